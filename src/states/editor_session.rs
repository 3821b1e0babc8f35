use crate::builder_settings::BuilderConfig;
use crate::dsl::TransformRegistry;
use crate::events::{on_schema_updated, OperationTag, SchemaUpdateCallback};
use crate::keyboard::{resolve_command, Command, KeyChord};
use crate::mutations::{self, MoveDirection, MutationError, MutationOutcome};
use crate::path::NodeLookup;
use crate::renderer::{OutputNode, Renderer};
use crate::schema::SchemaNode;
use crate::selection::{SelectionPath, SelectionState};
use crate::states::active_edit::ActiveEdit;
use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Mutation(#[from] MutationError),
    /// The tree was updated but the host failed to persist it.
    #[error("schema update was not persisted: {0}")]
    Persist(anyhow::Error),
}

pub type NodeSelectCallback = Box<dyn FnMut(&str)>;

/// One editing session: the schema being edited, the selection tuple and
/// the host callbacks. Selection changes are computed on a copy and swapped
/// in whole.
pub struct EditorSession {
    pub tree: SchemaNode,
    pub selection: SelectionState,
    pub config: BuilderConfig,
    pub transforms: TransformRegistry,
    pub active_edit: Option<ActiveEdit>,
    pub toast: Option<Toast>,
    pub on_schema_update: Option<SchemaUpdateCallback>,
    pub on_node_select: Option<NodeSelectCallback>,
}

impl EditorSession {
    pub fn new(tree: SchemaNode, config: BuilderConfig) -> Self {
        let selection = SelectionState::new(config.selection_enabled);
        Self {
            tree,
            selection,
            config,
            transforms: TransformRegistry::new(),
            active_edit: None,
            toast: None,
            on_schema_update: None,
            on_node_select: None,
        }
    }

    pub fn render(&self, context: &Value) -> Option<OutputNode> {
        Renderer::new(&self.config.render, &self.transforms).render(&self.tree, context)
    }

    // ─── Toasts ───────────────────────────────────────────────────────────────

    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toast = Some(Toast {
            message: message.into(),
            kind,
        });
    }

    pub fn take_toast(&mut self) -> Option<Toast> {
        self.toast.take()
    }

    // ─── Selection ────────────────────────────────────────────────────────────

    /// Run `f` on a copy of the selection and swap the result in. The
    /// node-select callback fires when the selected id changed.
    fn update_selection<R>(&mut self, f: impl FnOnce(&mut SelectionState) -> R) -> R {
        let mut next = self.selection.clone();
        let out = f(&mut next);
        let before = self.selection.selected.as_ref().map(|s| s.component_id.clone());
        self.selection = next;
        if let Some(sel) = &self.selection.selected {
            if before.as_deref() != Some(sel.component_id.as_str()) {
                if let Some(cb) = self.on_node_select.as_mut() {
                    cb(&sel.component_id);
                }
            }
        }
        out
    }

    pub fn set_selection_enabled(&mut self, enabled: bool) {
        self.update_selection(|s| {
            s.enabled = enabled;
            if !enabled {
                s.clear_selection();
            }
        });
    }

    pub fn select_node(&mut self, id: &str, path: &[usize]) -> bool {
        self.update_selection(|s| s.select_node(id, path))
    }

    pub fn set_hovered_node(&mut self, id: Option<&str>, path: &[usize]) -> bool {
        self.update_selection(|s| s.set_hovered_node(id, path))
    }

    pub fn hover(&mut self, output: &impl NodeLookup, raw: &[usize], direct: bool) -> bool {
        self.update_selection(|s| s.hover(output, raw, direct))
    }

    pub fn click(&mut self, output: &impl NodeLookup, raw: &[usize], direct: bool) -> Option<SelectionPath> {
        self.update_selection(|s| s.click(output, raw, direct))
    }

    pub fn double_click(&mut self, output: &impl NodeLookup, raw: &[usize]) -> Option<SelectionPath> {
        self.update_selection(|s| s.double_click(output, raw))
    }

    pub fn navigate_to_children(&mut self) -> bool {
        let tree = &self.tree;
        let mut next = self.selection.clone();
        let changed = next.navigate_to_children(tree);
        self.selection = next;
        changed
    }

    pub fn navigate_to_parent(&mut self) -> bool {
        self.update_selection(SelectionState::navigate_to_parent)
    }

    /// Swap in a new schema (e.g. loaded from storage). Selection and any
    /// pending edit are reset; the clipboard survives.
    pub fn replace_schema(&mut self, tree: SchemaNode) {
        let mut selection = SelectionState::new(self.selection.enabled);
        selection.copied = self.selection.copied.take();
        self.tree = tree;
        self.selection = selection;
        self.active_edit = None;
        tracing::debug!(root = %self.tree.id(), "schema replaced");
    }

    // ─── Mutations ────────────────────────────────────────────────────────────

    fn apply(&mut self, outcome: MutationOutcome) -> Result<OperationTag, SessionError> {
        let MutationOutcome { tree, selection, tag } = outcome;
        let mut next = self.selection.clone();
        next.selected = selection;
        next.hovered = None;
        next.revalidate(&tree);
        self.tree = tree;
        self.update_selection(|s| *s = next);
        on_schema_updated(self, tag).map_err(SessionError::Persist)?;
        Ok(tag)
    }

    fn reject(&mut self, err: MutationError) -> SessionError {
        tracing::debug!(error = %err, "mutation rejected");
        self.show_toast(err.to_string(), ToastKind::Error);
        SessionError::Mutation(err)
    }

    pub fn copy(&mut self) -> Result<(), SessionError> {
        match mutations::copy(&self.tree, self.selection.selected.as_ref()) {
            Ok(node) => {
                self.show_toast("Copied", ToastKind::Info);
                self.selection.copied = Some(node);
                Ok(())
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    pub fn cut(&mut self) -> Result<OperationTag, SessionError> {
        match mutations::cut(&self.tree, self.selection.selected.as_ref()) {
            Ok((outcome, node)) => {
                self.selection.copied = Some(node);
                self.apply(outcome)
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    pub fn paste(&mut self) -> Result<OperationTag, SessionError> {
        let result = mutations::paste_as_child(
            &self.tree,
            self.selection.selected.as_ref(),
            self.selection.copied.as_ref(),
        );
        self.finish(result)
    }

    pub fn delete(&mut self) -> Result<OperationTag, SessionError> {
        let result = mutations::delete(&self.tree, self.selection.selected.as_ref());
        self.finish(result)
    }

    pub fn duplicate(&mut self) -> Result<OperationTag, SessionError> {
        let result = mutations::duplicate(&self.tree, self.selection.selected.as_ref());
        self.finish(result)
    }

    pub fn move_selected(&mut self, direction: MoveDirection) -> Result<OperationTag, SessionError> {
        let result = mutations::move_node(&self.tree, self.selection.selected.as_ref(), direction);
        self.finish(result)
    }

    pub fn move_selected_to(&mut self, to_parent: &[usize], to_index: usize) -> Result<OperationTag, SessionError> {
        let result = mutations::move_to(&self.tree, self.selection.selected.as_ref(), to_parent, to_index);
        self.finish(result)
    }

    fn finish(&mut self, result: Result<MutationOutcome, MutationError>) -> Result<OperationTag, SessionError> {
        match result {
            Ok(outcome) => self.apply(outcome),
            Err(err) => Err(self.reject(err)),
        }
    }

    // ─── Active edit ──────────────────────────────────────────────────────────

    pub fn begin_edit(&mut self, node_id: &str) -> &mut ActiveEdit {
        self.active_edit.insert(ActiveEdit::new(node_id))
    }

    pub fn cancel_edit(&mut self) {
        self.active_edit = None;
    }

    /// Apply the pending edit, if any. The edit is consumed either way.
    pub fn commit_edit(&mut self) -> Result<Option<OperationTag>, SessionError> {
        let Some(edit) = self.active_edit.take() else {
            return Ok(None);
        };
        let result = mutations::update_node_content(&self.tree, &edit);
        self.finish(result).map(Some)
    }

    // ─── Keyboard ─────────────────────────────────────────────────────────────

    /// Run the command bound to `chord`. Unmet preconditions are silent
    /// no-ops; only a failed hand-off of an applied change is an error.
    pub fn handle_chord(&mut self, chord: &KeyChord) -> Result<Option<Command>, SessionError> {
        let Some(command) = resolve_command(chord, &self.config.keyboard, self.selection.enabled) else {
            return Ok(None);
        };
        let ran = match command {
            Command::Escape => self.update_selection(SelectionState::escape),
            Command::SelectFirstChild => {
                let tree = &self.tree;
                let mut next = self.selection.clone();
                let ran = next.select_first_child(tree).is_some();
                self.update_selection(|s| *s = next);
                ran
            }
            Command::SelectParent => {
                let tree = &self.tree;
                let mut next = self.selection.clone();
                let ran = next.select_parent(tree).is_some();
                self.update_selection(|s| *s = next);
                ran
            }
            Command::NextSibling | Command::PreviousSibling => {
                let tree = &self.tree;
                let mut next = self.selection.clone();
                let ran = next
                    .select_sibling(tree, command == Command::PreviousSibling)
                    .is_some();
                self.update_selection(|s| *s = next);
                ran
            }
            Command::Move(direction) => self.quiet(|s| s.move_selected(direction))?,
            Command::Copy => self.quiet(EditorSession::copy)?,
            Command::Cut => self.quiet(EditorSession::cut)?,
            Command::Paste => self.quiet(EditorSession::paste)?,
            Command::Duplicate => self.quiet(EditorSession::duplicate)?,
            Command::Delete => self.quiet(EditorSession::delete)?,
        };
        Ok(ran.then_some(command))
    }

    /// Run a mutation from the keyboard: rejections are swallowed (and their
    /// toast cleared), persistence failures still surface.
    fn quiet<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, SessionError>,
    ) -> Result<bool, SessionError> {
        let toast_before = self.toast.clone();
        match op(self) {
            Ok(_) => Ok(true),
            Err(SessionError::Mutation(err)) => {
                tracing::debug!(error = %err, "keyboard command skipped");
                self.toast = toast_before;
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Feed one frame of egui input through the keyboard dispatcher.
    #[cfg(feature = "egui")]
    pub fn handle_egui_input(&mut self, input: &egui::InputState) -> Result<Vec<Command>, SessionError> {
        let mut ran = Vec::new();
        for chord in crate::keyboard::chords_from_egui_input(input) {
            if let Some(command) = self.handle_chord(&chord)? {
                ran.push(command);
            }
        }
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::{Key, Modifiers};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tree() -> SchemaNode {
        serde_json::from_value(json!({
            "id": "root",
            "type": "div",
            "children": [
                { "id": "a", "type": "div", "children": [{ "id": "a0", "type": "text", "children": "hi" }] },
                { "id": "b", "type": "div" }
            ]
        }))
        .unwrap()
    }

    fn session() -> EditorSession {
        EditorSession::new(tree(), BuilderConfig::default())
    }

    #[test]
    fn node_select_callback_fires_on_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut s = session();
        s.on_node_select = Some(Box::new(move |id| sink.borrow_mut().push(id.to_string())));
        s.select_node("a", &[0]);
        s.select_node("a", &[0]);
        s.select_node("b", &[1]);
        assert_eq!(seen.borrow().as_slice(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn mutation_updates_tree_and_persists() {
        let tags = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&tags);
        let mut s = session();
        s.on_schema_update = Some(Box::new(move |_, tag| {
            sink.borrow_mut().push(tag);
            Ok(())
        }));
        s.select_node("a", &[0]);
        assert_eq!(s.duplicate().expect("duplicated"), OperationTag::Duplicate);
        assert_eq!(s.tree.child_items().len(), 3);
        let selected = s.selection.selected.clone().unwrap();
        assert_eq!(selected.path, vec![1]);
        assert_eq!(tags.borrow().as_slice(), &[OperationTag::Duplicate]);
    }

    #[test]
    fn rejected_mutation_sets_toast_and_keeps_tree() {
        let mut s = session();
        s.select_node("root", &[]);
        let err = s.delete().unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete the root node");
        assert_eq!(s.toast.as_ref().map(|t| t.kind), Some(ToastKind::Error));
        assert_eq!(s.tree, tree());
    }

    #[test]
    fn persistence_failure_is_surfaced_after_applying() {
        let mut s = session();
        s.on_schema_update = Some(Box::new(|_, _| Err(anyhow::anyhow!("offline"))));
        s.select_node("b", &[1]);
        let err = s.delete().unwrap_err();
        assert!(matches!(err, SessionError::Persist(_)));
        assert_eq!(s.tree.child_items().len(), 1);
        assert!(s.selection.selected.is_none());
    }

    #[test]
    fn copy_paste_via_keyboard() {
        let mut s = session();
        s.select_node("a0", &[0, 0]);
        let copy = KeyChord::new(Key::C, Modifiers::COMMAND);
        assert_eq!(s.handle_chord(&copy).expect("ok"), Some(Command::Copy));
        s.select_node("b", &[1]);
        let paste = KeyChord::new(Key::V, Modifiers::COMMAND);
        assert_eq!(s.handle_chord(&paste).expect("ok"), Some(Command::Paste));
        let b = crate::path::get_node(&s.tree, &[1]).unwrap();
        assert_eq!(b.child_items().len(), 1);
    }

    #[test]
    fn keyboard_preconditions_are_silent() {
        let mut s = session();
        let delete = KeyChord::plain(Key::Delete);
        assert_eq!(s.handle_chord(&delete).expect("ok"), None);
        assert!(s.toast.is_none());
        s.config.keyboard.allow_delete = false;
        s.select_node("b", &[1]);
        assert_eq!(s.handle_chord(&delete).expect("ok"), None);
        assert_eq!(s.tree, tree());
    }

    #[test]
    fn keyboard_navigation_moves_selection() {
        let mut s = session();
        s.select_node("a", &[0]);
        assert_eq!(s.handle_chord(&KeyChord::plain(Key::Tab)).expect("ok"), Some(Command::NextSibling));
        assert_eq!(s.selection.selected.as_ref().unwrap().component_id, "b");
        assert_eq!(
            s.handle_chord(&KeyChord::new(Key::Tab, Modifiers::SHIFT)).expect("ok"),
            Some(Command::PreviousSibling)
        );
        assert_eq!(s.handle_chord(&KeyChord::plain(Key::Enter)).expect("ok"), Some(Command::SelectFirstChild));
        assert_eq!(s.selection.selected.as_ref().unwrap().component_id, "a0");
        assert_eq!(s.handle_chord(&KeyChord::plain(Key::Escape)).expect("ok"), Some(Command::Escape));
        assert!(s.selection.selected.is_none());
        assert_eq!(s.handle_chord(&KeyChord::plain(Key::Escape)).expect("ok"), Some(Command::Escape));
        assert_eq!(s.selection.level, 0);
    }

    #[test]
    fn active_edit_commits_through_mutation() {
        let mut s = session();
        s.begin_edit("a0").text = Some("bye".into());
        assert_eq!(s.commit_edit().expect("committed"), Some(OperationTag::Edit));
        let out = s.render(&json!({})).unwrap();
        assert_eq!(out.text_content(), "bye");
        assert!(s.active_edit.is_none());
        assert_eq!(s.commit_edit().expect("nothing"), None);
    }

    #[test]
    fn replace_schema_resets_selection() {
        let mut s = session();
        s.select_node("a", &[0]);
        s.copy().expect("copied");
        s.replace_schema(tree());
        assert!(s.selection.selected.is_none());
        assert!(s.selection.copied.is_some());
    }
}
