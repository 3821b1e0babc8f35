// In-progress content edit for one node, owned by the editor session.
// An external editor panel fills it in; `commit` turns it into a schema
// update through `mutations::update_node_content`.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveEdit {
    pub node_id: String,
    /// Replacement text content.
    pub text: Option<String>,
    /// Replacement `className` prop.
    pub class_name: Option<String>,
}

impl ActiveEdit {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.class_name.is_none()
    }
}
