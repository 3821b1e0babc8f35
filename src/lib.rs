//! Schema-driven UI builder core: interprets JSON component schemas into a
//! render tree, and provides the selection engine and structural edits the
//! builder canvas runs on.

pub mod builder_settings;
pub mod dsl;
pub mod events;
pub mod keyboard;
pub mod logics;
pub mod mutations;
pub mod path;
pub mod renderer;
pub mod schema;
pub mod selection;
pub mod states;

// --- Re-exports ---
pub use builder_settings::BuilderConfig;
pub use events::OperationTag;
pub use mutations::{MoveDirection, MutationError};
pub use renderer::{render, OutputNode, RenderConfig, Renderer};
pub use schema::{parse_schema, SchemaError, SchemaNode};
pub use selection::{SelectionPath, SelectionState};
pub use states::{EditorSession, SessionError, Toast, ToastKind};
