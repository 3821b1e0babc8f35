pub mod active_edit;
pub mod editor_session;

pub use active_edit::ActiveEdit;
pub use editor_session::{EditorSession, NodeSelectCallback, SessionError, Toast, ToastKind};
