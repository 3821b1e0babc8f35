/// Binding expression language - public module facade.
pub mod ast;
pub mod binding;
pub mod builtins;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod transforms;
pub mod value;

// --- Re-exports ---
pub use binding::{interpolate, resolve_json, resolve_value};
pub use evaluator::{evaluate, resolve_data_path, try_evaluate, EvalError};
pub use transforms::TransformRegistry;
