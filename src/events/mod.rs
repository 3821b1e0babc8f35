pub mod schema_update_event;

pub use schema_update_event::{on_schema_updated, publish_schema_update, OperationTag, SchemaUpdateCallback};
