pub mod evaluation;
pub mod hierarchy;
pub mod idea_ops;
pub mod layout;
pub mod task_ops;
pub mod task_type_ops;
pub mod timeline;
pub mod transfer;

/// Fresh random id for a stored entity
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
