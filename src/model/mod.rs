pub mod config;
pub mod idea;
pub mod task;
pub mod task_type;
pub mod workspace;

pub use config::*;
pub use idea::*;
pub use task::*;
pub use task_type::*;
pub use workspace::*;
