use std::path::PathBuf;

use super::config::Config;
use super::idea::Idea;
use super::task::Task;
use super::task_type::TaskType;

/// A fully loaded ChronoTask workspace
#[derive(Debug)]
pub struct Workspace {
    /// Directory containing `.chronotask/`
    pub root: PathBuf,
    /// Path to the `.chronotask/` data directory
    pub data_dir: PathBuf,
    /// Parsed config.toml
    pub config: Config,
    pub tasks: Vec<Task>,
    pub ideas: Vec<Idea>,
    pub task_types: Vec<TaskType>,
}
