use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::io::config_io::{self, ConfigError};
use crate::io::repository::{IDEAS_KEY, Repository, TASK_TYPES_KEY, TASKS_KEY};
use crate::io::store::{FileStore, StoreError};
use crate::model::idea::Idea;
use crate::model::task::Task;
use crate::model::task_type::TaskType;
use crate::model::workspace::Workspace;
use crate::ops::task_type_ops;

/// Name of the data directory inside a workspace root
pub const DATA_DIR: &str = ".chronotask";

/// Error type for workspace I/O
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not a chronotask workspace: no .chronotask/ directory found (run `ct init`)")]
    NotAWorkspace,
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Walk up from `start` looking for a directory that contains `.chronotask/`.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(DATA_DIR).is_dir() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(WorkspaceError::NotAWorkspace);
        }
    }
}

pub fn store_for(workspace: &Workspace) -> FileStore {
    FileStore::new(&workspace.data_dir)
}

/// Load config and all three collections. Task types fall back to the
/// predefined set until one has been saved; tasks written by older versions
/// are repaired in memory.
pub fn load_workspace(root: &Path) -> Result<Workspace, WorkspaceError> {
    let data_dir = root.join(DATA_DIR);
    if !data_dir.is_dir() {
        return Err(WorkspaceError::NotAWorkspace);
    }
    let (config, _doc) = config_io::read_config(&data_dir)?;
    let store = FileStore::new(&data_dir);

    let mut tasks = Repository::<Task>::new(&store, TASKS_KEY).load()?;
    let repaired = tasks.iter_mut().map(Task::normalize_legacy).filter(|&c| c).count();
    if repaired > 0 {
        tracing::info!(repaired, "normalized legacy task records");
    }

    let ideas = Repository::<Idea>::new(&store, IDEAS_KEY).load()?;

    let types_repo = Repository::<TaskType>::new(&store, TASK_TYPES_KEY);
    let task_types = if types_repo.exists()? {
        types_repo.load()?
    } else {
        task_type_ops::seed_defaults(Utc::now())
    };

    Ok(Workspace {
        root: root.to_path_buf(),
        data_dir,
        config,
        tasks,
        ideas,
        task_types,
    })
}

pub fn save_tasks(workspace: &Workspace) -> Result<(), WorkspaceError> {
    let store = store_for(workspace);
    Repository::<Task>::new(&store, TASKS_KEY).save(&workspace.tasks)?;
    Ok(())
}

pub fn save_ideas(workspace: &Workspace) -> Result<(), WorkspaceError> {
    let store = store_for(workspace);
    Repository::<Idea>::new(&store, IDEAS_KEY).save(&workspace.ideas)?;
    Ok(())
}

pub fn save_task_types(workspace: &Workspace) -> Result<(), WorkspaceError> {
    let store = store_for(workspace);
    Repository::<TaskType>::new(&store, TASK_TYPES_KEY).save(&workspace.task_types)?;
    Ok(())
}
