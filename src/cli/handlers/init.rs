use std::fs;
use std::path::Path;

use chrono::Utc;

use crate::cli::commands::InitArgs;
use crate::io::config_io::{CONFIG_FILE, read_config};
use crate::io::repository::{Repository, TASK_TYPES_KEY};
use crate::io::store::FileStore;
use crate::io::workspace_io::{self, DATA_DIR};
use crate::model::task_type::TaskType;
use crate::ops::task_type_ops::seed_defaults;

const CONFIG_TEMPLATE: &str = r##"# ChronoTask workspace settings. Every key is optional.
# Change values here or with: ct config set <section.key> <value>

[planner]
work_start = "08:00"
work_end = "18:00"
# Pixels per minute of the day column (1.0 = 60px per hour)
pixels_per_minute = 1.0
# Block out the breaks below on the timeline and in `ct plan eval`
workday_active = false
breaks = [
  { start = "10:00", minutes = 30 },
  { start = "11:30", minutes = 60 },
  { start = "14:30", minutes = 30 },
]

[layout]
node_width = 250.0
node_height = 120.0
horizontal_gap = 50.0
vertical_gap = 150.0
margin_x = 50.0
margin_y = 50.0
root_gap = 100.0

[tasks]
default_type = "work"
default_estimate = 30
"##;

pub fn cmd_init(args: InitArgs, cwd: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = cwd.join(DATA_DIR);

    if data_dir.is_dir() && !args.force {
        return Err(format!("workspace already exists in ./{}/ (use --force to reset config)", DATA_DIR).into());
    }

    if let Some(parent) = cwd.parent()
        && let Ok(parent_root) = workspace_io::discover_workspace(parent)
    {
        eprintln!("note: enclosing workspace found at {}/", parent_root.join(DATA_DIR).display());
    }

    fs::create_dir_all(&data_dir)?;
    fs::write(data_dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;
    // The written template must parse
    read_config(&data_dir)?;

    let store = FileStore::new(&data_dir);
    let types: Repository<TaskType> = Repository::new(&store, TASK_TYPES_KEY);
    if !types.exists()? {
        types.save(&seed_defaults(Utc::now()))?;
    }

    println!("Initialized chronotask workspace in {}", data_dir.display());
    Ok(())
}
