mod idea;
mod init;
mod plan;
mod task;
pub use init::cmd_init;

use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::cli::commands::*;
use crate::io::config_io;
use crate::io::lock::{DEFAULT_LOCK_TIMEOUT, FileLock};
use crate::io::recovery;
use crate::io::workspace_io::{self, DATA_DIR};
use crate::model::workspace::Workspace;

/// Per-invocation settings shared by every handler
pub struct Context {
    /// Where workspace discovery starts (`-C` or the current directory)
    pub start: PathBuf,
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let start = match &cli.workspace_dir {
        Some(dir) => std::fs::canonicalize(dir).map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };
    let ctx = Context { start, json: cli.json };

    match cli.command {
        Commands::Init(args) => cmd_init(args, &ctx.start),
        Commands::Task(cmd) => task::run(cmd.action, &ctx),
        Commands::Type(cmd) => task::run_type(cmd.action, &ctx),
        Commands::Plan(cmd) => plan::run(cmd.action, &ctx),
        Commands::Idea(cmd) => idea::run(cmd.action, &ctx),
        Commands::Watch(args) => idea::cmd_watch(args, &ctx),
        Commands::Config(cmd) => cmd_config(cmd.action, &ctx),
        Commands::Recovery(cmd) => cmd_recovery(cmd, &ctx),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_workspace(ctx: &Context) -> Result<Workspace, Box<dyn Error>> {
    let root = workspace_io::discover_workspace(&ctx.start)?;
    Ok(workspace_io::load_workspace(&root)?)
}

/// Lock the data directory, then load. The lock must outlive the save.
fn load_workspace_locked(ctx: &Context) -> Result<(Workspace, FileLock), Box<dyn Error>> {
    let root = workspace_io::discover_workspace(&ctx.start)?;
    let lock = FileLock::acquire(&root.join(DATA_DIR), DEFAULT_LOCK_TIMEOUT)?;
    let workspace = workspace_io::load_workspace(&root)?;
    Ok((workspace, lock))
}

/// Resolve a full id or a unique id prefix
fn resolve_id<'a>(ids: impl IntoIterator<Item = &'a str>, query: &str, what: &str) -> Result<String, String> {
    let query = query.trim();
    if query.is_empty() {
        return Err(format!("{} id is required", what));
    }
    let mut matches = Vec::new();
    for id in ids {
        if id == query {
            return Ok(id.to_string());
        }
        if id.starts_with(query) {
            matches.push(id);
        }
    }
    match matches.as_slice() {
        [] => Err(format!("{} not found: {}", what, query)),
        [one] => Ok(one.to_string()),
        many => Err(format!(
            "ambiguous {} id '{}' matches {} {}s",
            what,
            query,
            many.len(),
            what
        )),
    }
}

/// `YYYY-MM-DD`, or today when absent
fn parse_day(raw: Option<&str>) -> Result<NaiveDate, String> {
    match raw {
        None => Ok(Local::now().date_naive()),
        Some(s) => parse_date(s),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", raw))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config(action: ConfigAction, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let root = workspace_io::discover_workspace(&ctx.start)?;
    let data_dir = root.join(DATA_DIR);
    match action {
        ConfigAction::Get(args) => {
            let (config, _doc) = config_io::read_config(&data_dir)?;
            let value = config_io::get_value(&config, &args.key)?;
            if ctx.json {
                print_json(&serde_json::json!({ "key": args.key, "value": value }))?;
            } else {
                println!("{}", value);
            }
        }
        ConfigAction::Set(args) => {
            let _lock = FileLock::acquire(&data_dir, DEFAULT_LOCK_TIMEOUT)?;
            let mut doc = config_io::read_document(&data_dir)?;
            let config = config_io::set_value(&mut doc, &args.key, &args.value)?;
            config_io::write_config(&data_dir, &doc)?;
            let value = config_io::get_value(&config, &args.key)?;
            if ctx.json {
                print_json(&serde_json::json!({ "key": args.key, "value": value }))?;
            } else {
                println!("{} = {}", args.key, value);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

fn cmd_recovery(cmd: RecoveryCmd, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let root = workspace_io::discover_workspace(&ctx.start)?;
    let data_dir = root.join(DATA_DIR);
    match cmd.action {
        Some(RecoveryAction::Path) => {
            println!("{}", recovery::recovery_log_path(&data_dir).display());
        }
        Some(RecoveryAction::Prune(args)) => {
            let removed = recovery::prune_recovery(&data_dir, None, args.all)?;
            if ctx.json {
                print_json(&serde_json::json!({ "removed": removed }))?;
            } else {
                println!("removed {} entries", removed);
            }
        }
        None => {
            let entries = recovery::read_recovery_entries(&data_dir, Some(cmd.limit));
            if ctx.json {
                print_json(&entries)?;
            } else if entries.is_empty() {
                println!("recovery log is empty");
            } else {
                for entry in &entries {
                    println!(
                        "{}  {:<7} {}  {}",
                        entry.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                        entry.category.to_string(),
                        entry.key,
                        entry.description
                    );
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_exact_and_prefix() {
        let ids = ["abc123", "abd456", "abc"];
        assert_eq!(resolve_id(ids, "abc", "task").unwrap(), "abc");
        assert_eq!(resolve_id(ids, "abd", "task").unwrap(), "abd456");
        assert_eq!(
            resolve_id(ids, "ab", "task").unwrap_err(),
            "ambiguous task id 'ab' matches 3 tasks"
        );
        assert_eq!(resolve_id(ids, "zz", "idea").unwrap_err(), "idea not found: zz");
        assert!(resolve_id(ids, " ", "idea").is_err());
    }

    #[test]
    fn dates_parse() {
        assert_eq!(parse_date("2025-03-10").unwrap(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert!(parse_date("10/03/2025").is_err());
        assert!(parse_day(None).is_ok());
    }
}
