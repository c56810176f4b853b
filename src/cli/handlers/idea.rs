use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;

use super::*;
use crate::cli::output::{RemovedJson, format_idea_tree, format_layout};
use crate::io::recovery::{RecoveryCategory, RecoveryEntry, atomic_write, log_recovery};
use crate::io::repository::{IDEAS_KEY, TASK_TYPES_KEY, TASKS_KEY};
use crate::io::watcher::StoreWatcher;
use crate::model::idea::{Idea, IdeaDraft, IdeaUpdate};
use crate::ops::idea_ops;
use crate::ops::layout::{build_tree, calculate_layout};
use crate::ops::transfer::{export_ideas, import_ideas};

const WATCH_POLL: Duration = Duration::from_millis(500);

pub(super) fn run(action: IdeaAction, ctx: &Context) -> Result<(), Box<dyn Error>> {
    match action {
        IdeaAction::Add(args) => cmd_add(args, ctx),
        IdeaAction::List(args) => cmd_list(args, ctx),
        IdeaAction::Edit(args) => cmd_edit(args, ctx),
        IdeaAction::Mv(args) => cmd_mv(args, ctx),
        IdeaAction::Pin(args) => cmd_pin(args, ctx),
        IdeaAction::Unpin(args) => cmd_unpin(args, ctx),
        IdeaAction::Rm(args) => cmd_rm(args, ctx),
        IdeaAction::Layout => cmd_layout(ctx),
        IdeaAction::Export(args) => cmd_export(args, ctx),
        IdeaAction::Import(args) => cmd_import(args, ctx),
    }
}

fn resolve_idea(ideas: &[Idea], query: &str) -> Result<String, String> {
    resolve_id(ideas.iter().map(|i| i.id.as_str()), query, "idea")
}

fn print_idea(idea: &Idea, ctx: &Context) -> Result<(), Box<dyn Error>> {
    if ctx.json {
        print_json(idea)?;
    } else {
        println!("{}", idea.id);
    }
    Ok(())
}

fn cmd_add(args: IdeaAddArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let parent_id = args
        .parent
        .as_deref()
        .map(|p| resolve_idea(&workspace.ideas, p))
        .transpose()?;
    let draft = IdeaDraft {
        name: args.name,
        description: args.description,
        topic: args.topic,
        parent_id,
        ..IdeaDraft::default()
    };
    let idea = idea_ops::create_idea(&mut workspace.ideas, draft, Utc::now())?;
    workspace_io::save_ideas(&workspace)?;
    print_idea(&idea, ctx)
}

fn cmd_list(args: IdeaListArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let workspace = load_workspace(ctx)?;
    match args.topic.as_deref() {
        Some(topic) => {
            let ideas = idea_ops::filter_by_topic(&workspace.ideas, topic);
            if ctx.json {
                print_json(&ideas)?;
            } else {
                for idea in ideas {
                    println!("{}  {}", crate::cli::output::short_id(&idea.id), idea.name);
                }
            }
        }
        None => {
            if ctx.json {
                print_json(&workspace.ideas)?;
            } else {
                print_lines(&format_idea_tree(&build_tree(&workspace.ideas)));
            }
        }
    }
    Ok(())
}

fn cmd_edit(args: IdeaEditArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let id = resolve_idea(&workspace.ideas, &args.id)?;
    let update = IdeaUpdate {
        name: args.name,
        description: args.description,
        topic: args.topic,
    };
    let idea = idea_ops::update_idea(&mut workspace.ideas, &id, update, Utc::now())?;
    workspace_io::save_ideas(&workspace)?;
    print_idea(&idea, ctx)
}

fn cmd_mv(args: IdeaMvArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let id = resolve_idea(&workspace.ideas, &args.id)?;
    let parent = match (args.root, args.to.as_deref()) {
        (true, _) | (false, None) => None,
        (false, Some(to)) => Some(resolve_idea(&workspace.ideas, to)?),
    };
    let idea = idea_ops::move_idea(&mut workspace.ideas, &id, parent.as_deref(), Utc::now())?;
    workspace_io::save_ideas(&workspace)?;
    print_idea(&idea, ctx)
}

fn cmd_pin(args: IdeaPinArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let id = resolve_idea(&workspace.ideas, &args.id)?;
    let idea = idea_ops::pin_idea(&mut workspace.ideas, &id, args.x, args.y, Utc::now())?;
    workspace_io::save_ideas(&workspace)?;
    print_idea(&idea, ctx)
}

fn cmd_unpin(args: IdArg, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let id = resolve_idea(&workspace.ideas, &args.id)?;
    let idea = idea_ops::unpin_idea(&mut workspace.ideas, &id, Utc::now())?;
    workspace_io::save_ideas(&workspace)?;
    print_idea(&idea, ctx)
}

fn cmd_rm(args: IdArg, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let id = resolve_idea(&workspace.ideas, &args.id)?;
    let before = workspace.ideas.clone();
    let removed = idea_ops::delete_idea(&mut workspace.ideas, &id)?;
    workspace_io::save_ideas(&workspace)?;

    let doomed: Vec<&Idea> = before.iter().filter(|i| removed.contains(&i.id)).collect();
    log_recovery(
        &workspace.data_dir,
        RecoveryEntry::new(
            RecoveryCategory::Delete,
            IDEAS_KEY,
            format!("idea {} deleted with {} descendants", id, removed.len().saturating_sub(1)),
            serde_json::to_string_pretty(&doomed)?,
        ),
    );

    if ctx.json {
        print_json(&RemovedJson { removed })?;
    } else {
        println!("deleted {} ideas", removed.len());
    }
    Ok(())
}

fn print_layout(workspace: &Workspace, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let layout = calculate_layout(&workspace.ideas, &workspace.config.layout);
    if ctx.json {
        print_json(&layout)?;
    } else {
        print_lines(&format_layout(&workspace.ideas, &layout));
    }
    Ok(())
}

fn cmd_layout(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let workspace = load_workspace(ctx)?;
    print_layout(&workspace, ctx)
}

fn cmd_export(args: ExportArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let workspace = load_workspace(ctx)?;
    let export = export_ideas(&workspace.ideas);
    let json = serde_json::to_string_pretty(&export)?;
    match args.output.as_deref() {
        Some(path) => {
            atomic_write(Path::new(path), json.as_bytes())?;
            eprintln!("exported {} ideas to {}", export.ideas.len(), path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

fn cmd_import(args: ImportArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let raw = fs::read_to_string(&args.file).map_err(|e| format!("cannot read {}: {}", args.file, e))?;
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let count = import_ideas(&raw, &mut workspace.ideas, &workspace.config.layout, Utc::now())?;
    workspace_io::save_ideas(&workspace)?;
    if ctx.json {
        print_json(&serde_json::json!({ "imported": count }))?;
    } else {
        println!("imported {} ideas", count);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Watch
// ---------------------------------------------------------------------------

pub(super) fn cmd_watch(args: WatchArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let workspace = load_workspace(ctx)?;
    let watcher = StoreWatcher::start(&workspace.data_dir)?;
    print_layout(&workspace, ctx)?;

    let mut seen = 0usize;
    while args.max_events.is_none_or(|max| seen < max) {
        let keys = watcher.wait(WATCH_POLL);
        let relevant: Vec<&String> = keys
            .iter()
            .filter(|k| [IDEAS_KEY, TASKS_KEY, TASK_TYPES_KEY].contains(&k.as_str()))
            .collect();
        if relevant.is_empty() {
            continue;
        }
        seen += 1;
        tracing::debug!(?relevant, "store changed");
        let workspace = load_workspace(ctx)?;
        if !ctx.json {
            println!("-- changed: {}", relevant.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", "));
        }
        print_layout(&workspace, ctx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idea_prefixes_resolve() {
        let now = Utc::now();
        let ideas = vec![Idea::new("aaa-1", "A", now), Idea::new("bbb-1", "B", now)];
        assert_eq!(resolve_idea(&ideas, "bb").unwrap(), "bbb-1");
        assert!(resolve_idea(&ideas, "c").is_err());
    }
}
