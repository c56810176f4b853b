use std::error::Error;

use chrono::Utc;

use super::*;
use crate::cli::output::{RemovedJson, format_task_detail, format_task_line, format_type_line};
use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::repository::TASKS_KEY;
use crate::model::task::{TaskDraft, TaskUpdate};
use crate::model::task_type::TaskType;
use crate::ops::{task_ops, task_type_ops};

pub(super) fn run(action: TaskAction, ctx: &Context) -> Result<(), Box<dyn Error>> {
    match action {
        TaskAction::Add(args) => cmd_add(args, ctx),
        TaskAction::List(args) => cmd_list(args, ctx),
        TaskAction::Show(args) => cmd_show(args, ctx),
        TaskAction::Edit(args) => cmd_edit(args, ctx),
        TaskAction::Done(args) => cmd_done(args, ctx),
        TaskAction::Rm(args) => cmd_rm(args, ctx),
    }
}

pub(super) fn run_type(action: TypeAction, ctx: &Context) -> Result<(), Box<dyn Error>> {
    match action {
        TypeAction::List => cmd_type_list(ctx),
        TypeAction::Add(args) => cmd_type_add(args, ctx),
        TypeAction::Edit(args) => cmd_type_edit(args, ctx),
        TypeAction::Rm(args) => cmd_type_rm(args, ctx),
    }
}

pub(super) fn resolve_task(workspace: &Workspace, query: &str) -> Result<String, String> {
    resolve_id(workspace.tasks.iter().map(|t| t.id.as_str()), query, "task")
}

fn warn_unknown_type(workspace: &Workspace, name: &str) {
    if task_type_ops::find_by_name(&workspace.task_types, name).is_none() {
        eprintln!("note: no task type named '{}' (see `ct type list`)", name);
    }
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn cmd_add(args: TaskAddArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let draft = TaskDraft {
        title: args.title,
        description: args.description,
        due_date: args.due.as_deref().map(parse_date).transpose()?,
        task_type: args.task_type,
        tags: args.tags,
        estimate_minutes: args.estimate,
        scheduled_start: None,
    };
    let task = task_ops::create_task(&mut workspace.tasks, draft, &workspace.config.tasks, Utc::now())?;
    warn_unknown_type(&workspace, &task.task_type);
    workspace_io::save_tasks(&workspace)?;

    if ctx.json {
        print_json(&task)?;
    } else {
        println!("{}", task.id);
    }
    Ok(())
}

fn cmd_list(args: TaskListArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let workspace = load_workspace(ctx)?;
    let mut tasks: Vec<_> = if args.all {
        workspace.tasks.iter().collect()
    } else {
        task_ops::filter_by_completion(&workspace.tasks, args.done)
    };
    if let Some(kind) = args.task_type.as_deref() {
        let kind = kind.trim().to_lowercase();
        tasks.retain(|t| t.task_type.to_lowercase() == kind);
    }
    if args.unscheduled {
        tasks.retain(|t| !t.is_scheduled());
    }

    if ctx.json {
        print_json(&tasks)?;
    } else {
        for task in tasks {
            println!("{}", format_task_line(task));
        }
    }
    Ok(())
}

fn cmd_show(args: IdArg, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let workspace = load_workspace(ctx)?;
    let id = resolve_task(&workspace, &args.id)?;
    let task = task_ops::find_task(&workspace.tasks, &id).ok_or_else(|| format!("task not found: {}", id))?;
    if ctx.json {
        print_json(task)?;
    } else {
        print_lines(&format_task_detail(task));
    }
    Ok(())
}

fn cmd_edit(args: TaskEditArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let id = resolve_task(&workspace, &args.id)?;
    let update = TaskUpdate {
        title: args.title,
        description: args.description,
        completed: None,
        due_date: args.due.as_deref().map(parse_date).transpose()?,
        task_type: args.task_type,
        tags: args.tags.as_deref().map(split_tags),
        estimate_minutes: args.estimate,
    };
    let task = task_ops::update_task(&mut workspace.tasks, &id, update, Utc::now())?;
    warn_unknown_type(&workspace, &task.task_type);
    workspace_io::save_tasks(&workspace)?;

    if ctx.json {
        print_json(&task)?;
    } else {
        println!("{}", format_task_line(&task));
    }
    Ok(())
}

fn cmd_done(args: IdArg, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let id = resolve_task(&workspace, &args.id)?;
    let completed = task_ops::toggle_completion(&mut workspace.tasks, &id, Utc::now())?;
    workspace_io::save_tasks(&workspace)?;

    if ctx.json {
        print_json(&serde_json::json!({ "id": id, "completed": completed }))?;
    } else {
        println!("{} {}", id, if completed { "done" } else { "reopened" });
    }
    Ok(())
}

fn cmd_rm(args: IdArg, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let id = resolve_task(&workspace, &args.id)?;
    let task = task_ops::delete_task(&mut workspace.tasks, &id)?;
    workspace_io::save_tasks(&workspace)?;
    log_recovery(
        &workspace.data_dir,
        RecoveryEntry::new(
            RecoveryCategory::Delete,
            TASKS_KEY,
            format!("task {} deleted", id),
            serde_json::to_string_pretty(&task)?,
        ),
    );

    if ctx.json {
        print_json(&RemovedJson { removed: vec![id] })?;
    } else {
        println!("deleted {}", task.title);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Task types
// ---------------------------------------------------------------------------

/// Match a type by exact name (any case), then by id or id prefix
fn resolve_type(types: &[TaskType], query: &str) -> Result<String, String> {
    if let Some(found) = task_type_ops::find_by_name(types, query) {
        return Ok(found.id.clone());
    }
    resolve_id(types.iter().map(|t| t.id.as_str()), query, "task type")
}

fn cmd_type_list(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let workspace = load_workspace(ctx)?;
    if ctx.json {
        print_json(&workspace.task_types)?;
    } else {
        for task_type in &workspace.task_types {
            println!("{}", format_type_line(task_type));
        }
    }
    Ok(())
}

fn cmd_type_add(args: TypeAddArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let created = task_type_ops::create_task_type(&mut workspace.task_types, &args.name, &args.color, Utc::now())?;
    workspace_io::save_task_types(&workspace)?;
    if ctx.json {
        print_json(&created)?;
    } else {
        println!("{}", created.id);
    }
    Ok(())
}

fn cmd_type_edit(args: TypeEditArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let id = resolve_type(&workspace.task_types, &args.name)?;
    let updated = task_type_ops::update_task_type(
        &mut workspace.task_types,
        &id,
        args.new_name.as_deref(),
        args.color.as_deref(),
        Utc::now(),
    )?;
    workspace_io::save_task_types(&workspace)?;
    if ctx.json {
        print_json(&updated)?;
    } else {
        println!("{}", format_type_line(&updated));
    }
    Ok(())
}

fn cmd_type_rm(args: TypeRef, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let id = resolve_type(&workspace.task_types, &args.name)?;
    let removed = task_type_ops::delete_task_type(&mut workspace.task_types, &id)?;
    workspace_io::save_task_types(&workspace)?;
    let in_use = workspace
        .tasks
        .iter()
        .filter(|t| removed.matches_name(&t.task_type))
        .count();
    if in_use > 0 {
        eprintln!("note: {} tasks still use '{}'", in_use, removed.name);
    }
    if ctx.json {
        print_json(&RemovedJson { removed: vec![removed.id.clone()] })?;
    } else {
        println!("deleted {}", removed.name);
    }
    Ok(())
}
