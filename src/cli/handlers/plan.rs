use std::error::Error;

use chrono::Utc;

use super::task::resolve_task;
use super::*;
use crate::cli::output::{drop_to_json, format_drop, format_evaluation, format_plan_day, plan_day_to_json};
use crate::model::config::hhmm;
use crate::ops::evaluation::evaluate_day;
use crate::ops::task_ops;
use crate::ops::timeline::{DropPreview, Timeline, scheduled_on};

pub(super) fn run(action: PlanAction, ctx: &Context) -> Result<(), Box<dyn Error>> {
    match action {
        PlanAction::Day(args) => cmd_day(args, ctx),
        PlanAction::Preview(args) => cmd_drop(args, false, ctx),
        PlanAction::Drop(args) => cmd_drop(args, true, ctx),
        PlanAction::At(args) => cmd_at(args, ctx),
        PlanAction::Unschedule(args) => cmd_unschedule(args, ctx),
        PlanAction::Eval(args) => cmd_eval(args, ctx),
    }
}

fn cmd_day(args: DateArg, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let workspace = load_workspace(ctx)?;
    let day = parse_day(args.date.as_deref())?;
    let timeline = Timeline::from_config(&workspace.config.planner);
    let tasks = scheduled_on(&workspace.tasks, day);

    if ctx.json {
        print_json(&plan_day_to_json(day, &tasks, &workspace.task_types, &timeline))?;
    } else {
        print_lines(&format_plan_day(day, &tasks, &timeline));
    }
    Ok(())
}

/// `preview` and `drop` share the pixel-offset path; only `drop` writes
fn cmd_drop(args: DropArgs, apply: bool, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let day = parse_day(args.date.as_deref())?;
    let id = resolve_task(&workspace, &args.id)?;
    let timeline = Timeline::from_config(&workspace.config.planner);

    let task = task_ops::find_task(&workspace.tasks, &id).ok_or_else(|| format!("task not found: {}", id))?;
    let preview = timeline.preview_drop(args.y, day, task, &workspace.tasks);
    tracing::debug!(task = %id, y = args.y, start = %preview.start, "drop preview");

    if apply {
        apply_preview(&mut workspace, &id, &preview)?;
    }
    report_drop(&id, &preview, apply, ctx)
}

fn cmd_at(args: AtArgs, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let day = parse_day(args.date.as_deref())?;
    let time = hhmm::parse(&args.time).map_err(|_| format!("invalid time '{}' (expected HH:MM)", args.time))?;
    let id = resolve_task(&workspace, &args.id)?;
    let timeline = Timeline::from_config(&workspace.config.planner);

    let task = task_ops::find_task(&workspace.tasks, &id).ok_or_else(|| format!("task not found: {}", id))?;
    let preview = timeline.preview_at(day.and_time(time), task, &workspace.tasks);

    apply_preview(&mut workspace, &id, &preview)?;
    report_drop(&id, &preview, true, ctx)
}

/// Overlaps are reported, never refused
fn apply_preview(workspace: &mut Workspace, id: &str, preview: &DropPreview) -> Result<(), Box<dyn Error>> {
    task_ops::schedule_task(&mut workspace.tasks, id, preview.start, Utc::now())?;
    workspace_io::save_tasks(workspace)?;
    if preview.has_overlap() {
        tracing::info!(task = %id, conflicts = preview.conflicts.len(), "scheduled with overlap");
    }
    Ok(())
}

fn report_drop(id: &str, preview: &DropPreview, applied: bool, ctx: &Context) -> Result<(), Box<dyn Error>> {
    if ctx.json {
        print_json(&drop_to_json(id, preview, applied))?;
    } else {
        print_lines(&format_drop(preview, applied));
    }
    Ok(())
}

fn cmd_unschedule(args: IdArg, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let (mut workspace, _lock) = load_workspace_locked(ctx)?;
    let id = resolve_task(&workspace, &args.id)?;
    task_ops::unschedule_task(&mut workspace.tasks, &id, Utc::now())?;
    workspace_io::save_tasks(&workspace)?;
    if ctx.json {
        print_json(&serde_json::json!({ "id": id, "scheduled": false }))?;
    } else {
        println!("{} moved to backlog", id);
    }
    Ok(())
}

fn cmd_eval(args: DateArg, ctx: &Context) -> Result<(), Box<dyn Error>> {
    let workspace = load_workspace(ctx)?;
    let day = parse_day(args.date.as_deref())?;
    let timeline = Timeline::from_config(&workspace.config.planner);
    let eval = evaluate_day(day, &workspace.tasks, &workspace.task_types, &timeline);
    if ctx.json {
        print_json(&eval)?;
    } else {
        print_lines(&format_evaluation(&eval));
    }
    Ok(())
}
