use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::idea::{Idea, Placement};
use crate::model::task::Task;
use crate::model::task_type::{FALLBACK_TYPE_COLOR, TaskType};
use crate::ops::evaluation::DayEvaluation;
use crate::ops::layout::{NodePosition, TreeNode};
use crate::ops::task_type_ops::find_by_name;
use crate::ops::timeline::{Block, DropPreview, Timeline, format_time};
use crate::util::unicode::{fit_to_width, truncate_to_width};

/// Width of the title column in task listings
const TITLE_COLUMN: usize = 40;

/// Short ids in human output
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTaskJson {
    pub id: String,
    pub title: String,
    pub task_type: String,
    pub color: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Pixel offset of the block's top edge in the day column
    pub top: f64,
    pub height: f64,
    pub completed: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDayJson {
    pub day: NaiveDate,
    pub column_height: f64,
    pub tasks: Vec<PlannedTaskJson>,
    pub breaks: Vec<BreakJson>,
}

#[derive(Serialize)]
pub struct BreakJson {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub top: f64,
    pub height: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropJson {
    pub id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub conflicts: Vec<String>,
    pub overlaps_break: bool,
    /// False for `plan preview`
    pub applied: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedJson {
    pub removed: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn type_color<'a>(types: &'a [TaskType], name: &str) -> &'a str {
    find_by_name(types, name).map_or(FALLBACK_TYPE_COLOR, |t| t.color.as_str())
}

pub fn plan_day_to_json(day: NaiveDate, tasks: &[&Task], types: &[TaskType], timeline: &Timeline) -> PlanDayJson {
    PlanDayJson {
        day,
        column_height: timeline.column_height(),
        tasks: tasks
            .iter()
            .filter_map(|task| {
                let start = task.scheduled_start?;
                let end = task.scheduled_end()?;
                Some(PlannedTaskJson {
                    id: task.id.clone(),
                    title: task.title.clone(),
                    task_type: task.task_type.clone(),
                    color: type_color(types, &task.task_type).to_string(),
                    start,
                    end,
                    top: timeline.offset_of(start),
                    height: crate::ops::timeline::duration_height(task.estimate_minutes, timeline.pixels_per_minute),
                    completed: task.completed,
                })
            })
            .collect(),
        breaks: timeline
            .break_blocks(day)
            .iter()
            .map(|b| break_to_json(b, timeline))
            .collect(),
    }
}

fn break_to_json(block: &Block, timeline: &Timeline) -> BreakJson {
    BreakJson {
        start: block.start,
        end: block.end,
        top: timeline.offset_of(block.start),
        height: block.minutes() as f64 * timeline.pixels_per_minute,
    }
}

pub fn drop_to_json(id: &str, preview: &DropPreview, applied: bool) -> DropJson {
    DropJson {
        id: id.to_string(),
        start: preview.start,
        end: preview.end,
        conflicts: preview.conflicts.clone(),
        overlaps_break: preview.overlaps_break,
        applied,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// One-line task summary: `[x] 1a2b3c4d  Title   work 30m @09:15`
pub fn format_task_line(task: &Task) -> String {
    let check = if task.completed { 'x' } else { ' ' };
    let mut line = format!(
        "[{}] {}  {}  {} {}m",
        check,
        short_id(&task.id),
        fit_to_width(&task.title, TITLE_COLUMN),
        task.task_type,
        task.estimate_minutes
    );
    if let Some(start) = task.scheduled_start {
        line.push_str(&format!(" @{} {}", start.date(), format_time(start)));
    }
    if !task.tags.is_empty() {
        let tags: Vec<String> = task.tags.iter().map(|t| format!("#{}", t)).collect();
        line.push_str(&format!(" {}", tags.join(" ")));
    }
    line
}

pub fn format_task_detail(task: &Task) -> Vec<String> {
    let check = if task.completed { 'x' } else { ' ' };
    let mut lines = vec![format!("[{}] {}", check, task.title)];
    lines.push(format!("id: {}", task.id));
    lines.push(format!("type: {}", task.task_type));
    lines.push(format!("estimate: {}m", task.estimate_minutes));
    if let Some(due) = task.due_date {
        lines.push(format!("due: {}", due));
    }
    if let (Some(start), Some(end)) = (task.scheduled_start, task.scheduled_end()) {
        lines.push(format!(
            "scheduled: {} {}-{}",
            start.date(),
            format_time(start),
            format_time(end)
        ));
    }
    if !task.tags.is_empty() {
        let tags: Vec<String> = task.tags.iter().map(|t| format!("#{}", t)).collect();
        lines.push(format!("tags: {}", tags.join(" ")));
    }
    if let Some(description) = &task.description {
        lines.push("description:".to_string());
        for line in description.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

pub fn format_type_line(task_type: &TaskType) -> String {
    let marker = if task_type.is_default { " (default)" } else { "" };
    format!(
        "{} {}  {}{}",
        task_type.color,
        short_id(&task_type.id),
        task_type.name,
        marker
    )
}

/// Planner column: tasks and breaks in time order
pub fn format_plan_day(day: NaiveDate, tasks: &[&Task], timeline: &Timeline) -> Vec<String> {
    let mut rows: Vec<(NaiveDateTime, String)> = Vec::new();
    for task in tasks {
        if let (Some(start), Some(end)) = (task.scheduled_start, task.scheduled_end()) {
            let check = if task.completed { 'x' } else { ' ' };
            rows.push((
                start,
                format!(
                    "{}-{}  [{}] {}  {} ({})",
                    format_time(start),
                    format_time(end),
                    check,
                    short_id(&task.id),
                    truncate_to_width(&task.title, TITLE_COLUMN),
                    task.task_type
                ),
            ));
        }
    }
    for block in timeline.break_blocks(day) {
        rows.push((
            block.start,
            format!("{}-{}  -- break --", format_time(block.start), format_time(block.end)),
        ));
    }
    rows.sort_by_key(|(start, _)| *start);

    let mut lines = vec![format!(
        "== {} ({}-{}) ==",
        day,
        timeline.work_start.format("%H:%M"),
        timeline.work_end.format("%H:%M")
    )];
    if rows.is_empty() {
        lines.push("(nothing scheduled)".to_string());
    }
    lines.extend(rows.into_iter().map(|(_, row)| row));
    lines
}

pub fn format_drop(preview: &DropPreview, applied: bool) -> Vec<String> {
    let verb = if applied { "scheduled" } else { "would land" };
    let mut lines = vec![format!(
        "{} {} {}-{}",
        verb,
        preview.start.date(),
        format_time(preview.start),
        format_time(preview.end)
    )];
    for id in &preview.conflicts {
        lines.push(format!("overlaps task {}", short_id(id)));
    }
    if preview.overlaps_break {
        lines.push("overlaps a break".to_string());
    }
    lines
}

pub fn format_evaluation(eval: &DayEvaluation) -> Vec<String> {
    let mut lines = vec![format!(
        "== {}: {}m work day, {}m planned ==",
        eval.day, eval.work_minutes, eval.planned_minutes
    )];
    for share in &eval.shares {
        lines.push(format!(
            "{} {:>5}m {:>5.1}%  {}",
            share.color, share.minutes, share.percentage, share.name
        ));
    }
    lines
}

fn idea_label(idea: &Idea) -> String {
    let mut label = format!("{}  {}", short_id(&idea.id), idea.name);
    if let Some(topic) = &idea.topic {
        label.push_str(&format!(" [{}]", topic));
    }
    if let Placement::Pinned { x, y } = idea.placement {
        label.push_str(&format!(" (pinned {}, {})", x, y));
    }
    label
}

/// Indented outline of the idea forest
pub fn format_idea_tree(roots: &[TreeNode<'_>]) -> Vec<String> {
    fn walk(node: &TreeNode<'_>, depth: usize, lines: &mut Vec<String>) {
        lines.push(format!("{}{}", "  ".repeat(depth), idea_label(node.idea)));
        for child in &node.children {
            walk(child, depth + 1, lines);
        }
    }
    let mut lines = Vec::new();
    for root in roots {
        walk(root, 0, &mut lines);
    }
    lines
}

pub fn format_layout(ideas: &[Idea], layout: &IndexMap<String, NodePosition>) -> Vec<String> {
    layout
        .iter()
        .map(|(id, pos)| {
            let name = ideas
                .iter()
                .find(|i| &i.id == id)
                .map_or("", |i| i.name.as_str());
            format!(
                "{}  x={:<7} y={:<7} {}",
                short_id(id),
                pos.x,
                pos.y,
                truncate_to_width(name, TITLE_COLUMN)
            )
        })
        .collect()
}
