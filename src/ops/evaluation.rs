//! Time evaluation of a planner day: where the working minutes go.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::task::Task;
use crate::model::task_type::{FALLBACK_TYPE_COLOR, TaskType};
use crate::ops::task_type_ops::find_by_name;
use crate::ops::timeline::Timeline;

pub const BREAK_COLOR: &str = "#FEF3C7";
pub const FREE_COLOR: &str = "#E5E7EB";
pub const UNSCHEDULED_COLOR: &str = "#9CA3AF";

/// One slice of the day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeShare {
    pub name: String,
    pub color: String,
    pub minutes: i64,
    /// Share of the working day, 0..=100 (may exceed 100 when overbooked)
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEvaluation {
    pub day: NaiveDate,
    pub work_minutes: i64,
    pub planned_minutes: i64,
    pub break_minutes: i64,
    pub free_minutes: i64,
    pub unscheduled_minutes: i64,
    /// Sorted by minutes, largest first
    pub shares: Vec<TimeShare>,
}

/// Evaluate `day`: tasks scheduled on it count as planned (grouped by task
/// type), open tasks without a slot count as unscheduled.
pub fn evaluate_day(day: NaiveDate, tasks: &[Task], types: &[TaskType], timeline: &Timeline) -> DayEvaluation {
    let work_minutes = timeline.work_minutes();

    let mut planned_by_type: IndexMap<&str, i64> = IndexMap::new();
    let mut planned_minutes = 0;
    let mut unscheduled_minutes = 0;
    for task in tasks {
        let minutes = i64::from(task.estimate_minutes);
        match task.scheduled_start {
            Some(start) if start.date() == day => {
                *planned_by_type.entry(task.task_type.as_str()).or_default() += minutes;
                planned_minutes += minutes;
            }
            Some(_) => {}
            None if !task.completed => unscheduled_minutes += minutes,
            None => {}
        }
    }

    let break_minutes: i64 = timeline.break_blocks(day).iter().map(|b| b.minutes()).sum();
    let free_minutes = (work_minutes - planned_minutes - break_minutes).max(0);

    let share = |name: &str, color: &str, minutes: i64| TimeShare {
        name: name.to_string(),
        color: color.to_string(),
        minutes,
        percentage: if work_minutes > 0 {
            minutes as f64 / work_minutes as f64 * 100.0
        } else {
            0.0
        },
    };

    let mut shares: Vec<TimeShare> = planned_by_type
        .iter()
        .map(|(&name, &minutes)| {
            let color = find_by_name(types, name).map_or(FALLBACK_TYPE_COLOR, |t| t.color.as_str());
            share(name, color, minutes)
        })
        .collect();
    if break_minutes > 0 {
        shares.push(share("break", BREAK_COLOR, break_minutes));
    }
    if free_minutes > 0 {
        shares.push(share("free", FREE_COLOR, free_minutes));
    }
    if unscheduled_minutes > 0 {
        shares.push(share("unscheduled", UNSCHEDULED_COLOR, unscheduled_minutes));
    }
    // Stable sort keeps insertion order between equal slices
    shares.sort_by(|a, b| b.minutes.cmp(&a.minutes));

    DayEvaluation {
        day,
        work_minutes,
        planned_minutes,
        break_minutes,
        free_minutes,
        unscheduled_minutes,
        shares,
    }
}
