//! Day planner geometry.
//!
//! Maps vertical pixel offsets in a single-day column to wall-clock times and
//! back, and tests scheduled tasks for interval overlap. Everything here is a
//! pure function of its arguments: no clock reads, no storage.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::model::config::PlannerConfig;
use crate::model::task::Task;

/// Scheduling granularity, in minutes
pub const SNAP_MINUTES: u32 = 15;

// ---------------------------------------------------------------------------
// Time <-> pixel mapping
// ---------------------------------------------------------------------------

/// Convert a pixel offset within the day column into a start time on `day`.
///
/// The offset is turned into whole minutes after `work_start`, then snapped
/// to the nearest quarter hour. `y` is expected to be clamped by the caller
/// to the column height; out-of-range offsets produce out-of-range times.
pub fn time_from_position(
    y: f64,
    day: NaiveDate,
    pixels_per_minute: f64,
    work_start: NaiveTime,
) -> NaiveDateTime {
    let minutes_from_start = (y / pixels_per_minute).round() as i64;
    let hours = minutes_from_start.div_euclid(60);
    let minutes = minutes_from_start.rem_euclid(60);
    let raw = day.and_time(work_start) + Duration::hours(hours) + Duration::minutes(minutes);
    snap_to_quarter_hour(raw)
}

/// Pixel offset of `time` within the column (inverse of [`time_from_position`]
/// for times on the quarter-hour grid). Times before `work_start` map to 0.
pub fn position_from_time(time: NaiveDateTime, work_start: NaiveTime, pixels_per_minute: f64) -> f64 {
    offset_minutes_in_day(time, work_start) as f64 * pixels_per_minute
}

/// Minutes from `work_start` to `time` on the same day, floored at 0
pub fn offset_minutes_in_day(time: NaiveDateTime, work_start: NaiveTime) -> i64 {
    let at = i64::from(time.hour()) * 60 + i64::from(time.minute());
    let start = i64::from(work_start.hour()) * 60 + i64::from(work_start.minute());
    (at - start).max(0)
}

/// Height of a block lasting `minutes`
pub fn duration_height(minutes: u32, pixels_per_minute: f64) -> f64 {
    f64::from(minutes) * pixels_per_minute
}

/// Round to the nearest multiple of 15 minutes and clear seconds.
/// Rounding up from :53 or later rolls into the next hour.
pub fn snap_to_quarter_hour(time: NaiveDateTime) -> NaiveDateTime {
    let minute = time.minute();
    let snapped = (f64::from(minute) / f64::from(SNAP_MINUTES)).round() as i64 * i64::from(SNAP_MINUTES);
    let hour_start = time
        - Duration::minutes(i64::from(minute))
        - Duration::seconds(i64::from(time.second()))
        - Duration::nanoseconds(i64::from(time.nanosecond()));
    hour_start + Duration::minutes(snapped)
}

// ---------------------------------------------------------------------------
// Intervals
// ---------------------------------------------------------------------------

/// Whether two half-open ranges `[start, end)` intersect
pub fn time_ranges_overlap(
    start1: NaiveDateTime,
    end1: NaiveDateTime,
    start2: NaiveDateTime,
    end2: NaiveDateTime,
) -> bool {
    start1 < end2 && start2 < end1
}

/// Whether `[start_a, start_a + duration_a)` and `[start_b, start_b + duration_b)`
/// intersect. Durations are in minutes.
pub fn tasks_overlap(
    start_a: NaiveDateTime,
    duration_a: u32,
    start_b: NaiveDateTime,
    duration_b: u32,
) -> bool {
    time_ranges_overlap(
        start_a,
        add_minutes(start_a, i64::from(duration_a)),
        start_b,
        add_minutes(start_b, i64::from(duration_b)),
    )
}

pub fn add_minutes(time: NaiveDateTime, minutes: i64) -> NaiveDateTime {
    time + Duration::minutes(minutes)
}

/// Minutes from `from` to `to`, rounded to the nearest minute
pub fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    let millis = (to - from).num_milliseconds();
    (millis as f64 / 60_000.0).round() as i64
}

pub fn is_same_day(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.date() == b.date()
}

/// `HH:MM`, 24-hour clock
pub fn format_time(time: NaiveDateTime) -> String {
    time.format("%H:%M").to_string()
}

// ---------------------------------------------------------------------------
// Planner column
// ---------------------------------------------------------------------------

/// A fixed interval on the planner (break, scheduled task)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Block {
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Result of hovering or dropping a task at an offset
#[derive(Debug, Clone, PartialEq)]
pub struct DropPreview {
    /// Snapped start time
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Ids of other scheduled tasks the dropped task would overlap
    pub conflicts: Vec<String>,
    /// Whether the slot runs into a break block
    pub overlaps_break: bool,
}

impl DropPreview {
    pub fn has_overlap(&self) -> bool {
        !self.conflicts.is_empty() || self.overlaps_break
    }
}

/// One day column of the planner, built from `[planner]` config
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub pixels_per_minute: f64,
    pub workday_active: bool,
    /// `(start, minutes)` of each break
    pub breaks: Vec<(NaiveTime, u32)>,
}

impl Timeline {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Timeline {
            work_start: config.work_start,
            work_end: config.work_end,
            pixels_per_minute: config.pixels_per_minute,
            workday_active: config.workday_active,
            breaks: config.breaks.iter().map(|b| (b.start, b.minutes)).collect(),
        }
    }

    /// Length of the working day in minutes (0 if the end precedes the start)
    pub fn work_minutes(&self) -> i64 {
        (self.work_end - self.work_start).num_minutes().max(0)
    }

    pub fn column_height(&self) -> f64 {
        self.work_minutes() as f64 * self.pixels_per_minute
    }

    /// Clamp a pointer offset into the column
    pub fn clamp_offset(&self, y: f64) -> f64 {
        y.clamp(0.0, self.column_height().max(0.0))
    }

    /// Snapped time under a (clamped) pointer offset
    pub fn time_at(&self, y: f64, day: NaiveDate) -> NaiveDateTime {
        time_from_position(self.clamp_offset(y), day, self.pixels_per_minute, self.work_start)
    }

    /// Pixel offset of a time within this column
    pub fn offset_of(&self, time: NaiveDateTime) -> f64 {
        position_from_time(time, self.work_start, self.pixels_per_minute)
    }

    /// Break intervals on `day`; empty unless the workday is active
    pub fn break_blocks(&self, day: NaiveDate) -> Vec<Block> {
        if !self.workday_active {
            return Vec::new();
        }
        self.breaks
            .iter()
            .map(|&(start, minutes)| {
                let start = day.and_time(start);
                Block {
                    start,
                    end: add_minutes(start, i64::from(minutes)),
                }
            })
            .collect()
    }

    /// Where `task` would land if dropped at offset `y` on `day`, and what it
    /// would collide with. The task itself is never reported as a conflict.
    pub fn preview_drop(&self, y: f64, day: NaiveDate, task: &Task, tasks: &[Task]) -> DropPreview {
        self.preview_at(self.time_at(y, day), task, tasks)
    }

    /// Like [`Timeline::preview_drop`] for a wall-clock start, which is
    /// snapped but not clamped to the working day.
    pub fn preview_at(&self, start: NaiveDateTime, task: &Task, tasks: &[Task]) -> DropPreview {
        let start = snap_to_quarter_hour(start);
        let day = start.date();
        let end = add_minutes(start, i64::from(task.estimate_minutes));

        let conflicts = tasks
            .iter()
            .filter(|other| other.id != task.id)
            .filter_map(|other| {
                let other_start = other.scheduled_start?;
                tasks_overlap(start, task.estimate_minutes, other_start, other.estimate_minutes)
                    .then(|| other.id.clone())
            })
            .collect();

        let overlaps_break = self
            .break_blocks(day)
            .iter()
            .any(|b| time_ranges_overlap(start, end, b.start, b.end));

        DropPreview {
            start,
            end,
            conflicts,
            overlaps_break,
        }
    }
}

/// Tasks scheduled on `day`, ordered by start time
pub fn scheduled_on(tasks: &[Task], day: NaiveDate) -> Vec<&Task> {
    let mut on_day: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.scheduled_start.is_some_and(|s| s.date() == day))
        .collect();
    on_day.sort_by_key(|t| t.scheduled_start);
    on_day
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn eight() -> NaiveTime {
        NaiveTime::from_hms_opt(8, 0, 0).unwrap()
    }

    fn task(id: &str, start: Option<NaiveDateTime>, minutes: u32) -> Task {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Task {
            id: id.into(),
            title: id.into(),
            description: None,
            completed: false,
            due_date: None,
            task_type: "work".into(),
            tags: Vec::new(),
            estimate_minutes: minutes,
            scheduled_start: start,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn position_zero_is_work_start() {
        assert_eq!(time_from_position(0.0, day(), 1.0, eight()), at(8, 0));
    }

    #[test]
    fn position_rounds_to_nearest_quarter() {
        // 67 minutes -> 9:07 -> 9:00
        assert_eq!(time_from_position(67.0, day(), 1.0, eight()), at(9, 0));
        // 68 minutes -> 9:08 -> 9:15
        assert_eq!(time_from_position(68.0, day(), 1.0, eight()), at(9, 15));
        // 2 px per minute: 150 px = 75 minutes -> 9:15
        assert_eq!(time_from_position(150.0, day(), 2.0, eight()), at(9, 15));
    }

    #[test]
    fn position_snap_rolls_into_next_hour() {
        // 53 minutes -> 8:53 -> 9:00
        assert_eq!(time_from_position(53.0, day(), 1.0, eight()), at(9, 0));
    }

    #[test]
    fn position_is_monotonic_and_on_grid() {
        let mut last = time_from_position(0.0, day(), 1.5, eight());
        let mut y = 0.0;
        while y <= 900.0 {
            let t = time_from_position(y, day(), 1.5, eight());
            assert!(t >= last, "non-monotonic at y={}", y);
            assert_eq!(t.minute() % 15, 0);
            assert_eq!(t.second(), 0);
            assert_eq!(t.nanosecond(), 0);
            last = t;
            y += 0.75;
        }
    }

    #[test]
    fn half_hour_work_start() {
        let start = NaiveTime::from_hms_opt(8, 30, 0).unwrap();
        assert_eq!(time_from_position(0.0, day(), 1.0, start), at(8, 30));
        assert_eq!(time_from_position(45.0, day(), 1.0, start), at(9, 15));
    }

    #[test]
    fn snap_clears_seconds() {
        let t = day().and_hms_milli_opt(10, 22, 59, 500).unwrap();
        assert_eq!(snap_to_quarter_hour(t), at(10, 15));
        let t = day().and_hms_opt(10, 23, 0).unwrap();
        assert_eq!(snap_to_quarter_hour(t), at(10, 30));
    }

    #[test]
    fn overlap_reflexive() {
        assert!(tasks_overlap(at(9, 0), 30, at(9, 0), 30));
        assert!(tasks_overlap(at(9, 0), 1, at(9, 0), 1));
    }

    #[test]
    fn overlap_symmetric() {
        let cases = [
            (at(9, 0), 30, at(9, 15), 30),
            (at(9, 0), 30, at(9, 30), 30),
            (at(9, 0), 120, at(9, 30), 15),
            (at(13, 0), 15, at(9, 30), 15),
        ];
        for (a, da, b, db) in cases {
            assert_eq!(tasks_overlap(a, da, b, db), tasks_overlap(b, db, a, da));
        }
    }

    #[test]
    fn back_to_back_do_not_overlap() {
        let t = at(9, 0);
        assert!(!tasks_overlap(t, 30, add_minutes(t, 30), 30));
        assert!(!tasks_overlap(add_minutes(t, 30), 30, t, 30));
        assert!(tasks_overlap(t, 31, add_minutes(t, 30), 30));
    }

    #[test]
    fn containment_overlaps() {
        assert!(tasks_overlap(at(9, 0), 120, at(9, 30), 15));
    }

    #[test]
    fn position_from_time_inverts_grid_times() {
        for y in [0.0, 15.0, 90.0, 585.0] {
            let t = time_from_position(y, day(), 1.0, eight());
            assert_eq!(position_from_time(t, eight(), 1.0), y);
        }
        assert_eq!(position_from_time(at(7, 0), eight(), 1.0), 0.0);
    }

    #[test]
    fn minutes_between_rounds() {
        let a = at(9, 0);
        let b = day().and_hms_opt(9, 10, 31).unwrap();
        assert_eq!(minutes_between(a, b), 11);
        assert_eq!(minutes_between(b, a), -11);
    }

    #[test]
    fn format_time_is_24h() {
        assert_eq!(format_time(at(14, 5)), "14:05");
        assert!(is_same_day(at(0, 0), at(23, 45)));
    }

    #[test]
    fn timeline_clamps_pointer() {
        let timeline = Timeline::from_config(&PlannerConfig::default());
        assert_eq!(timeline.column_height(), 600.0);
        assert_eq!(timeline.time_at(-40.0, day()), at(8, 0));
        assert_eq!(timeline.time_at(10_000.0, day()), at(18, 0));
        assert_eq!(timeline.offset_of(at(10, 30)), 150.0);
    }

    #[test]
    fn degenerate_scale_pins_pointer_to_work_start() {
        for ppm in [-1.0, f64::NAN] {
            let timeline = Timeline {
                pixels_per_minute: ppm,
                ..Timeline::from_config(&PlannerConfig::default())
            };
            assert_eq!(timeline.clamp_offset(120.0), 0.0);
            assert_eq!(timeline.time_at(120.0, day()), at(8, 0));
        }
    }

    #[test]
    fn preview_reports_conflicts_but_not_self() {
        let timeline = Timeline::from_config(&PlannerConfig::default());
        let dragged = task("a", Some(at(9, 0)), 60);
        let tasks = vec![
            dragged.clone(),
            task("b", Some(at(9, 30)), 30),
            task("c", Some(at(10, 0)), 30),
            task("d", None, 30),
        ];
        // Drop at 9:00 (60 px)
        let preview = timeline.preview_drop(60.0, day(), &dragged, &tasks);
        assert_eq!(preview.start, at(9, 0));
        assert_eq!(preview.end, at(10, 0));
        assert_eq!(preview.conflicts, vec!["b".to_string()]);
        assert!(!preview.overlaps_break);
        assert!(preview.has_overlap());
    }

    #[test]
    fn preview_sees_breaks_only_when_active() {
        let mut config = PlannerConfig::default();
        let dragged = task("a", None, 30);
        // 10:15 overlaps the 10:00-10:30 break
        let timeline = Timeline::from_config(&config);
        assert!(!timeline.preview_drop(135.0, day(), &dragged, &[]).overlaps_break);
        config.workday_active = true;
        let timeline = Timeline::from_config(&config);
        let preview = timeline.preview_drop(135.0, day(), &dragged, &[]);
        assert!(preview.overlaps_break);
        assert!(preview.conflicts.is_empty());
        assert_eq!(timeline.break_blocks(day()).len(), 3);
    }

    #[test]
    fn preview_at_snaps_without_clamping() {
        let timeline = Timeline::from_config(&PlannerConfig::default());
        let dragged = task("a", None, 30);
        let evening = task("b", Some(at(19, 0)), 60);
        let preview = timeline.preview_at(at(19, 22), &dragged, &[evening]);
        assert_eq!(preview.start, at(19, 15));
        assert_eq!(preview.end, at(19, 45));
        assert_eq!(preview.conflicts, vec!["b".to_string()]);
    }

    #[test]
    fn scheduled_on_filters_and_sorts() {
        let other_day = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        let tasks = vec![
            task("late", Some(at(15, 0)), 30),
            task("early", Some(at(8, 15)), 30),
            task("tomorrow", Some(other_day.and_hms_opt(9, 0, 0).unwrap()), 30),
            task("backlog", None, 30),
        ];
        let ids: Vec<&str> = scheduled_on(&tasks, day()).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }
}
