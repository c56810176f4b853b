use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub tasks: TaskDefaults,
}

/// Day planner grid settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_work_start", with = "hhmm")]
    pub work_start: NaiveTime,
    #[serde(default = "default_work_end", with = "hhmm")]
    pub work_end: NaiveTime,
    #[serde(default = "default_pixels_per_minute")]
    pub pixels_per_minute: f64,
    /// Whether the configured breaks are blocked out on the timeline
    #[serde(default)]
    pub workday_active: bool,
    #[serde(default = "default_breaks")]
    pub breaks: Vec<BreakConfig>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            work_start: default_work_start(),
            work_end: default_work_end(),
            pixels_per_minute: default_pixels_per_minute(),
            workday_active: false,
            breaks: default_breaks(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakConfig {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    pub minutes: u32,
}

/// Mind-map node geometry, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_node_width")]
    pub node_width: f64,
    #[serde(default = "default_node_height")]
    pub node_height: f64,
    /// Gap between adjacent sibling slices
    #[serde(default = "default_horizontal_gap")]
    pub horizontal_gap: f64,
    /// Gap between a parent's bottom edge and its children's top edge
    #[serde(default = "default_vertical_gap")]
    pub vertical_gap: f64,
    #[serde(default = "default_margin")]
    pub margin_x: f64,
    #[serde(default = "default_margin")]
    pub margin_y: f64,
    /// Gap between adjacent root subtrees
    #[serde(default = "default_root_gap")]
    pub root_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            node_width: default_node_width(),
            node_height: default_node_height(),
            horizontal_gap: default_horizontal_gap(),
            vertical_gap: default_vertical_gap(),
            margin_x: default_margin(),
            margin_y: default_margin(),
            root_gap: default_root_gap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefaults {
    #[serde(default = "default_type")]
    pub default_type: String,
    #[serde(default = "default_estimate")]
    pub default_estimate: u32,
}

impl Default for TaskDefaults {
    fn default() -> Self {
        TaskDefaults {
            default_type: default_type(),
            default_estimate: default_estimate(),
        }
    }
}

// Defaults: see the template written by `ct init`

fn default_work_start() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_work_end() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_pixels_per_minute() -> f64 {
    1.0
}

fn default_breaks() -> Vec<BreakConfig> {
    [(10, 0, 30), (11, 30, 60), (14, 30, 30)]
        .into_iter()
        .filter_map(|(h, m, minutes)| {
            NaiveTime::from_hms_opt(h, m, 0).map(|start| BreakConfig { start, minutes })
        })
        .collect()
}

fn default_node_width() -> f64 {
    250.0
}

fn default_node_height() -> f64 {
    120.0
}

fn default_horizontal_gap() -> f64 {
    50.0
}

fn default_vertical_gap() -> f64 {
    150.0
}

fn default_margin() -> f64 {
    50.0
}

fn default_root_gap() -> f64 {
    100.0
}

fn default_type() -> String {
    crate::model::task::DEFAULT_TASK_TYPE.to_string()
}

fn default_estimate() -> u32 {
    crate::model::task::DEFAULT_ESTIMATE_MINUTES
}

/// `HH:MM` wall-clock times in config files
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(raw.trim(), FORMAT)
    }
}
