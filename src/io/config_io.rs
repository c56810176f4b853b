use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::atomic_write;
use crate::model::config::Config;

pub const CONFIG_FILE: &str = "config.toml";

/// Keys accepted by `ct config get/set`
pub const KNOWN_KEYS: &[&str] = &[
    "planner.work_start",
    "planner.work_end",
    "planner.pixels_per_minute",
    "planner.workday_active",
    "layout.node_width",
    "layout.node_height",
    "layout.horizontal_gap",
    "layout.vertical_gap",
    "layout.margin_x",
    "layout.margin_y",
    "layout.root_gap",
    "tasks.default_type",
    "tasks.default_estimate",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config syntax: {0}")]
    Syntax(#[from] toml_edit::TomlError),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Read the config, returning both the parsed config and the raw toml_edit
/// document for edits that keep comments and layout. A missing file reads as
/// the defaults.
pub fn read_config(data_dir: &Path) -> Result<(Config, toml_edit::DocumentMut), ConfigError> {
    let text = read_text(data_dir)?;
    let config: Config = toml::from_str(&text)?;
    validate(&config)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Read only the editable document, so `set` can repair a rejected value
pub fn read_document(data_dir: &Path) -> Result<toml_edit::DocumentMut, ConfigError> {
    Ok(read_text(data_dir)?.parse()?)
}

fn read_text(data_dir: &Path) -> Result<String, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(ConfigError::Read { path, source }),
    }
}

/// Reject values the planner geometry cannot work with
fn validate(config: &Config) -> Result<(), ConfigError> {
    let ppm = config.planner.pixels_per_minute;
    if !(ppm.is_finite() && ppm > 0.0) {
        return Err(ConfigError::InvalidValue {
            key: "planner.pixels_per_minute".to_string(),
            message: format!("must be a positive number, got {}", ppm),
        });
    }
    let layout = &config.layout;
    let dimensions = [
        ("layout.node_width", layout.node_width),
        ("layout.node_height", layout.node_height),
        ("layout.horizontal_gap", layout.horizontal_gap),
        ("layout.vertical_gap", layout.vertical_gap),
        ("layout.margin_x", layout.margin_x),
        ("layout.margin_y", layout.margin_y),
        ("layout.root_gap", layout.root_gap),
    ];
    if let Some((key, value)) = dimensions.iter().find(|(_, v)| !(v.is_finite() && *v >= 0.0)) {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("must be a non-negative number, got {}", value),
        });
    }
    Ok(())
}

pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    atomic_write(&path, doc.to_string().as_bytes()).map_err(|source| ConfigError::Write { path, source })
}

fn split_key(key: &str) -> Result<(&str, &str), ConfigError> {
    if !KNOWN_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey(key.to_string()));
    }
    key.split_once('.')
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

/// Current value of a dotted key, from the effective (defaulted) config
pub fn get_value(config: &Config, key: &str) -> Result<String, ConfigError> {
    let (section, field) = split_key(key)?;
    let value = toml::Value::try_from(config).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    let found = value
        .get(section)
        .and_then(|s| s.get(field))
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    Ok(match found {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Interpret a command-line value: booleans, integers and floats keep their
/// type, anything else is a string.
fn parse_raw_value(raw: &str) -> toml_edit::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return b.into();
    }
    if let Ok(i) = raw.parse::<i64>() {
        return i.into();
    }
    if let Ok(f) = raw.parse::<f64>() {
        return f.into();
    }
    raw.into()
}

/// Set a dotted key in the document. The edited document must still parse
/// into a valid [`Config`]; otherwise the document is left unchanged.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, raw: &str) -> Result<Config, ConfigError> {
    let (section, field) = split_key(key)?;
    let mut edited = doc.clone();
    if !edited.contains_key(section) {
        edited[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let mut value = parse_raw_value(raw);
    // Float-typed fields accept whole numbers on the command line
    if (section == "layout" || field == "pixels_per_minute")
        && let Some(i) = value.as_integer()
    {
        value = (i as f64).into();
    }
    // Integer-typed fields must not become floats or strings silently
    if field == "default_estimate" && value.as_integer().is_none() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a whole number of minutes, got {:?}", raw),
        });
    }
    edited[section][field] = toml_edit::Item::Value(value);

    let config: Config = toml::from_str(&edited.to_string()).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.message().to_string(),
    })?;
    validate(&config)?;
    *doc = edited;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"# planner settings
[planner]
work_start = "09:00" # morning

[layout]
node_width = 200.0
"#;

    #[test]
    fn missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let (config, doc) = read_config(tmp.path()).unwrap();
        assert_eq!(config.layout.node_width, 250.0);
        assert!(doc.to_string().is_empty());
    }

    #[test]
    fn round_trip_preserves_comments() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), SAMPLE).unwrap();
        let (config, doc) = read_config(tmp.path()).unwrap();
        assert_eq!(config.layout.node_width, 200.0);
        assert_eq!(get_value(&config, "planner.work_start").unwrap(), "09:00");
        write_config(tmp.path(), &doc).unwrap();
        assert_eq!(fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap(), SAMPLE);
    }

    #[test]
    fn set_value_keeps_layout_and_validates() {
        let mut doc: toml_edit::DocumentMut = SAMPLE.parse().unwrap();
        let config = set_value(&mut doc, "planner.work_end", "17:30").unwrap();
        assert_eq!(get_value(&config, "planner.work_end").unwrap(), "17:30");
        let text = doc.to_string();
        assert!(text.contains("work_start = \"09:00\" # morning"));
        assert!(text.contains("work_end = \"17:30\""));

        let config = set_value(&mut doc, "layout.root_gap", "120").unwrap();
        assert_eq!(config.layout.root_gap, 120.0);
        let config = set_value(&mut doc, "planner.workday_active", "true").unwrap();
        assert!(config.planner.workday_active);
        let config = set_value(&mut doc, "tasks.default_type", "code").unwrap();
        assert_eq!(config.tasks.default_type, "code");
    }

    #[test]
    fn set_value_rejects_bad_input() {
        let mut doc: toml_edit::DocumentMut = SAMPLE.parse().unwrap();
        let before = doc.to_string();
        assert!(matches!(
            set_value(&mut doc, "planner.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            set_value(&mut doc, "planner.work_start", "nine"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            set_value(&mut doc, "tasks.default_estimate", "1.5"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(doc.to_string(), before);
    }

    #[test]
    fn set_value_rejects_unusable_scale() {
        let mut doc: toml_edit::DocumentMut = SAMPLE.parse().unwrap();
        let before = doc.to_string();
        for raw in ["-1", "0", "nan", "inf"] {
            let err = set_value(&mut doc, "planner.pixels_per_minute", raw).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { key, .. } if key == "planner.pixels_per_minute"),
                "{raw}: {err}"
            );
        }
        assert!(matches!(
            set_value(&mut doc, "layout.node_width", "-5"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(doc.to_string(), before);

        let config = set_value(&mut doc, "planner.pixels_per_minute", "1.5").unwrap();
        assert_eq!(config.planner.pixels_per_minute, 1.5);
    }

    #[test]
    fn hand_edited_bad_scale_fails_to_load() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[planner]\npixels_per_minute = -1.0\n").unwrap();
        let err = read_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "planner.pixels_per_minute"));
        assert!(err.to_string().contains("positive"));

        let mut doc = read_document(tmp.path()).unwrap();
        let config = set_value(&mut doc, "planner.pixels_per_minute", "2").unwrap();
        assert_eq!(config.planner.pixels_per_minute, 2.0);
        write_config(tmp.path(), &doc).unwrap();
        assert!(read_config(tmp.path()).is_ok());
    }

    #[test]
    fn get_value_reads_defaults() {
        let config = Config::default();
        assert_eq!(get_value(&config, "layout.vertical_gap").unwrap(), "150.0");
        assert_eq!(get_value(&config, "tasks.default_estimate").unwrap(), "30");
        assert!(get_value(&config, "bogus").is_err());
    }
}
