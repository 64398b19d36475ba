use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TracefallError};

/// Rendering knobs for the terminal surface. The engine itself takes no
/// configuration; these only shape how its output is drawn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Width of the waterfall track in columns.
    pub track_width: usize,
    /// Width of the span-name column in columns.
    pub name_width: usize,
    /// Spaces of indentation per tree depth level.
    pub indent: usize,
    pub color: ColorMode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl FromStr for ColorMode {
    type Err = TracefallError;

    fn from_str(input: &str) -> Result<Self> {
        match input.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(TracefallError::Config(format!(
                "color must be auto, always or never, got {other}"
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            track_width: 60,
            name_width: 32,
            indent: 2,
            color: ColorMode::Auto,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    track_width: Option<usize>,
    name_width: Option<usize>,
    indent: Option<usize>,
    color: Option<String>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("TRACEFALL_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("tracefall/config.toml")
}

fn load_file_overrides(path: &PathBuf) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| TracefallError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| TracefallError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> Result<ConfigOverrides> {
    Ok(ConfigOverrides {
        track_width: parse_env_usize("TRACEFALL_TRACK_WIDTH")?,
        name_width: parse_env_usize("TRACEFALL_NAME_WIDTH")?,
        indent: parse_env_usize("TRACEFALL_INDENT")?,
        color: env::var("TRACEFALL_COLOR").ok(),
    })
}

fn parse_env_usize(key: &str) -> Result<Option<usize>> {
    match env::var(key) {
        Ok(v) => Ok(Some(v.parse::<usize>().map_err(|e| {
            TracefallError::Config(format!("bad {key} in environment: {e}"))
        })?)),
        Err(_) => Ok(None),
    }
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.track_width {
        if v < 10 {
            return Err(TracefallError::Config(format!(
                "track_width in {source} must be at least 10, got {v}"
            )));
        }
        cfg.track_width = v;
    }
    if let Some(v) = overrides.name_width {
        cfg.name_width = v.max(8);
    }
    if let Some(v) = overrides.indent {
        cfg.indent = v;
    }
    if let Some(v) = overrides.color {
        cfg.color = ColorMode::from_str(&v).map_err(|_| {
            TracefallError::Config(format!(
                "color in {source} must be auto, always or never, got {v}"
            ))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fits_a_terminal() {
        let cfg = Config::default();
        assert_eq!(cfg.track_width, 60);
        assert_eq!(cfg.color, ColorMode::Auto);
    }

    #[test]
    fn apply_file_overrides_updates_render_fields() {
        let mut cfg = Config::default();
        let file = ConfigOverrides {
            track_width: Some(80),
            name_width: Some(40),
            indent: Some(4),
            color: Some("never".to_string()),
        };

        apply_overrides(&mut cfg, file, "config file").unwrap();

        assert_eq!(cfg.track_width, 80);
        assert_eq!(cfg.name_width, 40);
        assert_eq!(cfg.indent, 4);
        assert_eq!(cfg.color, ColorMode::Never);
    }

    #[test]
    fn rejects_unusable_track_width() {
        let mut cfg = Config::default();
        let file = ConfigOverrides {
            track_width: Some(3),
            ..ConfigOverrides::default()
        };
        assert!(apply_overrides(&mut cfg, file, "config file").is_err());
    }

    #[test]
    fn rejects_unknown_color_mode() {
        let mut cfg = Config::default();
        let file = ConfigOverrides {
            color: Some("sometimes".to_string()),
            ..ConfigOverrides::default()
        };
        assert!(apply_overrides(&mut cfg, file, "config file").is_err());
    }
}
