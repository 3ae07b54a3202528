//! Tool configuration
//!
//! Every setting has a built-in default matching the layout the map
//! pipeline has always used (`states/` in, `states2/` out). A TOML file can
//! override any subset of them, one table per tool:
//!
//! ```toml
//! [recolor]
//! dir = "maps/states"
//! stroke = "#cccccc"
//!
//! [filter]
//! on_unknown_slug = "skip"
//! ```

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

use crate::svg::ParseMode;

/// Errors that can occur when loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What to do with a file whose name is not a state slug
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnknownSlugPolicy {
    /// Stop the batch with an error
    #[default]
    Abort,
    /// Log a warning and move on to the next file
    Skip,
}

/// Configuration for all tools
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub strip: StripConfig,
    pub tag: TagConfig,
    pub recolor: RecolorConfig,
    pub filter: FilterConfig,
    pub interactive: InteractiveConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StripConfig {
    /// Directory rewritten in place
    pub dir: PathBuf,
    /// `id` of the `<text>` element to remove
    pub marker_id: String,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("states"),
            marker_id: "credit-text-svg".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagConfig {
    /// Attribute receiving the resolved state name
    pub attribute: String,
    pub parse_mode: ParseMode,
    /// Ids listed per failure class in the summary before eliding the rest
    pub report_limit: usize,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            attribute: "data-state".to_string(),
            parse_mode: ParseMode::Lenient,
            report_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecolorConfig {
    /// Directory rewritten in place
    pub dir: PathBuf,
    pub stroke: String,
    pub stroke_width: String,
    pub parse_mode: ParseMode,
}

impl Default for RecolorConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("states"),
            stroke: "rgb(209, 219, 221)".to_string(),
            stroke_width: "0.3".to_string(),
            parse_mode: ParseMode::Strict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub parse_mode: ParseMode,
    pub on_unknown_slug: UnknownSlugPolicy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("states"),
            output_dir: PathBuf::from("states2"),
            parse_mode: ParseMode::Strict,
            on_unknown_slug: UnknownSlugPolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractiveConfig {
    /// Directory rewritten in place
    pub dir: PathBuf,
    pub parse_mode: ParseMode,
    pub on_unknown_slug: UnknownSlugPolicy,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("states"),
            parse_mode: ParseMode::Strict,
            on_unknown_slug: UnknownSlugPolicy::Abort,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strip.marker_id.is_empty() {
            return Err(invalid("strip.marker_id must not be empty"));
        }
        if !is_attribute_name(&self.tag.attribute) {
            return Err(invalid(format!(
                "tag.attribute '{}' is not a valid attribute name",
                self.tag.attribute
            )));
        }
        if self.recolor.stroke.trim().is_empty() {
            return Err(invalid("recolor.stroke must not be empty"));
        }
        match self.recolor.stroke_width.trim().parse::<f64>() {
            Ok(width) if width.is_finite() && width >= 0.0 => {}
            _ => {
                return Err(invalid(format!(
                    "recolor.stroke_width '{}' is not a non-negative number",
                    self.recolor.stroke_width
                )))
            }
        }
        if self.filter.input_dir == self.filter.output_dir {
            return Err(invalid("filter.output_dir must differ from filter.input_dir"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

/// Accepts XML names such as `data-state` or `inkscape:label`
pub(crate) fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.strip.dir, PathBuf::from("states"));
        assert_eq!(config.strip.marker_id, "credit-text-svg");
        assert_eq!(config.tag.attribute, "data-state");
        assert_eq!(config.tag.parse_mode, ParseMode::Lenient);
        assert_eq!(config.recolor.stroke, "rgb(209, 219, 221)");
        assert_eq!(config.recolor.stroke_width, "0.3");
        assert_eq!(config.filter.output_dir, PathBuf::from("states2"));
        assert_eq!(config.filter.on_unknown_slug, UnknownSlugPolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_str("").expect("Should parse");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_override() {
        let toml_str = r##"
[recolor]
stroke = "#cccccc"

[filter]
output_dir = "out"
on_unknown_slug = "skip"
parse_mode = "lenient"
"##;
        let config = Config::from_str(toml_str).expect("Should parse");
        assert_eq!(config.recolor.stroke, "#cccccc");
        assert_eq!(config.recolor.stroke_width, "0.3");
        assert_eq!(config.filter.input_dir, PathBuf::from("states"));
        assert_eq!(config.filter.output_dir, PathBuf::from("out"));
        assert_eq!(config.filter.on_unknown_slug, UnknownSlugPolicy::Skip);
        assert_eq!(config.filter.parse_mode, ParseMode::Lenient);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = Config::from_str("[strip]\ndirectory = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_stroke_width() {
        let result = Config::from_str("[recolor]\nstroke_width = \"thin\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_filter_dirs_must_differ() {
        let result = Config::from_str("[filter]\noutput_dir = \"states\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_attribute_names() {
        assert!(is_attribute_name("data-state"));
        assert!(is_attribute_name("inkscape:label"));
        assert!(!is_attribute_name(""));
        assert!(!is_attribute_name("1st"));
        assert!(!is_attribute_name("data state"));
    }

    #[test]
    fn test_invalid_toml_error() {
        let invalid = "this is not valid toml {{{{";
        assert!(Config::from_str(invalid).is_err());
    }
}
