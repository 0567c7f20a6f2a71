//! Harness configuration.
//!
//! Values come from an optional YAML file and are then overridden by
//! command-line flags. Every key is optional:
//!
//! ```yaml
//! color: auto        # auto | always | never
//! verbosity: normal  # quiet | normal | verbose
//! format: text       # text | json
//! pattern: "^APITest\\."
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;
use termcolor::ColorChoice;

use crate::diagnostics::{HarnessError, HarnessResult};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "verdict.yaml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Only non-passing units and the summary.
    Quiet,
    #[default]
    Normal,
    /// Every unit, with its duration.
    Verbose,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub color: ColorMode,
    pub verbosity: Verbosity,
    pub format: OutputFormat,
    pub pattern: Option<String>,
}

impl HarnessConfig {
    /// Loads a config file. A missing or malformed file is an error.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| HarnessError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content, path)
    }

    /// Parses YAML content; `origin` is only used for diagnostics.
    pub fn from_yaml(content: &str, origin: &Path) -> HarnessResult<Self> {
        // An empty file deserializes as null rather than an empty mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|source| HarnessError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` if given, else [`DEFAULT_CONFIG_FILE`] if it exists,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>) -> HarnessResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            tracing::debug!(path = %default_path.display(), "loading default config file");
            return Self::load(&default_path);
        }
        Ok(Self::default())
    }

    pub fn use_colors(&self) -> bool {
        match self.color {
            ColorMode::Auto => atty::is(atty::Stream::Stdout),
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }

    pub fn color_choice(&self) -> ColorChoice {
        if self.use_colors() {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_every_key() {
        let yaml = "color: never\nverbosity: verbose\nformat: json\npattern: '^APITest'\n";
        let config = HarnessConfig::from_yaml(yaml, Path::new("verdict.yaml")).unwrap();
        assert_eq!(
            config,
            HarnessConfig {
                color: ColorMode::Never,
                verbosity: Verbosity::Verbose,
                format: OutputFormat::Json,
                pattern: Some("^APITest".to_string()),
            }
        );
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = HarnessConfig::from_yaml("format: json\n", Path::new("x.yaml")).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.verbosity, Verbosity::Normal);
        assert_eq!(config.pattern, None);

        let empty = HarnessConfig::from_yaml("\n", Path::new("x.yaml")).unwrap();
        assert_eq!(empty, HarnessConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = HarnessConfig::from_yaml("colour: never\n", Path::new("x.yaml")).unwrap_err();
        assert!(matches!(err, HarnessError::ConfigParse { .. }));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = HarnessConfig::discover(Some(Path::new("/nonexistent/verdict.yaml"))).unwrap_err();
        assert!(matches!(err, HarnessError::ConfigIo { .. }));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "verbosity: quiet").unwrap();
        let config = HarnessConfig::load(file.path()).unwrap();
        assert_eq!(config.verbosity, Verbosity::Quiet);
    }

    #[test]
    fn never_disables_colors() {
        let config = HarnessConfig {
            color: ColorMode::Never,
            ..HarnessConfig::default()
        };
        assert!(!config.use_colors());
        assert_eq!(config.color_choice(), ColorChoice::Never);
    }
}
