//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.postats.toml` files.

use anyhow::{bail, Context, Result};
use postats::report::TableStyle;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".postats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Table rendering style.
    #[serde(default)]
    pub render: TableStyle,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output image path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "overall_stats.png".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.postats.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the user actually passed override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(dpi) = args.dpi {
            self.render.dpi = dpi;
        }
        if let Some(font_size) = args.font_size {
            self.render.font_size = font_size;
        }
        if let Some(orientation) = args.orientation {
            self.render.orientation = orientation;
        }
        if !args.font_dir.is_empty() {
            self.render.font_dirs.extend(args.font_dir.iter().cloned());
        }
    }

    /// Check the merged settings before rendering.
    ///
    /// Applies the same ranges as the command-line flags, so a config file
    /// cannot slip in a DPI or font size the flags would reject.
    pub fn validate(&self) -> Result<()> {
        let dpi = self.render.dpi;
        if !(dpi.is_finite() && (1.0..=1200.0).contains(&dpi)) {
            bail!("[render] dpi must be between 1 and 1200, got {}", dpi);
        }

        let font_size = self.render.font_size;
        if !(font_size.is_finite() && font_size > 0.0) {
            bail!("[render] font_size must be positive, got {}", font_size);
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
