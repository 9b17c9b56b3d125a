//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use postats::ingest::InputFormat;
use postats::report::Orientation;
use std::path::PathBuf;

/// Postats - per-channel social post statistics as a PNG table
///
/// Reads a CSV or JSON export of posts, computes impressions, engagements,
/// link clicks and rates per channel, and renders them as a styled table image.
///
/// Examples:
///   postats --input posts.csv
///   postats --input posts.json --output stats.png --dpi 150
///   postats --input posts.csv --summary stats.md --summary-format markdown
///   postats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Post table to analyze (CSV or JSON array of records)
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Input format; inferred from the file extension when omitted
    #[arg(long, value_name = "FORMAT")]
    pub input_format: Option<InputFormat>,

    /// Output PNG path
    ///
    /// Defaults to the config file value, or overall_stats.png.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write the statistics to this file
    #[arg(short, long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Format of the --summary file (json, markdown)
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub summary_format: SummaryFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .postats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Image resolution in dots per inch
    #[arg(long, value_name = "DPI", env = "POSTATS_DPI")]
    pub dpi: Option<f32>,

    /// Table font size in points
    #[arg(long, value_name = "PT")]
    pub font_size: Option<f32>,

    /// Table layout (metrics-by-row, channels-by-row)
    #[arg(long, value_name = "LAYOUT")]
    pub orientation: Option<Orientation>,

    /// Additional font directory (repeatable)
    #[arg(long, value_name = "DIR")]
    pub font_dir: Vec<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .postats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the statistics summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SummaryFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// Markdown table
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.input {
            Some(ref input) if !input.is_file() => {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            None => return Err("An --input file is required".to_string()),
            _ => {}
        }

        if let Some(dpi) = self.dpi {
            if !(dpi.is_finite() && (1.0..=1200.0).contains(&dpi)) {
                return Err("DPI must be between 1 and 1200".to_string());
            }
        }

        if let Some(font_size) = self.font_size {
            if !(font_size.is_finite() && font_size > 0.0) {
                return Err("Font size must be positive".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Input format, explicit or inferred from the input path.
    pub fn effective_input_format(&self) -> InputFormat {
        match (self.input_format, &self.input) {
            (Some(format), _) => format,
            (None, Some(path)) => InputFormat::from_path(path),
            (None, None) => InputFormat::Csv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(input: PathBuf) -> Args {
        Args {
            input: Some(input),
            input_format: None,
            output: None,
            summary: None,
            summary_format: SummaryFormat::Json,
            config: None,
            dpi: None,
            font_size: None,
            orientation: None,
            font_dir: Vec::new(),
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    fn existing_input() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.csv");
        std::fs::write(&path, "Channel\n").unwrap();
        (dir, path)
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "postats",
            "--input",
            "posts.json",
            "--dpi",
            "150",
            "--orientation",
            "channels-by-row",
            "--summary-format",
            "markdown",
        ])
        .unwrap();

        assert_eq!(args.dpi, Some(150.0));
        assert_eq!(args.orientation, Some(Orientation::ChannelsByRow));
        assert_eq!(args.summary_format, SummaryFormat::Markdown);
        assert_eq!(args.effective_input_format(), InputFormat::Json);
    }

    #[test]
    fn test_input_required_unless_init_config() {
        assert!(Args::try_parse_from(["postats"]).is_err());
        assert!(Args::try_parse_from(["postats", "--init-config"]).is_ok());
    }

    #[test]
    fn test_validation_missing_input_file() {
        let args = make_args(PathBuf::from("/definitely/not/here.csv"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_dpi_range() {
        let (_dir, path) = existing_input();
        let mut args = make_args(path);
        assert!(args.validate().is_ok());

        args.dpi = Some(0.0);
        assert!(args.validate().is_err());
        args.dpi = Some(f32::NAN);
        assert!(args.validate().is_err());
        args.dpi = Some(300.0);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let (_dir, path) = existing_input();
        let mut args = make_args(path);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let (_dir, path) = existing_input();
        let mut args = make_args(path);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_explicit_input_format_wins() {
        let mut args = make_args(PathBuf::from("posts.json"));
        args.input_format = Some(InputFormat::Csv);
        assert_eq!(args.effective_input_format(), InputFormat::Csv);
    }
}
