use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::{TrendConfig, MAX_WEEKLY_WINDOW};
use crate::time_utils::DEFAULT_TIMESTAMP_FORMAT;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Smoothed daily, weekly and monthly blood-glucose trends from a health export
#[derive(Parser, Debug, Clone)]
#[command(
    name = "glucose-trends",
    about = "Smoothed daily, weekly and monthly blood-glucose trends from a health export",
    version
)]
pub struct Settings {
    /// CSV export to analyse (defaults to the last file used)
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Export schema
    #[arg(long, default_value = "auto", value_parser = ["libre", "health", "auto"])]
    pub schema: String,

    /// strftime layout of the export's timestamp column
    #[arg(long, default_value = DEFAULT_TIMESTAMP_FORMAT)]
    pub timestamp_format: String,

    /// Timezone used for timestamps that carry an offset (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Trailing window of the weekly moving average, in days
    #[arg(long, default_value = "7", value_parser = clap::value_parser!(u32).range(1..=MAX_WEEKLY_WINDOW as i64))]
    pub weekly_window: u32,

    /// Days with data required inside the weekly window (7 = full windows only)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=MAX_WEEKLY_WINDOW as i64))]
    pub weekly_min_periods: u32,

    /// IQR multiplier of the outlier fences
    #[arg(long, default_value = "1.5")]
    pub iqr_multiplier: f64,

    /// Samples drawn from each smooth curve
    #[arg(long, default_value = "500", value_parser = clap::value_parser!(u32).range(2..=100_000))]
    pub samples: u32,

    /// Output format
    #[arg(long, default_value = "json", value_parser = ["json", "summary"])]
    pub format: String,

    /// Write the report here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted input selection saved to `~/.glucose-trends/last_used.json`.
///
/// Only how to read the export is remembered; computed trends never are.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    /// Uses `~/.glucose-trends/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".glucose-trends").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());

        // Parse into the typed struct using the same args.
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if settings.input.is_none() {
            settings.input = last.input;
        }
        // NOTE: clap stores the arg id using the *field name* (underscores),
        // not the long-flag spelling (hyphens).
        if !is_arg_explicitly_set(&matches, "schema") {
            if let Some(v) = last.schema {
                settings.schema = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timestamp_format") {
            if let Some(v) = last.timestamp_format {
                settings.timestamp_format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        // Only remember a selection that points at something.
        if settings.input.is_some() {
            let params = LastUsedParams::from(&settings);
            let _ = params.save_to(config_path);
        }

        settings
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }

        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Pipeline tunables selected on the command line.
    pub fn trend_config(&self) -> TrendConfig {
        TrendConfig {
            weekly_window: self.weekly_window as usize,
            weekly_min_periods: self.weekly_min_periods as usize,
            iqr_multiplier: self.iqr_multiplier,
            sample_count: self.samples as usize,
        }
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            input: s.input.clone(),
            schema: Some(s.schema.clone()),
            timestamp_format: Some(s.timestamp_format.clone()),
            timezone: Some(s.timezone.clone()),
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    // ── LastUsedParams ────────────────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            input: Some(PathBuf::from("/exports/libre.csv")),
            schema: Some("libre".to_string()),
            timestamp_format: Some("%d.%m.%Y %H:%M".to_string()),
            timezone: Some("Europe/Berlin".to_string()),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.input, Some(PathBuf::from("/exports/libre.csv")));
        assert_eq!(loaded.schema, Some("libre".to_string()));
        assert_eq!(loaded.timestamp_format, Some("%d.%m.%Y %H:%M".to_string()));
        assert_eq!(loaded.timezone, Some("Europe/Berlin".to_string()));
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            schema: Some("health".to_string()),
            ..Default::default()
        };
        params.save_to(&path).expect("save");
        assert!(path.exists(), "file must exist after save");

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists(), "file must be gone after clear");
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert!(LastUsedParams::load_from(&path).input.is_none());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(LastUsedParams::load_from(&path).schema.is_none());
    }

    // ── CLI parsing ───────────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["glucose-trends"]);

        assert!(settings.input.is_none());
        assert_eq!(settings.schema, "auto");
        assert_eq!(settings.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(settings.timezone, "auto");
        assert_eq!(settings.weekly_window, 7);
        assert_eq!(settings.weekly_min_periods, 1);
        assert!((settings.iqr_multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(settings.samples, 500);
        assert_eq!(settings.format, "json");
        assert!(settings.output.is_none());
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_explicit_values() {
        let settings = Settings::parse_from([
            "glucose-trends",
            "--input",
            "/tmp/health.csv",
            "--schema",
            "health",
            "--weekly-min-periods",
            "7",
            "--samples",
            "50",
            "--format",
            "summary",
        ]);
        assert_eq!(settings.input, Some(PathBuf::from("/tmp/health.csv")));
        assert_eq!(settings.schema, "health");
        assert_eq!(settings.weekly_min_periods, 7);
        assert_eq!(settings.samples, 50);
        assert_eq!(settings.format, "summary");
    }

    #[test]
    fn test_settings_rejects_out_of_range_samples() {
        let result = Settings::try_parse_from(["glucose-trends", "--samples", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_trend_config_from_settings() {
        let settings = Settings::parse_from([
            "glucose-trends",
            "--weekly-window",
            "14",
            "--iqr-multiplier",
            "3",
        ]);
        let config = settings.trend_config();
        assert_eq!(config.weekly_window, 14);
        assert_eq!(config.weekly_min_periods, 1);
        assert!((config.iqr_multiplier - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.sample_count, 500);
        assert!(config.validate().is_ok());
    }

    // ── load_with_last_used ───────────────────────────────────────────────────

    #[test]
    fn test_load_with_last_used_restores_input() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            input: Some(PathBuf::from("/exports/libre.csv")),
            schema: Some("libre".to_string()),
            timezone: Some("UTC".to_string()),
            ..Default::default()
        };
        params.save_to(&config_path).expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["glucose-trends".into()], &config_path);
        assert_eq!(settings.input, Some(PathBuf::from("/exports/libre.csv")));
        assert_eq!(settings.schema, "libre");
        assert_eq!(settings.timezone, "UTC");
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            input: Some(PathBuf::from("/exports/libre.csv")),
            schema: Some("libre".to_string()),
            timezone: Some("UTC".to_string()),
            ..Default::default()
        };
        params.save_to(&config_path).expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec![
                "glucose-trends".into(),
                "--input".into(),
                "/exports/health.csv".into(),
                "--schema".into(),
                "health".into(),
            ],
            &config_path,
        );
        assert_eq!(settings.input, Some(PathBuf::from("/exports/health.csv")));
        assert_eq!(settings.schema, "health");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            schema: Some("libre".to_string()),
            ..Default::default()
        };
        params.save_to(&config_path).expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["glucose-trends".into(), "--clear".into()],
            &config_path,
        );

        assert!(!config_path.exists(), "file must be gone after --clear");
        assert_eq!(settings.schema, "auto");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let settings = Settings::load_with_last_used_impl(
            vec!["glucose-trends".into(), "--debug".into()],
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
        assert_ne!(settings.timezone, "auto");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec![
                "glucose-trends".into(),
                "--input".into(),
                "/exports/health.csv".into(),
                "--timezone".into(),
                "Europe/Vienna".into(),
            ],
            &config_path,
        );

        assert!(config_path.exists(), "config file must be persisted after run");
        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.input, Some(PathBuf::from("/exports/health.csv")));
        assert_eq!(loaded.timezone, Some("Europe/Vienna".to_string()));
    }

    #[test]
    fn test_load_without_input_does_not_persist() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(vec!["glucose-trends".into()], &config_path);
        assert!(!config_path.exists());
    }
}
