//! Runtime configuration.
//!
//! Every setting can come from a command-line flag, an environment variable or
//! a built-in default, in that order of priority.

use argh::FromArgs;
use std::path::PathBuf;

pub const DEFAULT_HISTORY_LOCATION: &str = "data/balance.csv";
pub const DEFAULT_LOG_PATH: &str = "logs/app.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_ENVIRONMENT: &str = "production";

pub const HISTORY_LOCATION_VAR: &str = "HISTORY_LOCATION";
pub const LOG_PATH_VAR: &str = "LOG_PATH";
pub const LOGGER_LEVEL_VAR: &str = "LOGGER_LEVEL";
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

#[derive(FromArgs, Debug, Default)]
/// Interactive four-function calculator that keeps a history of results in a CSV file.
pub struct Cli {
    #[argh(option)]
    /// history file to read and write (env HISTORY_LOCATION, default data/balance.csv)
    pub history: Option<PathBuf>,

    #[argh(option)]
    /// file that receives the log (env LOG_PATH, default logs/app.log)
    pub log_path: Option<PathBuf>,

    #[argh(option)]
    /// log verbosity: error, warn, info, debug or trace (env LOGGER_LEVEL, default info)
    pub log_level: Option<String>,

    #[argh(option)]
    /// deployment name recorded in the log (env ENVIRONMENT, default production)
    pub environment: Option<String>,

    #[argh(option)]
    /// user name to record with saved results; asked for when omitted
    pub name: Option<String>,
}

impl Cli {
    /// The `--name` value with surrounding whitespace removed, if it has any
    /// other characters.
    pub fn user_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|name| !name.is_empty())
    }
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub environment: String,
    pub log_path: PathBuf,
    pub log_level: String,
    pub history_location: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            history_location: PathBuf::from(DEFAULT_HISTORY_LOCATION),
        }
    }
}

impl Config {
    /// Combine `cli` with the variables visible through `lookup`.
    ///
    /// `lookup` is normally `|key| std::env::var(key).ok()`. Empty values count
    /// as unset.
    pub fn resolve<F>(cli: &Cli, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        Self {
            environment: cli
                .environment
                .clone()
                .or_else(|| var(ENVIRONMENT_VAR))
                .unwrap_or(defaults.environment),
            log_path: cli
                .log_path
                .clone()
                .or_else(|| var(LOG_PATH_VAR).map(PathBuf::from))
                .unwrap_or(defaults.log_path),
            log_level: normalize_level(
                &cli.log_level
                    .clone()
                    .or_else(|| var(LOGGER_LEVEL_VAR))
                    .unwrap_or(defaults.log_level),
            ),
            history_location: cli
                .history
                .clone()
                .or_else(|| var(HISTORY_LOCATION_VAR).map(PathBuf::from))
                .unwrap_or(defaults.history_location),
        }
    }

    /// Shorthand for [`Config::resolve`] against the process environment.
    pub fn from_env(cli: &Cli) -> Self {
        Self::resolve(cli, |key| std::env::var(key).ok())
    }
}

/// Maps the level names people tend to write (`INFO`, `WARNING`, `CRITICAL`)
/// onto tracing's.
fn normalize_level(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    match level.as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        _ => level,
    }
}
