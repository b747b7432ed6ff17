use std::env;
use std::path::PathBuf;

use dotenv::dotenv;

/// Engine configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level name for [`crate::utils::log::init_logger`].
    pub logger_level: String,
    /// When set, log output is mirrored into a dated file in this directory.
    pub logger_dir: Option<PathBuf>,
    /// Reject `NAME=a=b` assignments instead of discarding the tail.
    pub strict_assignments: bool,
    /// Resolving an unset `$VAR` is an error instead of the empty string.
    pub strict_vars: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            logger_level: String::from("warn"),
            logger_dir: None,
            strict_assignments: false,
            strict_vars: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();

        if let Ok(level) = env::var("SHTREE_LOG") {
            config.logger_level = level;
        }

        if let Ok(dir) = env::var("SHTREE_LOG_DIR") {
            config.logger_dir = Some(PathBuf::from(dir));
        }

        if let Ok(value) = env::var("SHTREE_STRICT_ASSIGN") {
            config.strict_assignments = is_truthy(&value);
        }

        if let Ok(value) = env::var("SHTREE_STRICT_VARS") {
            config.strict_vars = is_truthy(&value);
        }

        config
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_lenient() {
        let config = Config::default();
        assert!(!config.strict_assignments);
        assert!(!config.strict_vars);
        assert_eq!(config.logger_level, "warn");
    }

    #[test]
    fn truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }
}
