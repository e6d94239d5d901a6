//! Environment-driven user preferences
//!
//! Each field defaults from a `CEQL_*` environment variable. Hosts may also build the
//! structs directly and install them before logging starts.

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable names
pub mod env_vars {
    pub const PARSER_TRACE_RULES: &str = "CEQL_PARSER_TRACE_RULES";
    pub const PARSER_LOG_TRANSLATIONS: &str = "CEQL_PARSER_LOG_TRANSLATIONS";

    pub const LOGGING_USE_STRUCTURED: &str = "CEQL_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "CEQL_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "CEQL_LOGGING_MIN_LEVEL";
    pub const LOGGING_INCLUDE_QUERY_CONTEXT: &str = "CEQL_LOGGING_INCLUDE_QUERY_CONTEXT";
}

/// Boolean environment variable; unset or unparsable reads as `default`
fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_flag(&value))
        .unwrap_or(default)
}

/// Accepts true/false, 1/0, yes/no and on/off
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a log level name as accepted in environment variables
pub fn parse_log_level(value: &str) -> Option<LogLevel> {
    match value.trim().to_ascii_lowercase().as_str() {
        "error" => Some(LogLevel::Error),
        "warn" | "warning" => Some(LogLevel::Warning),
        "info" => Some(LogLevel::Info),
        "debug" | "trace" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserPreferences {
    /// Log every rule call at debug level
    pub trace_rule_calls: bool,
    /// Log each successful translation with its CQP output
    pub log_translations: bool,
}

impl Default for ParserPreferences {
    fn default() -> Self {
        Self {
            trace_rule_calls: env_flag(env_vars::PARSER_TRACE_RULES, false),
            log_translations: env_flag(env_vars::PARSER_LOG_TRANSLATIONS, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// JSON lines instead of plain text
    pub use_structured_logging: bool,
    /// Install a stderr logger at all
    pub enable_console_logging: bool,
    pub min_log_level: LogLevel,
    /// Attach the query being compiled to each event
    pub include_query_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env_flag(env_vars::LOGGING_USE_STRUCTURED, false),
            enable_console_logging: env_flag(env_vars::LOGGING_ENABLE_CONSOLE, false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            include_query_context: env_flag(env_vars::LOGGING_INCLUDE_QUERY_CONTEXT, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level(" WARN "), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("warning"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("Error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("loud"), None);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_preferences_serialize() {
        let preferences = LoggingPreferences {
            use_structured_logging: true,
            enable_console_logging: true,
            min_log_level: LogLevel::Debug,
            include_query_context: false,
        };
        let json = serde_json::to_string(&preferences).unwrap();
        let back: LoggingPreferences = serde_json::from_str(&json).unwrap();

        assert_eq!(back.min_log_level, LogLevel::Debug);
        assert!(!back.include_query_context);
    }
}
