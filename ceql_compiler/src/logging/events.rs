//! Log events emitted while compiling queries

use super::codes::{self, Code};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Log severity levels, ordered from least to most verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// One log record
///
/// `query` is the query being compiled on the emitting thread, if any. Context keys are
/// kept sorted so formatted output is stable.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: SystemTime,
    pub level: LogLevel,
    pub code: Code,
    pub message: String,
    pub query: Option<String>,
    pub context: BTreeMap<String, String>,
}

impl LogEvent {
    fn new(level: LogLevel, code: Code, message: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            level,
            code,
            message: truncate(message, super::config::get_max_log_message_length()),
            query: None,
            context: BTreeMap::new(),
        }
    }

    pub fn error(error_code: Code, message: &str) -> Self {
        Self::new(LogLevel::Error, error_code, message)
    }

    /// Warnings carry no specific code
    pub fn warning(message: &str) -> Self {
        Self::new(LogLevel::Warning, Code::new("W000"), message)
    }

    pub fn info(message: &str) -> Self {
        Self::new(LogLevel::Info, Code::new("I000"), message)
    }

    /// Info event carrying a success code
    pub fn success(success_code: Code, message: &str) -> Self {
        Self::new(LogLevel::Info, success_code, message)
    }

    pub fn debug(message: &str) -> Self {
        Self::new(LogLevel::Debug, Code::new("D000"), message)
    }

    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn is_info(&self) -> bool {
        self.level == LogLevel::Info
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.code.as_str())
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.code.as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.code.as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.code.as_str())
    }

    /// Single line: `[LEVEL] CODE message key=value ... (query '...')`
    pub fn format(&self) -> String {
        let mut line = format!("[{}] {} {}", self.level.as_str(), self.code, self.message);
        for (key, value) in &self.context {
            line.push_str(&format!(" {}={}", key, value));
        }
        if let Some(query) = &self.query {
            line.push_str(&format!(" (query '{}')", query));
        }
        line
    }

    /// `format` followed by the registry's category and recommended action for errors
    pub fn format_detailed(&self) -> String {
        let mut output = self.format();
        if self.is_error() {
            output.push_str(&format!(
                "\n  {} error, severity {}",
                self.category(),
                self.severity()
            ));
            output.push_str(&format!("\n  help: {}", self.recommended_action()));
        }
        output
    }

    /// JSON object for structured logging
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        let timestamp = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let mut json = serde_json::json!({
            "timestamp_ms": timestamp,
            "level": self.level.as_str(),
            "code": self.code.as_str(),
            "message": self.message,
        });

        if let Some(query) = &self.query {
            json["query"] = serde_json::Value::String(query.clone());
        }
        if self.is_error() {
            json["category"] = self.category().into();
            json["severity"] = self.severity().into();
            json["requires_halt"] = self.requires_halt().into();
        }
        if !self.context.is_empty() {
            json["context"] = serde_json::to_value(&self.context)?;
        }

        serde_json::to_string(&json)
    }
}

/// Cut a message to at most `max_len` bytes on a char boundary
fn truncate(message: &str, max_len: usize) -> String {
    if message.len() <= max_len {
        return message.to_string();
    }
    let mut cut = max_len;
    while !message.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &message[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_event_creation() {
        let event = LogEvent::error(codes::grammar::EMPTY_GROUP, "empty group");

        assert!(event.is_error());
        assert_eq!(event.code.as_str(), "Q104");
        assert_eq!(event.category(), "Grammar");
        assert!(event.query.is_none());
    }

    #[test]
    fn test_success_event_creation() {
        let event = LogEvent::success(codes::success::QUERY_TRANSLATED, "translated");

        assert!(event.is_info());
        assert_eq!(event.code.as_str(), "I010");
    }

    #[test]
    fn test_format_line() {
        let event = LogEvent::error(codes::availability::LEMMA_NOT_AVAILABLE, "no lemma")
            .with_context("rule", "lemma_pattern")
            .with_context("depth", "4")
            .with_query("{cat}");

        assert_eq!(
            event.format(),
            "[ERROR] Q201 no lemma depth=4 rule=lemma_pattern (query '{cat}')"
        );
    }

    #[test]
    fn test_detailed_format() {
        let event = LogEvent::error(codes::engine::STACK_CORRUPTION, "bad frame");
        let detailed = event.format_detailed();

        assert!(detailed.contains("Engine error, severity Critical"));
        assert!(detailed.contains("help: "));
        assert!(event.requires_halt());

        let info = LogEvent::info("plain");
        assert_eq!(info.format_detailed(), info.format());
    }

    #[test]
    fn test_json_formatting() {
        let event = LogEvent::error(codes::values::DISALLOWED_TAG, "tag not allowed")
            .with_context("tag", "p")
            .with_query("<p>");

        let value: serde_json::Value = serde_json::from_str(&event.format_json().unwrap()).unwrap();
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["code"], "Q300");
        assert_eq!(value["query"], "<p>");
        assert_eq!(value["category"], "UnknownValue");
        assert_eq!(value["context"]["tag"], "p");
    }

    #[test]
    fn test_long_messages_truncated_on_char_boundary() {
        let message = "é".repeat(10);
        let cut = truncate(&message, 5);

        assert_eq!(cut, "éé...");
        assert_eq!(truncate("short", 5), "short");
    }
}
