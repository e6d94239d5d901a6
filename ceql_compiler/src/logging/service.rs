//! Logger backends and the level-filtering service in front of them
//!
//! All backends that print write to stderr; stdout belongs to translated queries.

use super::codes::{self, Code};
use super::config;
use super::events::{LogEvent, LogLevel};
use std::sync::{Arc, Mutex, MutexGuard};

pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// Level filter in front of one logger backend
pub struct LoggingService {
    logger: Arc<dyn Logger>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self { logger, min_level }
    }

    /// Backend and level chosen by the `CEQL_LOGGING_*` preferences
    pub fn with_config() -> Self {
        let min_level = config::get_min_log_level();
        let logger: Arc<dyn Logger> = if config::use_structured_logging() {
            Arc::new(StructuredLogger)
        } else {
            Arc::new(ConsoleLogger::new(min_level == LogLevel::Debug))
        };
        Self::new(logger, min_level)
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level <= self.min_level
    }

    pub fn log_event(&self, event: LogEvent) {
        if self.should_log(event.level) {
            self.logger.log(&event);
        }
    }
}

/// Human-readable lines on stderr
pub struct ConsoleLogger {
    detailed_errors: bool,
}

impl ConsoleLogger {
    /// `detailed_errors` adds the registry's category and help text under each error
    pub fn new(detailed_errors: bool) -> Self {
        Self { detailed_errors }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        if self.detailed_errors {
            eprintln!("{}", event.format_detailed());
        } else {
            eprintln!("{}", event.format());
        }
    }
}

/// One JSON object per line on stderr
pub struct StructuredLogger;

impl Logger for StructuredLogger {
    fn log(&self, event: &LogEvent) {
        match event.format_json() {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{}", event.format()),
        }
    }
}

/// Bounded in-memory event buffer, for tests and hosts that inspect what a parse logged
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn events(&self) -> MutexGuard<'_, Vec<LogEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn collect<F>(&self, keep: F) -> Vec<LogEvent>
    where
        F: Fn(&LogEvent) -> bool,
    {
        self.events().iter().filter(|e| keep(e)).cloned().collect()
    }

    pub fn get_events(&self) -> Vec<LogEvent> {
        self.events().clone()
    }

    pub fn clear(&self) {
        self.events().clear();
    }

    pub fn event_count(&self) -> usize {
        self.events().len()
    }

    pub fn get_events_with_code(&self, code: Code) -> Vec<LogEvent> {
        self.collect(|e| e.code == code)
    }

    pub fn has_error_with_code(&self, code: Code) -> bool {
        self.events().iter().any(|e| e.is_error() && e.code == code)
    }

    /// Everything logged while `query` was being compiled
    pub fn events_for_query(&self, query: &str) -> Vec<LogEvent> {
        self.collect(|e| e.query.as_deref() == Some(query))
    }

    /// `(query, cqp)` for each logged translation
    pub fn translations(&self) -> Vec<(String, String)> {
        self.events()
            .iter()
            .filter(|e| e.code == codes::success::QUERY_TRANSLATED)
            .filter_map(|e| {
                let query = e.query.clone()?;
                let cqp = e.context_value("cqp")?.to_string();
                Some((query, cqp))
            })
            .collect()
    }

    /// `(query, code)` for each query error in the buffer
    pub fn failures(&self) -> Vec<(String, Code)> {
        self.events()
            .iter()
            .filter(|e| e.is_error())
            .filter_map(|e| e.query.clone().map(|query| (query, e.code)))
            .collect()
    }
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        let mut events = self.events();

        let max_events = config::get_error_buffer_size();
        if events.len() >= max_events {
            let remove_count = events.len() - max_events + 1;
            events.drain(0..remove_count);
        }

        events.push(event.clone());
    }
}
