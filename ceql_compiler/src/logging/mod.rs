//! Global logging for the CEQL compiler
//!
//! One process-wide `LoggingService` plus a per-thread *query context*: the query a parser
//! on this thread is compiling, attached to every event logged meanwhile. Every macro is a
//! no-op until a logger has been installed, so embedding hosts that never initialise
//! logging pay only for an atomic load.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

thread_local! {
    static QUERY_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Install the logger described by the `CEQL_LOGGING_*` preferences
///
/// Leaves logging disabled when console output is not enabled.
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;
    codes::validate_registry()?;

    if !config::use_console_logging() {
        return Ok(());
    }

    let service = Arc::new(LoggingService::with_config());
    GLOBAL_LOGGER
        .set(service.clone())
        .map_err(|_| "Global logger already initialized")?;

    service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));
    Ok(())
}

/// Install a specific service (tests and embedding hosts)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

// ============================================================================
// QUERY CONTEXT
// ============================================================================

/// Run `f` with `query` as the current thread's query context
///
/// The previous context is restored afterwards, so nested parsers on one thread report
/// their own query.
pub fn with_query_context<F, R>(query: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let previous = QUERY_CONTEXT.with(|ctx| ctx.replace(Some(query.to_string())));
    let result = f();
    QUERY_CONTEXT.with(|ctx| *ctx.borrow_mut() = previous);
    result
}

pub fn get_current_query_context() -> Option<String> {
    QUERY_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Attach the active query to an event when the preference allows it
pub fn attach_query_context(event: LogEvent) -> LogEvent {
    if !config::include_query_context() {
        return event;
    }
    match get_current_query_context() {
        Some(query) => event.with_query(&query),
        None => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query_context() {
        assert!(get_current_query_context().is_none());

        let result = with_query_context("{walk}", || {
            assert_eq!(get_current_query_context().as_deref(), Some("{walk}"));
            7
        });

        assert_eq!(result, 7);
        assert!(get_current_query_context().is_none());
    }

    #[test]
    fn test_nested_query_context_restored() {
        with_query_context("dog <<3>> cat", || {
            with_query_context("dog", || {
                assert_eq!(get_current_query_context().as_deref(), Some("dog"));
            });
            assert_eq!(get_current_query_context().as_deref(), Some("dog <<3>> cat"));
        });
    }

    #[test]
    fn test_attach_query_context() {
        let event = with_query_context("the_DT", || attach_query_context(LogEvent::info("x")));
        if config::include_query_context() {
            assert_eq!(event.query.as_deref(), Some("the_DT"));
        }
        assert!(attach_query_context(LogEvent::info("y")).query.is_none());
    }
}
