//! Logging macros taking a code, a message and `"key" => value` context pairs
//!
//! Context values only need `Display`. Nothing is formatted unless a global logger is
//! installed and accepts the event's level.

/// Build an event, attach context and the active query, and hand it to the global logger
#[doc(hidden)]
#[macro_export]
macro_rules! __emit_event {
    ($level:expr, $event:expr $(, $key:expr => $value:expr)*) => {{
        if let Some(logger) = $crate::logging::try_get_global_logger() {
            if logger.should_log($level) {
                #[allow(unused_mut)]
                let mut event = $event;
                $(
                    event = event.with_context($key, &format!("{}", $value));
                )*
                logger.log_event($crate::logging::attach_query_context(event));
            }
        }
    }};
}

#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__emit_event!(
            $crate::logging::LogLevel::Error,
            $crate::logging::LogEvent::error($code, $message)
            $(, $key => $value)*
        )
    };
}

#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__emit_event!(
            $crate::logging::LogLevel::Info,
            $crate::logging::LogEvent::success($code, $message)
            $(, $key => $value)*
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__emit_event!(
            $crate::logging::LogLevel::Info,
            $crate::logging::LogEvent::info($message)
            $(, $key => $value)*
        )
    };
}

#[macro_export]
macro_rules! log_warning {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__emit_event!(
            $crate::logging::LogLevel::Warning,
            $crate::logging::LogEvent::warning($message)
            $(, $key => $value)*
        )
    };
}

#[macro_export]
macro_rules! log_debug {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__emit_event!(
            $crate::logging::LogLevel::Debug,
            $crate::logging::LogEvent::debug($message)
            $(, $key => $value)*
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::logging::codes;

    #[test]
    fn test_macros_are_noops_without_logger() {
        let depth: usize = 3;

        log_error!(codes::grammar::EMPTY_GROUP, "Empty group",
            "depth" => depth,
            "delimiter" => '('
        );
        log_success!(codes::success::QUERY_TRANSLATED, "Translated");
        log_info!("Parsing query", "length" => 12,);
        log_warning!("Suspicious input", "char" => '\u{0}');
        log_debug!("Rule call", "rule" => "ceql_query", "depth" => depth);
    }
}
