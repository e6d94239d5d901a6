pub mod compile_time {
    pub mod query {
        /// Maximum query length in bytes accepted by `Parser::parse`
        /// SECURITY: Bounds backtracking work on hostile input
        pub const MAX_QUERY_LENGTH: usize = 4_096;

        /// Maximum rule nesting depth on the call stack
        /// SECURITY: Prevents stack overflow in recursive rule application
        pub const MAX_CALL_DEPTH: usize = 200;

        /// Maximum number of simultaneously open groups within one Apply
        /// SECURITY: Prevents unbounded bracket nesting
        pub const MAX_GROUP_DEPTH: usize = 64;
    }

    pub mod logging {
        /// Log buffer size for in-memory loggers
        /// RESOURCE: Controls memory usage for logging
        pub const LOG_BUFFER_SIZE: usize = 10_000;

        /// Maximum log message length before truncation
        /// RESOURCE: Prevents memory attacks via huge messages
        pub const MAX_LOG_MESSAGE_LENGTH: usize = 10_000;
    }
}
