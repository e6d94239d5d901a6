//! Configuration module for the CEQL compiler
//!
//! Compile-time limits live in `constants`, environment-driven user preferences in
//! `runtime`, and per-corpus grammar settings (attribute names, tag tables) in `corpus`.

pub mod constants;
pub mod corpus;
pub mod runtime;

pub use constants::compile_time;
pub use corpus::{ConfigError, GrammarConfig};
pub use runtime::{LoggingPreferences, ParserPreferences};
