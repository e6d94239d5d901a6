// Internal modules
#[macro_use]
pub mod logging;
pub mod config;
pub mod engine;
pub mod grammar;
pub mod lexical;

// Re-export key types for library consumers
pub use config::{ConfigError, GrammarConfig};
pub use engine::{Diagnosis, Fragment, ParseError, Parser, Rule, RuleResult, RuleTable};
pub use grammar::{CeqlParser, Flavour};

/// Translate one query with the given grammar flavour and configuration
///
/// Builds a fresh parser per call. Hosts compiling many queries should keep a
/// `CeqlParser` and call `parse` on it instead.
pub fn translate(
    query: &str,
    config: &GrammarConfig,
    flavour: Flavour,
) -> Result<String, Diagnosis> {
    let mut parser = CeqlParser::with_config(config, flavour)
        .map_err(|error| Diagnosis::new(error, &[]))?;
    match parser.parse(query) {
        Ok(cqp) => Ok(cqp),
        Err(error) => Err(parser
            .diagnosis()
            .cloned()
            .unwrap_or_else(|| Diagnosis::new(error, &[]))),
    }
}
