//! # CEQL Command Line Compiler
//!
//! Translates simple queries to CQP, one query per argument, per line of `--file`,
//! or per line of standard input.

use ceql_compiler::config::{LoggingPreferences, ParserPreferences};
use ceql_compiler::logging::{codes, LogLevel};
use ceql_compiler::{log_info, log_success, log_warning, logging};
use ceql_compiler::{CeqlParser, Flavour, GrammarConfig};
use clap::Parser as ClapParser;
use serde::Serialize;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, ClapParser)]
#[command(name = "ceql", version, about = "Compile CEQL simple queries to CQP")]
struct Cli {
    /// Corpus grammar configuration (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Grammar flavour: ceql or cqpweb
    #[arg(short, long, default_value_t = Flavour::Ceql)]
    grammar: Flavour,

    /// Read queries from a file, one per line
    #[arg(short, long, value_name = "FILE", conflicts_with = "queries")]
    file: Option<PathBuf>,

    /// Emit one JSON object per query
    #[arg(long, conflicts_with = "html")]
    json: bool,

    /// Render error traces as HTML
    #[arg(long)]
    html: bool,

    /// Log rule activity to stderr (repeat for rule-level tracing)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write log events to stderr as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Queries to translate; standard input is read when none are given
    #[arg(value_name = "QUERY")]
    queries: Vec<String>,
}

/// One translated query in `--json` output
#[derive(Debug, Serialize)]
struct QueryReport<'a> {
    query: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cqp: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Environment preferences, overridden by `--verbose` and `--log-json`
fn init_logging(cli: &Cli) -> Result<(), String> {
    let mut preferences = LoggingPreferences::default();
    if cli.verbose > 0 || cli.log_json {
        preferences.enable_console_logging = true;
        preferences.min_log_level = LogLevel::Debug;
    }
    preferences.use_structured_logging |= cli.log_json;
    logging::config::init_runtime_preferences(preferences)?;
    logging::init_global_logging()
}

fn parser_preferences(cli: &Cli) -> ParserPreferences {
    let mut preferences = ParserPreferences::default();
    preferences.trace_rule_calls |= cli.verbose > 1;
    preferences
}

/// Translate every query; returns whether all of them compiled
fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => GrammarConfig::load(path)?,
        None => GrammarConfig::default(),
    };
    let mut parser = CeqlParser::with_config(&config, cli.grammar)?;
    parser.set_preferences(parser_preferences(cli));

    let queries = collect_queries(cli)?;
    log_info!("Translating queries",
        "count" => queries.len(),
        "grammar" => cli.grammar
    );

    let mut failures = 0usize;
    for query in &queries {
        match parser.parse(query) {
            Ok(cqp) => emit_success(cli, query, cqp)?,
            Err(_) => {
                emit_failure(cli, query, &parser)?;
                failures += 1;
            }
        }
    }

    if failures == 0 {
        log_success!(codes::success::OPERATION_COMPLETED_SUCCESSFULLY, "All queries translated",
            "count" => queries.len()
        );
    } else {
        log_warning!("Some queries failed to translate",
            "failed" => failures,
            "count" => queries.len()
        );
    }
    Ok(failures == 0)
}

fn collect_queries(cli: &Cli) -> io::Result<Vec<String>> {
    if let Some(path) = &cli.file {
        let content = std::fs::read_to_string(path)?;
        return Ok(query_lines(content.lines()));
    }
    if !cli.queries.is_empty() {
        return Ok(cli.queries.clone());
    }

    let stdin = io::stdin();
    let lines = stdin.lock().lines().collect::<io::Result<Vec<_>>>()?;
    Ok(query_lines(lines.iter().map(String::as_str)))
}

/// Non-blank lines that are not `#` comments
fn query_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    lines
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn emit_success(cli: &Cli, query: &str, cqp: String) -> Result<(), serde_json::Error> {
    if cli.json {
        let report = QueryReport {
            query,
            ok: true,
            cqp: Some(cqp),
            errors: Vec::new(),
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", cqp);
    }
    Ok(())
}

fn emit_failure(cli: &Cli, query: &str, parser: &CeqlParser) -> Result<(), serde_json::Error> {
    if cli.json {
        let report = QueryReport {
            query,
            ok: false,
            cqp: None,
            errors: parser.error_message().to_vec(),
        };
        println!("{}", serde_json::to_string(&report)?);
    } else if cli.html {
        println!("{}", parser.html_error_message());
    } else {
        eprintln!("error: cannot translate '{}'", query);
        for line in parser.error_message() {
            eprintln!("  {}", line);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_lines_skip_blanks_and_comments() {
        let lines = query_lines("dog\n\n# comment\n  cat_N  \n".lines());
        assert_eq!(lines, vec!["dog".to_string(), "cat_N".to_string()]);
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from(["ceql", "--grammar", "cqpweb", "--json", "a b"]).unwrap();
        assert_eq!(cli.grammar, Flavour::Cqpweb);
        assert!(cli.json);
        assert_eq!(cli.queries, vec!["a b".to_string()]);

        assert!(Cli::try_parse_from(["ceql", "--grammar", "poliqarp"]).is_err());
        assert!(Cli::try_parse_from(["ceql", "--json", "--html", "a"]).is_err());
    }

    #[test]
    fn test_verbosity_enables_rule_tracing() {
        let quiet = Cli::try_parse_from(["ceql", "-v", "a"]).unwrap();
        let tracing = Cli::try_parse_from(["ceql", "-vv", "a"]).unwrap();

        assert!(!parser_preferences(&quiet).trace_rule_calls);
        assert!(parser_preferences(&tracing).trace_rule_calls);
    }

    #[test]
    fn test_json_report_shape() {
        let report = QueryReport {
            query: "a_b_c",
            ok: false,
            cqp: None,
            errors: vec!["More than one '_' separator".to_string()],
        };
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();

        assert_eq!(value["ok"], false);
        assert!(value.get("cqp").is_none());
        assert_eq!(value["errors"][0], "More than one '_' separator");
    }
}
