//! Conversion of a failed parse into human-readable diagnostic lines

use super::error::ParseError;
use super::frame::ParseFrame;
use crate::lexical::patterns;

/// Marker separating consumed from remaining tokens in an Apply line
pub const POSITION_MARKER: &str = "^^";

/// A failed parse: the raised error and its rendered call trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub error: ParseError,
    pub lines: Vec<String>,
}

impl Diagnosis {
    pub fn new(error: ParseError, frames: &[ParseFrame]) -> Self {
        let lines = trace_lines(&error, frames);
        Self { error, lines }
    }

    pub fn to_html(&self) -> String {
        render_html(&self.lines)
    }
}

/// Render the error followed by one line per distinct frame, innermost first
///
/// Consecutive call frames on the same input are merged into a single line.
pub fn trace_lines(error: &ParseError, frames: &[ParseFrame]) -> Vec<String> {
    let mut lines = vec![error.flattened_message()];
    let mut previous_input: Option<&str> = None;

    for frame in frames.iter().rev() {
        match &frame.progress {
            Some(progress) => {
                let consumed = progress.consumed.join(" ");
                let remaining = progress.remaining.iter().cloned().collect::<Vec<_>>().join(" ");
                let indicator = format!("{} {} {}", consumed, POSITION_MARKER, remaining);
                lines.push(format!(
                    "when applying **{}** at position: {}",
                    frame.rule,
                    indicator.trim()
                ));
                previous_input = None;
            }
            None => {
                let merged = previous_input == Some(frame.input.as_str());
                match lines.last_mut() {
                    Some(last) if merged => {
                        last.push_str(&format!(", **{}**", frame.rule));
                    }
                    _ => lines.push(format!(
                        "when parsing '{}' as **{}**",
                        frame.input, frame.rule
                    )),
                }
                previous_input = Some(frame.input.as_str());
            }
        }
    }

    lines
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn markup_line(line: &str) -> String {
    let escaped = escape_html(line);
    let bolded = match patterns::bold_marker() {
        Some(re) => re.replace_all(&escaped, "<b>$1</b>").into_owned(),
        None => escaped,
    };
    bolded.replace(
        POSITION_MARKER,
        &format!("<span class=\"error-position\">{}</span>", POSITION_MARKER),
    )
}

/// Render diagnostic lines as an HTML fragment
pub fn render_html(lines: &[String]) -> String {
    let Some((message, trace)) = lines.split_first() else {
        return String::new();
    };

    let mut html = format!("<p class=\"error-message\">{}</p>", markup_line(message));
    if !trace.is_empty() {
        html.push_str("\n<ul class=\"error-trace\">");
        for line in trace {
            html.push_str(&format!("\n<li>{}</li>", markup_line(line)));
        }
        html.push_str("\n</ul>");
    }
    html
}
