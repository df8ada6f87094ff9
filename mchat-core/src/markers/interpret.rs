use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::markers::LONG_FORM_THRESHOLD;
use crate::model::{FormattedMarker, Marker, MarkerKind};

static REQUEST_FIELDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\[Claude wants to use tool:\s*([\w.:/-]+)\s*(.*?)\s*\]$")
        .expect("valid regex")
});
static INVOCATION_FIELDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\[Calling tool\s+([\w.:/-]+)\s+with args:?\s*(.*?)\s*\]$")
        .expect("valid regex")
});
static RESULT_FIELDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\[Tool\s+([\w.:/-]+)\s+result:\s*(.*?)\s*\]$").expect("valid regex")
});
static TEXT_CONTENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)^\[\s*TextContent\(.*?\btext=(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")"#,
    )
    .expect("valid regex")
});

/// Sub-fields recovered from a marker's raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolFields {
    Request { tool: String, arguments: String },
    Invocation { tool: String, arguments: String },
    Result { tool: String, output: String },
}

impl ToolFields {
    pub fn tool(&self) -> &str {
        match self {
            Self::Request { tool, .. } | Self::Invocation { tool, .. } | Self::Result { tool, .. } => {
                tool.as_str()
            }
        }
    }

    fn detail_body(&self) -> String {
        match self {
            Self::Request { tool, arguments } | Self::Invocation { tool, arguments } => {
                let mut output = format!("Tool: {tool}");
                if !arguments.is_empty() {
                    output.push_str("\nArguments:\n");
                    output.push_str(&pretty_arguments(arguments));
                }
                output
            }
            Self::Result { tool, output } => format!("Tool: {tool}\nResult:\n{output}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedMarker {
    Matched(ToolFields),
    Unmatched { raw_text: String },
}

pub fn parse_marker(marker: &Marker) -> ParsedMarker {
    let raw = marker.raw_text.as_str();
    let fields = match marker.kind {
        MarkerKind::Request => REQUEST_FIELDS_RE.captures(raw).map(|caps| ToolFields::Request {
            tool: caps[1].to_string(),
            arguments: caps[2].to_string(),
        }),
        MarkerKind::Invocation => {
            INVOCATION_FIELDS_RE
                .captures(raw)
                .map(|caps| ToolFields::Invocation {
                    tool: caps[1].to_string(),
                    arguments: caps[2].to_string(),
                })
        }
        MarkerKind::Result => RESULT_FIELDS_RE.captures(raw).map(|caps| {
            let payload = &caps[2];
            ToolFields::Result {
                tool: caps[1].to_string(),
                output: unwrap_text_content(payload).unwrap_or_else(|| payload.to_string()),
            }
        }),
    };

    match fields {
        Some(fields) => ParsedMarker::Matched(fields),
        None => ParsedMarker::Unmatched {
            raw_text: marker.raw_text.clone(),
        },
    }
}

pub fn format_marker(marker: &Marker) -> FormattedMarker {
    let (summary, detail_body) = match parse_marker(marker) {
        ParsedMarker::Matched(fields) => (fields.tool().to_string(), fields.detail_body()),
        ParsedMarker::Unmatched { raw_text } => (String::new(), raw_text),
    };

    FormattedMarker {
        identifier: marker.identifier.clone(),
        kind: marker.kind,
        title: marker.kind.title().to_string(),
        summary,
        detail_body,
        is_long_form: marker.raw_text.chars().count() > LONG_FORM_THRESHOLD,
    }
}

/// Pulls the text out of a `[TextContent(type='text', text='...')]` payload.
fn unwrap_text_content(payload: &str) -> Option<String> {
    let caps = TEXT_CONTENT_RE.captures(payload.trim())?;
    let inner = caps.get(1).or_else(|| caps.get(2))?;
    Some(unescape(inner.as_str()))
}

fn unescape(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => output.push('\n'),
            Some('t') => output.push('\t'),
            Some(escaped @ ('\\' | '\'' | '"')) => output.push(escaped),
            Some(other) => {
                output.push('\\');
                output.push(other);
            }
            None => output.push('\\'),
        }
    }

    output
}

fn pretty_arguments(arguments: &str) -> String {
    serde_json::from_str::<Value>(arguments)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| arguments.to_string())
}
