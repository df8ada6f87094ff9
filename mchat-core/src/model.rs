use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub body: String,
}

/// What a bracketed tool marker reports about a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// The model asks to use a tool.
    Request,
    /// The client is executing a tool call.
    Invocation,
    /// Output of a finished tool call.
    Result,
}

impl MarkerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Invocation => "invocation",
            Self::Result => "result",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "request" => Some(Self::Request),
            "invocation" => Some(Self::Invocation),
            "result" => Some(Self::Result),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Request => "Tool Request",
            Self::Invocation => "Tool Call",
            Self::Result => "Tool Result",
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            Self::Request => "[?]",
            Self::Invocation => "[>]",
            Self::Result => "[=]",
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool marker as it was matched in a message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub identifier: String,
    pub kind: MarkerKind,
    pub raw_text: String,
}

/// Presentation-ready view of a [`Marker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedMarker {
    pub identifier: String,
    pub kind: MarkerKind,
    pub title: String,
    pub summary: String,
    pub detail_body: String,
    pub is_long_form: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderBlock {
    Text { text: String },
    Tool(FormattedMarker),
}

impl RenderBlock {
    pub fn as_tool(&self) -> Option<&FormattedMarker> {
        match self {
            Self::Tool(marker) => Some(marker),
            Self::Text { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub id: String,
    pub role: MessageRole,
    pub blocks: Vec<RenderBlock>,
}
