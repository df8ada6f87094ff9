use std::collections::HashMap;

use crate::conversation::Conversation;
use crate::error::{MchatError, Result};
use crate::markers::render_blocks;
use crate::model::{FormattedMarker, Message, MessageRole, RenderBlock, RenderedMessage};

const EMPTY_CONVERSATION: &str = "_No messages yet. Send a message to start chatting._";

/// Expand/collapse flags for tool panels, keyed by marker identifier.
///
/// Identifiers are derived from marker text, so state survives re-rendering
/// the same message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    expanded: HashMap<String, bool>,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, identifier: &str) -> bool {
        self.expanded.get(identifier).copied().unwrap_or(false)
    }

    pub fn set_expanded(&mut self, identifier: impl Into<String>, expanded: bool) {
        self.expanded.insert(identifier.into(), expanded);
    }

    /// Flips a panel and returns its new state.
    pub fn toggle(&mut self, identifier: &str) -> bool {
        let expanded = !self.is_expanded(identifier);
        self.expanded.insert(identifier.to_string(), expanded);
        expanded
    }

    pub fn expand_all(&mut self, blocks: &[RenderBlock]) {
        for marker in blocks.iter().filter_map(RenderBlock::as_tool) {
            self.expanded.insert(marker.identifier.clone(), true);
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }
}

pub fn render_message(message: &Message) -> RenderedMessage {
    let blocks = match message.role {
        MessageRole::Assistant => render_blocks(&message.body),
        MessageRole::User | MessageRole::System if message.body.is_empty() => Vec::new(),
        MessageRole::User | MessageRole::System => vec![RenderBlock::Text {
            text: message.body.clone(),
        }],
    };

    RenderedMessage {
        id: message.id.clone(),
        role: message.role,
        blocks,
    }
}

pub fn render_blocks_markdown(blocks: &[RenderBlock], state: &PanelState) -> String {
    let mut output = String::new();
    let mut after_panel = false;
    for block in blocks {
        match block {
            RenderBlock::Text { text } => {
                // A blank line ends the quote; otherwise the text is a lazy
                // continuation of the panel.
                if after_panel && !text.starts_with('\n') {
                    output.push('\n');
                }
                output.push_str(text);
                after_panel = false;
            }
            RenderBlock::Tool(marker) => {
                if after_panel || (!output.is_empty() && !output.ends_with('\n')) {
                    output.push('\n');
                }
                render_panel(&mut output, marker, state.is_expanded(&marker.identifier));
                after_panel = true;
            }
        }
    }
    output
}

pub fn render_message_markdown(message: &Message, state: &PanelState) -> String {
    render_blocks_markdown(&render_message(message).blocks, state)
}

pub fn render_conversation_markdown(conversation: &Conversation, state: &PanelState) -> String {
    let mut output = String::new();
    output.push_str("# Conversation\n\n");

    if let Some(error) = conversation.error() {
        output.push_str(&format!("> **Error:** {error}\n\n"));
    }

    if conversation.messages().is_empty() {
        output.push_str(EMPTY_CONVERSATION);
        output.push('\n');
        return output;
    }

    for (idx, message) in conversation.messages().iter().enumerate() {
        let title = match message.role {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
            MessageRole::System => "System",
        };

        output.push_str(&format!("## {}. {}\n\n", idx + 1, title));
        output.push_str(render_message_markdown(message, state).trim_end_matches('\n'));
        output.push_str("\n\n");
    }

    output
}

pub fn blocks_to_raw_json(blocks: &[RenderBlock]) -> Result<String> {
    serde_json::to_string_pretty(blocks).map_err(|err| MchatError::Serialization(err.to_string()))
}

pub fn conversation_to_raw_json(conversation: &Conversation) -> Result<String> {
    let rendered: Vec<RenderedMessage> =
        conversation.messages().iter().map(render_message).collect();
    serde_json::to_string_pretty(&rendered)
        .map_err(|err| MchatError::Serialization(err.to_string()))
}

fn render_panel(output: &mut String, marker: &FormattedMarker, expanded: bool) {
    output.push_str(&format!("> {} **{}**", marker.kind.badge(), marker.title));
    if !marker.summary.is_empty() {
        output.push_str(&format!(" `{}`", marker.summary));
    }
    output.push_str(&format!(" <sub>{}</sub>\n", marker.identifier));

    if !expanded {
        if marker.is_long_form {
            let hidden = marker.detail_body.chars().count();
            output.push_str(&format!(
                "> _collapsed: {hidden} characters hidden, expand to view_\n"
            ));
        } else {
            output.push_str("> _collapsed, expand to view_\n");
        }
        return;
    }

    let fence = fence_for(&marker.detail_body);
    output.push_str(">\n");
    output.push_str(&format!("> {fence}text\n"));
    for line in marker.detail_body.lines() {
        output.push_str("> ");
        output.push_str(line);
        output.push('\n');
    }
    output.push_str(&format!("> {fence}\n"));
}

/// A backtick fence longer than any backtick run in `body`.
fn fence_for(body: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in body.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat(longest.max(2) + 1)
}
