pub mod config;
pub mod conversation;
pub mod error;
pub mod markers;
pub mod model;
pub mod render;
pub mod transport;

pub use config::ChatConfig;
pub use conversation::Conversation;
pub use error::{MchatError, Result};
pub use markers::{
    Extraction, LONG_FORM_THRESHOLD, ParsedMarker, ToolFields, extract_markers, format_marker,
    marker_identifier, parse_marker, reassemble, render_blocks,
};
pub use model::{
    FormattedMarker, Marker, MarkerKind, Message, MessageRole, RenderBlock, RenderedMessage,
};
pub use render::{
    PanelState, blocks_to_raw_json, conversation_to_raw_json, render_blocks_markdown,
    render_conversation_markdown, render_message, render_message_markdown,
};
pub use transport::{ChatTransport, HttpChatTransport};
