//! Tool-marker pipeline for assistant message bodies.
//!
//! A body goes through [`extract::extract_markers`], which swaps every
//! bracketed marker for a placeholder, then [`reassemble::reassemble`], which
//! splits the transformed body back into text and tool blocks and formats each
//! marker with [`interpret::format_marker`]. None of these steps can fail.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::model::{MarkerKind, RenderBlock};

pub mod extract;
pub mod interpret;
pub mod reassemble;

pub use extract::{Extraction, extract_markers};
pub use interpret::{ParsedMarker, ToolFields, format_marker, parse_marker};
pub use reassemble::reassemble;

/// Delimits placeholders. Marker payloads never contain it.
pub(crate) const PLACEHOLDER_SENTINEL: char = '\u{1f}';

/// Raw markers longer than this many characters are long-form.
pub const LONG_FORM_THRESHOLD: usize = 150;

const TOKEN_BYTES: usize = 8;

// Shortest run up to the next `]`, with one level of nested brackets.
const PAYLOAD: &str = r"(?:[^\[\]\x1f]|\[[^\[\]\x1f]*\])*?";

pub(crate) static REQUEST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\[Claude wants to use tool:{PAYLOAD}\]")).expect("valid regex")
});
pub(crate) static INVOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\[Calling tool {PAYLOAD}\]")).expect("valid regex"));
pub(crate) static RESULT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\[Tool [^\[\]\x1f]*? result:{PAYLOAD}\]")).expect("valid regex")
});

/// Grammars in scan order.
pub(crate) fn grammars() -> [(MarkerKind, &'static Regex); 3] {
    [
        (MarkerKind::Request, &REQUEST_RE),
        (MarkerKind::Invocation, &INVOCATION_RE),
        (MarkerKind::Result, &RESULT_RE),
    ]
}

/// Stable identifier for a marker's raw text.
///
/// The token is a truncated SHA-256 of the text. It keys UI state for a
/// render pass and is not meant for content addressing.
pub fn marker_identifier(kind: MarkerKind, raw_text: &str) -> String {
    let digest = Sha256::digest(raw_text.as_bytes());
    let token: String = digest
        .iter()
        .take(TOKEN_BYTES)
        .map(|byte| format!("{byte:02x}"))
        .collect();
    format!("tool-{}-{token}", kind.as_str())
}

pub(crate) fn placeholder(kind: MarkerKind, identifier: &str) -> String {
    format!(
        "{PLACEHOLDER_SENTINEL}tool:{}:{identifier}{PLACEHOLDER_SENTINEL}",
        kind.as_str()
    )
}

/// Runs the whole pipeline over one message body.
pub fn render_blocks(body: &str) -> Vec<RenderBlock> {
    let extraction = extract_markers(body);
    reassemble(&extraction)
}
