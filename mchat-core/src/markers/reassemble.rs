use tracing::debug;

use crate::markers::{Extraction, format_marker, placeholder};
use crate::model::{Marker, RenderBlock};

/// Splits an extraction into text and tool blocks in body order.
///
/// Only the recorded placeholder ranges are split on; anything else in the
/// body is text. Empty text between adjacent placeholders is not emitted. A
/// range whose token does not name its marker's kind and identifier is dropped.
pub fn reassemble(extraction: &Extraction) -> Vec<RenderBlock> {
    let body = extraction.body.as_str();
    let mut blocks = Vec::new();
    let mut cursor = 0;
    let mut dropped = 0usize;

    for (range, marker) in extraction.placeholders.iter().zip(&extraction.markers) {
        let (Some(before), Some(token)) = (body.get(cursor..range.start), body.get(range.clone()))
        else {
            dropped += 1;
            continue;
        };

        push_text(&mut blocks, before);
        cursor = range.end;

        if resolves_to(token, marker) {
            blocks.push(RenderBlock::Tool(format_marker(marker)));
        } else {
            dropped += 1;
        }
    }

    push_text(&mut blocks, body.get(cursor..).unwrap_or_default());

    if dropped > 0 {
        debug!(dropped, "dropped unresolved tool placeholders");
    }

    blocks
}

fn resolves_to(token: &str, marker: &Marker) -> bool {
    token == placeholder(marker.kind, &marker.identifier)
}

fn push_text(blocks: &mut Vec<RenderBlock>, text: &str) {
    if text.is_empty() {
        return;
    }
    blocks.push(RenderBlock::Text {
        text: text.to_string(),
    });
}
