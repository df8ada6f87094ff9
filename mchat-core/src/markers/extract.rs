use std::ops::Range;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::markers::{grammars, marker_identifier, placeholder};
use crate::model::{Marker, MarkerKind};

/// A message body with its markers swapped for placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub body: String,
    /// One record per occurrence, in original left-to-right order.
    pub markers: Vec<Marker>,
    /// Byte ranges of the inserted placeholders in `body`, parallel to
    /// `markers`. Placeholder-shaped text that came with the input is not
    /// listed and stays plain text.
    pub placeholders: Vec<Range<usize>>,
}

enum Piece {
    Text(String),
    Marker(Marker),
}

pub fn extract_markers(body: &str) -> Extraction {
    let mut pieces = vec![Piece::Text(body.to_string())];

    // Later grammars only see text left over by earlier ones.
    for (kind, pattern) in grammars() {
        pieces = pieces
            .into_iter()
            .flat_map(|piece| match piece {
                Piece::Text(text) => split_text(&text, kind, pattern),
                marker @ Piece::Marker(_) => vec![marker],
            })
            .collect();
    }

    let mut transformed = String::with_capacity(body.len());
    let mut markers = Vec::new();
    let mut placeholders = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Text(text) => transformed.push_str(&text),
            Piece::Marker(marker) => {
                let start = transformed.len();
                transformed.push_str(&placeholder(marker.kind, &marker.identifier));
                placeholders.push(start..transformed.len());
                markers.push(marker);
            }
        }
    }

    if markers.is_empty() {
        return Extraction {
            body: body.to_string(),
            markers,
            placeholders,
        };
    }

    debug!(markers = markers.len(), "extracted tool markers");

    Extraction {
        body: transformed,
        markers,
        placeholders,
    }
}

fn split_text(text: &str, kind: MarkerKind, pattern: &Regex) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut cursor = 0;

    for found in pattern.find_iter(text) {
        if found.start() > cursor {
            pieces.push(Piece::Text(text[cursor..found.start()].to_string()));
        }
        let raw_text = found.as_str().to_string();
        pieces.push(Piece::Marker(Marker {
            identifier: marker_identifier(kind, &raw_text),
            kind,
            raw_text,
        }));
        cursor = found.end();
    }

    if cursor < text.len() {
        pieces.push(Piece::Text(text[cursor..].to_string()));
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::extract_markers;
    use crate::markers::{marker_identifier, placeholder};
    use crate::model::MarkerKind;

    #[test]
    fn clean_text_is_returned_unchanged() {
        let body = "No tools here, just [brackets] and a colon: fine.";
        let extraction = extract_markers(body);

        assert_eq!(extraction.body, body);
        assert!(extraction.markers.is_empty());
    }

    #[test]
    fn empty_body_has_no_markers() {
        let extraction = extract_markers("");
        assert_eq!(extraction.body, "");
        assert!(extraction.markers.is_empty());
    }

    #[test]
    fn placeholders_point_at_inserted_tokens() {
        let extraction = extract_markers("a [Calling tool x with args 1] b");

        assert_eq!(extraction.placeholders.len(), 1);
        let token = &extraction.body[extraction.placeholders[0].clone()];
        assert_eq!(
            token,
            placeholder(MarkerKind::Invocation, &extraction.markers[0].identifier)
        );
    }

    #[test]
    fn placeholder_shaped_input_is_not_a_marker() {
        let body = "hello \u{1f}tool:request:abc\u{1f} world";
        let extraction = extract_markers(body);

        assert_eq!(extraction.body, body);
        assert!(extraction.markers.is_empty());
        assert!(extraction.placeholders.is_empty());
    }

    #[test]
    fn copied_placeholder_does_not_duplicate_marker() {
        let marker = "[Calling tool a with args 1]";
        let identifier = marker_identifier(MarkerKind::Invocation, marker);
        let copied = placeholder(MarkerKind::Invocation, &identifier);
        let extraction = extract_markers(&format!("{marker} {copied}"));

        assert_eq!(extraction.markers.len(), 1);
        assert_eq!(extraction.placeholders.len(), 1);
        assert!(extraction.body.ends_with(&format!(" {copied}")));
    }

    #[test]
    fn request_and_result_do_not_overlap() {
        let body = r#"[Claude wants to use tool: search {"q":"x"}] and [Tool search result: [TextContent(text='ok')]]"#;
        let extraction = extract_markers(body);

        assert_eq!(extraction.markers.len(), 2);
        assert_eq!(extraction.markers[0].kind, MarkerKind::Request);
        assert_eq!(
            extraction.markers[0].raw_text,
            r#"[Claude wants to use tool: search {"q":"x"}]"#
        );
        assert_eq!(extraction.markers[1].kind, MarkerKind::Result);
        assert_eq!(
            extraction.markers[1].raw_text,
            "[Tool search result: [TextContent(text='ok')]]"
        );

        assert!(!extraction.body.contains('['));
        assert!(!extraction.body.contains(']'));
        assert!(extraction.body.contains(" and "));
    }

    #[test]
    fn markers_keep_original_order_across_grammars() {
        let body = "[Tool a result: one] then [Calling tool b with args {}] then [Claude wants to use tool: c {}]";
        let kinds: Vec<MarkerKind> = extract_markers(body)
            .markers
            .iter()
            .map(|marker| marker.kind)
            .collect();

        assert_eq!(
            kinds,
            vec![MarkerKind::Result, MarkerKind::Invocation, MarkerKind::Request]
        );
    }

    #[test]
    fn identifiers_are_stable_across_extractions() {
        let body = "before [Calling tool fetch with args {\"url\":\"x\"}] after";
        let first = extract_markers(body);
        let second = extract_markers(&format!("other text {body}"));

        assert_eq!(
            first.markers[0].identifier,
            second.markers[0].identifier
        );
    }

    #[test]
    fn repeated_marker_is_recorded_per_occurrence() {
        let body = "[Calling tool ls with args .] x [Calling tool ls with args .]";
        let extraction = extract_markers(body);

        assert_eq!(extraction.markers.len(), 2);
        assert_eq!(
            extraction.markers[0].identifier,
            extraction.markers[1].identifier
        );
    }

    #[test]
    fn adjacent_markers_do_not_merge() {
        let body = "[Calling tool a with args 1][Calling tool b with args 2]";
        let extraction = extract_markers(body);

        assert_eq!(extraction.markers.len(), 2);
        assert_eq!(
            extraction.markers[0].raw_text,
            "[Calling tool a with args 1]"
        );
        assert_eq!(
            extraction.markers[1].raw_text,
            "[Calling tool b with args 2]"
        );
    }

    #[test]
    fn malformed_markers_pass_through() {
        let body = "[Claude wants to use tool search] and [Tool x result: unterminated";
        let extraction = extract_markers(body);

        assert_eq!(extraction.body, body);
        assert!(extraction.markers.is_empty());
    }

    #[test]
    fn replaced_spans_are_invisible_to_later_grammars() {
        let body = "[Tool outer result: [Claude wants to use tool: inner {}]]";
        let extraction = extract_markers(body);

        assert_eq!(extraction.markers.len(), 1);
        assert_eq!(extraction.markers[0].kind, MarkerKind::Request);
        assert!(extraction.body.starts_with("[Tool outer result: "));
        assert!(extraction.body.ends_with(']'));
    }

    #[test]
    fn nested_list_arguments_stay_inside_the_marker() {
        let body = r#"[Claude wants to use tool: read {"paths":["a","b"]}] ok"#;
        let extraction = extract_markers(body);

        assert_eq!(extraction.markers.len(), 1);
        assert_eq!(
            extraction.markers[0].raw_text,
            r#"[Claude wants to use tool: read {"paths":["a","b"]}]"#
        );
    }
}
