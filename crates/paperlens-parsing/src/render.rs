//! Whitespace render encoding for stored paper text.
//!
//! Extracted text is stored with explicit markers standing in for whitespace
//! that a collapsing renderer would otherwise eat: `\n` becomes [`LINE_BREAK`]
//! and each double space becomes [`NBSP_PAIR`]. The space substitution is
//! literal and non-overlapping, so a run of three spaces leaves one plain
//! space behind. Stored text depends on that exact shape, so keep it.

pub use paperlens_core::{LINE_BREAK, NBSP_PAIR};

/// Encode raw text for storage: line breaks first, then double spaces.
pub fn encode_whitespace(text: &str) -> String {
    text.replace('\n', LINE_BREAK).replace("  ", NBSP_PAIR)
}

/// Invert [`encode_whitespace`] for display and prompt building.
pub fn decode_whitespace(text: &str) -> String {
    text.replace(LINE_BREAK, "\n").replace(NBSP_PAIR, "  ")
}

/// Encode line breaks only. Generated text gets this before storage; model
/// output never goes through the double-space substitution.
pub fn encode_line_breaks(text: &str) -> String {
    text.replace('\n', LINE_BREAK)
}

/// Decode line breaks only, the inverse of [`encode_line_breaks`].
pub fn decode_line_breaks(text: &str) -> String {
    text.replace(LINE_BREAK, "\n")
}
