use once_cell::sync::Lazy;
use regex::Regex;

use paperlens_core::PaperMetadata;

use crate::render::encode_whitespace;

/// Placeholder title when no line qualifies.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Placeholder when no author-like group is found.
pub const UNKNOWN_AUTHORS: &str = "Unknown Authors";

/// Placeholder when no abstract marker (or no section break after one) exists.
pub const ABSTRACT_NOT_FOUND: &str = "Abstract not found";

/// Lines scanned past the title for the end of the author block.
pub const AUTHOR_SCAN_LINES: usize = 15;

/// Extract bibliographic metadata from raw paper text.
///
/// Heuristics are tuned to arXiv-style front matter:
/// - Title: first line that is non-empty after trimming and either starts
///   with an uppercase character or trims to more than 10 characters.
/// - Authors: "First Last1, First Last2" style name groups with optional
///   numeric affiliation superscripts, matched against the block of lines
///   between the title and the first abstract/date/correspondence/affiliation
///   line (the scan stops [`AUTHOR_SCAN_LINES`] lines past the title).
/// - Abstract: text between an "abstract" marker and the next numbered
///   section heading.
/// - Full text: the input itself, render-encoded.
///
/// Total over its input: a field that cannot be extracted degrades to its
/// placeholder string, never an error. The abstract and full text come back
/// render-encoded (see [`crate::render`]); title and authors are plain
/// trimmed strings.
pub fn extract_metadata(text: &str) -> PaperMetadata {
    let lines: Vec<&str> = text.split('\n').collect();
    let title = extract_title(&lines);
    let authors = extract_authors(&lines, &title);
    let abstract_text = extract_abstract(text);

    PaperMetadata {
        title,
        authors,
        abstract_text,
        full_text: encode_whitespace(text),
    }
}

// ───────────────── Field heuristics ─────────────────

/// First line whose raw first character is uppercase or whose trimmed form
/// runs past 10 characters. Short lowercase lines (page furniture, arXiv
/// identifiers) are skipped.
fn extract_title(lines: &[&str]) -> String {
    lines
        .iter()
        .find(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty()
                && (line.chars().next().is_some_and(char::is_uppercase)
                    || trimmed.chars().count() > 10)
        })
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

fn extract_authors(lines: &[&str], title: &str) -> String {
    static BOUNDARY_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)abstract|date|correspondence|affiliation").unwrap());
    // Capitalized name groups with optional numeric superscripts:
    // "Jane Doe1, 2, John Smith3"
    static AUTHOR_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*(?:\s*\d+(?:,\s*\d+)*)?(?:,\s*[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*(?:\s*\d+(?:,\s*\d+)*)?)*",
        )
        .unwrap()
    });

    // The block starts on the line after the first occurrence of the title,
    // or at the top of the document when the title line cannot be relocated.
    let start = lines
        .iter()
        .position(|line| line.trim() == title)
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut bound = lines.len();
    for (i, line) in lines.iter().enumerate().skip(start).take(AUTHOR_SCAN_LINES) {
        if BOUNDARY_RE.is_match(line.trim()) {
            bound = i;
            break;
        }
    }

    let block = lines[start..bound].join(" ");
    AUTHOR_RE
        .find(block.trim())
        .map(|m| m.as_str().replace('\n', " ").trim().to_string())
        .unwrap_or_else(|| UNKNOWN_AUTHORS.to_string())
}

fn extract_abstract(text: &str) -> String {
    static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)abstract").unwrap());
    // A numbered section heading ("\n2 Methods"), or the introduction heading.
    static SECTION_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\n\s*\d+\s+|\n\s*1\s+introduction").unwrap());

    let Some(marker) = MARKER_RE.find(text) else {
        return ABSTRACT_NOT_FOUND.to_string();
    };
    let after = &text[marker.end()..];

    // The capture starts at the first non-whitespace character past the
    // marker; the whitespace run between them is consumed greedily.
    let gap = after
        .char_indices()
        .find(|&(_, c)| !c.is_whitespace())
        .map_or(after.len(), |(i, _)| i);
    let body = &after[gap..];

    if let Some(section) = SECTION_RE.find(body) {
        return encode_whitespace(body[..section.start()].trim());
    }
    // A section break sitting inside the whitespace run leaves an empty
    // capture; no section break anywhere means no match at all.
    if SECTION_RE.is_match(after) {
        return String::new();
    }
    ABSTRACT_NOT_FOUND.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arxiv_style_front_matter() {
        let meta =
            extract_metadata("My Great Paper\nJane Doe1, John Smith2\nAbstract\nWe study X.\n1 Introduction\n...");
        assert_eq!(meta.title, "My Great Paper");
        assert_eq!(meta.authors, "Jane Doe1, John Smith2");
        assert_eq!(meta.abstract_text, "We study X.");
        assert_eq!(
            meta.full_text,
            "My Great Paper<br>Jane Doe1, John Smith2<br>Abstract<br>We study X.<br>1 Introduction<br>...",
        );
    }

    #[test]
    fn test_empty_input_degrades_to_placeholders() {
        let meta = extract_metadata("");
        assert_eq!(meta.title, UNKNOWN_TITLE);
        assert_eq!(meta.authors, UNKNOWN_AUTHORS);
        assert_eq!(meta.abstract_text, ABSTRACT_NOT_FOUND);
        assert_eq!(meta.full_text, "");
    }

    #[test]
    fn test_short_lowercase_lines_never_qualify_as_title() {
        let meta = extract_metadata("ab\ncd\nef");
        assert_eq!(meta.title, UNKNOWN_TITLE);
        assert_eq!(meta.authors, UNKNOWN_AUTHORS);
        assert_eq!(meta.abstract_text, ABSTRACT_NOT_FOUND);
        assert_eq!(meta.full_text, "ab<br>cd<br>ef");
    }

    #[test]
    fn test_long_lowercase_line_qualifies_as_title() {
        let meta = extract_metadata(
            "this line is long enough to be a title\nAbstract\nBody.\n1 Introduction",
        );
        assert_eq!(meta.title, "this line is long enough to be a title");
        assert_eq!(meta.authors, UNKNOWN_AUTHORS);
        assert_eq!(meta.abstract_text, "Body.");
    }

    #[test]
    fn test_indented_title_is_trimmed_and_relocated() {
        // The title line carries leading whitespace; the stored title is the
        // trimmed form and the author scan still starts on the next line.
        let meta = extract_metadata(" My Paper Title\nJane Doe1\nAbstract\nX.\n1 Introduction");
        assert_eq!(meta.title, "My Paper Title");
        assert_eq!(meta.authors, "Jane Doe1");
        assert_eq!(meta.abstract_text, "X.");
    }

    #[test]
    fn test_author_superscripts_are_kept() {
        let meta = extract_metadata(
            "Deep Nets\nJane Doe1, 2, John Smith3\nAbstract\nBody.\n1 Introduction",
        );
        assert_eq!(meta.authors, "Jane Doe1, 2, John Smith3");
    }

    #[test]
    fn test_author_block_joins_wrapped_lines() {
        let meta = extract_metadata(
            "Wide Nets\nJane Doe1,\nJohn Smith2\nAbstract\nBody.\n1 Introduction",
        );
        assert_eq!(meta.authors, "Jane Doe1, John Smith2");
    }

    #[test]
    fn test_author_block_stops_at_affiliation_line() {
        let meta = extract_metadata(
            "Title Here\nJane Doe1\nAffiliation: MIT\nJohn Smith2\nAbstract\nBody.\n1 Introduction",
        );
        assert_eq!(meta.authors, "Jane Doe1");
    }

    #[test]
    fn test_boundary_past_scan_window_is_not_seen() {
        // The abstract heading sits 17 lines down, past the scan window, so
        // the author block runs to the end of the document and the first
        // capitalized group in it wins.
        let mut text = String::from("Scan Window Paper\n");
        for i in 0..16 {
            text.push_str(&format!("filler line {i}\n"));
        }
        text.push_str("Abstract\nBody.\n1 Introduction");
        let meta = extract_metadata(&text);
        assert_eq!(meta.authors, "Abstract Body");
        assert_eq!(meta.abstract_text, "Body.");
    }

    #[test]
    fn test_abstract_heading_with_immediate_section_break() {
        let meta = extract_metadata("Abstract\n1 Introduction");
        assert_eq!(meta.title, "Abstract");
        assert_eq!(meta.authors, "Introduction");
        assert_eq!(meta.abstract_text, "");
    }

    #[test]
    fn test_abstract_without_section_break_is_not_found() {
        let meta = extract_metadata(
            "Title Line\nAbstract\nThis abstract just runs on with no numbered section after it",
        );
        assert_eq!(meta.abstract_text, ABSTRACT_NOT_FOUND);
    }

    #[test]
    fn test_abstract_capture_spans_lines_until_next_section() {
        let meta = extract_metadata("Header\nAbstract\n1 Introduction\nMore\n2 Methods x");
        assert_eq!(meta.abstract_text, "1 Introduction<br>More");
    }

    #[test]
    fn test_abstract_marker_matches_inside_words() {
        let meta = extract_metadata(
            "A Study\nJane Doe1\nThe word anabstraction appears here.\n1 introduction follows",
        );
        assert_eq!(meta.authors, "Jane Doe1");
        assert_eq!(meta.abstract_text, "ion appears here.");
    }

    #[test]
    fn test_inline_abstract_mention_captures_following_text() {
        let meta = extract_metadata("Intro text mentions abstract concepts\nhere\n1 Introduction");
        assert_eq!(meta.abstract_text, "concepts<br>here");
        assert_eq!(meta.authors, "Introduction");
    }

    #[test]
    fn test_bare_number_line_ends_abstract_early() {
        let meta = extract_metadata("Title\nAbstract\nWe cite\n 42 things\n1 Introduction");
        assert_eq!(meta.abstract_text, "We cite");
    }

    #[test]
    fn test_section_number_followed_by_blank_line() {
        let meta = extract_metadata("T\nAbstract\nbody\n1\n\nIntroduction");
        assert_eq!(meta.abstract_text, "body");
    }

    #[test]
    fn test_crlf_line_endings() {
        let meta = extract_metadata(
            "Title Of Mine\r\nJane Doe1\r\nAbstract\r\nBody text here.\r\n1 Introduction",
        );
        assert_eq!(meta.title, "Title Of Mine");
        assert_eq!(meta.authors, "Jane Doe1");
        assert_eq!(meta.abstract_text, "Body text here.");
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "Sample Title\nJane Doe1\nAbstract\nBody.\n1 Introduction\nthings  here";
        assert_eq!(extract_metadata(text), extract_metadata(text));
    }
}
