pub mod analysis;
pub mod backend;
pub mod config_file;
pub mod generate;
pub mod store;

// Re-export for convenience
pub use analysis::{Analyzer, AnalysisError, GapsReport, SummaryReport};
pub use backend::{BackendError, PdfBackend};
pub use generate::{GenerateError, GenerationRequest, OpenAiGenerator, TextGenerator};
pub use store::{PaperStore, SearchHit, StoreError};

/// Marker substituted for `\n` in stored text fields.
pub const LINE_BREAK: &str = "<br>";

/// Marker substituted for each run of exactly two spaces in stored text fields.
pub const NBSP_PAIR: &str = "&nbsp;&nbsp;";

/// Bibliographic metadata extracted from a paper's raw text.
///
/// Produced by `paperlens_parsing::extract_metadata`. `abstract_text` and
/// `full_text` carry the render-encoding ([`LINE_BREAK`] / [`NBSP_PAIR`]
/// markers); `title` and `authors` are plain trimmed strings, falling back to
/// fixed placeholders when a heuristic finds no match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperMetadata {
    pub title: String,
    pub authors: String,
    pub abstract_text: String,
    pub full_text: String,
}

/// A persisted paper.
///
/// `summary`, `key_findings`, `gaps`, and `future_work` start out `None` and
/// are filled in by the analysis pipeline at most once; once set they are
/// returned from storage without recomputation. All stored text fields keep
/// the render-encoding.
#[derive(Debug, Clone)]
pub struct Paper {
    pub id: i64,
    pub title: String,
    pub authors: String,
    pub abstract_text: String,
    pub full_text: String,
    pub summary: Option<String>,
    pub key_findings: Option<String>,
    pub gaps: Option<String>,
    pub future_work: Option<String>,
    pub pdf_path: String,
}

impl Paper {
    /// Whether the summary has been computed and is non-empty.
    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Whether gap analysis has been computed and is non-empty.
    pub fn has_gaps(&self) -> bool {
        self.gaps.as_deref().is_some_and(|g| !g.is_empty())
    }
}
