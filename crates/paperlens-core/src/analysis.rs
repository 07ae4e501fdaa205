//! Paper analysis pipeline: summaries, key findings, research gaps, and
//! pairwise comparisons.
//!
//! Prompts are built from the stored (encoded) text, decoded as each stage
//! expects, and responses are re-encoded before persisting. Summaries and
//! gap analyses are generated at most once per paper and served from the
//! store afterwards; comparisons are regenerated on every request.

use crate::generate::{GenerateError, GenerationRequest, TextGenerator};
use crate::store::{PaperStore, StoreError};
use crate::{LINE_BREAK, NBSP_PAIR, Paper};

/// Character cap applied to decoded paper text in summary prompts.
pub const SUMMARY_INPUT_LIMIT: usize = 3000;

/// Character cap applied to each decoded summary in compare prompts.
pub const COMPARE_SUMMARY_LIMIT: usize = 500;

/// Sampling temperature for summary generation.
pub const SUMMARY_TEMPERATURE: f32 = 0.3;

/// Sampling temperature for gap analysis.
pub const GAPS_TEMPERATURE: f32 = 0.5;

/// Splits a gap-analysis response into limitations and future work.
pub const FUTURE_WORK_MARKER: &str = "Future Work:";

/// Fallback future-work text when a response lacks [`FUTURE_WORK_MARKER`].
pub const DEFAULT_FUTURE_WORK: &str = "Future directions: Explore multimodal extensions.";

/// Errors from the analysis pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("paper {0} not found")]
    PaperNotFound(i64),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("generation error: {0}")]
    Generate(#[from] GenerateError),
}

/// Summary plus key findings for one paper, as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryReport {
    pub summary: String,
    pub key_findings: String,
}

/// Gap analysis split into the limitations text and the future-work text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapsReport {
    pub gaps: String,
    pub future_work: String,
}

/// Orchestrates analysis over stored papers: builds prompts, invokes the
/// text generator, and persists results so repeat requests skip generation.
pub struct Analyzer<'a> {
    store: &'a PaperStore,
    generator: &'a dyn TextGenerator,
}

impl<'a> Analyzer<'a> {
    pub fn new(store: &'a PaperStore, generator: &'a dyn TextGenerator) -> Self {
        Self { store, generator }
    }

    /// Summarize a paper, generating and storing the summary and key
    /// findings on first request. Repeat calls return the stored pair.
    pub async fn summarize(&self, id: i64) -> Result<SummaryReport, AnalysisError> {
        let paper = self.ensure_summary(id).await?;
        Ok(SummaryReport {
            summary: paper.summary.unwrap_or_default(),
            key_findings: paper.key_findings.unwrap_or_default(),
        })
    }

    /// Analyze a paper for research gaps, generating and storing the result
    /// on first request. The prompt is built from the stored summary, or
    /// from the abstract when no usable summary exists yet.
    pub async fn gaps(&self, id: i64) -> Result<GapsReport, AnalysisError> {
        let paper = self.fetch(id)?;
        if paper.has_gaps() {
            tracing::debug!(id, "gap analysis already stored");
            return Ok(GapsReport {
                gaps: paper.gaps.unwrap_or_default(),
                future_work: paper.future_work.unwrap_or_default(),
            });
        }

        // Gap prompts decode line breaks only; nbsp markers pass through.
        let source = match paper.summary.as_deref() {
            Some(summary) if !summary.is_empty() => summary.replace(LINE_BREAK, "\n"),
            _ => paper.abstract_text.replace(LINE_BREAK, "\n"),
        };
        let request =
            GenerationRequest::new(gaps_prompt(&source)).with_temperature(GAPS_TEMPERATURE);
        let response = self.generator.generate(&request).await?;
        let (gaps, future_work) = split_future_work(&encode_response(&response));
        self.store.set_gaps(id, &gaps, &future_work)?;
        tracing::debug!(id, generator = self.generator.name(), "stored gap analysis");
        Ok(GapsReport { gaps, future_work })
    }

    /// Compare two papers, generating any missing summaries first. Only the
    /// summaries are stored; the comparison itself is regenerated on every
    /// call.
    pub async fn compare(&self, first_id: i64, second_id: i64) -> Result<String, AnalysisError> {
        let first = self.ensure_summary(first_id).await?;
        let second = self.ensure_summary(second_id).await?;

        let request = GenerationRequest::new(compare_prompt(&first, &second));
        let response = self.generator.generate(&request).await?;
        Ok(encode_response(&response))
    }

    fn fetch(&self, id: i64) -> Result<Paper, AnalysisError> {
        self.store.get(id)?.ok_or(AnalysisError::PaperNotFound(id))
    }

    /// Fetch a paper and make sure it carries a non-empty summary,
    /// generating and storing the summary/key-findings pair if needed.
    async fn ensure_summary(&self, id: i64) -> Result<Paper, AnalysisError> {
        let mut paper = self.fetch(id)?;
        if paper.has_summary() {
            tracing::debug!(id, "summary already stored");
            return Ok(paper);
        }

        let decoded = paper
            .full_text
            .replace(LINE_BREAK, "\n")
            .replace(NBSP_PAIR, "  ");
        let request =
            GenerationRequest::new(summary_prompt(&decoded)).with_temperature(SUMMARY_TEMPERATURE);
        let summary = encode_response(&self.generator.generate(&request).await?);

        // Key findings are extracted from the summary as stored, markers
        // included.
        let findings_request = GenerationRequest::new(findings_prompt(&summary));
        let key_findings = encode_response(&self.generator.generate(&findings_request).await?);

        self.store.set_summary(id, &summary, &key_findings)?;
        tracing::debug!(
            id,
            generator = self.generator.name(),
            "stored summary and key findings"
        );
        paper.summary = Some(summary);
        paper.key_findings = Some(key_findings);
        Ok(paper)
    }
}

fn summary_prompt(text: &str) -> String {
    // The input cap applies to the flattened text, not the stored form.
    let flattened = text.replace(LINE_BREAK, "\n").replace(NBSP_PAIR, " ");
    format!(
        "Summarize this AI/CS research paper concisely (150-200 words).\n\
         Structure as:\n\
         - Main Contributions: [bullet points]\n\
         - Methodology: [brief description]\n\
         - Key Results: [bullet points]\n\
         Focus on innovations and implications.\n\
         Paper text: {}",
        truncate_chars(&flattened, SUMMARY_INPUT_LIMIT)
    )
}

fn findings_prompt(summary: &str) -> String {
    format!(
        "Extract 3-5 key findings and contributions as bullet points from this summary.\n\
         Summary: {summary}"
    )
}

fn gaps_prompt(summary: &str) -> String {
    format!(
        "Analyze this AI/CS paper summary for research gaps.\n\
         Structure as:\n\
         - Limitations: [bullet points]\n\
         - Future Work: [3-5 specific suggestions]\n\
         - Unexplored Areas: [opportunities]\n\
         Be realistic.\n\
         Summary: {summary}"
    )
}

fn compare_prompt(first: &Paper, second: &Paper) -> String {
    format!(
        "Compare these two AI/CS papers for gaps and synergies.\n\
         Paper 1 ({}): Summary - {}\n\
         Paper 2 ({}): Summary - {}\n\
         Output:\n\
         - Similarities: [bullets]\n\
         - Differences/Gaps: [bullets with opportunities]\n\
         - Suggested Joint Future Work: [3 ideas]",
        first.title,
        summary_excerpt(first),
        second.title,
        summary_excerpt(second),
    )
}

/// Decoded summary excerpt for compare prompts, capped at
/// [`COMPARE_SUMMARY_LIMIT`] characters.
fn summary_excerpt(paper: &Paper) -> String {
    let decoded = paper
        .summary
        .as_deref()
        .unwrap_or_default()
        .replace(LINE_BREAK, "\n");
    truncate_chars(&decoded, COMPARE_SUMMARY_LIMIT).to_string()
}

fn encode_response(response: &str) -> String {
    response.replace('\n', LINE_BREAK)
}

/// Split a gap analysis at the first [`FUTURE_WORK_MARKER`]. The part
/// before the marker is kept verbatim; the part after is trimmed. Without
/// a marker the whole text becomes the gaps and the future work falls back
/// to [`DEFAULT_FUTURE_WORK`].
fn split_future_work(gaps_text: &str) -> (String, String) {
    match gaps_text.split_once(FUTURE_WORK_MARKER) {
        Some((gaps, future_work)) => (gaps.to_string(), future_work.trim().to_string()),
        None => (gaps_text.to_string(), DEFAULT_FUTURE_WORK.to_string()),
    }
}

/// Cut `text` to at most `max_chars` characters (not bytes).
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
