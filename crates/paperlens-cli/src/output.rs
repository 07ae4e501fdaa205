use std::io::Write;

use owo_colors::OwoColorize;
use paperlens_core::{GapsReport, Paper, PaperMetadata, SearchHit, SummaryReport};
use paperlens_parsing::{decode_line_breaks, decode_whitespace};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the confirmation block after `add` stores a paper.
pub fn print_added(
    w: &mut dyn Write,
    id: i64,
    meta: &PaperMetadata,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "{} {}",
            format!("Added paper #{}:", id).bold().green(),
            meta.title.bold()
        )?;
    } else {
        writeln!(w, "Added paper #{}: {}", id, meta.title)?;
    }
    writeln!(w, "  Authors: {}", meta.authors)?;
    Ok(())
}

/// Print a stored paper. Derived fields appear only once populated;
/// `full` appends the decoded full text.
pub fn print_paper(
    w: &mut dyn Write,
    paper: &Paper,
    full: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", format!("Paper #{}: {}", paper.id, paper.title).bold())?;
    } else {
        writeln!(w, "Paper #{}: {}", paper.id, paper.title)?;
    }
    writeln!(w, "  Authors: {}", paper.authors)?;
    writeln!(w, "  PDF:     {}", paper.pdf_path)?;

    write_section(w, "Abstract", &decode_whitespace(&paper.abstract_text), color)?;

    if let Some(ref summary) = paper.summary
        && !summary.is_empty()
    {
        write_section(w, "Summary", &decode_line_breaks(summary), color)?;
    }
    if let Some(ref findings) = paper.key_findings
        && !findings.is_empty()
    {
        write_section(w, "Key Findings", &decode_line_breaks(findings), color)?;
    }
    if let Some(ref gaps) = paper.gaps
        && !gaps.is_empty()
    {
        write_section(w, "Research Gaps", &decode_line_breaks(gaps), color)?;
    }
    if let Some(ref future_work) = paper.future_work
        && !future_work.is_empty()
    {
        write_section(w, "Future Work", &decode_line_breaks(future_work), color)?;
    }

    if full {
        write_section(w, "Full Text", &decode_whitespace(&paper.full_text), color)?;
    }
    Ok(())
}

/// Print the summary pipeline result.
pub fn print_summary_report(
    w: &mut dyn Write,
    report: &SummaryReport,
    color: ColorMode,
) -> std::io::Result<()> {
    write_section(w, "Summary", &decode_line_breaks(&report.summary), color)?;
    write_section(
        w,
        "Key Findings",
        &decode_line_breaks(&report.key_findings),
        color,
    )?;
    Ok(())
}

/// Print the gap analysis result.
pub fn print_gaps_report(
    w: &mut dyn Write,
    report: &GapsReport,
    color: ColorMode,
) -> std::io::Result<()> {
    write_section(w, "Research Gaps", &decode_line_breaks(&report.gaps), color)?;
    write_section(
        w,
        "Future Work",
        &decode_line_breaks(&report.future_work),
        color,
    )?;
    Ok(())
}

/// Print a two-paper comparison.
pub fn print_comparison(
    w: &mut dyn Write,
    first_id: i64,
    second_id: i64,
    comparison: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    let heading = format!("Comparison of papers #{} and #{}", first_id, second_id);
    if color.enabled() {
        writeln!(w, "{}", heading.bold())?;
    } else {
        writeln!(w, "{}", heading)?;
    }
    for line in decode_line_breaks(comparison).trim().lines() {
        writeln!(w, "  {}", line)?;
    }
    Ok(())
}

/// Print search hits as an indexed list.
pub fn print_search_results(
    w: &mut dyn Write,
    hits: &[SearchHit],
    color: ColorMode,
) -> std::io::Result<()> {
    if hits.is_empty() {
        writeln!(w, "No papers matched.")?;
        return Ok(());
    }

    for hit in hits {
        if color.enabled() {
            writeln!(
                w,
                "{} {}",
                format!("[{}]", hit.id).bold().yellow(),
                hit.title
            )?;
            writeln!(w, "    {}", hit.authors.dimmed())?;
        } else {
            writeln!(w, "[{}] {}", hit.id, hit.title)?;
            writeln!(w, "    {}", hit.authors)?;
        }
    }
    writeln!(w)?;
    writeln!(w, "Total: {} papers", hits.len())?;
    Ok(())
}

fn write_section(
    w: &mut dyn Write,
    heading: &str,
    text: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", format!("{}:", heading).bold())?;
    } else {
        writeln!(w, "{}:", heading)?;
    }
    for line in text.trim().lines() {
        writeln!(w, "  {}", line)?;
    }
    Ok(())
}
