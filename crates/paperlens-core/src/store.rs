//! SQLite-backed persistence for ingested papers.
//!
//! A single `papers` table holds the extracted metadata plus the analysis
//! columns filled in lazily by [`crate::analysis::Analyzer`]. Text columns
//! store the encoded form produced by extraction (`<br>` and `&nbsp;&nbsp;`
//! markers included); nothing is re-encoded on read.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::{Paper, PaperMetadata};

/// Errors from the paper store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A search result row: just enough to identify and list the paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    pub authors: String,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS papers (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT NOT NULL,
    authors      TEXT NOT NULL,
    abstract     TEXT NOT NULL,
    full_text    TEXT NOT NULL,
    summary      TEXT,
    key_findings TEXT,
    gaps         TEXT,
    future_work  TEXT,
    pdf_path     TEXT NOT NULL
);";

/// SQLite-backed store for papers and their cached analyses.
///
/// The connection is serialized behind a mutex; SQLite itself runs with
/// `NO_MUTEX` since the connection is never handed to more than one thread
/// at a time.
pub struct PaperStore {
    conn: Mutex<Connection>,
}

impl PaperStore {
    /// Open (or create) a store at `path`, creating parent directories as
    /// needed. Applies WAL mode and standard pragmas.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        // parent() is Some("") for bare filenames like "papers.db".
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(SCHEMA)?;
        tracing::info!(path = %path.display(), "opened paper store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (nothing survives drop). Used by tests and
    /// one-off runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // A poisoned lock only means another thread panicked mid-query; the
    // connection itself is still usable.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a newly extracted paper. Returns the assigned id.
    pub fn insert(&self, meta: &PaperMetadata, pdf_path: &str) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO papers (title, authors, abstract, full_text, pdf_path)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                meta.title,
                meta.authors,
                meta.abstract_text,
                meta.full_text,
                pdf_path
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!(id, title = %meta.title, "stored paper");
        Ok(id)
    }

    /// Fetch a paper by id. `Ok(None)` if no such row exists.
    pub fn get(&self, id: i64) -> Result<Option<Paper>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(
            "SELECT id, title, authors, abstract, full_text,
                    summary, key_findings, gaps, future_work, pdf_path
             FROM papers WHERE id = ?1",
        )?;
        let paper = stmt
            .query_row(params![id], |row| {
                Ok(Paper {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    authors: row.get(2)?,
                    abstract_text: row.get(3)?,
                    full_text: row.get(4)?,
                    summary: row.get(5)?,
                    key_findings: row.get(6)?,
                    gaps: row.get(7)?,
                    future_work: row.get(8)?,
                    pdf_path: row.get(9)?,
                })
            })
            .optional()?;
        Ok(paper)
    }

    /// Store the generated summary and key findings for a paper.
    pub fn set_summary(
        &self,
        id: i64,
        summary: &str,
        key_findings: &str,
    ) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE papers SET summary = ?1, key_findings = ?2 WHERE id = ?3",
            params![summary, key_findings, id],
        )?;
        Ok(())
    }

    /// Store the generated gap analysis and future-work text for a paper.
    pub fn set_gaps(&self, id: i64, gaps: &str, future_work: &str) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE papers SET gaps = ?1, future_work = ?2 WHERE id = ?3",
            params![gaps, future_work, id],
        )?;
        Ok(())
    }

    /// Case-insensitive substring search over title, summary, and full text,
    /// optionally narrowed to papers whose summary also mentions `area`.
    ///
    /// Rows whose summary is still NULL can match `query` through their
    /// title or full text, but never pass the `area` filter.
    pub fn search(&self, query: &str, area: Option<&str>) -> Result<Vec<SearchHit>, StoreError> {
        let conn = self.conn();
        let hits = match area {
            Some(area) => {
                let mut stmt = conn.prepare_cached(
                    "SELECT id, title, authors FROM papers
                     WHERE (lower(title) LIKE '%' || lower(?1) || '%'
                         OR lower(summary) LIKE '%' || lower(?1) || '%'
                         OR lower(full_text) LIKE '%' || lower(?1) || '%')
                       AND lower(summary) LIKE '%' || lower(?2) || '%'
                     ORDER BY id",
                )?;
                let rows = stmt.query_map(params![query, area], hit_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare_cached(
                    "SELECT id, title, authors FROM papers
                     WHERE lower(title) LIKE '%' || lower(?1) || '%'
                        OR lower(summary) LIKE '%' || lower(?1) || '%'
                        OR lower(full_text) LIKE '%' || lower(?1) || '%'
                     ORDER BY id",
                )?;
                let rows = stmt.query_map(params![query], hit_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(hits)
    }

    /// Number of stored papers.
    pub fn count(&self) -> Result<usize, StoreError> {
        let n: usize = self
            .conn()
            .query_row("SELECT COUNT(*) FROM papers", [], |row| row.get(0))?;
        Ok(n)
    }
}

fn hit_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SearchHit> {
    Ok(SearchHit {
        id: row.get(0)?,
        title: row.get(1)?,
        authors: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn sample_meta() -> PaperMetadata {
        PaperMetadata {
            title: "Attention Is All You Need".to_string(),
            authors: "Ashish Vaswani1, Noam Shazeer2".to_string(),
            abstract_text: "We propose the Transformer.".to_string(),
            full_text: "Attention Is All You Need<br>Ashish Vaswani1, Noam Shazeer2<br>Abstract<br>We propose the Transformer.<br>1 Introduction<br>Sequence transduction models.".to_string(),
        }
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let store = PaperStore::open_in_memory().unwrap();
        let first = store.insert(&sample_meta(), "uploads/a.pdf").unwrap();
        let second = store.insert(&sample_meta(), "uploads/b.pdf").unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn roundtrip_preserves_encoded_text() {
        let store = PaperStore::open_in_memory().unwrap();
        let meta = PaperMetadata {
            title: "Spacing Study".to_string(),
            authors: "Ada Lovelace1".to_string(),
            abstract_text: "Double&nbsp;&nbsp;spaced abstract.".to_string(),
            full_text: "Spacing Study<br>line&nbsp;&nbsp;two<br>end".to_string(),
        };
        let id = store.insert(&meta, "uploads/spacing.pdf").unwrap();

        let paper = store.get(id).unwrap().unwrap();
        assert_eq!(paper.id, id);
        assert_eq!(paper.title, meta.title);
        assert_eq!(paper.authors, meta.authors);
        assert_eq!(paper.abstract_text, meta.abstract_text);
        assert_eq!(paper.full_text, meta.full_text);
        assert_eq!(paper.pdf_path, "uploads/spacing.pdf");
        assert!(paper.summary.is_none());
        assert!(paper.key_findings.is_none());
        assert!(paper.gaps.is_none());
        assert!(paper.future_work.is_none());
        assert!(!paper.has_summary());
        assert!(!paper.has_gaps());
    }

    #[test]
    fn get_missing_returns_none() {
        let store = PaperStore::open_in_memory().unwrap();
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn set_summary_fills_both_columns() {
        let store = PaperStore::open_in_memory().unwrap();
        let id = store.insert(&sample_meta(), "uploads/a.pdf").unwrap();
        store
            .set_summary(id, "A transformer paper.", "- Attention suffices")
            .unwrap();

        let paper = store.get(id).unwrap().unwrap();
        assert_eq!(paper.summary.as_deref(), Some("A transformer paper."));
        assert_eq!(paper.key_findings.as_deref(), Some("- Attention suffices"));
        assert!(paper.has_summary());
        assert!(!paper.has_gaps());
    }

    #[test]
    fn set_gaps_fills_both_columns() {
        let store = PaperStore::open_in_memory().unwrap();
        let id = store.insert(&sample_meta(), "uploads/a.pdf").unwrap();
        store
            .set_gaps(id, "No multilingual eval.", "Future Work: broader corpora")
            .unwrap();

        let paper = store.get(id).unwrap().unwrap();
        assert_eq!(paper.gaps.as_deref(), Some("No multilingual eval."));
        assert_eq!(
            paper.future_work.as_deref(),
            Some("Future Work: broader corpora")
        );
        assert!(paper.has_gaps());
    }

    #[test]
    fn search_matches_title_case_insensitively() {
        let store = PaperStore::open_in_memory().unwrap();
        let id = store.insert(&sample_meta(), "uploads/a.pdf").unwrap();

        let hits = store.search("ATTENTION", None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
        assert_eq!(hits[0].title, "Attention Is All You Need");
        assert_eq!(hits[0].authors, "Ashish Vaswani1, Noam Shazeer2");

        assert!(store.search("quantum", None).unwrap().is_empty());
    }

    #[test]
    fn search_matches_summary_and_full_text() {
        let store = PaperStore::open_in_memory().unwrap();
        let id = store.insert(&sample_meta(), "uploads/a.pdf").unwrap();

        // "transduction" only appears in the full text.
        let hits = store.search("transduction", None).unwrap();
        assert_eq!(hits.len(), 1);

        // "recurrence" only appears once a summary is stored.
        assert!(store.search("recurrence", None).unwrap().is_empty());
        store
            .set_summary(id, "Replaces recurrence with attention.", "- findings")
            .unwrap();
        assert_eq!(store.search("recurrence", None).unwrap().len(), 1);
    }

    #[test]
    fn search_empty_query_returns_all() {
        let store = PaperStore::open_in_memory().unwrap();
        store.insert(&sample_meta(), "uploads/a.pdf").unwrap();
        store.insert(&sample_meta(), "uploads/b.pdf").unwrap();

        let hits = store.search("", None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[1].id, 2);
    }

    #[test]
    fn search_area_requires_summary_match() {
        let store = PaperStore::open_in_memory().unwrap();
        let summarized = store.insert(&sample_meta(), "uploads/a.pdf").unwrap();
        let unsummarized = store.insert(&sample_meta(), "uploads/b.pdf").unwrap();
        store
            .set_summary(summarized, "A machine translation study.", "- findings")
            .unwrap();

        // Both titles match the query, but only the summarized paper passes
        // the area filter; the NULL summary never matches.
        let hits = store.search("attention", Some("translation")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, summarized);

        let hits = store.search("attention", Some("robotics")).unwrap();
        assert!(hits.is_empty());

        let hits = store.search("attention", None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, summarized);
        assert_eq!(hits[1].id, unsummarized);
    }

    // ── File-backed store tests ───────────────────────────────────────

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_db_path() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "paperlens_test_store_{}_{}",
            std::process::id(),
            id,
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("papers.db")
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let path = temp_db_path();
        let _ = std::fs::remove_file(&path);

        let id = {
            let store = PaperStore::open(&path).unwrap();
            let id = store.insert(&sample_meta(), "uploads/a.pdf").unwrap();
            store.set_summary(id, "Persisted summary.", "- one").unwrap();
            id
        };

        let store = PaperStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        let paper = store.get(id).unwrap().unwrap();
        assert_eq!(paper.title, "Attention Is All You Need");
        assert_eq!(paper.summary.as_deref(), Some("Persisted summary."));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn open_creates_missing_parent_dirs() {
        let base = std::env::temp_dir().join(format!(
            "paperlens_test_store_nested_{}",
            std::process::id(),
        ));
        let _ = std::fs::remove_dir_all(&base);
        let path = base.join("deep").join("papers.db");

        let store = PaperStore::open(&path).unwrap();
        store.insert(&sample_meta(), "uploads/a.pdf").unwrap();
        assert_eq!(store.count().unwrap(), 1);

        drop(store);
        let _ = std::fs::remove_dir_all(&base);
    }
}
