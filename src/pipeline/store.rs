//! Persistence boundaries: reports, redacted blobs and document status.
//!
//! The in-memory implementations back tests and single-process hosts; the
//! directory-backed ones back the CLI.

use crate::error::{RedactorError, RedactorResult};
use crate::report::RedactionRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Stores and retrieves redaction records by document id.
pub trait ReportStore: Send + Sync {
    fn save(&self, record: &RedactionRecord) -> RedactorResult<()>;

    /// Fails with `NotFound` when no record exists.
    fn load_by_document_id(&self, document_id: &str) -> RedactorResult<RedactionRecord>;
}

/// Stores redacted document bytes and issues a URL for them.
pub trait BlobStore: Send + Sync {
    fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> RedactorResult<String>;
}

/// Processing status of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Redacted,
    Failed,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Redacted => "redacted",
            Self::Failed => "failed",
        })
    }
}

/// Receives status transitions for source documents.
pub trait StatusSink: Send + Sync {
    fn set_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        redacted_url: Option<&str>,
    ) -> RedactorResult<()>;
}

fn lock_poisoned() -> RedactorError {
    RedactorError::Storage {
        message: "store lock poisoned".to_string(),
        source: None,
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    records: Mutex<HashMap<String, RedactionRecord>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for InMemoryReportStore {
    fn save(&self, record: &RedactionRecord) -> RedactorResult<()> {
        self.records
            .lock()
            .map_err(|_| lock_poisoned())?
            .insert(record.document_id.clone(), record.clone());
        Ok(())
    }

    fn load_by_document_id(&self, document_id: &str) -> RedactorResult<RedactionRecord> {
        self.records
            .lock()
            .map_err(|_| lock_poisoned())?
            .get(document_id)
            .cloned()
            .ok_or_else(|| RedactorError::NotFound {
                document_id: document_id.to_string(),
            })
    }
}

/// One pretty-printed JSON file per document id.
#[derive(Debug, Clone)]
pub struct DirectoryReportStore {
    dir: PathBuf,
}

impl DirectoryReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, document_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(document_id)))
    }
}

impl ReportStore for DirectoryReportStore {
    fn save(&self, record: &RedactionRecord) -> RedactorResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| RedactorError::Io {
            path: self.dir.clone(),
            source: e,
        })?;
        let path = self.path_for(&record.document_id);
        let json = serde_json::to_vec_pretty(record)?;
        std::fs::write(&path, json).map_err(|e| RedactorError::Io { path, source: e })
    }

    fn load_by_document_id(&self, document_id: &str) -> RedactorResult<RedactionRecord> {
        let path = self.path_for(document_id);
        if !path.exists() {
            return Err(RedactorError::NotFound {
                document_id: document_id.to_string(),
            });
        }
        let data = std::fs::read(&path).map_err(|e| RedactorError::Io { path, source: e })?;
        Ok(serde_json::from_slice(&data)?)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under a URL previously returned by `put`.
    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        let path = url.strip_prefix("memory://")?;
        self.blobs.lock().ok()?.get(path).cloned()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> RedactorResult<String> {
        self.blobs
            .lock()
            .map_err(|_| lock_poisoned())?
            .insert(path.to_string(), bytes.to_vec());
        Ok(format!("memory://{}", path))
    }
}

/// Writes blobs beneath a root directory and returns `file://` URLs.
#[derive(Debug, Clone)]
pub struct DirectoryBlobStore {
    root: PathBuf,
}

impl DirectoryBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BlobStore for DirectoryBlobStore {
    fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> RedactorResult<String> {
        let target = path
            .split('/')
            .filter(|s| !s.is_empty() && *s != "..")
            .fold(self.root.clone(), |acc, s| acc.join(sanitize(s)));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RedactorError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&target, bytes).map_err(|e| RedactorError::Io {
            path: target.clone(),
            source: e,
        })?;
        tracing::debug!(path = %target.display(), content_type, "blob stored");
        Ok(format!("file://{}", target.display()))
    }
}

/// Records every status transition and logs it.
#[derive(Debug, Default)]
pub struct StatusLog {
    entries: Mutex<Vec<(String, DocumentStatus, Option<String>)>>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest status recorded for `document_id`.
    pub fn latest(&self, document_id: &str) -> Option<(DocumentStatus, Option<String>)> {
        self.entries
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(id, _, _)| id == document_id)
            .map(|(_, status, url)| (*status, url.clone()))
    }
}

impl StatusSink for StatusLog {
    fn set_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
        redacted_url: Option<&str>,
    ) -> RedactorResult<()> {
        tracing::info!(document_id, %status, redacted_url = ?redacted_url, "document status updated");
        self.entries.lock().map_err(|_| lock_poisoned())?.push((
            document_id.to_string(),
            status,
            redacted_url.map(str::to_string),
        ));
        Ok(())
    }
}

/// Keeps ids usable as single path components.
fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RedactionReport;

    fn record(id: &str) -> RedactionRecord {
        RedactionRecord {
            document_id: id.into(),
            user_id: "u1".into(),
            template_id: "tpl".into(),
            original_url: "file:///in.docx".into(),
            original_filename: "in.docx".into(),
            redacted_url: "file:///out.docx".into(),
            redacted_filename: "in_redacted.docx".into(),
            report: RedactionReport {
                before_text: "b".into(),
                after_text: "a".into(),
                events: Vec::new(),
                total_redactions: 0,
                template_id: "tpl".into(),
            },
            prompt: None,
            ai_detected_matches: Vec::new(),
            total_previous_redactions: None,
        }
    }

    #[test]
    fn test_directory_store_round_trip_and_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryReportStore::new(dir.path());

        let err = store.load_by_document_id("doc/1").unwrap_err();
        assert!(matches!(err, RedactorError::NotFound { .. }));

        store.save(&record("doc/1")).unwrap();
        assert_eq!(store.load_by_document_id("doc/1").unwrap(), record("doc/1"));
        assert!(dir.path().join("doc_1.json").exists());
    }

    #[test]
    fn test_directory_blob_store_stays_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryBlobStore::new(dir.path());
        let url = store
            .put("u1/../redacted/a.pdf", b"data", "application/pdf")
            .unwrap();
        let expected = dir.path().join("u1").join("redacted").join("a.pdf");
        assert_eq!(url, format!("file://{}", expected.display()));
        assert_eq!(std::fs::read(expected).unwrap(), b"data");
    }

    #[test]
    fn test_status_log_latest() {
        let log = StatusLog::new();
        log.set_status("d", DocumentStatus::Pending, None).unwrap();
        log.set_status("d", DocumentStatus::Redacted, Some("memory://x"))
            .unwrap();
        assert_eq!(
            log.latest("d"),
            Some((DocumentStatus::Redacted, Some("memory://x".to_string())))
        );
        assert_eq!(log.latest("other"), None);
    }
}
