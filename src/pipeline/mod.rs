//! Request flows over injected collaborators.
//!
//! Two flows are supported:
//! - rule-driven redaction of a source document, producing a fresh record;
//! - prompt-driven redaction of an already-redacted document, whose report
//!   is merged onto the stored one.
//!
//! Either flow marks the document `failed` on any fatal error and
//! `redacted` with the new location on success.

pub mod detector;
pub mod source;
pub mod store;

pub use detector::{
    entity_detector_from_config, prompt_detector_from_config, HttpEntityDetector,
    HttpPromptDetector,
};
pub use source::{DocumentSource, HttpDocumentSource, LocalDocumentSource, UrlDocumentSource};
pub use store::{
    BlobStore, DirectoryBlobStore, DirectoryReportStore, DocumentStatus, InMemoryBlobStore,
    InMemoryReportStore, ReportStore, StatusLog, StatusSink,
};

use crate::config::Config;
use crate::document::Document;
use crate::domain::{
    rules_from_prompt_matches, PromptDetector, PromptMatch, RedactionRule, PROMPT_TEMPLATE_ID,
};
use crate::error::{RedactorError, RedactorResult};
use crate::redaction::{RedactionOutcome, RedactionService};
use crate::report::RedactionRecord;
use std::sync::Arc;

/// Rule-driven redaction request.
#[derive(Debug, Clone)]
pub struct RedactRequest {
    pub document_id: String,
    pub template_id: String,
    pub user_id: String,
    pub document_url: String,
    pub rules: Vec<RedactionRule>,
}

/// Prompt-driven follow-up redaction request.
#[derive(Debug, Clone)]
pub struct PromptRedactRequest {
    pub document_id: String,
    pub user_id: String,
    pub prompt: String,
}

/// Orchestrates fetch → redact → upload → persist → status.
pub struct RedactionPipeline {
    service: RedactionService,
    source: Arc<dyn DocumentSource>,
    blobs: Arc<dyn BlobStore>,
    reports: Arc<dyn ReportStore>,
    status: Arc<dyn StatusSink>,
    prompt_detector: Option<Arc<dyn PromptDetector>>,
}

impl RedactionPipeline {
    pub fn new(
        service: RedactionService,
        source: Arc<dyn DocumentSource>,
        blobs: Arc<dyn BlobStore>,
        reports: Arc<dyn ReportStore>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            service,
            source,
            blobs,
            reports,
            status,
            prompt_detector: None,
        }
    }

    /// Wires the pipeline from configuration: documents fetched by URL,
    /// blobs and reports under the `[storage]` directories, detectors from
    /// `[detector]`, and status transitions logged.
    pub fn from_config(config: &Config) -> RedactorResult<Self> {
        let service = RedactionService::from_config(config)
            .with_entity_detector(entity_detector_from_config(&config.detector)?);
        let pipeline = Self::new(
            service,
            Arc::new(UrlDocumentSource::new(&config.fetch)?),
            Arc::new(DirectoryBlobStore::new(config.storage.blobs_dir.clone())),
            Arc::new(DirectoryReportStore::new(config.storage.reports_dir.clone())),
            Arc::new(StatusLog::new()),
        );
        Ok(match prompt_detector_from_config(&config.detector)? {
            Some(detector) => pipeline.with_prompt_detector(detector),
            None => pipeline,
        })
    }

    pub fn with_prompt_detector(mut self, detector: Arc<dyn PromptDetector>) -> Self {
        self.prompt_detector = Some(detector);
        self
    }

    pub fn service(&self) -> &RedactionService {
        &self.service
    }

    /// Redacts a source document with a template's rules.
    pub fn redact_document(&self, request: &RedactRequest) -> RedactorResult<RedactionRecord> {
        let result = self.run_redact(request);
        self.finish(&request.document_id, result)
    }

    /// Re-opens the latest redacted document and redacts what the prompt
    /// detector finds, appending to the stored report.
    pub fn redact_with_prompt(
        &self,
        request: &PromptRedactRequest,
    ) -> RedactorResult<RedactionRecord> {
        let result = self.run_prompt(request);
        self.finish(&request.document_id, result)
    }

    fn run_redact(&self, request: &RedactRequest) -> RedactorResult<RedactionRecord> {
        let bytes = self.source.fetch(&request.document_url)?;
        let document = Document::from_bytes(bytes, Some(&request.document_url))?;
        let outcome = self
            .service
            .redact(&document, &request.rules, &request.template_id)?;

        let original_filename = file_name_from_url(&request.document_url);
        let redacted_url = self.upload(&request.user_id, &original_filename, &outcome)?;

        let record = RedactionRecord {
            document_id: request.document_id.clone(),
            user_id: request.user_id.clone(),
            template_id: request.template_id.clone(),
            original_url: request.document_url.clone(),
            redacted_filename: redacted_file_name(&original_filename),
            original_filename,
            redacted_url,
            report: outcome.report,
            prompt: None,
            ai_detected_matches: Vec::new(),
            total_previous_redactions: None,
        };
        self.reports.save(&record)?;
        Ok(record)
    }

    fn run_prompt(&self, request: &PromptRedactRequest) -> RedactorResult<RedactionRecord> {
        let prior = self.reports.load_by_document_id(&request.document_id)?;
        if prior.redacted_url.is_empty() {
            return Err(RedactorError::Storage {
                message: format!(
                    "no redacted document recorded for '{}'",
                    request.document_id
                ),
                source: None,
            });
        }

        let bytes = self.source.fetch(&prior.redacted_url)?;
        let document = Document::from_bytes(bytes, Some(&prior.redacted_url))?;
        let text = self.service.extract_text(&document)?;

        let matches = self.detect(&text, &request.prompt);
        let rules = rules_from_prompt_matches(&matches);
        let outcome = self.service.redact(&document, &rules, PROMPT_TEMPLATE_ID)?;

        let original_filename = file_name_from_url(&prior.redacted_url);
        let redacted_url = self.upload(&request.user_id, &original_filename, &outcome)?;

        let record = prior.merged_with(
            request.user_id.clone(),
            outcome.report,
            redacted_url,
            Some(request.prompt.clone()),
            matches,
        );
        self.reports.save(&record)?;
        Ok(record)
    }

    /// Prompt detector output, degraded to empty on failure.
    fn detect(&self, text: &str, prompt: &str) -> Vec<PromptMatch> {
        let Some(detector) = &self.prompt_detector else {
            tracing::warn!("prompt redaction requested but no prompt detector is configured");
            return Vec::new();
        };
        match detector.find_matches(text, prompt) {
            Ok(matches) => matches
                .into_iter()
                .filter(|m| !m.text.trim().is_empty())
                .collect(),
            Err(err) => {
                tracing::warn!(
                    detector = detector.name(),
                    error = %err,
                    "prompt detector unavailable, treating as no matches"
                );
                Vec::new()
            }
        }
    }

    fn upload(
        &self,
        user_id: &str,
        original_filename: &str,
        outcome: &RedactionOutcome,
    ) -> RedactorResult<String> {
        let path = format!("{}/redacted/{}", user_id, original_filename);
        self.blobs.put(
            &path,
            outcome.document.bytes(),
            outcome.document.format().content_type(),
        )
    }

    fn finish(
        &self,
        document_id: &str,
        result: RedactorResult<RedactionRecord>,
    ) -> RedactorResult<RedactionRecord> {
        match result {
            Ok(record) => {
                self.status.set_status(
                    document_id,
                    DocumentStatus::Redacted,
                    Some(&record.redacted_url),
                )?;
                Ok(record)
            }
            Err(err) => {
                tracing::error!(document_id, error = %err, "redaction request failed");
                if let Err(status_err) =
                    self.status
                        .set_status(document_id, DocumentStatus::Failed, None)
                {
                    tracing::warn!(document_id, error = %status_err, "failed to record failure status");
                }
                Err(err)
            }
        }
    }
}

/// Last path segment of a URL, without query string or encoded folders.
pub fn file_name_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url).trim();
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment.rsplit("%2F").next().unwrap_or(segment).to_string()
}

/// `report.pdf` → `report_redacted.pdf`
pub fn redacted_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_redacted.{}", stem, ext),
        _ => format!("{}_redacted", file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://host/v0/b/o/user%2Fdocs%2Fcontract.pdf?alt=media"),
            "contract.pdf"
        );
        assert_eq!(file_name_from_url("file:///tmp/a.docx"), "a.docx");
    }

    #[test]
    fn test_redacted_file_name() {
        assert_eq!(redacted_file_name("contract.pdf"), "contract_redacted.pdf");
        assert_eq!(redacted_file_name("archive.v2.docx"), "archive.v2_redacted.docx");
        assert_eq!(redacted_file_name("README"), "README_redacted");
    }
}
