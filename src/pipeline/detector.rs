//! HTTP-backed entity and prompt detectors.
//!
//! Both post JSON to a configured endpoint. Transport failures and non-2xx
//! responses surface as `DetectorUnavailable`, which callers treat as no
//! matches.

use crate::config::DetectorConfig;
use crate::domain::{
    parse_prompt_response, Entity, EntityDetector, PatternEntityDetector, PromptDetector,
    PromptMatch,
};
use crate::error::{RedactorError, RedactorResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// The HTTP entity detector when an endpoint is configured, else the
/// built-in pattern detector.
pub fn entity_detector_from_config(
    config: &DetectorConfig,
) -> RedactorResult<Arc<dyn EntityDetector>> {
    Ok(match &config.entity_endpoint {
        Some(url) => Arc::new(HttpEntityDetector::new(url, config)?),
        None => Arc::new(PatternEntityDetector::with_builtin()),
    })
}

/// The HTTP prompt detector, if an endpoint is configured.
pub fn prompt_detector_from_config(
    config: &DetectorConfig,
) -> RedactorResult<Option<Arc<dyn PromptDetector>>> {
    config
        .prompt_endpoint
        .as_deref()
        .map(|url| -> RedactorResult<Arc<dyn PromptDetector>> {
            Ok(Arc::new(HttpPromptDetector::new(url, config)?))
        })
        .transpose()
}

#[derive(Serialize)]
struct EntityRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EntityResponse {
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Serialize)]
struct PromptRequest<'a> {
    text: &'a str,
    prompt: &'a str,
}

/// Shared blocking client posting to one endpoint.
#[derive(Debug, Clone)]
struct JsonEndpoint {
    name: &'static str,
    url: String,
    client: reqwest::blocking::Client,
}

impl JsonEndpoint {
    fn new(name: &'static str, url: &str, config: &DetectorConfig) -> RedactorResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RedactorError::BackendError {
                backend: "reqwest".to_string(),
                message: format!("failed to build {} detector client", name),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            name,
            url: url.to_string(),
            client,
        })
    }

    fn unavailable(&self, reason: impl Into<String>) -> RedactorError {
        RedactorError::DetectorUnavailable {
            detector: self.name.to_string(),
            reason: reason.into(),
        }
    }

    /// Posts `payload` and returns the raw response body.
    fn post<T: Serialize>(&self, payload: &T) -> RedactorResult<String> {
        let body = serde_json::to_vec(payload)?;
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.unavailable(format!("HTTP {}", status)));
        }
        response.text().map_err(|e| self.unavailable(e.to_string()))
    }
}

/// Named-entity service reached over HTTP.
///
/// Request: `{"text": ...}`. Response: `{"entities": [{"text", "type"}]}`.
#[derive(Debug, Clone)]
pub struct HttpEntityDetector {
    endpoint: JsonEndpoint,
}

impl HttpEntityDetector {
    pub fn new(url: &str, config: &DetectorConfig) -> RedactorResult<Self> {
        Ok(Self {
            endpoint: JsonEndpoint::new("entity", url, config)?,
        })
    }
}

impl EntityDetector for HttpEntityDetector {
    fn extract_entities(&self, text: &str) -> RedactorResult<Vec<Entity>> {
        let raw = self.endpoint.post(&EntityRequest { text })?;
        let response: EntityResponse = serde_json::from_str(&raw)
            .map_err(|e| self.endpoint.unavailable(format!("malformed response: {}", e)))?;
        tracing::debug!(entities = response.entities.len(), "entity detector replied");
        Ok(response.entities)
    }

    fn name(&self) -> &str {
        self.endpoint.name
    }
}

/// Language-model prompt service reached over HTTP.
///
/// Request: `{"text": ..., "prompt": ...}`. The reply body may be free-form;
/// a JSON object with a `matches` list is extracted from it, and an
/// unparseable reply counts as no matches.
#[derive(Debug, Clone)]
pub struct HttpPromptDetector {
    endpoint: JsonEndpoint,
}

impl HttpPromptDetector {
    pub fn new(url: &str, config: &DetectorConfig) -> RedactorResult<Self> {
        Ok(Self {
            endpoint: JsonEndpoint::new("prompt", url, config)?,
        })
    }
}

impl PromptDetector for HttpPromptDetector {
    fn find_matches(&self, text: &str, prompt: &str) -> RedactorResult<Vec<PromptMatch>> {
        let raw = self.endpoint.post(&PromptRequest { text, prompt })?;
        Ok(parse_prompt_response(&raw))
    }

    fn name(&self) -> &str {
        self.endpoint.name
    }
}
