//! Document retrieval.

use crate::config::FetchConfig;
use crate::error::{RedactorError, RedactorResult};
use std::path::PathBuf;
use std::time::Duration;

/// Fetches document bytes by URL.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, url: &str) -> RedactorResult<Vec<u8>>;
}

/// Blocking HTTP(S) source. Callers own retry policy; a failed or non-2xx
/// response is a `FetchError`.
#[derive(Debug, Clone)]
pub struct HttpDocumentSource {
    client: reqwest::blocking::Client,
}

impl HttpDocumentSource {
    pub fn new(config: &FetchConfig) -> RedactorResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RedactorError::BackendError {
                backend: "reqwest".to_string(),
                message: "failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client })
    }
}

impl DocumentSource for HttpDocumentSource {
    fn fetch(&self, url: &str) -> RedactorResult<Vec<u8>> {
        let fetch_error = |reason: String| RedactorError::FetchError {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().map_err(|e| fetch_error(e.to_string()))?;
        tracing::debug!(url, bytes = bytes.len(), "document fetched");
        Ok(bytes.to_vec())
    }
}

/// Reads `file://` URLs or plain paths, optionally relative to a root.
#[derive(Debug, Clone, Default)]
pub struct LocalDocumentSource {
    root: Option<PathBuf>,
}

impl LocalDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = url.strip_prefix("file://").unwrap_or(url);
        let path = path.split('?').next().unwrap_or(path);
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => PathBuf::from(path),
        }
    }
}

impl DocumentSource for LocalDocumentSource {
    fn fetch(&self, url: &str) -> RedactorResult<Vec<u8>> {
        let path = self.resolve(url);
        std::fs::read(&path).map_err(|e| RedactorError::FetchError {
            url: url.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

/// Sends `http://` and `https://` URLs over the network and reads anything
/// else from the local filesystem.
#[derive(Debug, Clone)]
pub struct UrlDocumentSource {
    http: HttpDocumentSource,
    local: LocalDocumentSource,
}

impl UrlDocumentSource {
    pub fn new(config: &FetchConfig) -> RedactorResult<Self> {
        Ok(Self {
            http: HttpDocumentSource::new(config)?,
            local: LocalDocumentSource::new(),
        })
    }
}

impl DocumentSource for UrlDocumentSource {
    fn fetch(&self, url: &str) -> RedactorResult<Vec<u8>> {
        let scheme = url.split_once("://").map(|(s, _)| s.to_ascii_lowercase());
        match scheme.as_deref() {
            Some("http") | Some("https") => self.http.fetch(url),
            _ => self.local.fetch(url),
        }
    }
}
