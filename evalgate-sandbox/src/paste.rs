//! Paste store fallback for output that cannot be shown inline

use crate::config::PasteConfig;
use crate::error::{GatewayError, GatewayResult, PasteError};
use crate::types::PasteLink;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

/// External content store
#[async_trait]
pub trait PasteStore: Send + Sync {
    /// Store `text` and return the URL it can be retrieved from
    async fn upload(&self, text: &str) -> Result<Url, PasteError>;

    /// Get store name
    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct PasteResponse {
    key: Option<String>,
}

/// Hastebin-style store: `POST /documents` answers `{"key": ...}`
pub struct HttpPasteStore {
    client: Client,
    base: Url,
    documents_url: Url,
}

impl HttpPasteStore {
    pub fn new(config: &PasteConfig) -> GatewayResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Config(format!("paste client: {}", e)))?;
        Self::with_client(client, config.url.clone())
    }

    pub fn with_client(client: Client, base: Url) -> GatewayResult<Self> {
        let documents_url = crate::config::endpoint(&base, "documents")?;
        Ok(Self {
            client,
            base,
            documents_url,
        })
    }

    fn document_url(&self, key: &str) -> Result<Url, PasteError> {
        Ok(crate::config::endpoint(&self.base, key)?)
    }
}

#[async_trait]
impl PasteStore for HttpPasteStore {
    async fn upload(&self, text: &str) -> Result<Url, PasteError> {
        let response = self
            .client
            .post(self.documents_url.clone())
            .body(text.to_owned())
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let key = serde_json::from_str::<PasteResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.key)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| PasteError::MissingKey(body.chars().take(200).collect()))?;

        self.document_url(&key)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Uploads full output when it is too long or suspicious to display.
///
/// Enforces the upload ceiling and turns store failures into log lines: a
/// failed upload only means the rendered output carries no link.
#[derive(Clone)]
pub struct PasteFallback {
    store: Arc<dyn PasteStore>,
    max_chars: usize,
}

impl PasteFallback {
    pub fn new(store: Arc<dyn PasteStore>, max_chars: usize) -> Self {
        Self { store, max_chars }
    }

    pub async fn persist(&self, text: &str) -> Option<PasteLink> {
        let chars = text.chars().count();
        if chars > self.max_chars {
            tracing::info!(chars, max_chars = self.max_chars, "Output too large to upload");
            return Some(PasteLink::TooLarge);
        }

        match self.store.upload(text).await {
            Ok(url) => {
                tracing::debug!(store = self.store.name(), url = %url, "Uploaded full output");
                Some(PasteLink::Url(url))
            }
            Err(e) => {
                tracing::warn!(store = self.store.name(), error = %e, "Paste upload failed");
                None
            }
        }
    }
}
