//! Index registry client.
//!
//! Thin request/response wrappers over the backend's `/api/upload` router:
//! listing knowledge indexes, selecting the active set, querying the current
//! selection, probing liveness, and uploading documents for extraction.
//!
//! No local caching — the backend is the sole source of truth for the
//! current selection, and no reconciliation is attempted against selection
//! changes made by other clients. All operations are plain request/response
//! pairs with no retry.

use anyhow::{bail, Context, Result};
use reqwest::multipart;
use serde::Deserialize;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::models::IndexDescriptor;

/// Liveness probes give up after this long; every other call waits
/// unbounded (uploads may sit behind slow backend-side OCR).
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Response of `GET /api/upload/indexes`.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexList {
    pub indexes: Vec<IndexDescriptor>,
    #[serde(default)]
    pub current_index: String,
}

/// Response of `POST /api/upload/indexes/select`.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectReply {
    #[serde(default)]
    pub message: String,
    pub current_index: String,
}

/// Response of `POST /api/upload/indexes/select-multiple`.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiSelectReply {
    #[serde(default)]
    pub message: String,
    pub selected_indexes: Vec<String>,
}

/// Response of `GET /api/upload/indexes/current`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentSelection {
    #[serde(default)]
    pub current_index: String,
    #[serde(default)]
    pub selected_indexes: Vec<String>,
}

/// Response of `POST /api/upload/upload`. Only `extracted_text` matters to
/// the ingestion pipeline; the rest is advisory.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReply {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub doc_id: String,
    pub extracted_text: Option<String>,
}

/// Outcome of a liveness probe. Never an `Err` — failures are folded into
/// the `error` field so callers can render a status line unconditionally.
#[derive(Debug, Clone)]
pub struct Health {
    pub connected: bool,
    pub status: Option<String>,
    pub error: Option<String>,
}

/// Client for the backend's index registry and upload endpoints.
pub struct Registry {
    client: reqwest::Client,
    base_url: String,
}

impl Registry {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// List all available indexes plus the backend's notion of "current".
    pub async fn list_indexes(&self) -> Result<IndexList> {
        let url = format!("{}/api/upload/indexes", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("index listing request failed: {}", url))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("index listing failed: HTTP {}", status.as_u16());
        }

        resp.json().await.context("invalid index listing response")
    }

    /// Select a single index as current.
    pub async fn select_index(&self, name: &str) -> Result<SelectReply> {
        let url = format!("{}/api/upload/indexes/select", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "index_name": name }))
            .send()
            .await
            .context("index select request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("index select failed: HTTP {}", status.as_u16());
        }

        resp.json().await.context("invalid index select response")
    }

    /// Replace the server-side selection with `names`. Not additive.
    pub async fn select_multiple(&self, names: &[String]) -> Result<MultiSelectReply> {
        let url = format!("{}/api/upload/indexes/select-multiple", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "index_names": names }))
            .send()
            .await
            .context("multi-select request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("index multi-select failed: HTTP {}", status.as_u16());
        }

        resp.json().await.context("invalid multi-select response")
    }

    /// Query the backend's current single index and full selected set.
    pub async fn current_selection(&self) -> Result<CurrentSelection> {
        let url = format!("{}/api/upload/indexes/current", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("current-selection request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("current-selection query failed: HTTP {}", status.as_u16());
        }

        resp.json()
            .await
            .context("invalid current-selection response")
    }

    /// Upload raw document bytes for backend-side text extraction.
    ///
    /// `index_names` rides along as a query parameter so the backend indexes
    /// the document into the active partitions. An empty slice omits it.
    pub async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
        index_names: &[String],
    ) -> Result<UploadReply> {
        let url = format!("{}/api/upload/upload", self.base_url);

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .with_context(|| format!("invalid MIME type: {}", mime_type))?;
        let form = multipart::Form::new().part("file", part);

        let mut request = self.client.post(&url).multipart(form);
        if !index_names.is_empty() {
            request = request.query(&[("index_names", index_names.join(","))]);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("upload request failed: {}", file_name))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(file_name, body = %body, "upload rejected");
            bail!("Upload failed: {}", status.as_u16());
        }

        resp.json().await.context("invalid upload response")
    }

    /// Probe backend liveness. Captures every failure mode — refused
    /// connection, timeout, non-2xx, bad body — into the result.
    pub async fn check_health(&self) -> Health {
        let url = format!("{}/api/health", self.base_url);

        #[derive(Deserialize)]
        struct HealthBody {
            status: Option<String>,
        }

        match self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    match resp.json::<HealthBody>().await {
                        Ok(body) => Health {
                            connected: true,
                            status: body.status,
                            error: None,
                        },
                        Err(e) => Health {
                            connected: false,
                            status: None,
                            error: Some(e.to_string()),
                        },
                    }
                } else {
                    Health {
                        connected: false,
                        status: None,
                        error: Some(format!("HTTP {}", status.as_u16())),
                    }
                }
            }
            Err(e) => Health {
                connected: false,
                status: None,
                error: Some(e.to_string()),
            },
        }
    }
}
