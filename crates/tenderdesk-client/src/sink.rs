//! Submission sink
//!
//! Two write endpoints: one for the plain values map, one for base64
//! attachments. Values always go first; attachments only follow when the
//! map is non-empty and the values request succeeded.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::config::ClientConfig;
use crate::provider::parse_base;
use crate::{ClientError, Result};

/// Body of the values request.
#[derive(Clone, Debug, Serialize)]
pub struct ValuesRequest {
    #[serde(rename = "menuId")]
    pub menu_id: u32,
    #[serde(rename = "ActivityId")]
    pub activity_id: String,
    #[serde(rename = "LatLong")]
    pub lat_long: String,
    #[serde(rename = "Draft")]
    pub draft: u8,
    #[serde(rename = "TaskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u32>,
    pub data: BTreeMap<String, Option<String>>,
}

/// Body of the attachments request.
#[derive(Clone, Debug, Serialize)]
pub struct AttachmentsRequest {
    #[serde(rename = "menuId")]
    pub menu_id: u32,
    #[serde(rename = "ActivityId")]
    pub activity_id: String,
    #[serde(rename = "LatLong")]
    pub lat_long: String,
    pub data: BTreeMap<String, String>,
}

/// Write side of the form API.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit_values(&self, request: &ValuesRequest) -> Result<()>;
    async fn submit_attachments(&self, request: &AttachmentsRequest) -> Result<()>;
}

/// HTTP submission sink over the PHP endpoints.
pub struct HttpSubmissionSink {
    http: reqwest::Client,
    base: Url,
}

impl HttpSubmissionSink {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Self::with_client(http, &config.api_base_url)
    }

    pub fn with_client(http: reqwest::Client, base: &str) -> Result<Self> {
        Ok(Self {
            http,
            base: parse_base(base)?,
        })
    }

    async fn post<B: Serialize>(&self, name: &str, body: &B) -> Result<()> {
        let url = self.base.join(name).expect("static endpoint name");
        tracing::debug!(%url, "posting submission request");
        self.http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Submission(e.to_string()))?
            .error_for_status()
            .map_err(|e| ClientError::Submission(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SubmissionSink for HttpSubmissionSink {
    async fn submit_values(&self, request: &ValuesRequest) -> Result<()> {
        self.post("add_transaction.php", request).await
    }

    async fn submit_attachments(&self, request: &AttachmentsRequest) -> Result<()> {
        self.post("add_image.php", request).await
    }
}
