//! Schema provider
//!
//! The server describes a form through three read endpoints, each wrapped
//! in a `{ success, data }` envelope: the menu list (page layout per
//! form), the checkpoint list and the type list. All three must succeed
//! before anything renders; a partial schema is never displayed.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use tenderdesk_forms::{CheckpointRecord, MenuRecord, TypeRecord};

use crate::config::ClientConfig;
use crate::{ClientError, Result};

/// Standard `{ success, data, message }` response envelope.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning `success: false` or a missing payload
    /// into the envelope's message.
    pub fn into_data(self) -> std::result::Result<T, String> {
        if !self.success {
            return Err(self
                .message
                .unwrap_or_else(|| "server reported failure".into()));
        }
        self.data.ok_or_else(|| "response carried no data".into())
    }
}

/// Which menu row to load a form from. Call sites address forms either by
/// position in the menu list or by server-side menu id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuSelector {
    Index(usize),
    Id(u32),
}

impl MenuSelector {
    /// Pick the menu row out of the fetched list. Id selection trusts the
    /// server-side filter and falls back to the first row.
    pub fn select<'a>(&self, menus: &'a [MenuRecord]) -> Option<&'a MenuRecord> {
        match self {
            MenuSelector::Index(index) => menus.get(*index),
            MenuSelector::Id(id) => menus
                .iter()
                .find(|m| m.menu_id == Some(*id))
                .or_else(|| menus.first()),
        }
    }

    /// Wire value of the `menuId` submission field.
    pub fn menu_id(&self, menu: &MenuRecord) -> u32 {
        match self {
            MenuSelector::Id(id) => *id,
            MenuSelector::Index(_) => menu.menu_id.unwrap_or(1),
        }
    }
}

/// Read side of the form API.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn fetch_menus(&self, selector: &MenuSelector) -> Result<Vec<MenuRecord>>;
    async fn fetch_checkpoints(&self) -> Result<Vec<CheckpointRecord>>;
    async fn fetch_types(&self) -> Result<Vec<TypeRecord>>;
}

/// HTTP schema provider over the PHP endpoints.
pub struct HttpSchemaProvider {
    http: reqwest::Client,
    base: Url,
}

impl HttpSchemaProvider {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self::with_client(http, &config.api_base_url)?)
    }

    pub fn with_client(http: reqwest::Client, base: &str) -> Result<Self> {
        Ok(Self {
            http,
            base: parse_base(base)?,
        })
    }

    fn endpoint(&self, name: &str) -> Url {
        // The base is normalized with a trailing slash, so join appends.
        self.base.join(name).expect("static endpoint name")
    }

    async fn get_envelope<T: serde::de::DeserializeOwned + Default>(&self, url: Url) -> Result<T> {
        tracing::debug!(%url, "fetching schema resource");
        let envelope: ApiEnvelope<T> = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::SchemaLoad(e.to_string()))?
            .error_for_status()
            .map_err(|e| ClientError::SchemaLoad(e.to_string()))?
            .json()
            .await
            .map_err(|e| ClientError::SchemaLoad(e.to_string()))?;
        envelope.into_data().map_err(ClientError::SchemaLoad)
    }
}

#[async_trait]
impl SchemaProvider for HttpSchemaProvider {
    async fn fetch_menus(&self, selector: &MenuSelector) -> Result<Vec<MenuRecord>> {
        let mut url = self.endpoint("get_menu.php");
        if let MenuSelector::Id(id) = selector {
            url.query_pairs_mut().append_pair("MenuId", &id.to_string());
        }
        self.get_envelope(url).await
    }

    async fn fetch_checkpoints(&self) -> Result<Vec<CheckpointRecord>> {
        self.get_envelope(self.endpoint("get_checkpoints.php")).await
    }

    async fn fetch_types(&self) -> Result<Vec<TypeRecord>> {
        self.get_envelope(self.endpoint("get_types.php")).await
    }
}

pub(crate) fn parse_base(base: &str) -> Result<Url> {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    Url::parse(&normalized).map_err(|e| ClientError::Config(format!("bad base url: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_menus_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_menu.php"))
            .and(query_param("MenuId", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{ "MenuId": 4, "CheckpointId": "1,2;3", "Paas": "75" }]
            })))
            .mount(&server)
            .await;

        let provider =
            HttpSchemaProvider::with_client(reqwest::Client::new(), &server.uri()).unwrap();
        let menus = provider.fetch_menus(&MenuSelector::Id(4)).await.unwrap();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].checkpoint_layout, "1,2;3");
        assert_eq!(MenuSelector::Id(4).menu_id(&menus[0]), 4);
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope_is_a_load_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_checkpoints.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": "no checkpoints"
            })))
            .mount(&server)
            .await;

        let provider =
            HttpSchemaProvider::with_client(reqwest::Client::new(), &server.uri()).unwrap();
        let err = provider.fetch_checkpoints().await.unwrap_err();
        assert!(matches!(err, ClientError::SchemaLoad(m) if m == "no checkpoints"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_a_load_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_types.php"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider =
            HttpSchemaProvider::with_client(reqwest::Client::new(), &server.uri()).unwrap();
        assert!(matches!(
            provider.fetch_types().await,
            Err(ClientError::SchemaLoad(_))
        ));
    }

    #[test]
    fn test_selector_picks_rows() {
        let menus = vec![
            MenuRecord {
                menu_id: Some(1),
                checkpoint_layout: "1".into(),
                pass_percent: None,
            },
            MenuRecord {
                menu_id: Some(8),
                checkpoint_layout: "2".into(),
                pass_percent: None,
            },
        ];
        assert_eq!(
            MenuSelector::Index(1).select(&menus).unwrap().menu_id,
            Some(8)
        );
        assert_eq!(
            MenuSelector::Id(8).select(&menus).unwrap().menu_id,
            Some(8)
        );
        // Unknown id falls back to the first row, as the server-side
        // filter is expected to have narrowed the list already
        assert_eq!(
            MenuSelector::Id(99).select(&menus).unwrap().menu_id,
            Some(1)
        );
        assert!(MenuSelector::Index(5).select(&menus).is_none());
    }
}
