use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::ContentfulConfig;

const MANAGEMENT_CONTENT_TYPE: &str = "application/vnd.contentful.management.v1+json";
const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// A CMS entry as last seen by the service. `fields` holds the locale-keyed
/// field map, e.g. `{"grantName": {"en-US": "..."}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CmsEntry {
    pub id: String,
    pub version: u64,
    pub fields: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    #[error("cms transport failure: {0}")]
    Transport(String),
    #[error("cms responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unable to decode cms payload: {0}")]
    Decode(String),
}

/// Content-management operations the publish workflow relies on.
#[async_trait]
pub trait CmsGateway: Debug + Send + Sync {
    async fn create_entry(&self, fields: Map<String, Value>) -> Result<CmsEntry, CmsError>;
    async fn fetch_entry(&self, entry_id: &str) -> Result<CmsEntry, CmsError>;
    async fn update_entry(&self, entry: CmsEntry) -> Result<CmsEntry, CmsError>;
    /// Rich-text fields cannot be sent on create, so they are patched in
    /// afterwards as a separate call.
    async fn patch_rich_text(
        &self,
        entry: &CmsEntry,
        fields: Map<String, Value>,
    ) -> Result<(), CmsError>;
    async fn publish_entry(&self, entry: &CmsEntry) -> Result<CmsEntry, CmsError>;
    async fn unpublish_entry(&self, entry: &CmsEntry) -> Result<CmsEntry, CmsError>;
}

#[derive(Debug, Deserialize)]
struct EntryPayload {
    sys: EntrySys,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct EntrySys {
    id: String,
    version: u64,
}

impl From<EntryPayload> for CmsEntry {
    fn from(payload: EntryPayload) -> Self {
        Self {
            id: payload.sys.id,
            version: payload.sys.version,
            fields: payload.fields,
        }
    }
}

/// Client for the Contentful content management API.
pub struct ContentfulClient {
    http: reqwest::Client,
    config: ContentfulConfig,
}

impl ContentfulClient {
    pub fn new(config: ContentfulConfig) -> Result<Self, CmsError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.access_token))
            .map_err(|err| CmsError::Transport(err.to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("grant-admin/0.1")
            .build()
            .map_err(|err| CmsError::Transport(err.to_string()))?;

        Ok(Self { http, config })
    }

    fn entries_url(&self) -> String {
        format!(
            "{}/spaces/{}/environments/{}/entries",
            self.config.base_url.trim_end_matches('/'),
            self.config.space_id,
            self.config.environment_id
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = if path.is_empty() {
            self.entries_url()
        } else {
            format!("{}/{path}", self.entries_url())
        };
        self.http.request(method, url)
    }

    async fn send(request: RequestBuilder) -> Result<reqwest::Response, CmsError> {
        let response = request
            .send()
            .await
            .map_err(|err| CmsError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(CmsError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn send_for_entry(request: RequestBuilder) -> Result<CmsEntry, CmsError> {
        let response = Self::send(request).await?;
        let payload: EntryPayload = response
            .json()
            .await
            .map_err(|err| CmsError::Decode(err.to_string()))?;
        Ok(payload.into())
    }
}

impl Debug for ContentfulClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentfulClient")
            .field("space_id", &self.config.space_id)
            .field("environment_id", &self.config.environment_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CmsGateway for ContentfulClient {
    async fn create_entry(&self, fields: Map<String, Value>) -> Result<CmsEntry, CmsError> {
        let request = self
            .request(Method::POST, "")
            .header(CONTENT_TYPE, MANAGEMENT_CONTENT_TYPE)
            .header("X-Contentful-Content-Type", &self.config.content_type)
            .json(&json!({ "fields": fields }));
        Self::send_for_entry(request).await
    }

    async fn fetch_entry(&self, entry_id: &str) -> Result<CmsEntry, CmsError> {
        Self::send_for_entry(self.request(Method::GET, entry_id)).await
    }

    async fn update_entry(&self, entry: CmsEntry) -> Result<CmsEntry, CmsError> {
        let request = self
            .request(Method::PUT, &entry.id)
            .header(CONTENT_TYPE, MANAGEMENT_CONTENT_TYPE)
            .header("X-Contentful-Version", entry.version)
            .json(&json!({ "fields": entry.fields }));
        Self::send_for_entry(request).await
    }

    async fn patch_rich_text(
        &self,
        entry: &CmsEntry,
        fields: Map<String, Value>,
    ) -> Result<(), CmsError> {
        let operations: Vec<Value> = fields
            .into_iter()
            .map(|(name, value)| {
                json!({
                    "op": "add",
                    "path": format!("/fields/{name}"),
                    "value": value,
                })
            })
            .collect();

        let request = self
            .request(Method::PATCH, &entry.id)
            .header(CONTENT_TYPE, JSON_PATCH_CONTENT_TYPE)
            .header("X-Contentful-Version", entry.version)
            .json(&operations);
        Self::send(request).await.map(|_| ())
    }

    async fn publish_entry(&self, entry: &CmsEntry) -> Result<CmsEntry, CmsError> {
        let request = self
            .request(Method::PUT, &format!("{}/published", entry.id))
            .header("X-Contentful-Version", entry.version);
        Self::send_for_entry(request).await
    }

    async fn unpublish_entry(&self, entry: &CmsEntry) -> Result<CmsEntry, CmsError> {
        let request = self
            .request(Method::DELETE, &format!("{}/published", entry.id))
            .header("X-Contentful-Version", entry.version);
        Self::send_for_entry(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ContentfulConfig {
        ContentfulConfig {
            base_url: "https://api.contentful.test/".to_string(),
            space_id: "space-1".to_string(),
            environment_id: "master".to_string(),
            access_token: "token".to_string(),
            content_type: "grantDetails".to_string(),
            locale: "en-US".to_string(),
        }
    }

    #[test]
    fn entries_url_is_scoped_to_space_and_environment() {
        let client = ContentfulClient::new(config()).expect("client builds");
        assert_eq!(
            client.entries_url(),
            "https://api.contentful.test/spaces/space-1/environments/master/entries"
        );
    }

    #[test]
    fn entry_payload_maps_sys_metadata() {
        let payload: EntryPayload = serde_json::from_value(json!({
            "sys": { "id": "entry-9", "version": 4, "type": "Entry" },
            "fields": { "grantName": { "en-US": "Community fund" } }
        }))
        .expect("payload parses");

        let entry = CmsEntry::from(payload);
        assert_eq!(entry.id, "entry-9");
        assert_eq!(entry.version, 4);
        assert_eq!(entry.fields["grantName"]["en-US"], "Community fund");
    }

    #[test]
    fn debug_output_hides_access_token() {
        let client = ContentfulClient::new(config()).expect("client builds");
        assert!(!format!("{client:?}").contains("token"));
    }
}
