use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{GraphError, Result};
use crate::traits::{GraphApi, OutboundContent, SendRequest};
use crate::types::{BusinessProfile, MediaItem, SendReceipt, UserProfile};

const GRAPH_API_BASE: &str = "https://graph.facebook.com";

pub const DEFAULT_API_VERSION: &str = "v21.0";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_PROFILE_FIELDS: &str = "username,name";

/// Graph API client (HTTP direct, no SDK).
///
/// Access tokens live on the stored accounts, not the client, so one
/// instance serves every connected account.
pub struct GraphClient {
    http_client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl GraphClient {
    /// Create a client with the production endpoint and defaults.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> GraphClientBuilder {
        GraphClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn node_url(&self, node_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, node_id)
    }

    fn messages_url(&self, scope_id: &str) -> String {
        format!("{}/{}/{}/messages", self.base_url, self.api_version, scope_id)
    }

    /// Build the messaging endpoint payload for a send.
    pub fn send_payload(request: &SendRequest) -> Value {
        match &request.content {
            OutboundContent::Text(text) => serde_json::json!({
                "recipient": { "id": request.recipient_id },
                "message": { "text": text },
            }),
            OutboundContent::Attachment { kind, url } => serde_json::json!({
                "recipient": { "id": request.recipient_id },
                "message": {
                    "attachment": {
                        "type": kind,
                        "payload": { "url": url },
                    }
                },
            }),
        }
    }

    /// Build the business discovery projection for a username lookup.
    pub fn business_discovery_fields(username: &str) -> String {
        format!(
            "business_discovery.username({username})\
             {{username,name,biography,website,profile_picture_url,\
             followers_count,media_count,\
             media{{id,caption,media_type,media_url,permalink,timestamp}}}}"
        )
    }

    async fn error_from_response(response: reqwest::Response) -> GraphError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<GraphErrorEnvelope>(&body) {
            Ok(envelope) => {
                tracing::error!(
                    status,
                    code = envelope.error.code,
                    error_type = envelope.error.error_type.as_deref(),
                    "Graph API error: {}",
                    envelope.error.message.as_deref().unwrap_or("unknown error"),
                );
                GraphError::Api {
                    status,
                    code: envelope.error.code,
                    error_type: envelope.error.error_type,
                    message: envelope.error.message.unwrap_or(body),
                }
            }
            Err(_) => {
                tracing::error!(status, "Graph API error: {body}");
                GraphError::Api {
                    status,
                    code: None,
                    error_type: None,
                    message: body,
                }
            }
        }
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn send_message(&self, request: SendRequest) -> Result<SendReceipt> {
        let payload = Self::send_payload(&request);
        let response = self
            .http_client
            .post(self.messages_url(&request.scope_id))
            .query(&[("access_token", request.access_token.as_str())])
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn user_profile(&self, ig_user_id: &str, access_token: &str) -> Result<UserProfile> {
        let response = self
            .http_client
            .get(self.node_url(ig_user_id))
            .query(&[
                ("fields", USER_PROFILE_FIELDS),
                ("access_token", access_token),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn business_profile(
        &self,
        ig_business_id: &str,
        username: &str,
        access_token: &str,
    ) -> Result<BusinessProfile> {
        let fields = Self::business_discovery_fields(username);
        let response = self
            .http_client
            .get(self.node_url(ig_business_id))
            .query(&[("fields", fields.as_str()), ("access_token", access_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let envelope: BusinessDiscoveryEnvelope = response.json().await?;
        let node = envelope.business_discovery;
        Ok(BusinessProfile {
            username: node.username,
            name: node.name,
            biography: node.biography,
            website: node.website,
            profile_picture_url: node.profile_picture_url,
            followers_count: node.followers_count,
            media_count: node.media_count,
            media: node.media.data,
        })
    }
}

pub struct GraphClientBuilder {
    base_url: String,
    api_version: String,
    timeout: Duration,
}

impl GraphClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: GRAPH_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the client at a different host, used by tests to target a
    /// local stub server.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<GraphClient> {
        if self.api_version.is_empty() {
            return Err(GraphError::Config("API version is required".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(|e| GraphError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(GraphClient {
            http_client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_version: self.api_version,
        })
    }
}

impl Default for GraphClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct BusinessDiscoveryEnvelope {
    #[serde(default)]
    business_discovery: BusinessDiscoveryNode,
}

#[derive(Debug, Default, Deserialize)]
struct BusinessDiscoveryNode {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    biography: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    profile_picture_url: Option<String>,
    #[serde(default)]
    followers_count: i64,
    #[serde(default)]
    media_count: i64,
    #[serde(default)]
    media: MediaEnvelope,
}

#[derive(Debug, Default, Deserialize)]
struct MediaEnvelope {
    #[serde(default)]
    data: Vec<MediaItem>,
}
