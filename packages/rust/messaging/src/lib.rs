//! Live-messaging passthroughs over the PubNub REST API.
//!
//! Three calls are exposed through [`MessagingClient`]: publish, fetch
//! history, and here-now presence. Results are returned as raw JSON; callers
//! forward them without interpretation.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use pubnub_mcp_shared::{Credentials, PubNubConfig, PubNubMcpError, Result};

/// User-Agent string for REST requests.
const USER_AGENT: &str = concat!("pubnub-mcp/", env!("CARGO_PKG_VERSION"));

/// Messages returned per channel by a history fetch.
const HISTORY_PAGE_SIZE: u32 = 25;

// ---------------------------------------------------------------------------
// Seam
// ---------------------------------------------------------------------------

/// Acknowledgement of a published message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResponse {
    pub timetoken: String,
}

/// The live-messaging collaborator.
pub trait MessagingClient: Send + Sync {
    /// Publish `message` (any JSON value) to `channel`.
    fn publish(
        &self,
        channel: &str,
        message: &Value,
    ) -> impl Future<Output = Result<PublishResponse>> + Send;

    /// Recent history for each of `channels`.
    fn fetch_messages(&self, channels: &[String]) -> impl Future<Output = Result<Value>> + Send;

    /// Occupancy of `channels` and `channel_groups`.
    fn here_now(
        &self,
        channels: &[String],
        channel_groups: &[String],
    ) -> impl Future<Output = Result<Value>> + Send;
}

// ---------------------------------------------------------------------------
// REST client
// ---------------------------------------------------------------------------

/// [`MessagingClient`] speaking the PubNub REST protocol.
#[derive(Debug, Clone)]
pub struct PubNubClient {
    client: Client,
    origin: Url,
    credentials: Credentials,
    user_id: String,
}

impl PubNubClient {
    pub fn new(config: &PubNubConfig, credentials: Credentials, timeout_secs: u64) -> Result<Self> {
        let origin = Url::parse(&config.origin).map_err(|e| {
            PubNubMcpError::config(format!("invalid pubnub.origin '{}': {e}", config.origin))
        })?;
        if origin.cannot_be_a_base() {
            return Err(PubNubMcpError::config(format!(
                "pubnub.origin '{origin}' cannot have path segments"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PubNubMcpError::Network(format!("failed to build HTTP client: {e}")))?;

        let user_id = if config.user_id.is_empty() {
            Uuid::now_v7().to_string()
        } else {
            config.user_id.clone()
        };

        Ok(Self {
            client,
            origin,
            credentials,
            user_id,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.origin.clone();
        // Checked in `new`: the origin accepts path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.clear().extend(segments);
        }
        url.query_pairs_mut()
            .append_pair("uuid", &self.user_id)
            .append_pair("requestid", &Uuid::now_v7().to_string());
        url
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        debug!(path = url.path(), "pubnub request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PubNubMcpError::Messaging(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PubNubMcpError::Messaging(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(PubNubMcpError::Messaging(format!("HTTP {status}: {body}")));
        }

        serde_json::from_str(&body)
            .map_err(|e| PubNubMcpError::Messaging(format!("invalid JSON response: {e}")))
    }
}

impl MessagingClient for PubNubClient {
    #[instrument(skip(self, message))]
    async fn publish(&self, channel: &str, message: &Value) -> Result<PublishResponse> {
        let payload = serde_json::to_string(message)
            .map_err(|e| PubNubMcpError::Messaging(format!("unserializable message: {e}")))?;
        let url = self.endpoint(&[
            "publish",
            &self.credentials.publish_key,
            &self.credentials.subscribe_key,
            "0",
            channel,
            "0",
            &payload,
        ]);

        parse_publish_ack(&self.get_json(url).await?)
    }

    #[instrument(skip(self))]
    async fn fetch_messages(&self, channels: &[String]) -> Result<Value> {
        let mut url = self.endpoint(&[
            "v3",
            "history",
            "sub-key",
            &self.credentials.subscribe_key,
            "channel",
            &channels.join(","),
        ]);
        url.query_pairs_mut()
            .append_pair("max", &HISTORY_PAGE_SIZE.to_string());

        self.get_json(url).await
    }

    #[instrument(skip(self))]
    async fn here_now(&self, channels: &[String], channel_groups: &[String]) -> Result<Value> {
        // "," addresses no specific channel, as used for group-only queries.
        let channel_path = if channels.is_empty() {
            ",".to_string()
        } else {
            channels.join(",")
        };
        let mut url = self.endpoint(&[
            "v2",
            "presence",
            "sub-key",
            &self.credentials.subscribe_key,
            "channel",
            &channel_path,
        ]);
        if !channel_groups.is_empty() {
            url.query_pairs_mut()
                .append_pair("channel-group", &channel_groups.join(","));
        }

        self.get_json(url).await
    }
}

/// Extract the timetoken from a `[1, "Sent", "<timetoken>"]` acknowledgement.
fn parse_publish_ack(ack: &Value) -> Result<PublishResponse> {
    let fields = ack
        .as_array()
        .ok_or_else(|| PubNubMcpError::Messaging(format!("unexpected publish response: {ack}")))?;

    match (fields.first().and_then(Value::as_i64), fields.get(2)) {
        (Some(1), Some(Value::String(tt))) => Ok(PublishResponse {
            timetoken: tt.clone(),
        }),
        _ => Err(PubNubMcpError::Messaging(format!("publish rejected: {ack}"))),
    }
}
