//! Request validation and routing.
//!
//! A [`ToolCall`] is first checked against the fixed enumerations and the
//! resource catalog; nothing is fetched or read until it validates. Every
//! outcome, including collaborator failures, is returned as a [`ToolResponse`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use pubnub_mcp_docs::{Aggregator, DocumentRequest, HttpFetcher, ResourceCatalog, SourceResolver};
use pubnub_mcp_messaging::MessagingClient;
use pubnub_mcp_shared::{ApiTopic, AppType, EnumParseError, SdkLanguage};

use crate::tools::{
    APP_GUIDE_DOCUMENT, GET_MESSAGES, GET_PRESENCE, PUBLISH_MESSAGE, READ_RESOURCES,
    READ_SDK_DOCS, TOOL_NAMES, WRITE_APP,
};

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// An incoming `{name, arguments}` tool invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// One content block of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// `{content: [{type: "text", text}], isError?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text",
                text: text.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }

    /// Concatenated text of every content block.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// What was wrong with an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    Missing,
    WrongType { expected: &'static str },
    Empty,
    NotAllowed { value: String, allowed: Vec<String> },
}

/// A tool call rejected before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub tool: String,
    /// Offending argument (`"tool"` for an unknown tool name).
    pub field: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    fn new(tool: &str, field: &str, reason: ValidationReason) -> Self {
        Self {
            tool: tool.to_string(),
            field: field.to_string(),
            reason,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid arguments for tool {}: `{}` ", self.tool, self.field)?;
        match &self.reason {
            ValidationReason::Missing => f.write_str("is required"),
            ValidationReason::WrongType { expected } => write!(f, "must be {expected}"),
            ValidationReason::Empty => f.write_str("must not be empty"),
            ValidationReason::NotAllowed { value, allowed } => write!(
                f,
                "has invalid value '{value}' (expected one of: {})",
                allowed.join(", ")
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A fully validated tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    SdkDocs(DocumentRequest),
    Resource { document: String },
    Publish { channel: String, message: Value },
    History { channels: Vec<String> },
    Presence { channels: Vec<String>, channel_groups: Vec<String> },
    WriteApp { app_type: AppType },
}

/// Typed accessors over a call's argument object.
struct Args<'a> {
    tool: &'a str,
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Args<'a> {
    fn new(tool: &'a str, arguments: &'a Value) -> Result<Self, ValidationError> {
        match arguments {
            Value::Null => Ok(Self { tool, map: None }),
            Value::Object(map) => Ok(Self {
                tool,
                map: Some(map),
            }),
            _ => Err(ValidationError::new(
                tool,
                "arguments",
                ValidationReason::WrongType {
                    expected: "an object",
                },
            )),
        }
    }

    fn error(&self, field: &str, reason: ValidationReason) -> ValidationError {
        ValidationError::new(self.tool, field, reason)
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map
            .and_then(|m| m.get(field))
            .filter(|v| !v.is_null())
    }

    fn optional_str(&self, field: &str) -> Result<Option<&'a str>, ValidationError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.error(field, ValidationReason::WrongType { expected: "a string" })),
        }
    }

    fn required_str(&self, field: &str) -> Result<&'a str, ValidationError> {
        self.optional_str(field)?
            .ok_or_else(|| self.error(field, ValidationReason::Missing))
    }

    fn string_list(&self, field: &str) -> Result<Vec<String>, ValidationError> {
        let wrong_type = || {
            self.error(field, ValidationReason::WrongType {
                expected: "an array of strings",
            })
        };
        match self.get(field) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(&wrong_type))
                .collect(),
            Some(_) => Err(wrong_type()),
        }
    }

    fn parse_enum<T>(&self, field: &str, value: &str) -> Result<T, ValidationError>
    where
        T: FromStr<Err = EnumParseError>,
    {
        value.parse::<T>().map_err(|e| {
            self.error(field, ValidationReason::NotAllowed {
                value: e.value,
                allowed: e.allowed.into_iter().map(String::from).collect(),
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Validates tool calls and routes them to the docs pipeline or messaging client.
pub struct Dispatcher<F, M> {
    catalog: ResourceCatalog,
    resolver: SourceResolver,
    aggregator: Aggregator<F>,
    messaging: M,
}

impl<F: HttpFetcher, M: MessagingClient> Dispatcher<F, M> {
    pub fn new(
        catalog: ResourceCatalog,
        resolver: SourceResolver,
        aggregator: Aggregator<F>,
        messaging: M,
    ) -> Self {
        Self {
            catalog,
            resolver,
            aggregator,
            messaging,
        }
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    /// Check a call against its tool's argument domains.
    pub fn validate(&self, call: &ToolCall) -> Result<ToolRequest, ValidationError> {
        let tool = call.name.as_str();
        let args = Args::new(tool, &call.arguments)?;

        match tool {
            READ_SDK_DOCS => {
                let language: SdkLanguage =
                    args.parse_enum("language", args.required_str("language")?)?;
                let topic = match args.optional_str("apiReference")? {
                    Some(topic) => args.parse_enum("apiReference", topic)?,
                    None => ApiTopic::default(),
                };
                Ok(ToolRequest::SdkDocs(DocumentRequest::new(language, topic)))
            }
            READ_RESOURCES => {
                let document = args.required_str("document")?;
                if !self.catalog.contains(document) {
                    return Err(args.error("document", ValidationReason::NotAllowed {
                        value: document.to_string(),
                        allowed: self.catalog.ids().map(String::from).collect(),
                    }));
                }
                Ok(ToolRequest::Resource {
                    document: document.to_string(),
                })
            }
            PUBLISH_MESSAGE => {
                let channel = args.required_str("channel")?;
                if channel.is_empty() {
                    return Err(args.error("channel", ValidationReason::Empty));
                }
                // Any JSON payload is forwarded as-is.
                let message = args
                    .get("message")
                    .cloned()
                    .ok_or_else(|| args.error("message", ValidationReason::Missing))?;
                Ok(ToolRequest::Publish {
                    channel: channel.to_string(),
                    message,
                })
            }
            GET_MESSAGES => {
                if args.get("channels").is_none() {
                    return Err(args.error("channels", ValidationReason::Missing));
                }
                let channels = args.string_list("channels")?;
                if channels.is_empty() {
                    return Err(args.error("channels", ValidationReason::Empty));
                }
                Ok(ToolRequest::History { channels })
            }
            GET_PRESENCE => Ok(ToolRequest::Presence {
                channels: args.string_list("channels")?,
                channel_groups: args.string_list("channelGroups")?,
            }),
            WRITE_APP => {
                let app_type = args.parse_enum("appType", args.required_str("appType")?)?;
                Ok(ToolRequest::WriteApp { app_type })
            }
            unknown => Err(ValidationError::new(unknown, "tool", ValidationReason::NotAllowed {
                value: unknown.to_string(),
                allowed: TOOL_NAMES.iter().map(|s| s.to_string()).collect(),
            })),
        }
    }

    /// Validate and execute `call`; validation failures become error responses.
    #[instrument(skip_all, fields(tool = %call.name))]
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResponse {
        match self.validate(call) {
            Ok(request) => self.execute(request).await,
            Err(e) => {
                warn!(field = %e.field, "tool call rejected");
                ToolResponse::error(e.to_string())
            }
        }
    }

    /// Run an already-validated request.
    pub async fn execute(&self, request: ToolRequest) -> ToolResponse {
        debug!(?request, "executing tool request");
        match request {
            ToolRequest::SdkDocs(req) => {
                let plan = self.resolver.resolve(&req);
                let document = self.aggregator.aggregate(&plan).await;
                ToolResponse::text(document.text())
            }
            ToolRequest::Resource { document } => self.read_document(&document).await,
            ToolRequest::WriteApp { app_type } => {
                debug!(%app_type, "serving app guide");
                self.read_document(APP_GUIDE_DOCUMENT).await
            }
            ToolRequest::Publish { channel, message } => {
                match self.messaging.publish(&channel, &message).await {
                    Ok(ack) => ToolResponse::text(format!(
                        "Message published successfully. Timetoken: {}",
                        ack.timetoken
                    )),
                    Err(e) => ToolResponse::error(format!("Error publishing message: {e}")),
                }
            }
            ToolRequest::History { channels } => {
                json_response(self.messaging.fetch_messages(&channels).await, "fetching messages")
            }
            ToolRequest::Presence {
                channels,
                channel_groups,
            } => json_response(
                self.messaging.here_now(&channels, &channel_groups).await,
                "fetching presence",
            ),
        }
    }

    async fn read_document(&self, document: &str) -> ToolResponse {
        match self.catalog.read(document).await {
            Ok(text) => ToolResponse::text(text),
            Err(e) => ToolResponse::error(format!("Error reading resource {document}: {e}")),
        }
    }
}

/// Pretty-print a raw collaborator result, or wrap its error.
fn json_response(result: pubnub_mcp_shared::Result<Value>, action: &str) -> ToolResponse {
    match result {
        Ok(value) => ToolResponse::text(
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
        ),
        Err(e) => ToolResponse::error(format!("Error {action}: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
