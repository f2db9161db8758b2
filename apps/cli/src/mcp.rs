//! MCP stdio transport: newline-delimited JSON-RPC 2.0.
//!
//! Each line on stdin is one request. Requests without an `id` are
//! notifications and get no reply. Tool calls are handed to the
//! [`Dispatcher`]; tool failures come back as results with `isError: true`,
//! never as JSON-RPC errors.

use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use pubnub_mcp_core::{Dispatcher, ToolCall, tool_descriptors};
use pubnub_mcp_docs::HttpFetcher;
use pubnub_mcp_messaging::MessagingClient;

/// MCP revision this server implements.
const PROTOCOL_VERSION: &str = "2024-11-05";

const SERVER_NAME: &str = "pubnub-mcp";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

/// Incoming JSON-RPC request or notification.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(default)]
    jsonrpc: String,
    /// Absent for notifications.
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Serve requests from `reader` until it reaches EOF.
pub(crate) async fn serve<R, W, F, M>(
    dispatcher: &Dispatcher<F, M>,
    reader: R,
    mut writer: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: HttpFetcher,
    M: MessagingClient,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(response) = handle_line(dispatcher, &line).await else {
            continue;
        };

        let mut frame = serde_json::to_vec(&response)?;
        frame.push(b'\n');
        writer.write_all(&frame).await?;
        writer.flush().await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

async fn handle_line<F: HttpFetcher, M: MessagingClient>(
    dispatcher: &Dispatcher<F, M>,
    line: &str,
) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "unparsable request line");
            return Some(JsonRpcResponse::error(Value::Null, PARSE_ERROR, "parse error"));
        }
    };

    let Some(id) = request.id else {
        debug!(method = %request.method, "notification");
        return None;
    };
    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::error(id, INVALID_REQUEST, "invalid json-rpc version"));
    }

    debug!(method = %request.method, %id, "request");
    let outcome = match request.method.as_str() {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") }
        })),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tool_descriptors(dispatcher.catalog()) })),
        "tools/call" => call_tool(dispatcher, request.params).await,
        other => Err((METHOD_NOT_FOUND, format!("method not found: {other}"))),
    };

    Some(match outcome {
        Ok(result) => JsonRpcResponse::result(id, result),
        Err((code, message)) => JsonRpcResponse::error(id, code, message),
    })
}

async fn call_tool<F: HttpFetcher, M: MessagingClient>(
    dispatcher: &Dispatcher<F, M>,
    params: Option<Value>,
) -> Result<Value, (i64, String)> {
    let call: ToolCall = serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| (INVALID_PARAMS, format!("invalid tool params: {e}")))?;

    let response = dispatcher.dispatch(&call).await;
    serde_json::to_value(response).map_err(|e| (INTERNAL_ERROR, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pubnub_mcp_docs::{Aggregator, ReqwestFetcher, ResourceCatalog, SourceResolver};
    use pubnub_mcp_messaging::PubNubClient;
    use pubnub_mcp_shared::{Credentials, DocsConfig, PubNubConfig};

    fn dispatcher(resources: &std::path::Path) -> Dispatcher<ReqwestFetcher, PubNubClient> {
        let docs = DocsConfig {
            resources_dir: resources.to_string_lossy().to_string(),
            ..DocsConfig::default()
        };
        Dispatcher::new(
            ResourceCatalog::build(resources, &docs.languages_subdir),
            SourceResolver::new(&docs).unwrap(),
            Aggregator::new(ReqwestFetcher::new(5).unwrap(), &Credentials::demo()),
            PubNubClient::new(&PubNubConfig::default(), Credentials::demo(), 5).unwrap(),
        )
    }

    /// Feed `input` through the server and parse every reply line.
    async fn exchange(input: &str) -> Vec<Value> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pubnub_concepts.md"), "# Concepts\n").unwrap();
        std::fs::write(dir.path().join("how_to_write_a_pubnub_app.md"), "# Build it\n").unwrap();

        let mut output = Vec::new();
        serve(&dispatcher(dir.path()), input.as_bytes(), &mut output)
            .await
            .unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn handshake_and_notifications() {
        let replies = exchange(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#,
            "\n",
        ))
        .await;

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[0]["result"]["serverInfo"]["name"], "pubnub-mcp");
        assert!(replies[0]["result"]["capabilities"]["tools"].is_object());
        assert_eq!(replies[1], json!({ "jsonrpc": "2.0", "id": "p", "result": {} }));
    }

    #[tokio::test]
    async fn tools_list_advertises_catalog() {
        let replies = exchange("{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n").await;

        let tools = replies[0]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 6);
        assert_eq!(tools[0]["name"], "read_pubnub_sdk_docs");
        assert_eq!(
            tools[1]["inputSchema"]["properties"]["document"]["enum"],
            json!(["how_to_write_a_pubnub_app", "pubnub_concepts"])
        );
    }

    #[tokio::test]
    async fn tools_call_returns_text_content() {
        let replies = exchange(concat!(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"read_pubnub_resources","arguments":{"document":"pubnub_concepts"}}}"#,
            "\n",
        ))
        .await;

        assert_eq!(
            replies[0]["result"],
            json!({ "content": [{ "type": "text", "text": "# Concepts\n" }] })
        );
    }

    #[tokio::test]
    async fn invalid_arguments_are_tool_errors() {
        let replies = exchange(concat!(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"write_pubnub_app","arguments":{"appType":"chat"}}}"#,
            "\n",
        ))
        .await;

        let result = &replies[0]["result"];
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Invalid arguments for tool write_pubnub_app"));
    }

    #[tokio::test]
    async fn protocol_errors() {
        let replies = exchange(concat!(
            "this is not json\n",
            r#"{"jsonrpc":"2.0","id":5,"method":"resources/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"arguments":{}}}"#,
            "\n",
            r#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#,
            "\n",
        ))
        .await;

        let codes: Vec<_> = replies.iter().map(|r| r["error"]["code"].as_i64().unwrap()).collect();
        assert_eq!(codes, [PARSE_ERROR, METHOD_NOT_FOUND, INVALID_PARAMS, INVALID_REQUEST]);
        assert_eq!(replies[0]["id"], Value::Null);
    }
}
