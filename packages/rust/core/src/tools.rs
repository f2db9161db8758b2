//! Tool descriptors advertised to MCP clients.
//!
//! Enumerated arguments embed their allowed values in the schema so clients
//! can offer them as choices. The `document` enumeration comes from the
//! resource catalog built at startup.

use serde::Serialize;
use serde_json::{Value, json};

use pubnub_mcp_docs::ResourceCatalog;
use pubnub_mcp_shared::{ApiTopic, AppType, SdkLanguage};

pub const READ_SDK_DOCS: &str = "read_pubnub_sdk_docs";
pub const READ_RESOURCES: &str = "read_pubnub_resources";
pub const PUBLISH_MESSAGE: &str = "publish_pubnub_message";
pub const GET_MESSAGES: &str = "get_pubnub_messages";
pub const GET_PRESENCE: &str = "get_pubnub_presence";
pub const WRITE_APP: &str = "write_pubnub_app";

/// Every tool name, in advertisement order.
pub const TOOL_NAMES: &[&str] = &[
    READ_SDK_DOCS,
    READ_RESOURCES,
    PUBLISH_MESSAGE,
    GET_MESSAGES,
    GET_PRESENCE,
    WRITE_APP,
];

/// Catalog document returned by `write_pubnub_app`.
pub const APP_GUIDE_DOCUMENT: &str = "how_to_write_a_pubnub_app";

/// One entry of a `tools/list` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Descriptors for every tool, with `document` limited to `catalog`.
pub fn tool_descriptors(catalog: &ResourceCatalog) -> Vec<ToolDescriptor> {
    let documents: Vec<&str> = catalog.ids().collect();

    vec![
        ToolDescriptor {
            name: READ_SDK_DOCS,
            description: "Retrieves official PubNub SDK documentation for a given programming \
                          language and API reference section, as Markdown.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "language": {
                        "type": "string",
                        "enum": SdkLanguage::names(),
                        "description": "Programming language of the PubNub SDK"
                    },
                    "apiReference": {
                        "type": "string",
                        "enum": ApiTopic::names(),
                        "default": ApiTopic::default().as_str(),
                        "description": "API reference section to retrieve"
                    }
                },
                "required": ["language"]
            }),
        },
        ToolDescriptor {
            name: READ_RESOURCES,
            description: "Returns PubNub conceptual guides and how-to documentation from local \
                          Markdown files.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "document": {
                        "type": "string",
                        "enum": documents,
                        "description": "Resource name to fetch (file name without .md)"
                    }
                },
                "required": ["document"]
            }),
        },
        ToolDescriptor {
            name: PUBLISH_MESSAGE,
            description: "Publishes a message to a PubNub channel and returns the timetoken.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "channel": { "type": "string", "description": "Channel to publish to" },
                    "message": {
                        "type": ["string", "number", "boolean", "array", "object"],
                        "description": "Message payload, any JSON value"
                    }
                },
                "required": ["channel", "message"]
            }),
        },
        ToolDescriptor {
            name: GET_MESSAGES,
            description: "Fetches recent message history for one or more PubNub channels.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "channels": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1,
                        "description": "Channels to fetch history for"
                    }
                },
                "required": ["channels"]
            }),
        },
        ToolDescriptor {
            name: GET_PRESENCE,
            description: "Returns current occupancy and user ids for PubNub channels and \
                          channel groups.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "channels": {
                        "type": "array",
                        "items": { "type": "string" },
                        "default": []
                    },
                    "channelGroups": {
                        "type": "array",
                        "items": { "type": "string" },
                        "default": []
                    }
                }
            }),
        },
        ToolDescriptor {
            name: WRITE_APP,
            description: "Returns instructions for creating a PubNub application.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "appType": {
                        "type": "string",
                        "enum": AppType::names(),
                        "description": "Kind of application to build"
                    }
                },
                "required": ["appType"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_cover_every_tool_in_order() {
        let descriptors = tool_descriptors(&ResourceCatalog::default());
        let names: Vec<_> = descriptors.iter().map(|d| d.name).collect();
        assert_eq!(names, TOOL_NAMES);
    }

    #[test]
    fn document_enum_comes_from_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pubnub_concepts.md"), "concepts").unwrap();
        let catalog = ResourceCatalog::build(dir.path(), "languages");

        let descriptors = tool_descriptors(&catalog);
        let schema = &descriptors[1].input_schema;
        assert_eq!(schema["properties"]["document"]["enum"], json!(["pubnub_concepts"]));
    }

    #[test]
    fn schema_serializes_with_camel_case_key() {
        let descriptors = tool_descriptors(&ResourceCatalog::default());
        let value = serde_json::to_value(&descriptors[0]).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert_eq!(
            value["inputSchema"]["properties"]["apiReference"]["default"],
            "configuration"
        );
        assert_eq!(value["inputSchema"]["properties"]["language"]["enum"][7], "c-sharp");
    }

    #[test]
    fn publish_message_accepts_any_non_null_json() {
        let descriptors = tool_descriptors(&ResourceCatalog::default());
        let types = &descriptors[2].input_schema["properties"]["message"]["type"];
        assert_eq!(types, &json!(["string", "number", "boolean", "array", "object"]));
    }
}
