//! Tool surface of the PubNub MCP server.
//!
//! This crate ties the documentation pipeline and the messaging client
//! together behind one validated entry point:
//! - [`tools`] — tool names, descriptions and JSON Schema inputs
//! - [`dispatcher`] — argument validation and routing to the collaborators

pub mod dispatcher;
pub mod tools;

pub use dispatcher::{
    Dispatcher, ToolCall, ToolContent, ToolRequest, ToolResponse, ValidationError,
    ValidationReason,
};
pub use tools::{ToolDescriptor, tool_descriptors};
