//! Documentation sourcing and aggregation.
//!
//! This crate provides:
//! - [`fetch`] — the HTTP fetch seam ([`HttpFetcher`]) and its `reqwest` implementation
//! - [`catalog`] — the startup-time catalog of local Markdown resources
//! - [`resolver`] — which sources to consult for a `(language, topic)` request
//! - [`aggregator`] — failure-isolating execution of a plan into one document
//! - [`snapshot`] — bundling remote articles into a local resource file

pub mod aggregator;
pub mod catalog;
pub mod fetch;
pub mod resolver;
pub mod snapshot;
pub mod snippet;

pub use aggregator::{AggregatedDocument, Aggregator, ContentFragment};
pub use catalog::{DOCUMENT_EXTENSION, ResourceCatalog};
pub use fetch::{FetchError, FetchResponse, HttpFetcher, ReqwestFetcher, fetch_markdown};
pub use resolver::{DocumentRequest, SourcePlan, SourceRef, SourceResolver};
pub use snapshot::{SnapshotResult, snapshot_articles};
pub use snippet::configuration_snippet;
