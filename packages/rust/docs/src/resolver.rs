//! Source planning for SDK documentation requests.
//!
//! A plan always has three slots, in this order:
//! 1. the SDK overview page (remote)
//! 2. the API-reference page (remote), or the local functions file for
//!    [`ApiTopic::Functions`]
//! 3. the per-language supplement (local, optional)
//!
//! The trailing configuration snippet is not a source; the aggregator appends it.

use std::path::PathBuf;

use url::Url;

use pubnub_mcp_shared::{ApiTopic, DocsConfig, PubNubMcpError, Result, SdkLanguage};

use crate::catalog::DOCUMENT_EXTENSION;

/// A validated request for SDK documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentRequest {
    pub language: SdkLanguage,
    pub topic: ApiTopic,
}

impl DocumentRequest {
    pub fn new(language: SdkLanguage, topic: ApiTopic) -> Self {
        Self { language, topic }
    }
}

/// One place content can come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// A documentation page to fetch and normalize.
    Remote { url: Url },
    /// A Markdown file read verbatim. A missing optional file contributes nothing.
    Local { path: PathBuf, optional: bool },
}

impl SourceRef {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote { url } => write!(f, "{url}"),
            Self::Local { path, .. } => write!(f, "{}", path.display()),
        }
    }
}

/// Ordered sources for one request.
pub type SourcePlan = Vec<SourceRef>;

/// Maps requests to source plans using the configured docs site and resources directory.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    docs_base: Url,
    resources_dir: PathBuf,
    languages_subdir: String,
    functions_file: String,
}

impl SourceResolver {
    pub fn new(config: &DocsConfig) -> Result<Self> {
        let docs_base = Url::parse(&config.base_url).map_err(|e| {
            PubNubMcpError::config(format!("invalid docs base URL '{}': {e}", config.base_url))
        })?;
        if docs_base.cannot_be_a_base() {
            return Err(PubNubMcpError::config(format!(
                "docs base URL '{docs_base}' cannot have path segments"
            )));
        }

        Ok(Self {
            docs_base,
            resources_dir: PathBuf::from(&config.resources_dir),
            languages_subdir: config.languages_subdir.clone(),
            functions_file: config.functions_file.clone(),
        })
    }

    /// Build the plan for `request`.
    pub fn resolve(&self, request: &DocumentRequest) -> SourcePlan {
        let language = request.language.as_str();

        let reference = if request.topic.is_local_only() {
            SourceRef::Local {
                path: self.resources_dir.join(&self.functions_file),
                optional: false,
            }
        } else {
            SourceRef::Remote {
                url: self.docs_url(&["sdks", language, "api-reference", request.topic.as_str()]),
            }
        };

        vec![
            SourceRef::Remote {
                url: self.docs_url(&["sdks", language]),
            },
            reference,
            SourceRef::Local {
                path: self.supplement_path(request.language),
                optional: true,
            },
        ]
    }

    /// `{resources}/{languages}/{language}.md`
    pub fn supplement_path(&self, language: SdkLanguage) -> PathBuf {
        self.resources_dir
            .join(&self.languages_subdir)
            .join(format!("{}.{DOCUMENT_EXTENSION}", language.as_str()))
    }

    fn docs_url(&self, segments: &[&str]) -> Url {
        let mut url = self.docs_base.clone();
        // Checked in `new`: the base URL accepts path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
