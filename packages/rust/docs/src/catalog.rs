//! Catalog of local Markdown resources.
//!
//! Built once at startup from the resources directory and its language
//! supplement subdirectory. The identifier set is immutable afterwards: a file
//! added later is not requestable until the next start.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use pubnub_mcp_shared::{PubNubMcpError, Result};

/// Extension of files eligible for the catalog (without the dot).
pub const DOCUMENT_EXTENSION: &str = "md";

/// Immutable set of requestable document identifiers.
///
/// Top-level and subdirectory identifiers share one flat namespace. When both
/// define the same identifier, the top-level file wins.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    root: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

impl ResourceCatalog {
    /// Scan `root` and `root/<subdir>` for Markdown files.
    ///
    /// An unreadable root yields an empty catalog rather than an error.
    pub fn build(root: impl Into<PathBuf>, subdir: &str) -> Self {
        let root = root.into();
        let mut entries = BTreeMap::new();

        match scan_dir(&root) {
            Ok(found) => entries.extend(found),
            Err(e) => {
                warn!(root = %root.display(), error = %e, "resources directory unreadable, catalog is empty");
                return Self { root, entries };
            }
        }

        let sub = root.join(subdir);
        match scan_dir(&sub) {
            Ok(found) => {
                for (id, path) in found {
                    if let Some(existing) = entries.get(&id) {
                        debug!(%id, kept = %existing.display(), shadowed = %path.display(), "identifier collision");
                        continue;
                    }
                    entries.insert(id, path);
                }
            }
            Err(e) => debug!(dir = %sub.display(), error = %e, "no supplement directory"),
        }

        info!(root = %root.display(), documents = entries.len(), "resource catalog built");
        Self { root, entries }
    }

    /// Directory the catalog was built from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// File backing `id`, if catalogued.
    pub fn path_of(&self, id: &str) -> Option<&Path> {
        self.entries.get(id).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a catalogued document.
    ///
    /// Fails with a validation error naming the document if it is not
    /// catalogued or its file has since disappeared.
    pub async fn read(&self, id: &str) -> Result<String> {
        let path = self
            .path_of(id)
            .ok_or_else(|| PubNubMcpError::validation(format!("Document not found: {id}")))?;

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(PubNubMcpError::validation(format!("Document not found: {id}")));
        }

        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PubNubMcpError::io(path, e))
    }
}

/// Identifiers of the regular `.md` files directly inside `dir`, sorted by file name.
fn scan_dir(dir: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            found.push((stem.to_string(), path.clone()));
        }
    }

    found.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(found)
}
