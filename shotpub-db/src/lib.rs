//! Read-only queries against the project document store.
//!
//! Documents are keyed by `{type, name, parent}` and describe projects,
//! assets, subsets and versions. This crate only consumes documents
//! (finds one, reads specific fields); schema ownership is external.

use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use glob::glob;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// One document from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(rename = "type")]
    pub ty: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default)]
    pub data: Value,
}

impl Document {
    /// Dotted-path accessor into the `data` payload,
    /// e.g. `field("templates.publish")`.
    pub fn field(&self, dotted: &str) -> Option<&Value> {
        let mut current = &self.data;
        for part in dotted.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn field_str(&self, dotted: &str) -> Option<&str> {
        self.field(dotted).and_then(Value::as_str)
    }

    pub fn field_u64(&self, dotted: &str) -> Option<u64> {
        self.field(dotted).and_then(Value::as_u64)
    }
}

/// The `{type, name, parent}` lookup key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocFilter {
    pub ty: String,
    pub name: Option<String>,
    pub parent: Option<String>,
}

impl DocFilter {
    pub fn of_type(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: None,
            parent: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    fn matches(&self, doc: &Document) -> bool {
        if doc.ty != self.ty {
            return false;
        }
        if let Some(name) = &self.name
            && &doc.name != name
        {
            return false;
        }
        if let Some(parent) = &self.parent
            && doc.parent.as_ref() != Some(parent)
        {
            return false;
        }
        true
    }
}

/// Read-only document store access.
pub trait DocStore {
    fn find_one(&self, filter: &DocFilter) -> anyhow::Result<Option<Document>>;
}

/// Explicitly seeded store, used in tests and embedded setups.
#[derive(Debug, Clone, Default)]
pub struct MemDocStore {
    docs: Vec<Document>,
}

impl MemDocStore {
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }

    pub fn push(&mut self, doc: Document) {
        self.docs.push(doc);
    }
}

impl DocStore for MemDocStore {
    fn find_one(&self, filter: &DocFilter) -> anyhow::Result<Option<Document>> {
        Ok(self.docs.iter().find(|d| filter.matches(d)).cloned())
    }
}

#[derive(Debug, Error)]
pub enum DocLoadError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("json parse error: {message}")]
    Json { message: String },
}

/// Directory-backed store: every `*.json` file under the root is one
/// document. Files that fail to load are reported and skipped; they never
/// abort loading the rest.
#[derive(Debug, Clone)]
pub struct DirDocStore {
    docs: Vec<Document>,
}

impl DirDocStore {
    pub fn load(root: &Utf8Path) -> anyhow::Result<Self> {
        let pattern = root.join("**/*.json");
        debug!(pattern = %pattern, "scanning document store");

        let mut docs = Vec::new();
        for entry in glob(pattern.as_str())
            .map_err(|e| anyhow::anyhow!("glob {}: {e}", pattern))?
        {
            let path = match entry {
                Ok(p) => Utf8PathBuf::from(p.to_string_lossy().to_string()),
                Err(e) => {
                    warn!("skipping unreadable store entry: {e}");
                    continue;
                }
            };

            match load_doc(&path) {
                Ok(doc) => docs.push(doc),
                Err(e) => warn!(path = %path, "skipping document: {e}"),
            }
        }

        // Deterministic lookup order regardless of directory layout.
        docs.sort_by(|a, b| (&a.ty, &a.name, &a.id).cmp(&(&b.ty, &b.name, &b.id)));
        Ok(Self { docs })
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

fn load_doc(path: &Utf8Path) -> Result<Document, DocLoadError> {
    let raw = fs::read_to_string(path).map_err(|e| DocLoadError::Io {
        message: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| DocLoadError::Json {
        message: e.to_string(),
    })
}

impl DocStore for DirDocStore {
    fn find_one(&self, filter: &DocFilter) -> anyhow::Result<Option<Document>> {
        Ok(self.docs.iter().find(|d| filter.matches(d)).cloned())
    }
}
