//! Default port implementations for headless runs.
//!
//! [`JsonScene`] replays a JSON scene manifest in place of a live DCC
//! session, which is how farm-style invocations drive the pass.

use anyhow::Context as _;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shotpub_plugins::{PublishSet, ScenePort};
use std::collections::BTreeMap;
use tracing::debug;

/// On-disk shape of a scene manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneManifest {
    #[serde(default)]
    pub file: Option<Utf8PathBuf>,

    #[serde(default)]
    pub modified: bool,

    #[serde(default)]
    pub app_version: String,

    #[serde(default)]
    pub sets: Vec<SetEntry>,

    /// Product files per renderable layer node.
    #[serde(default)]
    pub products: BTreeMap<String, Vec<Utf8PathBuf>>,

    /// Whether the render command reports success. A successful render
    /// materializes the declared product files on disk.
    #[serde(default = "default_true")]
    pub render_ok: bool,
}

fn default_true() -> bool {
    true
}

/// One publish set node in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetEntry {
    pub node: String,
    pub family: String,

    #[serde(default)]
    pub subset: Option<String>,

    #[serde(default)]
    pub asset: Option<String>,

    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub members: Vec<String>,

    #[serde(default)]
    pub attrs: BTreeMap<String, Value>,
}

impl From<SetEntry> for PublishSet {
    fn from(entry: SetEntry) -> Self {
        PublishSet {
            subset: entry.subset.unwrap_or_else(|| entry.node.clone()),
            node: entry.node,
            family: entry.family,
            asset: entry.asset,
            active: entry.active,
            members: entry.members,
            attrs: entry.attrs,
        }
    }
}

impl From<PublishSet> for SetEntry {
    fn from(set: PublishSet) -> Self {
        SetEntry {
            node: set.node,
            family: set.family,
            subset: Some(set.subset),
            asset: set.asset,
            active: set.active,
            members: set.members,
            attrs: set.attrs,
        }
    }
}

/// `ScenePort` over a JSON scene manifest.
#[derive(Debug, Default)]
pub struct JsonScene {
    pub file: Option<Utf8PathBuf>,
    pub modified: bool,
    pub app_version: String,
    pub sets: Vec<PublishSet>,
    pub products: BTreeMap<String, Vec<Utf8PathBuf>>,
    pub render_ok: bool,
    pub render_calls: usize,

    attrs: BTreeMap<(String, String), Value>,
    references: Vec<Utf8PathBuf>,
    undo_depth: usize,
}

impl JsonScene {
    pub fn load(path: &Utf8Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        let manifest: SceneManifest =
            serde_json::from_str(&raw).with_context(|| format!("parse scene manifest {path}"))?;
        debug!(path = %path, sets = manifest.sets.len(), "loaded scene manifest");
        Ok(Self::from_manifest(manifest))
    }

    pub fn from_manifest(manifest: SceneManifest) -> Self {
        Self {
            file: manifest.file,
            modified: manifest.modified,
            app_version: manifest.app_version,
            sets: manifest.sets.into_iter().map(PublishSet::from).collect(),
            products: manifest.products,
            render_ok: manifest.render_ok,
            render_calls: 0,
            attrs: BTreeMap::new(),
            references: Vec::new(),
            undo_depth: 0,
        }
    }

    pub fn references(&self) -> &[Utf8PathBuf] {
        &self.references
    }

    pub fn to_manifest(&self) -> SceneManifest {
        SceneManifest {
            file: self.file.clone(),
            modified: self.modified,
            app_version: self.app_version.clone(),
            sets: self.sets.iter().cloned().map(SetEntry::from).collect(),
            products: self.products.clone(),
            render_ok: self.render_ok,
        }
    }

    /// Writes the manifest back, so set edits made through the port survive
    /// the process.
    pub fn save(&self, path: &Utf8Path) -> anyhow::Result<()> {
        let manifest = self.to_manifest();
        let raw = serde_json::to_string_pretty(&manifest)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

impl ScenePort for JsonScene {
    fn current_file(&self) -> Option<Utf8PathBuf> {
        self.file.clone()
    }

    fn is_modified(&self) -> bool {
        self.modified
    }

    fn app_version(&self) -> String {
        self.app_version.clone()
    }

    fn publish_sets(&self) -> Vec<PublishSet> {
        self.sets.clone()
    }

    fn create_publish_set(&mut self, set: PublishSet) -> anyhow::Result<()> {
        self.sets.retain(|s| s.node != set.node);
        self.sets.push(set);
        Ok(())
    }

    fn node_attr(&self, node: &str, attr: &str) -> Option<Value> {
        self.attrs
            .get(&(node.to_string(), attr.to_string()))
            .cloned()
    }

    fn set_node_attr(&mut self, node: &str, attr: &str, value: Value) -> anyhow::Result<()> {
        self.attrs
            .insert((node.to_string(), attr.to_string()), value);
        Ok(())
    }

    fn render_products(&self, node: &str) -> anyhow::Result<Vec<Utf8PathBuf>> {
        Ok(self.products.get(node).cloned().unwrap_or_default())
    }

    /// A successful render materializes the declared products of every
    /// requested layer.
    fn render(&mut self, nodes: &[String]) -> anyhow::Result<bool> {
        self.render_calls += 1;
        if !self.render_ok {
            return Ok(false);
        }
        for node in nodes {
            for product in self.products.get(node).cloned().unwrap_or_default() {
                if let Some(parent) = product.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&product, format!("rendered:{node}"))?;
            }
        }
        Ok(true)
    }

    fn export(&mut self, members: &[String], path: &Utf8Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, members.join("\n"))?;
        Ok(())
    }

    fn reference_file(&mut self, path: &Utf8Path) -> anyhow::Result<String> {
        self.references.push(path.to_path_buf());
        Ok(format!("{}RN", path.file_stem().unwrap_or("ref")))
    }

    fn begin_undo_chunk(&mut self, label: &str) {
        debug!(label = %label, "open undo chunk");
        self.undo_depth += 1;
    }

    fn end_undo_chunk(&mut self) {
        self.undo_depth = self.undo_depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn manifest_json(products_root: &str) -> String {
        json!({
            "file": "/work/shot010.ma",
            "app_version": "2024.2",
            "sets": [
                {
                    "node": "renderMainSet",
                    "family": "renderlayer",
                    "subset": "renderMain",
                    "asset": "shot010",
                    "members": ["rs_main"]
                }
            ],
            "products": {
                "renderMainSet": [
                    format!("{products_root}/main.1001.exr"),
                    format!("{products_root}/main.1002.exr")
                ]
            }
        })
        .to_string()
    }

    #[test]
    fn load_fills_defaults() {
        let td = tempfile::tempdir().unwrap();
        let root = td.path().to_str().unwrap();
        let path = Utf8PathBuf::from(root).join("scene.json");
        fs::write(&path, manifest_json(root)).unwrap();

        let scene = JsonScene::load(&path).unwrap();
        assert!(!scene.is_modified());
        assert!(scene.render_ok);
        let sets = scene.publish_sets();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].subset, "renderMain");
        assert!(sets[0].active);
    }

    #[test]
    fn subset_falls_back_to_node_name() {
        let entry = SetEntry {
            node: "cacheHero_SET".to_string(),
            family: "pointcache".to_string(),
            subset: None,
            asset: None,
            active: true,
            members: Vec::new(),
            attrs: BTreeMap::new(),
        };
        let set = PublishSet::from(entry);
        assert_eq!(set.subset, "cacheHero_SET");
    }

    #[test]
    fn successful_render_materializes_products() {
        let td = tempfile::tempdir().unwrap();
        let root = td.path().to_str().unwrap();
        let path = Utf8PathBuf::from(root).join("scene.json");
        fs::write(&path, manifest_json(root)).unwrap();

        let mut scene = JsonScene::load(&path).unwrap();
        let ok = scene.render(&["renderMainSet".to_string()]).unwrap();
        assert!(ok);
        assert!(Utf8PathBuf::from(root).join("main.1001.exr").exists());
        assert!(Utf8PathBuf::from(root).join("main.1002.exr").exists());
    }

    #[test]
    fn failed_render_materializes_nothing() {
        let td = tempfile::tempdir().unwrap();
        let root = td.path().to_str().unwrap();
        let path = Utf8PathBuf::from(root).join("scene.json");
        fs::write(&path, manifest_json(root)).unwrap();

        let mut scene = JsonScene::load(&path).unwrap();
        scene.render_ok = false;
        let ok = scene.render(&["renderMainSet".to_string()]).unwrap();
        assert!(!ok);
        assert!(!Utf8PathBuf::from(root).join("main.1001.exr").exists());
    }
}
