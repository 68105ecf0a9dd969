//! In-memory scene fixture shared by the unit tests.

use crate::ports::{PublishSet, ScenePort};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct FakeScene {
    pub file: Option<Utf8PathBuf>,
    pub modified: bool,
    pub version: String,
    pub sets: Vec<PublishSet>,
    pub products: BTreeMap<String, Vec<Utf8PathBuf>>,
    pub render_ok: bool,
    pub render_calls: usize,
    pub rendered_nodes: Vec<String>,
    pub attrs: BTreeMap<(String, String), Value>,
    pub exports: Vec<(Vec<String>, Utf8PathBuf)>,
    pub references: Vec<Utf8PathBuf>,
    pub undo_events: Vec<String>,
}

impl FakeScene {
    pub fn saved(file: &str) -> Self {
        Self {
            file: Some(Utf8PathBuf::from(file)),
            render_ok: true,
            version: "2024.2".to_string(),
            ..Self::default()
        }
    }
}

impl ScenePort for FakeScene {
    fn current_file(&self) -> Option<Utf8PathBuf> {
        self.file.clone()
    }

    fn is_modified(&self) -> bool {
        self.modified
    }

    fn app_version(&self) -> String {
        self.version.clone()
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
        self.attrs.get(&(node.to_string(), attr.to_string())).cloned()
    }

    fn set_node_attr(&mut self, node: &str, attr: &str, value: Value) -> anyhow::Result<()> {
        self.attrs.insert((node.to_string(), attr.to_string()), value);
        Ok(())
    }

    fn render_products(&self, node: &str) -> anyhow::Result<Vec<Utf8PathBuf>> {
        Ok(self.products.get(node).cloned().unwrap_or_default())
    }

    fn render(&mut self, nodes: &[String]) -> anyhow::Result<bool> {
        self.render_calls += 1;
        self.rendered_nodes.extend(nodes.iter().cloned());
        Ok(self.render_ok)
    }

    fn export(&mut self, members: &[String], path: &Utf8Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, members.join("\n"))?;
        self.exports.push((members.to_vec(), path.to_path_buf()));
        Ok(())
    }

    fn reference_file(&mut self, path: &Utf8Path) -> anyhow::Result<String> {
        self.references.push(path.to_path_buf());
        Ok(format!("{}RN", path.file_stem().unwrap_or("ref")))
    }

    fn begin_undo_chunk(&mut self, label: &str) {
        self.undo_events.push(format!("begin:{label}"));
    }

    fn end_undo_chunk(&mut self) {
        self.undo_events.push("end".to_string());
    }
}
