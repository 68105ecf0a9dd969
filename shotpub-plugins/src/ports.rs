//! Port traits abstracting the host DCC away from the plug-ins.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use std::collections::BTreeMap;

/// A creator-authored publish set node in the scene.
#[derive(Debug, Clone, Default)]
pub struct PublishSet {
    /// Node name of the set itself.
    pub node: String,
    pub family: String,
    pub subset: String,
    pub asset: Option<String>,
    pub active: bool,
    /// Member node names.
    pub members: Vec<String>,
    /// Additional authored attributes (frame range, representation, ...).
    pub attrs: BTreeMap<String, Value>,
}

/// Scene-graph access to the host DCC.
pub trait ScenePort {
    fn current_file(&self) -> Option<Utf8PathBuf>;

    /// Unsaved-changes flag.
    fn is_modified(&self) -> bool;

    fn app_version(&self) -> String;

    fn publish_sets(&self) -> Vec<PublishSet>;

    /// Creates the set node, replacing an existing set with the same
    /// node name.
    fn create_publish_set(&mut self, set: PublishSet) -> anyhow::Result<()>;

    fn node_attr(&self, node: &str, attr: &str) -> Option<Value>;

    fn set_node_attr(&mut self, node: &str, attr: &str, value: Value) -> anyhow::Result<()>;

    /// Product file paths a render of this layer node will produce.
    fn render_products(&self, node: &str) -> anyhow::Result<Vec<Utf8PathBuf>>;

    /// Renders the given layer nodes. `Ok(false)` means the render
    /// command itself reported failure.
    fn render(&mut self, nodes: &[String]) -> anyhow::Result<bool>;

    /// Exports member nodes to a file on disk.
    fn export(&mut self, members: &[String], path: &Utf8Path) -> anyhow::Result<()>;

    /// References a published file into the scene, returning the created
    /// reference node name.
    fn reference_file(&mut self, path: &Utf8Path) -> anyhow::Result<String>;

    fn begin_undo_chunk(&mut self, label: &str);

    fn end_undo_chunk(&mut self);
}

/// Scoped session undo chunk.
///
/// Closed unconditionally on drop, so a failing render never leaks an
/// open transaction.
pub struct UndoChunk<'a> {
    scene: &'a mut dyn ScenePort,
}

impl<'a> UndoChunk<'a> {
    pub fn open(scene: &'a mut dyn ScenePort, label: &str) -> Self {
        scene.begin_undo_chunk(label);
        Self { scene }
    }

    pub fn scene(&mut self) -> &mut dyn ScenePort {
        self.scene
    }
}

impl Drop for UndoChunk<'_> {
    fn drop(&mut self) {
        self.scene.end_undo_chunk();
    }
}
