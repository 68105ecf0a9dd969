use crate::{Plugin, RunEnv};
use anyhow::{Context as _, bail};
use camino::Utf8PathBuf;
use fs_err as fs;
use serde_json::json;
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};
use tracing::info;

/// Copies an instance's output files into its versioned publish
/// directory.
///
/// Sources are the staged `files` when present, otherwise the collected
/// `expectedFiles`. Records the `(src, dst)` pairs under `transfers` and
/// the destination paths under `published`.
pub struct IntegrateTransfers;

impl Plugin for IntegrateTransfers {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "integrate_transfers",
            "Integrate Transfers",
            order::INTEGRATE + 0.1,
            PluginKind::Integrator,
            Scope::Instance,
        )
    }

    fn process_instance(
        &self,
        cx: &mut Context,
        instance: usize,
        _env: &mut RunEnv,
    ) -> anyhow::Result<()> {
        let inst = &cx.instances[instance];
        let name = inst.name.clone();

        let mut sources = inst.data.str_list("files");
        if sources.is_empty() {
            sources = inst.data.str_list("expectedFiles");
        }
        if sources.is_empty() {
            bail!("instance {name} has nothing to integrate");
        }

        let Some(publish_dir) = inst.data.str("publishDir").map(Utf8PathBuf::from) else {
            bail!("no destination collected for instance {name}");
        };

        fs::create_dir_all(&publish_dir)
            .with_context(|| format!("create publish dir {publish_dir}"))?;

        let mut transfers = Vec::new();
        let mut published = Vec::new();
        for src in &sources {
            let src_path = Utf8PathBuf::from(src);
            let Some(file_name) = src_path.file_name() else {
                bail!("source path without file name: {src}");
            };
            let dst = publish_dir.join(file_name);
            fs::copy(&src_path, &dst).with_context(|| format!("copy {src_path} -> {dst}"))?;
            transfers.push(json!([src_path.as_str(), dst.as_str()]));
            published.push(dst.to_string());
        }
        info!(instance = %name, files = published.len(), dir = %publish_dir, "integrated");

        let inst = &mut cx.instances[instance];
        inst.data.set("transfers", transfers);
        inst.data.set("published", published);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeScene;
    use shotpub_db::MemDocStore;
    use shotpub_types::Instance;
    use std::collections::BTreeMap;

    #[test]
    fn copies_overwrite_on_rerun() {
        let td = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        let src = root.join("cacheHero.abc");
        fs::write(&src, "v1 contents").unwrap();
        let publish_dir = root.join("publish/v001");

        let mut inst = Instance::new("cacheHeroSet", "pointcache");
        inst.data.set("files", vec![src.to_string()]);
        inst.data.set("publishDir", publish_dir.as_str());
        let mut cx = Context::new();
        cx.instances.push(inst);

        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = MemDocStore::default();
        let mut env = RunEnv::new("maya", "local", BTreeMap::new(), &mut scene, &docs);

        IntegrateTransfers
            .process_instance(&mut cx, 0, &mut env)
            .unwrap();
        fs::write(&src, "v2 contents").unwrap();
        IntegrateTransfers
            .process_instance(&mut cx, 0, &mut env)
            .unwrap();

        let dst = publish_dir.join("cacheHero.abc");
        assert_eq!(fs::read_to_string(&dst).unwrap(), "v2 contents");
        assert_eq!(cx.instances[0].data.str_list("published"), vec![dst.to_string()]);
    }

    #[test]
    fn missing_destination_fails_loudly() {
        let mut inst = Instance::new("cacheHeroSet", "pointcache");
        inst.data.set("files", vec!["/tmp/cacheHero.abc".to_string()]);
        let mut cx = Context::new();
        cx.instances.push(inst);

        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = MemDocStore::default();
        let mut env = RunEnv::new("maya", "local", BTreeMap::new(), &mut scene, &docs);

        let err = IntegrateTransfers
            .process_instance(&mut cx, 0, &mut env)
            .unwrap_err();
        assert!(err.to_string().contains("no destination"));
    }
}
