use crate::{Plugin, RunEnv};
use anyhow::{Context as _, bail};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use sha2::{Digest, Sha256};
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};
use tracing::{debug, info};

/// Maintains the unversioned "master" copy of each published file.
///
/// The master path is the published path with its `v<digits>` segment
/// replaced by `master`. Copies overwrite, so re-running against the
/// same version leaves exactly one master file per subset/extension, and
/// the copy is verified by content hash before the plug-in reports
/// success.
pub struct IntegrateMaster;

impl Plugin for IntegrateMaster {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "integrate_master",
            "Integrate Master Copy",
            order::INTEGRATE + 0.2,
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
        let published = inst.data.str_list("published");
        if published.is_empty() {
            bail!("instance {name} has no published files; is the transfer integrator ordered first?");
        }

        let mut masters = Vec::new();
        for src in &published {
            let src = Utf8PathBuf::from(src);
            let Some(master) = shotpub_template::master_path(&src) else {
                debug!(path = %src, "no version segment, skipping master copy");
                continue;
            };

            if let Some(parent) = master.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create master dir {parent}"))?;
            }
            fs::copy(&src, &master).with_context(|| format!("copy {src} -> {master}"))?;

            let expected = file_digest(&src)?;
            let actual = file_digest(&master)?;
            if expected != actual {
                bail!(
                    "master copy verification failed for {master}: {expected} != {actual}"
                );
            }
            masters.push(master.to_string());
        }
        info!(instance = %name, files = masters.len(), "master copies up to date");

        cx.instances[instance].data.set("masterFiles", masters);
        Ok(())
    }
}

fn file_digest(path: &Utf8Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {path}"))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeScene;
    use shotpub_db::MemDocStore;
    use shotpub_types::Instance;
    use std::collections::BTreeMap;

    fn run(cx: &mut Context) -> anyhow::Result<()> {
        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = MemDocStore::default();
        let mut env = RunEnv::new("maya", "local", BTreeMap::new(), &mut scene, &docs);
        IntegrateMaster.process_instance(cx, 0, &mut env)
    }

    fn publish_version(root: &Utf8Path, version: &str, contents: &str) -> Utf8PathBuf {
        let dir = root.join("publish/cacheHero").join(version);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cacheHero.abc");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn master_copy_is_idempotent_and_tracks_latest() {
        let td = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        let master = root.join("publish/cacheHero/master/cacheHero.abc");

        let v1 = publish_version(&root, "v001", "version one");
        let mut cx = Context::new();
        let mut inst = Instance::new("cacheHeroSet", "pointcache");
        inst.data.set("published", vec![v1.to_string()]);
        cx.instances.push(inst);

        run(&mut cx).unwrap();
        run(&mut cx).unwrap();
        assert_eq!(fs::read_to_string(&master).unwrap(), "version one");

        // A newer version replaces the same master file.
        let v2 = publish_version(&root, "v002", "version two");
        cx.instances[0].data.set("published", vec![v2.to_string()]);
        run(&mut cx).unwrap();
        assert_eq!(fs::read_to_string(&master).unwrap(), "version two");

        let master_dir = root.join("publish/cacheHero/master");
        let entries: Vec<_> = fs::read_dir(master_dir).unwrap().collect();
        assert_eq!(entries.len(), 1, "exactly one master file");
    }

    #[test]
    fn unversioned_paths_are_skipped_not_fatal() {
        let td = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        let flat = root.join("cacheHero.abc");
        fs::write(&flat, "flat").unwrap();

        let mut cx = Context::new();
        let mut inst = Instance::new("cacheHeroSet", "pointcache");
        inst.data.set("published", vec![flat.to_string()]);
        cx.instances.push(inst);

        run(&mut cx).unwrap();
        assert!(cx.instances[0].data.str_list("masterFiles").is_empty());
    }

    #[test]
    fn nothing_published_is_an_error() {
        let mut cx = Context::new();
        cx.instances.push(Instance::new("cacheHeroSet", "pointcache"));
        let err = run(&mut cx).unwrap_err();
        assert!(err.to_string().contains("no published files"));
    }
}
