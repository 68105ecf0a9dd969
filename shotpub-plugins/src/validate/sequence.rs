use crate::{Plugin, RunEnv};
use anyhow::bail;
use camino::Utf8Path;
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};
use std::collections::BTreeSet;

/// The expected file sequence must cover the declared frame range with
/// no gaps.
///
/// Frame numbers are parsed from `name.<frame>.ext` file names; every
/// missing frame is reported, not just the first gap.
pub struct ValidateSequence;

impl Plugin for ValidateSequence {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "validate_sequence",
            "Validate Frame Sequence",
            order::VALIDATE + 0.3,
            PluginKind::Validator,
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
        let (Some(start), Some(end)) = (inst.data.i64("frameStart"), inst.data.i64("frameEnd"))
        else {
            return Ok(());
        };
        if start > end {
            bail!(
                "instance {}: frameStart {start} is after frameEnd {end}",
                inst.name
            );
        }

        let present: BTreeSet<i64> = inst
            .data
            .str_list("expectedFiles")
            .iter()
            .filter_map(|p| frame_number(Utf8Path::new(p)))
            .collect();
        if present.is_empty() {
            // Single-file representations carry a frame range too; only
            // numbered sequences are checked.
            return Ok(());
        }

        let missing: Vec<String> = (start..=end)
            .filter(|f| !present.contains(f))
            .map(|f| f.to_string())
            .collect();
        if !missing.is_empty() {
            bail!(
                "instance {}: missing frame(s) {} in range {start}-{end}",
                inst.name,
                missing.join(", ")
            );
        }
        Ok(())
    }
}

/// Frame number from `name.<frame>.ext` style file names.
fn frame_number(path: &Utf8Path) -> Option<i64> {
    let name = path.file_name()?;
    let mut parts = name.rsplit('.');
    let _ext = parts.next()?;
    let frame = parts.next()?;
    if frame.is_empty() || !frame.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    frame.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeScene;
    use shotpub_db::MemDocStore;
    use shotpub_types::Instance;
    use std::collections::BTreeMap;

    fn context_with_frames(frames: &[i64]) -> Context {
        let mut inst = Instance::new("renderMainSet", "renderlayer");
        inst.data.set("frameStart", 1001);
        inst.data.set("frameEnd", 1010);
        inst.data.set(
            "expectedFiles",
            frames
                .iter()
                .map(|f| format!("/renders/renderMain.{f}.exr"))
                .collect::<Vec<_>>(),
        );
        let mut cx = Context::new();
        cx.instances.push(inst);
        cx
    }

    fn run(cx: &mut Context) -> anyhow::Result<()> {
        let mut scene = FakeScene::saved("/work/shot010.ma");
        let docs = MemDocStore::default();
        let mut env = RunEnv::new("maya", "local", BTreeMap::new(), &mut scene, &docs);
        ValidateSequence.process_instance(cx, 0, &mut env)
    }

    #[test]
    fn gapless_range_passes() {
        let frames: Vec<i64> = (1001..=1010).collect();
        run(&mut context_with_frames(&frames)).unwrap();
    }

    #[test]
    fn removed_frame_is_reported() {
        let frames: Vec<i64> = (1001..=1010).filter(|f| *f != 1005).collect();
        let err = run(&mut context_with_frames(&frames)).unwrap_err();
        assert!(err.to_string().contains("1005"));
    }

    #[test]
    fn multiple_gaps_all_reported() {
        let frames: Vec<i64> = (1001..=1010)
            .filter(|f| *f != 1003 && *f != 1007)
            .collect();
        let err = run(&mut context_with_frames(&frames)).unwrap_err().to_string();
        assert!(err.contains("1003"));
        assert!(err.contains("1007"));
    }

    #[test]
    fn no_declared_range_passes() {
        let mut cx = Context::new();
        cx.instances.push(Instance::new("cacheHero", "pointcache"));
        run(&mut cx).unwrap();
    }

    #[test]
    fn frame_number_parsing() {
        assert_eq!(
            frame_number(Utf8Path::new("/r/renderMain.1001.exr")),
            Some(1001)
        );
        assert_eq!(frame_number(Utf8Path::new("/r/renderMain.exr")), None);
        assert_eq!(frame_number(Utf8Path::new("/r/render.v001.exr")), None);
    }
}
