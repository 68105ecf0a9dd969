use crate::{Plugin, RunEnv};
use shotpub_types::{Context, PluginKind, PluginSpec, Scope, order};
use tracing::debug;

/// Collects the product files a render of each layer will produce.
///
/// Reads: scene render settings for the layer node. Writes: instance
/// `expectedFiles` and `representation`.
pub struct CollectRenderProducts;

impl Plugin for CollectRenderProducts {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "collect_render_products",
            "Collect Render Products",
            order::COLLECT + 0.2,
            PluginKind::Collector,
            Scope::Instance,
        )
        .with_families(&["renderlayer"])
    }

    fn process_instance(
        &self,
        cx: &mut Context,
        instance: usize,
        env: &mut RunEnv,
    ) -> anyhow::Result<()> {
        let node = cx.instances[instance].name.clone();
        let products = env.scene.render_products(&node)?;
        debug!(layer = %node, products = products.len(), "collected render products");

        let inst = &mut cx.instances[instance];
        if let Some(first) = products.first()
            && let Some(ext) = first.extension()
        {
            inst.data.set("representation", ext);
        }
        let files: Vec<String> = products.iter().map(|p| p.to_string()).collect();
        inst.data.set("expectedFiles", files);
        Ok(())
    }
}
