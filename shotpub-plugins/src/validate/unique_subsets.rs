use crate::{Plugin, RunEnv};
use anyhow::bail;
use shotpub_types::{Context, Instance, PluginKind, PluginSpec, Scope, order};
use std::collections::BTreeMap;

/// Cross-instance invariant: among active instances with overlapping
/// families, no two may share a subset name.
///
/// Context scope on purpose — the check spans instances, so running it
/// per instance would both duplicate work and hide offenders.
pub struct ValidateUniqueSubsets;

impl Plugin for ValidateUniqueSubsets {
    fn spec(&self) -> PluginSpec {
        PluginSpec::new(
            "validate_unique_subsets",
            "Validate Unique Subsets",
            order::VALIDATE + 0.1,
            PluginKind::Validator,
            Scope::Context,
        )
    }

    fn process_context(&self, cx: &mut Context, _env: &mut RunEnv) -> anyhow::Result<()> {
        let mut by_subset: BTreeMap<&str, Vec<&Instance>> = BTreeMap::new();
        for inst in cx.instances.iter().filter(|i| i.is_active()) {
            by_subset.entry(inst.subset()).or_default().push(inst);
        }

        let mut conflicts = Vec::new();
        for (subset, group) in &by_subset {
            if group.len() < 2 {
                continue;
            }
            let mut offenders: Vec<&str> = group
                .iter()
                .filter(|a| {
                    group.iter().any(|b| {
                        a.name != b.name && a.all_families().any(|f| b.has_family(f))
                    })
                })
                .map(|i| i.name.as_str())
                .collect();
            if !offenders.is_empty() {
                offenders.sort_unstable();
                conflicts.push(format!("subset '{}': {}", subset, offenders.join(", ")));
            }
        }

        if !conflicts.is_empty() {
            bail!("duplicate subset names across instances: {}", conflicts.join("; "));
        }
        Ok(())
    }
}
