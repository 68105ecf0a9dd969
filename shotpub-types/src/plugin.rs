//! Plug-in records: a closed set of tagged kinds with a fixed
//! applicability interface, registered explicitly rather than discovered
//! by introspection.

use serde::{Deserialize, Serialize};

/// Conventional order bands. A stage boundary exists only through
/// ordering; there is no explicit phase type.
pub mod order {
    pub const COLLECT: f64 = 0.0;
    pub const VALIDATE: f64 = 1.0;
    pub const EXTRACT: f64 = 2.0;
    pub const INTEGRATE: f64 = 3.0;
}

/// The closed set of plug-in kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    Collector,
    Validator,
    Extractor,
    Integrator,
    Creator,
    Loader,
}

/// Whether a plug-in is invoked once per run or once per matching instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Context,
    Instance,
}

/// One registered behaviour unit.
///
/// `order` defines the total execution ordering; ties are broken by
/// registration order. Hosts and families accept the `"*"` wildcard; an
/// empty target set means "any target".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSpec {
    pub id: String,
    pub label: String,
    pub order: f64,
    pub kind: PluginKind,
    pub scope: Scope,
    pub hosts: Vec<String>,
    pub families: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

impl PluginSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        order: f64,
        kind: PluginKind,
        scope: Scope,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            order,
            kind,
            scope,
            hosts: vec!["*".to_string()],
            families: vec!["*".to_string()],
            targets: Vec::new(),
        }
    }

    pub fn with_hosts(mut self, hosts: &[&str]) -> Self {
        self.hosts = hosts.iter().map(|h| h.to_string()).collect();
        self
    }

    pub fn with_families(mut self, families: &[&str]) -> Self {
        self.families = families.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_targets(mut self, targets: &[&str]) -> Self {
        self.targets = targets.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn applies_to_host(&self, host: &str) -> bool {
        self.hosts.iter().any(|h| h == "*" || h == host)
    }

    pub fn applies_to_target(&self, target: &str) -> bool {
        self.targets.is_empty() || self.targets.iter().any(|t| t == target)
    }

    /// True when any of the given family tags intersects the declared set.
    pub fn applies_to_families<'a>(&self, families: impl IntoIterator<Item = &'a str>) -> bool {
        let mut families = families.into_iter().peekable();
        if self.families.iter().any(|f| f == "*") {
            return families.peek().is_some();
        }
        families.any(|f| self.families.iter().any(|own| own == f))
    }

    /// The fixed applicability check the driver runs before invocation.
    pub fn applies(&self, host: &str, family: &str, target: &str) -> bool {
        self.applies_to_host(host)
            && self.applies_to_target(target)
            && self.applies_to_families([family])
    }
}
