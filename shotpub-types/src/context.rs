//! The publish run data model: one [`Context`] per run, holding the
//! candidate [`Instance`]s and the shared run-level [`DataMap`].
//!
//! Both maps are mutated in place by successive plug-ins with no protection
//! beyond execution order. A later plug-in may overwrite an earlier
//! plug-in's value; that is accepted and documented behaviour.

use crate::record::RunRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered key/value mapping with typed accessors.
///
/// Backed by a `BTreeMap` so serialized artifacts are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataMap(BTreeMap<String, Value>);

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn u32(&self, key: &str) -> Option<u32> {
        self.get(key)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// String-array accessor. Non-array values and non-string items
    /// yield an empty vec / are dropped.
    pub fn str_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One candidate deliverable with its own metadata mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,

    /// Primary content-type tag.
    pub family: String,

    /// Secondary content-type tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub families: Vec<String>,

    #[serde(default)]
    pub data: DataMap,
}

impl Instance {
    pub fn new(name: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: family.into(),
            families: Vec::new(),
            data: DataMap::new(),
        }
    }

    /// Primary family followed by the secondary families.
    pub fn all_families(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.family.as_str()).chain(self.families.iter().map(String::as_str))
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.all_families().any(|f| f == family)
    }

    /// Both `active` and `publish` default to true when unset.
    pub fn is_active(&self) -> bool {
        self.data.bool_or("active", true) && self.data.bool_or("publish", true)
    }

    /// The subset name, falling back to the instance name.
    pub fn subset(&self) -> &str {
        self.data.str("subset").unwrap_or(&self.name)
    }
}

/// The full set of instances plus shared run-level data for one publish.
///
/// Created at run start, mutated by every plug-in, discarded at run end.
/// The driver appends one [`RunRecord`] per plug-in invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub data: DataMap,

    #[serde(default)]
    pub instances: Vec<Instance>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<RunRecord>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.name == name)
    }

    pub fn instance_mut(&mut self, name: &str) -> Option<&mut Instance> {
        self.instances.iter_mut().find(|i| i.name == name)
    }

    /// Instances with both activation flags set (the publishable subset).
    pub fn active_instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter().filter(|i| i.is_active())
    }

    pub fn failed(&self) -> bool {
        self.records.iter().any(|r| !r.success)
    }
}
