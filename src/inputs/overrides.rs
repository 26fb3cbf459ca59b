//! Caller overrides and provenance-tracked value resolution
//!
//! Every number entering a model is resolved through [`OverrideManager`],
//! which returns the caller's override when one exists at the matching path
//! and the named default otherwise, tagged either way. Unknown override
//! paths are inert: the caller may probe speculative paths freely.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{AssetClass, Region};
use crate::inputs::defaults::DefaultInputs;

/// Where a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// Built-in default assumption
    Default,
    /// Supplied directly by the caller
    Override,
    /// Derived from other tracked values
    Computed,
    /// Nominally a default, but a computed input upstream was overridden.
    /// Used only in dependency explanations, never for raw values.
    AffectedByOverride,
}

impl InputSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputSource::Default => "default",
            InputSource::Override => "override",
            InputSource::Computed => "computed",
            InputSource::AffectedByOverride => "affected_by_override",
        }
    }
}

/// A value paired with its provenance tag
///
/// Carried through every computation step until final result assembly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackedValue {
    pub value: f64,
    pub source: InputSource,
}

impl TrackedValue {
    pub fn default_of(value: f64) -> Self {
        Self { value, source: InputSource::Default }
    }

    pub fn override_of(value: f64) -> Self {
        Self { value, source: InputSource::Override }
    }

    pub fn computed(value: f64) -> Self {
        Self { value, source: InputSource::Computed }
    }

    pub fn is_override(&self) -> bool {
        self.source == InputSource::Override
    }
}

/// Ordered map of named tracked values, the unit of per-stage reporting
pub type TrackedMap = BTreeMap<String, TrackedValue>;

/// One node of the nested override structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideNode {
    Value(f64),
    Map(BTreeMap<String, OverrideNode>),
}

/// Nested caller-supplied overrides, keyed by category / region / field
///
/// Deserializes directly from the JSON shape the collaborating layers send:
/// `{"macro": {"us": {"inflation_forecast": 0.045}}, "bonds_hy": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideSet(BTreeMap<String, OverrideNode>);

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a scalar by path segments. Partial matches and paths ending
    /// on a nested map return `None`.
    pub fn get(&self, segments: &[&str]) -> Option<f64> {
        let (first, rest) = segments.split_first()?;
        let mut node = self.0.get(*first)?;
        for segment in rest {
            match node {
                OverrideNode::Map(map) => node = map.get(*segment)?,
                OverrideNode::Value(_) => return None,
            }
        }
        match node {
            OverrideNode::Value(value) => Some(*value),
            OverrideNode::Map(_) => None,
        }
    }

    /// Set a single scalar at a dotted path, creating intermediate maps.
    /// A scalar sitting where a map is needed is replaced by a map.
    pub fn set(&mut self, path: &str, value: f64) {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.is_empty() {
            return;
        }

        let mut current = &mut self.0;
        for segment in &segments[..segments.len() - 1] {
            let entry = current
                .entry((*segment).to_string())
                .or_insert_with(|| OverrideNode::Map(BTreeMap::new()));
            if !matches!(entry, OverrideNode::Map(_)) {
                *entry = OverrideNode::Map(BTreeMap::new());
            }
            match entry {
                OverrideNode::Map(map) => current = map,
                OverrideNode::Value(_) => unreachable!(),
            }
        }
        current.insert(
            segments[segments.len() - 1].to_string(),
            OverrideNode::Value(value),
        );
    }

    /// Deep-merge another override set into this one: nested maps combine
    /// recursively, scalars replace whatever they land on.
    pub fn merge(&mut self, updates: OverrideSet) {
        merge_maps(&mut self.0, updates.0);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// All leaf paths as dotted strings with their values
    pub fn leaves(&self) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        collect_leaves(&self.0, String::new(), &mut out);
        out
    }
}

fn merge_maps(base: &mut BTreeMap<String, OverrideNode>, updates: BTreeMap<String, OverrideNode>) {
    for (key, update) in updates {
        match update {
            OverrideNode::Map(incoming) => match base.get_mut(&key) {
                Some(OverrideNode::Map(existing)) => merge_maps(existing, incoming),
                _ => {
                    base.insert(key, OverrideNode::Map(incoming));
                }
            },
            scalar => {
                base.insert(key, scalar);
            }
        }
    }
}

fn collect_leaves(
    map: &BTreeMap<String, OverrideNode>,
    prefix: String,
    out: &mut BTreeMap<String, f64>,
) {
    for (key, node) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match node {
            OverrideNode::Value(value) => {
                out.insert(path, *value);
            }
            OverrideNode::Map(nested) => collect_leaves(nested, path, out),
        }
    }
}

/// Resolution layer merging caller overrides with the defaults catalog
///
/// The engine owns one manager per scenario; models borrow it for the
/// duration of a computation. No type or range validation happens here --
/// that is the caller's concern.
#[derive(Debug, Clone, Default)]
pub struct OverrideManager {
    overrides: OverrideSet,
}

impl OverrideManager {
    pub fn new(overrides: OverrideSet) -> Self {
        Self { overrides }
    }

    /// Resolve one value: override at the matching path wins, otherwise the
    /// supplied default.
    pub fn resolve(&self, segments: &[&str], default: f64) -> TrackedValue {
        match self.overrides.get(segments) {
            Some(value) => TrackedValue::override_of(value),
            None => TrackedValue::default_of(default),
        }
    }

    /// Resolve a category/subcategory/field triple (subcategory only for
    /// macro paths).
    pub fn get_value(
        &self,
        category: &str,
        subcategory: Option<&str>,
        field: &str,
        default: f64,
    ) -> TrackedValue {
        match subcategory {
            Some(sub) => self.resolve(&[category, sub, field], default),
            None => self.resolve(&[category, field], default),
        }
    }

    /// Whether the caller supplied an override at a dotted path
    pub fn has_override(&self, path: &str) -> bool {
        let segments: Vec<&str> = path.split('.').collect();
        self.overrides.get(&segments).is_some()
    }

    /// All macro inputs of a region, each tagged default or override
    pub fn macro_inputs(&self, region: Region) -> TrackedMap {
        let mut result = TrackedMap::new();
        for &(field, default) in DefaultInputs::macro_inputs(region) {
            result.insert(
                field.to_string(),
                self.resolve(&["macro", region.as_str(), field], default),
            );
        }
        result
    }

    /// All inputs of an asset class, each tagged default or override
    pub fn asset_inputs(&self, asset: AssetClass) -> TrackedMap {
        let mut result = TrackedMap::new();
        for &(field, default) in DefaultInputs::asset_inputs(asset) {
            result.insert(
                field.to_string(),
                self.resolve(&[asset.as_str(), field], default),
            );
        }
        result
    }

    /// Resolve one asset field, falling back to the catalog default (or the
    /// supplied fallback when the catalog has no entry for the field).
    pub fn asset_value(&self, asset: AssetClass, field: &str, fallback: f64) -> TrackedValue {
        let default = DefaultInputs::asset_default(asset, field).unwrap_or(fallback);
        self.resolve(&[asset.as_str(), field], default)
    }

    /// Inject a single override, e.g. `"macro.us.inflation_forecast"`
    pub fn set_override(&mut self, path: &str, value: f64) {
        self.overrides.set(path, value);
    }

    /// Deep-merge a partial override structure into the current set
    pub fn merge_overrides(&mut self, updates: OverrideSet) {
        self.overrides.merge(updates);
    }

    /// Drop all overrides, reverting to defaults
    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    /// The currently active override set
    pub fn overrides(&self) -> &OverrideSet {
        &self.overrides
    }

    /// Catalog paths where an override differs from the default, as
    /// (default, override) pairs. Paths outside the catalog (direct
    /// forecast overrides) are not compared.
    pub fn compare_with_defaults(&self) -> BTreeMap<String, (f64, f64)> {
        let mut diffs = BTreeMap::new();
        for (path, default) in DefaultInputs::catalog() {
            let segments: Vec<&str> = path.split('.').collect();
            if let Some(value) = self.overrides.get(&segments) {
                if value != default {
                    diffs.insert(path, (default, value));
                }
            }
        }
        diffs
    }
}
