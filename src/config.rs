//! Network configuration and parameter bundles
//!
//! `NetworkConfig` holds the run-wide settings. `ParamBundle` is a named
//! JSON document of per-layer and per-pathway overrides:
//!
//! ```json
//! {
//!   "name": "Base",
//!   "layers": { "Hidden": { "inhib": { "layer": { "gi": 2.0 } } } },
//!   "paths": { "InputToHidden": { "learn": { "lrate": 0.02 } } }
//! }
//! ```
//!
//! Overrides are merged field by field into the current values, so a
//! bundle only names what it changes.

use crate::error::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// How a layer's activity is summed when another layer reads it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotalActPolicy {
    /// Pool-0 average activity times unit count
    #[default]
    PoolAvgTimesN,
    PoolMax,
    PoolAvg,
    /// Straight sum over non-off units
    Sum,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub cyc_per_qtr: usize,
    /// Seconds per cycle
    pub time_per_cyc: f32,
    pub total_act: TotalActPolicy,
    /// Seed for weight init and noise; entropy when absent
    pub seed: Option<u64>,
    /// Run layer-local phases in parallel (needs the `parallel` feature)
    pub parallel: bool,
    /// Weight updates between weight-balance recomputations
    pub wt_bal_interval: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            cyc_per_qtr: 25,
            time_per_cyc: 0.001,
            total_act: TotalActPolicy::PoolAvgTimesN,
            seed: None,
            parallel: false,
            wt_bal_interval: 10,
        }
    }
}

/// Overrides for one layer; each entry patches the named parameter group
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerParams {
    pub act: Option<Value>,
    pub inhib: Option<Value>,
    pub learn: Option<Value>,
    /// `ModParams`, for layers that carry modulation state
    pub mods: Option<Value>,
    /// `DaModParams`, likewise
    pub da_mod: Option<Value>,
}

/// Overrides for one pathway
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathParams {
    pub wt_init: Option<Value>,
    pub wt_scale: Option<Value>,
    pub learn: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamBundle {
    pub name: String,
    pub layers: BTreeMap<String, LayerParams>,
    pub paths: BTreeMap<String, PathParams>,
}

impl ParamBundle {
    pub fn from_json(src: &str) -> Result<Self> {
        Ok(serde_json::from_str(src)?)
    }

    /// Read a bundle from a JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("reading param bundle {}", path.display()))?;
        let bundle = Self::from_json(&src)
            .with_context(|| format!("parsing param bundle {}", path.display()))?;
        log::debug!(
            "loaded param bundle {} ({} layers, {} paths)",
            bundle.name,
            bundle.layers.len(),
            bundle.paths.len()
        );
        Ok(bundle)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let src = serde_json::to_string_pretty(self)?;
        std::fs::write(path, src).with_context(|| format!("writing {}", path.display()))
    }
}

/// Merge a JSON patch into a parameter struct, field by field
pub fn merge_params<T>(target: &mut T, patch: &Value) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    let mut cur = serde_json::to_value(&*target)?;
    merge_value(&mut cur, patch);
    *target = serde_json::from_value(cur)?;
    Ok(())
}

fn merge_value(dst: &mut Value, patch: &Value) {
    match (dst, patch) {
        (Value::Object(d), Value::Object(p)) => {
            for (k, v) in p {
                match d.get_mut(k) {
                    Some(dv) => merge_value(dv, v),
                    None => {
                        d.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (dst, patch) => *dst = patch.clone(),
    }
}
