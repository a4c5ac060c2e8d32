//! Layer inhibition parameters: FFFB at layer and pool level,
//! per-neuron self inhibition, running average activity, and
//! inhibition received from other layers.

use super::fffb::FffbParams;
use serde::{Deserialize, Serialize};

/// Per-neuron recurrent self inhibition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfInhibParams {
    pub on: bool,
    pub gi: f32,
    /// Integration time constant in cycles
    pub tau: f32,
}

impl Default for SelfInhibParams {
    fn default() -> Self {
        Self {
            on: false,
            gi: 0.4,
            tau: 1.4,
        }
    }
}

impl SelfInhibParams {
    pub fn inhib(&self, gi_self: &mut f32, act: f32) {
        if self.on {
            *gi_self += (self.gi * act - *gi_self) / self.tau;
        } else {
            *gi_self = 0.0;
        }
    }
}

/// Expected and running average layer activity, used for input scaling
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActAvgParams {
    /// Initial estimated average activity
    pub init: f32,
    /// Always use `init` as the effective average
    pub fixed: bool,
    /// First update jumps halfway from init
    pub use_first: bool,
    /// Running average time constant in trials
    pub tau: f32,
    /// Multiplier on the running average for the effective value
    pub adjust: f32,
}

impl Default for ActAvgParams {
    fn default() -> Self {
        Self {
            init: 0.15,
            fixed: false,
            use_first: true,
            tau: 100.0,
            adjust: 1.0,
        }
    }
}

impl ActAvgParams {
    pub fn eff_init(&self) -> f32 {
        if self.fixed {
            self.init
        } else {
            self.adjust * self.init
        }
    }

    /// Update running average from a new trial's average activity
    pub fn avg_from_act(&self, avg: &mut f32, act: f32) {
        if act == 0.0 {
            return;
        }
        if self.use_first && *avg == self.init {
            *avg += 0.5 * (act - *avg);
        } else {
            *avg += (act - *avg) / self.tau;
        }
    }

    pub fn eff_from_avg(&self, eff: &mut f32, avg: f32) {
        *eff = if self.fixed { self.init } else { self.adjust * avg };
    }
}

/// Inhibition received from other named layers' pool-level Gi
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterInhibParams {
    /// Layers to receive inhibition from
    pub lays: Vec<String>,
    /// Multiplier on the other layers' Gi
    pub gi: f32,
    /// Add to own Gi, otherwise take the max
    pub add: bool,
}

impl Default for InterInhibParams {
    fn default() -> Self {
        Self {
            lays: Vec::new(),
            gi: 0.5,
            add: false,
        }
    }
}

impl InterInhibParams {
    /// Combine the other layers' original Gi values
    pub fn other_gi(&self, others: impl IntoIterator<Item = f32>) -> f32 {
        let mut gi = 0.0f32;
        for ogi in others {
            if self.add {
                gi += ogi;
            } else {
                gi = gi.max(ogi);
            }
        }
        gi
    }

    /// Apply scaled other-layer Gi to own pool Gi
    pub fn apply(&self, pool_gi: &mut f32, other_gi: f32) {
        let ogi = self.gi * other_gi;
        if self.add {
            *pool_gi += ogi;
        } else {
            *pool_gi = pool_gi.max(ogi);
        }
    }
}

/// All inhibition parameters for a layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InhibParams {
    pub layer: FffbParams,
    pub pool: FffbParams,
    #[serde(rename = "self")]
    pub self_inhib: SelfInhibParams,
    pub act_avg: ActAvgParams,
    pub inter: InterInhibParams,
}

impl Default for InhibParams {
    fn default() -> Self {
        Self {
            layer: FffbParams::default(),
            pool: FffbParams::off(),
            self_inhib: SelfInhibParams::default(),
            act_avg: ActAvgParams::default(),
            inter: InterInhibParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avg_use_first() {
        let p = ActAvgParams::default();
        let mut avg = p.init;
        p.avg_from_act(&mut avg, 0.35);
        assert!((avg - 0.25).abs() < 1e-6);
        p.avg_from_act(&mut avg, 0.0);
        assert!((avg - 0.25).abs() < 1e-6);
        p.avg_from_act(&mut avg, 0.35);
        assert!((avg - 0.251).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_eff() {
        let p = ActAvgParams {
            fixed: true,
            init: 0.2,
            ..Default::default()
        };
        let mut eff = 0.0;
        p.eff_from_avg(&mut eff, 0.9);
        assert_eq!(eff, 0.2);
    }

    #[test]
    fn test_self_inhib_off_zeroes() {
        let p = SelfInhibParams::default();
        let mut gs = 0.3;
        p.inhib(&mut gs, 1.0);
        assert_eq!(gs, 0.0);
    }

    #[test]
    fn test_inter_inhib_max_and_add() {
        let mut p = InterInhibParams::default();
        let other = p.other_gi([0.4, 1.2, 0.8]);
        assert_eq!(other, 1.2);
        let mut gi = 0.5;
        p.apply(&mut gi, other);
        assert!((gi - 0.6).abs() < 1e-6);
        p.add = true;
        let sum = p.other_gi([0.4, 0.6]);
        let mut gi = 0.5;
        p.apply(&mut gi, sum);
        assert!((gi - 1.0).abs() < 1e-6);
    }
}
