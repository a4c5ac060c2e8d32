//! Sodium-gated potassium adaptation
//!
//! Activity drives Na influx, which opens K channels that pull the
//! membrane back toward rest. Three time scales: fast (M-type),
//! medium (Slick) and slow (Slack).

use serde::{Deserialize, Serialize};

/// One KNa channel time scale
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnaChan {
    pub on: bool,
    /// Rise rate per unit of activity
    pub rise: f32,
    /// Maximum conductance
    pub max: f32,
    /// Decay time constant in cycles
    pub tau: f32,
}

impl Default for KnaChan {
    fn default() -> Self {
        Self {
            on: true,
            rise: 0.01,
            max: 0.1,
            tau: 100.0,
        }
    }
}

impl KnaChan {
    fn with(rise: f32, max: f32, tau: f32) -> Self {
        Self {
            on: true,
            rise,
            max,
            tau,
        }
    }

    /// Rate-code update of the conductance
    pub fn gc_from_rate(&self, g: &mut f32, act: f32) {
        if self.on {
            *g += act * self.rise * (self.max - *g) - (*g / self.tau);
        } else {
            *g = 0.0;
        }
    }
}

/// KNa adaptation over three channels
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnaParams {
    pub on: bool,
    /// Activity multiplier converting rate code to equivalent spike rate
    pub rate: f32,
    pub fast: KnaChan,
    pub med: KnaChan,
    pub slow: KnaChan,
}

impl Default for KnaParams {
    fn default() -> Self {
        Self {
            on: false,
            rate: 0.8,
            fast: KnaChan::with(0.05, 0.1, 50.0),
            med: KnaChan::with(0.02, 0.1, 200.0),
            slow: KnaChan::with(0.001, 1.0, 1000.0),
        }
    }
}

impl KnaParams {
    /// Update all three conductances from activity
    pub fn gc_from_rate(&self, fast: &mut f32, med: &mut f32, slow: &mut f32, act: f32) {
        let act = act * self.rate;
        self.fast.gc_from_rate(fast, act);
        self.med.gc_from_rate(med, act);
        self.slow.gc_from_rate(slow, act);
    }
}
