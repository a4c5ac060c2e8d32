//! Synapse state
//!
//! NOTE: Wt is always the sigmoid of LWt (times Scale) outside of an
//! in-flight weight update. DWt is zeroed as soon as it is applied.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Synapse {
    /// Effective contrast-enhanced weight
    pub wt: f32,
    /// Linear weight, the value learning acts on
    pub lwt: f32,
    pub dwt: f32,
    /// Running max of |DWt|, shared across a sender's synapses
    pub norm: f32,
    pub moment: f32,
    /// Per-synapse multiplier on Wt
    pub scale: f32,
}

impl Default for Synapse {
    fn default() -> Self {
        Self {
            wt: 0.0,
            lwt: 0.0,
            dwt: 0.0,
            norm: 0.0,
            moment: 0.0,
            scale: 1.0,
        }
    }
}

/// Per-synapse eligibility trace used by dopamine-gated pathways
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceSyn {
    /// New trace contribution computed this learning step
    pub ntr: f32,
    /// Accumulated, decaying trace
    pub tr: f32,
}

/// Stable names of synapse variables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SynVar {
    Wt,
    LWt,
    DWt,
    Norm,
    Moment,
    Scale,
    NTr,
    Tr,
}

impl SynVar {
    pub const ALL: [SynVar; 8] = [
        SynVar::Wt,
        SynVar::LWt,
        SynVar::DWt,
        SynVar::Norm,
        SynVar::Moment,
        SynVar::Scale,
        SynVar::NTr,
        SynVar::Tr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SynVar::Wt => "Wt",
            SynVar::LWt => "LWt",
            SynVar::DWt => "DWt",
            SynVar::Norm => "Norm",
            SynVar::Moment => "Moment",
            SynVar::Scale => "Scale",
            SynVar::NTr => "NTr",
            SynVar::Tr => "Tr",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.name() == name)
    }

    /// Trace variables only exist on trace pathways
    pub fn is_trace(self) -> bool {
        matches!(self, SynVar::NTr | SynVar::Tr)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl Synapse {
    pub fn var(&self, v: SynVar) -> Option<f32> {
        match v {
            SynVar::Wt => Some(self.wt),
            SynVar::LWt => Some(self.lwt),
            SynVar::DWt => Some(self.dwt),
            SynVar::Norm => Some(self.norm),
            SynVar::Moment => Some(self.moment),
            SynVar::Scale => Some(self.scale),
            SynVar::NTr | SynVar::Tr => None,
        }
    }
}

impl TraceSyn {
    pub fn var(&self, v: SynVar) -> Option<f32> {
        match v {
            SynVar::NTr => Some(self.ntr),
            SynVar::Tr => Some(self.tr),
            _ => None,
        }
    }
}
