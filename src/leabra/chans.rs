//! Channel conductances
//!
//! One value per ion channel: excitatory (E), leak (L), inhibitory (I)
//! and potassium (K). Used for both maximal conductances (Gbar) and
//! reversal potentials (Erev).

use serde::{Deserialize, Serialize};

/// Per-channel values in E, L, I, K order
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chans {
    /// Excitatory sodium (Na) AMPA channels
    pub e: f32,
    /// Constant leak (potassium, K+) channels
    pub l: f32,
    /// Inhibitory GABA-A channels (Cl-)
    pub i: f32,
    /// Gated K channels (adaptation, afterhyperpolarization)
    pub k: f32,
}

impl Chans {
    pub const fn new(e: f32, l: f32, i: f32, k: f32) -> Self {
        Self { e, l, i, k }
    }

    /// Each channel minus a common offset
    pub fn minus(&self, off: f32) -> Self {
        Self::new(self.e - off, self.l - off, self.i - off, self.k - off)
    }

    /// A common offset minus each channel
    pub fn sub_from(&self, off: f32) -> Self {
        Self::new(off - self.e, off - self.l, off - self.i, off - self.k)
    }
}
