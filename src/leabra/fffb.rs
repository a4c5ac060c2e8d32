//! Feedforward / feedback inhibition
//!
//! Computes a pool's inhibitory conductance from its excitatory net input
//! (feedforward) and its activity (feedback), approximating the effect
//! of a population of inhibitory interneurons.

use super::minmax::AvgMax;
use serde::{Deserialize, Serialize};

/// FFFB inhibition parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FffbParams {
    /// Enable this level of inhibition
    pub on: bool,
    /// Overall inhibition gain
    pub gi: f32,
    /// Feedforward gain on net input
    pub ff: f32,
    /// Feedback gain on average activation
    pub fb: f32,
    /// Feedback time constant in cycles
    pub fb_tau: f32,
    /// Weight of max over average Ge in the feedforward term
    pub max_vs_avg: f32,
    /// Feedforward zero point
    pub ff0: f32,
}

impl Default for FffbParams {
    fn default() -> Self {
        Self {
            on: true,
            gi: 1.8,
            ff: 1.0,
            fb: 1.0,
            fb_tau: 1.4,
            max_vs_avg: 0.0,
            ff0: 0.1,
        }
    }
}

impl FffbParams {
    /// Disabled parameter set, for tonically self-active layers
    pub fn off() -> Self {
        Self {
            on: false,
            ..Default::default()
        }
    }

    #[inline]
    pub fn fb_dt(&self) -> f32 {
        1.0 / self.fb_tau
    }

    /// Feedforward inhibition from Ge statistics
    pub fn ff_inhib(&self, avg_ge: f32, max_ge: f32) -> f32 {
        let ff_netin = avg_ge + self.max_vs_avg * (max_ge - avg_ge);
        if ff_netin > self.ff0 {
            self.ff * (ff_netin - self.ff0)
        } else {
            0.0
        }
    }

    /// Integrate feedback inhibition toward FB * avg activation
    pub fn fb_inhib(&self, fbi: &mut f32, avg_act: f32) {
        let nfb = self.fb * avg_act;
        *fbi += self.fb_dt() * (nfb - *fbi);
    }

    /// Full pool-level computation into `inhib`
    pub fn inhib(&self, inhib: &mut Inhib) {
        if !self.on {
            inhib.zero();
            return;
        }
        let ffi = self.ff_inhib(inhib.ge.avg, inhib.ge.max);
        self.fb_inhib(&mut inhib.fbi, inhib.act.avg);
        inhib.ffi = ffi;
        inhib.gi = self.gi * (ffi + inhib.fbi);
        inhib.gi_orig = inhib.gi;
    }
}

/// Pool-level inhibition state
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Inhib {
    /// Feedforward inhibition
    pub ffi: f32,
    /// Feedback inhibition
    pub fbi: f32,
    /// Overall inhibitory conductance
    pub gi: f32,
    /// Gi before any inter-layer or pool max adjustments
    pub gi_orig: f32,
    /// Layer-level Gi copied into sub-pools
    pub lay_gi: f32,
    pub ge: AvgMax,
    pub act: AvgMax,
}

impl Inhib {
    /// Reset inhibition values, keeping activity statistics
    pub fn zero(&mut self) {
        self.ffi = 0.0;
        self.fbi = 0.0;
        self.gi = 0.0;
        self.gi_orig = 0.0;
        self.lay_gi = 0.0;
    }

    pub fn init(&mut self) {
        self.zero();
        self.ge.init();
        self.act.init();
    }

    /// Decay inhibition state by a proportion toward zero
    pub fn decay(&mut self, decay: f32) {
        self.ge.decay(decay);
        self.act.decay(decay);
        self.ffi -= decay * self.ffi;
        self.fbi -= decay * self.fbi;
        self.gi -= decay * self.gi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ff_proportional_when_ff0_zero() {
        let p = FffbParams {
            ff0: 0.0,
            ff: 1.3,
            ..Default::default()
        };
        for ge in [0.05f32, 0.2, 0.7, 1.5] {
            assert_eq!(p.ff_inhib(ge, ge), p.ff * ge);
        }
    }

    #[test]
    fn test_below_ff0_is_zero() {
        let p = FffbParams::default();
        assert_eq!(p.ff_inhib(0.05, 0.05), 0.0);
    }

    #[test]
    fn test_off_zeroes() {
        let p = FffbParams::off();
        let mut inh = Inhib {
            gi: 3.0,
            fbi: 1.0,
            ..Default::default()
        };
        p.inhib(&mut inh);
        assert_eq!(inh.gi, 0.0);
        assert_eq!(inh.fbi, 0.0);
    }

    #[test]
    fn test_feedback_integrates() {
        let p = FffbParams::default();
        let mut inh = Inhib::default();
        inh.act.avg = 0.5;
        for _ in 0..50 {
            p.inhib(&mut inh);
        }
        assert!((inh.fbi - 0.5).abs() < 1e-3);
        assert!((inh.gi - p.gi * inh.fbi).abs() < 1e-5);
    }
}
