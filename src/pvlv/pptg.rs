//! Pedunculopontine tegmentum: positive-rectified change in excitation
//!
//! Each unit reports how much its Ge rose since the last plus phase,
//! which gives the VTA a phasic CS-onset signal.

use crate::leabra::{ActParams, LearnNeurParams, Neuron, Time};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PptgState {
    pub dnet_gain: f32,
    /// Net deltas below this are zeroed
    pub act_threshold: f32,
    /// Clip activity to the clamp range
    pub clamp_activation: bool,
    /// Ge at the end of the previous plus phase, per unit
    #[serde(skip)]
    pub ge_prev: Vec<f32>,
}

impl Default for PptgState {
    fn default() -> Self {
        Self {
            dnet_gain: 1.0,
            act_threshold: 0.0,
            clamp_activation: false,
            ge_prev: Vec::new(),
        }
    }
}

impl PptgState {
    pub fn build(&mut self, n: usize) {
        self.ge_prev = vec![0.0; n];
    }

    pub fn init_acts(&mut self) {
        self.ge_prev.iter_mut().for_each(|g| *g = 0.0);
    }

    pub fn act_from_g(&self, act: &ActParams, learn: &LearnNeurParams, neurons: &mut [Neuron]) {
        for (ni, nrn) in neurons.iter_mut().enumerate() {
            if nrn.is_off() {
                continue;
            }
            let ge = nrn.ge;
            let prev = self.ge_prev.get(ni).copied().unwrap_or(0.0);
            let mut dnet = self.dnet_gain * (ge - prev);
            if dnet < self.act_threshold {
                dnet = 0.0;
            }
            if self.clamp_activation {
                dnet = act.clamp.range.clip(dnet);
            }
            nrn.act = dnet;
            nrn.act_lrn = dnet;
            nrn.act_del = 0.0;
            nrn.ge = ge;
            learn.avgs_from_act(nrn);
        }
    }

    pub fn quarter_final(&mut self, neurons: &[Neuron], time: &Time) {
        if !time.plus_phase {
            return;
        }
        for (gp, nrn) in self.ge_prev.iter_mut().zip(neurons) {
            *gp = nrn.ge;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_rise_in_ge_only() {
        let mut ps = PptgState::default();
        ps.build(2);
        let act = ActParams::default();
        let learn = LearnNeurParams::default();
        let mut ns = vec![Neuron::default(); 2];
        ns[0].ge = 0.6;
        ns[1].ge = 0.2;
        ps.act_from_g(&act, &learn, &mut ns);
        assert!((ns[0].act - 0.6).abs() < 1e-6);
        assert_eq!(ns[0].ge, 0.6);

        let plus = Time {
            quarter: 3,
            plus_phase: true,
            ..Default::default()
        };
        ps.quarter_final(&ns, &plus);
        ns[0].ge = 0.6;
        ns[1].ge = 0.1;
        ps.act_from_g(&act, &learn, &mut ns);
        assert_eq!(ns[0].act, 0.0);
        assert_eq!(ns[1].act, 0.0);
    }

    #[test]
    fn test_ge_prev_only_saved_in_plus_phase() {
        let mut ps = PptgState::default();
        ps.build(1);
        let ns = vec![Neuron {
            ge: 0.4,
            ..Default::default()
        }];
        ps.quarter_final(&ns, &Time::default());
        assert_eq!(ps.ge_prev[0], 0.0);
    }
}
