//! Subthalamic nucleus with Ca-gated K afterhyperpolarization
//!
//! A burst floods Ca and fully opens KCa, whose conductance is applied
//! as Gk; the unit then pauses until Ca decays. Sub-burst activity above
//! `act_thr` adds Ca slowly. The burst-then-pause is the gating window.

use super::gp::tonic_layer_defaults;
use super::BgSender;
use crate::leabra::{ActParams, Layer, LearnNeurParams, Neuron, Pathway};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaParams {
    /// Activity at which a burst drives a strong Ca influx
    pub burst_thr: f32,
    /// Activity above which Ca rises in proportion
    pub act_thr: f32,
    pub burst_ca: f32,
    pub act_ca: f32,
    /// Maximal KCa conductance, applied as Gk
    pub gbar_kca: f32,
    pub kca_tau: f32,
    pub ca_tau: f32,
}

impl Default for CaParams {
    fn default() -> Self {
        Self {
            burst_thr: 0.9,
            act_thr: 0.7,
            burst_ca: 200.0,
            act_ca: 0.2,
            gbar_kca: 20.0,
            kca_tau: 40.0,
            ca_tau: 185.7,
        }
    }
}

impl CaParams {
    /// Asymptotic KCa conductance for a Ca level (Gillies & Willshaw 2006)
    pub fn kca_g_from_ca(&self, ca: f32) -> f32 {
        0.81 / (1.0 + (-(ca.ln() + 0.3)).exp() / 0.46)
    }

    /// Advance Ca and KCa by one cycle given the unit's new activity
    pub fn update(&self, snr: &mut StnNeuron, act: f32) {
        snr.kca += (self.kca_g_from_ca(snr.ca) - snr.kca) / self.kca_tau;
        let mut dca = -snr.ca / self.ca_tau;
        if act >= self.burst_thr {
            dca += self.burst_ca;
            snr.kca = 1.0;
        } else if act >= self.act_thr {
            dca += (act - self.act_thr) * self.act_ca;
        }
        snr.ca += dca;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StnNeuron {
    pub ca: f32,
    pub kca: f32,
}

pub const STN_VAR_NAMES: [&str; 2] = ["Ca", "KCa"];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StnState {
    pub ca: CaParams,
    #[serde(skip)]
    pub neurons: Vec<StnNeuron>,
}

impl StnState {
    pub fn build(&mut self, n: usize) {
        self.neurons = vec![StnNeuron::default(); n];
    }

    pub fn init_acts(&mut self) {
        self.neurons.iter_mut().for_each(|s| *s = StnNeuron::default());
    }

    pub fn alpha_cyc_init(&mut self, neurons: &mut [Neuron]) {
        for (snr, nrn) in self.neurons.iter_mut().zip(neurons.iter_mut()) {
            if nrn.is_off() {
                continue;
            }
            nrn.gk = 0.0;
            *snr = StnNeuron::default();
        }
    }

    pub fn act_from_g(&mut self, act: &ActParams, learn: &LearnNeurParams, neurons: &mut [Neuron]) {
        for (snr, nrn) in self.neurons.iter_mut().zip(neurons.iter_mut()) {
            if nrn.is_off() {
                continue;
            }
            act.vm_from_g(nrn);
            act.act_from_g(nrn);
            self.ca.update(snr, nrn.act);
            nrn.gk = self.ca.gbar_kca * snr.kca;
            learn.avgs_from_act(nrn);
        }
    }

    pub fn unit_val(&self, var: &str, ni: usize) -> Option<f32> {
        let snr = self.neurons.get(ni)?;
        match var {
            "Ca" => Some(snr.ca),
            "KCa" => Some(snr.kca),
            _ => None,
        }
    }
}

pub fn stn_layer_defaults(ly: &mut Layer) {
    tonic_layer_defaults(ly);
    ly.act.init.vm = 0.9;
    ly.act.init.act = 0.5;
}

/// Receiving pathways are fixed; STNp takes weak GPe input, STNs weak everything
pub fn stn_path_defaults(recv_name: &str, sender: BgSender, pj: &mut Pathway) {
    pj.learn.learn = false;
    pj.learn.wt_sig.gain = 1.0;
    pj.wt_init.rnd.mean = 0.9;
    pj.wt_init.rnd.var = 0.0;
    pj.wt_init.sym = false;
    if recv_name.ends_with("STNp") {
        if sender == BgSender::Gp {
            pj.wt_scale.abs = 0.1;
        }
    } else if sender == BgSender::Gp {
        pj.wt_scale.abs = 0.1;
    } else {
        pj.wt_scale.abs = 0.2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leabra::{PathType, PathwayRole, Pattern};

    #[test]
    fn test_burst_opens_kca() {
        let p = CaParams::default();
        let mut snr = StnNeuron::default();
        p.update(&mut snr, 0.95);
        assert_eq!(snr.kca, 1.0);
        assert!((snr.ca - 200.0).abs() < 1e-3);
        // Ca decays and KCa relaxes toward its Ca-driven level
        p.update(&mut snr, 0.1);
        assert!(snr.ca < 200.0);
        assert!(snr.kca < 1.0);
    }

    #[test]
    fn test_sub_burst_ca_and_zero_ca_is_finite() {
        let p = CaParams::default();
        assert_eq!(p.kca_g_from_ca(0.0), 0.0);
        let mut snr = StnNeuron::default();
        p.update(&mut snr, 0.8);
        assert!((snr.ca - 0.02).abs() < 1e-6);
        assert!(snr.kca.is_finite());
    }

    #[test]
    fn test_alpha_cyc_init_clears() {
        let mut ss = StnState::default();
        ss.build(1);
        ss.neurons[0].ca = 5.0;
        let mut ns = vec![Neuron {
            gk: 3.0,
            ..Default::default()
        }];
        ss.alpha_cyc_init(&mut ns);
        assert_eq!(ns[0].gk, 0.0);
        assert_eq!(ss.neurons[0].ca, 0.0);
    }

    #[test]
    fn test_path_scales() {
        let mut pj = Pathway::new("P".into(), 0, 1, PathType::Forward, Pattern::OneToOne, PathwayRole::Standard);
        stn_path_defaults("BgSTNs", BgSender::Other, &mut pj);
        assert_eq!(pj.wt_scale.abs, 0.2);
        assert!(!pj.learn.learn);
        stn_path_defaults("BgSTNp", BgSender::Gp, &mut pj);
        assert_eq!(pj.wt_scale.abs, 0.1);
    }
}
