//! Globus pallidus: GPeOut, GPeIn, GPeTA and GPi
//!
//! Tonically active layers with no FFFB, only self inhibition. After
//! `min_act_cyc` each unit tracks its minimum activity over the alpha
//! cycle, and that minimum is the ActLrn used by the GPeIn and GPi
//! learning rules: a unit that was pushed down has gated.

use super::matrix::trace_step;
use super::BgSender;
use crate::leabra::{
    norm_max, ActParams, Conns, Layer, LearnSynParams, Neuron, Pathway, PathwayRole, Synapse,
    Time, TraceSyn,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpState {
    /// Cycle after which the alpha-cycle minimum starts updating
    pub min_act_cyc: usize,
    #[serde(skip)]
    pub alpha_min_act: Vec<f32>,
}

impl Default for GpState {
    fn default() -> Self {
        Self {
            min_act_cyc: 30,
            alpha_min_act: Vec::new(),
        }
    }
}

impl GpState {
    pub fn build(&mut self, n: usize) {
        self.alpha_min_act = vec![0.0; n];
    }

    pub fn reset_min_act(&mut self, act: &ActParams) {
        let init = act.init.act;
        self.alpha_min_act.iter_mut().for_each(|m| *m = init);
    }

    pub fn track_min_act(&mut self, time: &Time, neurons: &mut [Neuron]) {
        if time.cycle < self.min_act_cyc {
            return;
        }
        for (min, nrn) in self.alpha_min_act.iter_mut().zip(neurons.iter_mut()) {
            if nrn.is_off() {
                continue;
            }
            *min = min.min(nrn.act);
            nrn.act_lrn = *min;
        }
    }
}

/// Defaults shared by the tonic BG layers: GP, STN, VThal
pub(crate) fn tonic_layer_defaults(ly: &mut Layer) {
    let ac = &mut ly.act;
    ac.erev.l = 0.8;
    ac.gbar.l = 0.3;
    ac.xx1.gain = 20.0;
    ac.dt.vm_tau = 3.3;
    ac.dt.g_tau = 3.0;
    ac.init.decay = 0.0;
    let inh = &mut ly.inhib;
    inh.layer.on = false;
    inh.pool.on = false;
    inh.self_inhib.on = true;
    inh.self_inhib.gi = 0.4;
    inh.self_inhib.tau = 3.0;
    inh.act_avg.init = 0.25;
    inh.act_avg.fixed = true;
}

pub fn gp_layer_defaults(ly: &mut Layer) {
    tonic_layer_defaults(ly);
    ly.act.init.vm = 0.57;
    ly.act.init.act = 0.65;
    if ly.name.ends_with("GPeIn") {
        ly.act.init.act = 0.77;
    } else if ly.name.ends_with("GPeTA") {
        ly.act.init.act = 0.15;
        ly.act.init.vm = 0.5;
    }
}

/// Receiving pathway defaults for a GPe layer, by sender class and own name
pub fn gp_path_defaults(recv_name: &str, sender: BgSender, pj: &mut Pathway) {
    pj.learn.wt_sig.gain = 1.0;
    pj.wt_init.rnd.mean = 0.9;
    pj.wt_init.rnd.var = 0.0;
    pj.wt_init.sym = false;
    match pj.role {
        PathwayRole::GpeIn => {
            match sender {
                BgSender::Matrix => pj.wt_scale.abs = 1.0,
                BgSender::Gp => pj.wt_scale.abs = 0.5,
                _ => {}
            }
            return;
        }
        PathwayRole::GpiTrace(_) => return,
        _ => {}
    }
    pj.learn.learn = false;
    match sender {
        BgSender::Matrix => pj.wt_scale.abs = 0.5,
        BgSender::Stn => pj.wt_scale.abs = 0.1,
        _ => {}
    }
    if recv_name.ends_with("GPeOut") {
        if sender == BgSender::Matrix {
            pj.wt_scale.abs = 0.5;
        }
    } else if recv_name.ends_with("GPeIn") {
        if sender == BgSender::Stn {
            pj.wt_scale.abs = 0.5;
        }
    } else if recv_name.ends_with("GPeTA") && sender == BgSender::Gp {
        pj.wt_scale.abs = 0.9;
    }
}

/// Receiving pathway defaults for GPi: GPe defaults, then its own scales
pub fn gpi_path_defaults(recv_name: &str, sender: BgSender, send_name: &str, pj: &mut Pathway) {
    gp_path_defaults(recv_name, sender, pj);
    pj.wt_init.rnd.mean = 0.5;
    if sender == BgSender::Matrix {
        pj.wt_scale.abs = 0.8;
    } else if sender == BgSender::Gp {
        pj.wt_scale.abs = 1.0;
    } else if send_name.ends_with("STNp") {
        pj.wt_scale.abs = 1.0;
    } else if send_name.ends_with("STNs") {
        pj.wt_scale.abs = 0.2;
    }
}

/// DA-Hebbian on the alpha-cycle minimum activity of both sides
pub fn gpe_in_dwt(
    learn: &LearnSynParams,
    conns: &Conns,
    syns: &mut [Synapse],
    send: &Layer,
    recv: &Layer,
) {
    let da = recv.modulators.da;
    for (si, sn) in send.neurons.iter().enumerate() {
        let range = conns.send_range(si);
        for k in range.clone() {
            let rn = &recv.neurons[conns.send_idx[k]];
            let sy = &mut syns[k];
            let dwt = da * rn.act_lrn * sn.act_lrn;
            let dwt = learn.norm_moment(&mut sy.norm, &mut sy.moment, dwt);
            sy.dwt += learn.lrate * dwt;
        }
        norm_max(learn, &mut syns[range]);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpiTraceParams {
    /// Add this trial's co-activity to the trace before DA is applied
    pub cur_trl_da: bool,
    /// Multiplier on ACh for trace decay, capped at full decay
    pub decay: f32,
    /// Activity below which the stripe counts as gated
    pub gate_act: f32,
}

impl Default for GpiTraceParams {
    fn default() -> Self {
        Self {
            cur_trl_da: false,
            decay: 2.0,
            gate_act: 0.2,
        }
    }
}

impl GpiTraceParams {
    /// Positive when gated (act below `gate_act`), negative otherwise
    pub fn lrn_factor(&self, act: f32) -> f32 {
        if act < self.gate_act {
            (self.gate_act - act) / self.gate_act
        } else {
            (self.gate_act - act) / (1.0 - self.gate_act)
        }
    }
}

pub fn gpi_trace_dwt(
    p: &GpiTraceParams,
    learn: &LearnSynParams,
    conns: &Conns,
    syns: &mut [Synapse],
    trace: &mut [TraceSyn],
    send: &Layer,
    recv: &Layer,
) {
    let da = recv.modulators.da;
    let dk = (recv.modulators.ach * p.decay).min(1.0);
    for (si, sn) in send.neurons.iter().enumerate() {
        let range = conns.send_range(si);
        for k in range.clone() {
            let rn = &recv.neurons[conns.send_idx[k]];
            let ntr = p.lrn_factor(rn.act_lrn) * sn.act_lrn;
            let dwt = trace_step(&mut trace[k], ntr, da, da, dk, p.cur_trl_da);
            let sy = &mut syns[k];
            let dwt = learn.norm_moment(&mut sy.norm, &mut sy.moment, dwt);
            sy.dwt += learn.lrate * dwt;
        }
        norm_max(learn, &mut syns[range]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leabra::{LayerKind, LayerType, PathType, Pattern};

    fn gp(name: &str) -> Layer {
        Layer::with_kind(name, &[1, 1], LayerType::Hidden, LayerKind::Gp(GpState::default()))
    }

    #[test]
    fn test_suffix_init_acts() {
        assert_eq!(gp("BgGPeIn").act.init.act, 0.77);
        let gta = gp("GPeTA");
        assert_eq!(gta.act.init.act, 0.15);
        assert_eq!(gta.act.init.vm, 0.5);
        let gout = gp("GPeOut");
        assert_eq!(gout.act.init.act, 0.65);
        assert!(!gout.inhib.layer.on && !gout.inhib.pool.on);
    }

    #[test]
    fn test_min_act_tracked_after_min_cyc() {
        let mut gs = GpState::default();
        gs.build(1);
        let mut act = ActParams::default();
        act.init.act = 0.65;
        gs.reset_min_act(&act);
        let mut ns = vec![Neuron {
            act: 0.3,
            ..Default::default()
        }];
        let mut t = Time::default();
        t.cycle = 10;
        gs.track_min_act(&t, &mut ns);
        assert_eq!(gs.alpha_min_act[0], 0.65);
        t.cycle = 30;
        gs.track_min_act(&t, &mut ns);
        assert_eq!(ns[0].act_lrn, 0.3);
        ns[0].act = 0.5;
        gs.track_min_act(&t, &mut ns);
        assert_eq!(ns[0].act_lrn, 0.3);
    }

    fn path(role: PathwayRole) -> Pathway {
        Pathway::new("P".into(), 0, 1, PathType::Inhib, Pattern::OneToOne, role)
    }

    #[test]
    fn test_gpe_path_dispatch() {
        let mut pj = path(PathwayRole::GpeIn);
        gp_path_defaults("GPeIn", BgSender::Gp, &mut pj);
        assert_eq!(pj.wt_scale.abs, 0.5);
        assert!(pj.learn.learn);

        let mut pj = path(PathwayRole::Standard);
        gp_path_defaults("GPeIn", BgSender::Stn, &mut pj);
        assert_eq!(pj.wt_scale.abs, 0.5);
        assert!(!pj.learn.learn);
        assert_eq!(pj.wt_init.rnd.mean, 0.9);

        let mut pj = path(PathwayRole::Standard);
        gp_path_defaults("GPeTA", BgSender::Stn, &mut pj);
        assert_eq!(pj.wt_scale.abs, 0.1);

        let mut pj = path(PathwayRole::Standard);
        gp_path_defaults("GPeTA", BgSender::Gp, &mut pj);
        assert_eq!(pj.wt_scale.abs, 0.9);
    }

    #[test]
    fn test_gpi_path_dispatch() {
        let mut pj = path(PathwayRole::GpiTrace(GpiTraceParams::default()));
        gpi_path_defaults("GPi", BgSender::Matrix, "MtxGo", &mut pj);
        assert_eq!(pj.wt_scale.abs, 0.8);
        assert_eq!(pj.wt_init.rnd.mean, 0.5);
        assert!(pj.learn.learn);

        let mut pj = path(PathwayRole::Standard);
        gpi_path_defaults("GPi", BgSender::Other, "BgSTNs", &mut pj);
        assert_eq!(pj.wt_scale.abs, 0.2);
        assert!(!pj.learn.learn);
    }

    #[test]
    fn test_gpi_lrn_factor_sign() {
        let p = GpiTraceParams::default();
        assert!((p.lrn_factor(0.0) - 1.0).abs() < 1e-6);
        assert_eq!(p.lrn_factor(0.2), 0.0);
        assert!((p.lrn_factor(1.0) + 1.0).abs() < 1e-6);
    }
}
