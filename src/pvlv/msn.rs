//! Striatal medium spiny neurons and their learning pathways
//!
//! Matrix MSN layers carry delayed inhibition from the previous trial's
//! Ge, which biases them toward switching what they gate. Patch layers
//! pass modulation straight through like other modulated layers.
//!
//! `TraceNoThalVs` learns from the trace built on earlier trials, so a
//! gating event at trial T is credited by DA arriving at T+2 with no
//! weight change in between.

use crate::leabra::{
    ActParams, Conns, Layer, LearnNeurParams, LearnSynParams, Neuron, NeuronVar, Synapse, Time,
    TraceSyn,
};
use crate::neuromod::{DaRType, ModState, Modulators};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StriatalCompartment {
    #[default]
    Patch,
    Matrix,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsnParams {
    /// Multiplier on DA from patch shunting, 0 = full shunt
    pub patch_shunt: f32,
    pub shunt_ach: bool,
    /// Extra inhibition for output-gating units when ACh is absent
    pub out_ach_inhib: f32,
}

impl Default for MsnParams {
    fn default() -> Self {
        Self {
            patch_shunt: 0.2,
            shunt_ach: true,
            out_ach_inhib: 0.3,
        }
    }
}

/// Inhibition from a unit's own earlier net input
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayedInhibParams {
    pub active: bool,
    /// Weight on Ge from the previous quarter
    pub prv_q: f32,
    /// Weight on Ge from the previous trial
    pub prv_trl: f32,
}

/// Per-unit MSN state
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MsnNeuron {
    pub da_lrn: f32,
    pub shunt: f32,
    pub ge_prv_q: f32,
    pub ge_prv_trl: f32,
}

pub const MSN_VAR_NAMES: [&str; 4] = ["DALrn", "Shunt", "GePrvQ", "GePrvTrl"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsnState {
    pub compartment: StriatalCompartment,
    pub dar: DaRType,
    pub params: MsnParams,
    pub del_inh: DelayedInhibParams,
    #[serde(skip)]
    pub neurons: Vec<MsnNeuron>,
}

impl Default for MsnState {
    fn default() -> Self {
        Self::new(StriatalCompartment::Patch, DaRType::D1R)
    }
}

impl MsnState {
    pub fn new(compartment: StriatalCompartment, dar: DaRType) -> Self {
        let del_inh = if compartment == StriatalCompartment::Matrix {
            DelayedInhibParams {
                active: true,
                prv_q: 0.0,
                prv_trl: 6.0,
            }
        } else {
            DelayedInhibParams::default()
        };
        Self {
            compartment,
            dar,
            params: MsnParams::default(),
            del_inh,
            neurons: Vec::new(),
        }
    }

    pub fn build(&mut self, n: usize) {
        self.neurons = vec![MsnNeuron::default(); n];
    }

    pub fn init_acts(&mut self) {
        for msn in &mut self.neurons {
            msn.ge_prv_q = 0.0;
            msn.ge_prv_trl = 0.0;
            msn.shunt = 0.0;
        }
    }

    /// Snapshot Ge at the start of a new trial
    pub fn save_prv_trl(&mut self, neurons: &[Neuron]) {
        if !self.del_inh.active {
            return;
        }
        for (msn, nrn) in self.neurons.iter_mut().zip(neurons) {
            msn.ge_prv_trl = nrn.ge;
        }
    }

    pub fn quarter_init_prvs(&mut self, neurons: &[Neuron], time: &Time) {
        for (msn, nrn) in self.neurons.iter_mut().zip(neurons) {
            msn.ge_prv_q = if time.quarter == 0 {
                msn.ge_prv_trl
            } else {
                nrn.ge
            };
        }
    }

    /// Add delayed inhibition on top of the already computed Gi
    pub fn add_delayed_inhib(&self, neurons: &mut [Neuron]) {
        let di = &self.del_inh;
        if !di.active {
            return;
        }
        for (nrn, msn) in neurons.iter_mut().zip(&self.neurons) {
            if nrn.is_off() {
                continue;
            }
            nrn.gi += di.prv_trl * msn.ge_prv_trl + di.prv_q * msn.ge_prv_q;
        }
    }

    /// Take layer DA / ACh, then gate by compartment
    pub fn mods_from_inc(&mut self, ms: &mut ModState, lay: &Modulators, neurons: &[Neuron]) {
        for (ni, nrn) in neurons.iter().enumerate() {
            if nrn.is_off() {
                continue;
            }
            let mnr = &mut ms.neurons[ni];
            mnr.mods.da = lay.da;
            mnr.mods.ach = lay.ach;
            self.neurons[ni].da_lrn = ms.da_mod.dalrn_from_da(lay.da);
        }
        let pl_max = ms.pool_max();
        let thr = ms.params.mod_net_threshold;
        let act_mod_zero = ms.params.act_mod_zero;
        for mnr in &mut ms.neurons {
            if mnr.mod_net <= thr {
                mnr.mod_lrn = 0.0;
                mnr.mod_level = match self.compartment {
                    StriatalCompartment::Patch if act_mod_zero => 0.0,
                    _ => 1.0,
                };
            } else {
                if pl_max != 0.0 {
                    mnr.mod_lrn = (mnr.mod_net / pl_max).min(1.0);
                } else if self.compartment == StriatalCompartment::Patch {
                    mnr.mod_lrn = 0.0;
                }
                mnr.mod_level = 1.0;
            }
        }
        ms.set_mod_levels(neurons);
    }

    /// Base activation, gated by ModLevel unless the layer sends modulation
    pub fn act_from_g(
        &self,
        act: &ActParams,
        learn: &LearnNeurParams,
        ms: &ModState,
        neurons: &mut [Neuron],
    ) {
        let gate = !ms.params.is_mod_sender;
        for (nrn, mnr) in neurons.iter_mut().zip(&ms.neurons) {
            if nrn.is_off() {
                continue;
            }
            act.vm_from_g(nrn);
            act.act_from_g(nrn);
            if gate {
                let new_act = nrn.act * mnr.mod_level;
                nrn.act_del -= nrn.act - new_act;
                nrn.act = new_act;
            }
            learn.avgs_from_act(nrn);
        }
    }

    pub fn unit_val(&self, var: &str, ni: usize) -> Option<f32> {
        let msn = self.neurons.get(ni)?;
        match var {
            "DALrn" => Some(msn.da_lrn),
            "Shunt" => Some(msn.shunt),
            "GePrvQ" => Some(msn.ge_prv_q),
            "GePrvTrl" => Some(msn.ge_prv_trl),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaLrnRule {
    /// DA times receiver and sender activity, scaled by ModLrn
    #[default]
    DaHebbVs,
    /// DA times the trace accumulated on earlier learning steps
    TraceNoThalVs,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsnTraceParams {
    /// Use 2 * act * (1 - act) instead of act
    pub deriv: bool,
    pub decay: f32,
}

impl Default for MsnTraceParams {
    fn default() -> Self {
        Self {
            deriv: true,
            decay: 1.0,
        }
    }
}

impl MsnTraceParams {
    pub fn act_lrn_factor(&self, act: f32) -> f32 {
        if self.deriv {
            2.0 * act * (1.0 - act)
        } else {
            act
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsnPathParams {
    pub rule: DaLrnRule,
    pub trace: MsnTraceParams,
    /// Activation variable read on both sides
    pub act_var: NeuronVar,
    /// Cap on how much ModNet can stand in for receiver activity
    pub max_vs_act_mod: f32,
}

impl Default for MsnPathParams {
    fn default() -> Self {
        Self {
            rule: DaLrnRule::DaHebbVs,
            trace: MsnTraceParams::default(),
            act_var: NeuronVar::ActP,
            max_vs_act_mod: 0.7,
        }
    }
}

pub fn msn_dwt(
    p: &MsnPathParams,
    learn: &LearnSynParams,
    conns: &Conns,
    syns: &mut [Synapse],
    trace: &mut [TraceSyn],
    send: &Layer,
    recv: &Layer,
) {
    if recv.off {
        return;
    }
    let Some(ms) = &recv.mods else {
        log::warn!("MSN pathway into {} which has no modulation state", recv.name);
        return;
    };
    for (si, sn) in send.neurons.iter().enumerate() {
        let sn_act = sn.var(p.act_var);
        for k in conns.send_range(si) {
            let ri = conns.send_idx[k];
            let rn = &recv.neurons[ri];
            if rn.is_off() {
                continue;
            }
            let mn = &ms.neurons[ri];
            let da_lrn = ms.dalrn_from_da(mn.mods.da);
            let rn_act = rn.var(p.act_var);
            let eff_rn_act = rn_act.max(mn.mod_net.min(p.max_vs_act_mod));
            let (lr, raw) = match p.rule {
                DaLrnRule::TraceNoThalVs => {
                    let trs = &mut trace[k];
                    let raw = da_lrn * trs.tr;
                    let ntr = p.trace.act_lrn_factor(eff_rn_act) * sn_act;
                    let decay = ntr.abs().min(1.0);
                    trs.tr += ntr - decay * trs.tr;
                    trs.ntr = ntr;
                    (learn.lrate, raw)
                }
                DaLrnRule::DaHebbVs => (learn.lrate * mn.mod_lrn, da_lrn * eff_rn_act * sn_act),
            };
            syns[k].dwt += lr * raw;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leabra::{connect_pattern, LayerKind, LayerType, Pattern};
    use crate::neuromod::ModulatorSink;

    fn msn_layer(comp: StriatalCompartment) -> Layer {
        let mut ly = Layer::with_kind(
            "VSMatrixPosD1",
            &[1, 2],
            LayerType::Hidden,
            LayerKind::Msn(MsnState::new(comp, DaRType::D1R)),
        );
        ly.build().unwrap();
        ly.init_wts_state();
        ly
    }

    #[test]
    fn test_matrix_delayed_inhib() {
        let mut ly = msn_layer(StriatalCompartment::Matrix);
        ly.neurons[0].ge = 0.1;
        ly.alpha_cyc_init_avgs();
        let LayerKind::Msn(ms) = &ly.kind else {
            panic!("not msn");
        };
        assert_eq!(ms.neurons[0].ge_prv_trl, 0.1);
        ms.add_delayed_inhib(&mut ly.neurons);
        assert!((ly.neurons[0].gi - 0.6).abs() < 1e-6);
        assert_eq!(ly.neurons[1].gi, 0.0);
    }

    #[test]
    fn test_patch_has_no_delayed_inhib() {
        let ms = MsnState::new(StriatalCompartment::Patch, DaRType::D2R);
        assert!(!ms.del_inh.active);
    }

    #[test]
    fn test_matrix_never_gates_activity_off() {
        let mut ly = msn_layer(StriatalCompartment::Matrix);
        let lay = Modulators {
            da: 0.5,
            ..Default::default()
        };
        let LayerKind::Msn(msn) = &mut ly.kind else {
            panic!("not msn");
        };
        let ms = ly.mods.as_mut().unwrap();
        ms.params.act_mod_zero = true;
        msn.mods_from_inc(ms, &lay, &ly.neurons);
        assert!(ms.neurons.iter().all(|m| m.mod_level == 1.0 && m.mod_lrn == 0.0));
        assert_eq!(msn.neurons[0].da_lrn, 0.5);
    }

    fn trace_setup() -> (Layer, Layer, Conns) {
        let mut send = Layer::new("Stim", &[1, 1], LayerType::Input);
        send.build().unwrap();
        let recv = msn_layer(StriatalCompartment::Matrix);
        let conns = Conns::from_pairs(
            connect_pattern(Pattern::Full, 1, &send.pools, 2, &recv.pools),
            1,
            2,
        );
        (send, recv, conns)
    }

    #[test]
    fn test_trace_uses_previous_trace() {
        let (mut send, mut recv, conns) = trace_setup();
        let p = MsnPathParams {
            rule: DaLrnRule::TraceNoThalVs,
            ..Default::default()
        };
        let learn = LearnSynParams::plain();
        let mut syns = vec![Synapse::default(); 2];
        let mut trace = vec![TraceSyn::default(); 2];
        send.neurons[0].act_p = 1.0;
        recv.neurons[0].act_p = 0.5;
        recv.set_da(1.0);
        msn_dwt(&p, &learn, &conns, &mut syns, &mut trace, &send, &recv);
        // first step has no prior trace: no learning even with DA
        assert_eq!(syns[0].dwt, 0.0);
        assert!((trace[0].ntr - 0.5).abs() < 1e-6);
        assert!((trace[0].tr - 0.5).abs() < 1e-6);
        msn_dwt(&p, &learn, &conns, &mut syns, &mut trace, &send, &recv);
        assert!((syns[0].dwt - learn.lrate * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_da_hebb_scaled_by_mod_lrn() {
        let (mut send, mut recv, conns) = trace_setup();
        let learn = LearnSynParams::plain();
        let mut syns = vec![Synapse::default(); 2];
        let mut trace = vec![TraceSyn::default(); 2];
        send.neurons[0].act_p = 1.0;
        recv.neurons[0].act_p = 0.5;
        recv.set_da(-0.4);
        recv.mods.as_mut().unwrap().neurons[0].mod_lrn = 0.5;
        msn_dwt(
            &MsnPathParams::default(),
            &learn,
            &conns,
            &mut syns,
            &mut trace,
            &send,
            &recv,
        );
        let want = learn.lrate * 0.5 * (-0.4 * 0.5);
        assert!((syns[0].dwt - want).abs() < 1e-6);
        assert_eq!(syns[1].dwt, 0.0);
    }
}
