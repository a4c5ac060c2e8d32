//! Modulator state carried by layers that send or receive modulation
//!
//! A sender sums its per-pool activity into `ModPool::mod_sent`; each
//! registered receiver copies that (scaled) into per-neuron `ModNet`,
//! then gates activation through `ModLevel` and learning through
//! `ModLrn`.

use crate::leabra::{Neuron, Pool};
use crate::leabra::AvgMax;
use serde::{Deserialize, Serialize};

/// Layer-level neuromodulator values
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Modulators {
    pub da: f32,
    pub ach: f32,
    pub se: f32,
}

impl Modulators {
    pub fn init(&mut self) {
        *self = Self::default();
    }
}

/// Per-neuron modulation state
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModNeuron {
    pub mods: Modulators,
    /// Activation seen by learning: gated Act scaled by DA, or PVAct
    pub mod_act: f32,
    /// Gate on activation passthrough, 0 or 1
    pub mod_level: f32,
    /// Incoming modulation from senders
    pub mod_net: f32,
    /// Learning-rate multiplier from modulation
    pub mod_lrn: f32,
    /// Primary value activation injected by a PV layer
    pub pv_act: f32,
}

impl Default for ModNeuron {
    fn default() -> Self {
        Self {
            mods: Modulators::default(),
            mod_act: 0.0,
            mod_level: 1.0,
            mod_net: 0.0,
            mod_lrn: 1.0,
            pv_act: 0.0,
        }
    }
}

impl ModNeuron {
    pub fn init_acts(&mut self) {
        *self = Self::default();
    }

    pub fn var(&self, v: ModNeuronVar) -> f32 {
        match v {
            ModNeuronVar::DA => self.mods.da,
            ModNeuronVar::ACh => self.mods.ach,
            ModNeuronVar::SE => self.mods.se,
            ModNeuronVar::ModAct => self.mod_act,
            ModNeuronVar::ModLevel => self.mod_level,
            ModNeuronVar::ModNet => self.mod_net,
            ModNeuronVar::ModLrn => self.mod_lrn,
            ModNeuronVar::PVAct => self.pv_act,
        }
    }
}

/// Modulation variables, indexed after the base neuron variables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModNeuronVar {
    DA,
    ACh,
    SE,
    ModAct,
    ModLevel,
    ModNet,
    ModLrn,
    PVAct,
}

impl ModNeuronVar {
    pub const ALL: [ModNeuronVar; 8] = [
        ModNeuronVar::DA,
        ModNeuronVar::ACh,
        ModNeuronVar::SE,
        ModNeuronVar::ModAct,
        ModNeuronVar::ModLevel,
        ModNeuronVar::ModNet,
        ModNeuronVar::ModLrn,
        ModNeuronVar::PVAct,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModNeuronVar::DA => "DA",
            ModNeuronVar::ACh => "ACh",
            ModNeuronVar::SE => "SE",
            ModNeuronVar::ModAct => "ModAct",
            ModNeuronVar::ModLevel => "ModLevel",
            ModNeuronVar::ModNet => "ModNet",
            ModNeuronVar::ModLrn => "ModLrn",
            ModNeuronVar::PVAct => "PVAct",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.name() == name)
    }
}

/// Per-pool modulation statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModPool {
    pub mod_net_stats: AvgMax,
    /// Summed above-threshold activation sent to receivers
    pub mod_sent: f32,
}

impl ModPool {
    pub fn init(&mut self) {
        self.mod_net_stats.init();
        self.mod_sent = 0.0;
    }
}

/// Dopamine receptor type; D2 reverses the sign of DA effects
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaRType {
    #[default]
    D1R,
    D2R,
}

/// Dopamine effect on learning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaModParams {
    pub on: bool,
    pub recep: DaRType,
    /// Multiplier on positive DA
    pub burst_gain: f32,
    /// Multiplier on negative DA
    pub dip_gain: f32,
}

impl Default for DaModParams {
    fn default() -> Self {
        Self {
            on: false,
            recep: DaRType::D1R,
            burst_gain: 1.0,
            dip_gain: 1.0,
        }
    }
}

impl DaModParams {
    /// Effective learning DA: gain by sign, then sign-reversed for D2
    pub fn dalrn_from_da(&self, da: f32) -> f32 {
        let da = if da > 0.0 {
            da * self.burst_gain
        } else {
            da * self.dip_gain
        };
        match self.recep {
            DaRType::D1R => da,
            DaRType::D2R => -da,
        }
    }
}

/// Modulation gating parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModParams {
    /// DA modulation of Ge in the minus phase
    pub minus: f32,
    /// DA modulation of Ge in the plus phase
    pub plus: f32,
    pub neg_gain: f32,
    pub pos_gain: f32,
    /// Absent modulation zeroes activation rather than passing it through
    pub act_mod_zero: bool,
    /// ModNet at or below this counts as no modulation
    pub mod_net_threshold: f32,
    pub mod_send_threshold: f32,
    pub is_mod_sender: bool,
    pub is_mod_receiver: bool,
    pub is_pv_receiver: bool,
}

impl Default for ModParams {
    fn default() -> Self {
        Self {
            minus: 0.0,
            plus: 0.0,
            neg_gain: 0.0,
            pos_gain: 0.0,
            act_mod_zero: false,
            mod_net_threshold: 0.0,
            mod_send_threshold: 0.1,
            is_mod_sender: false,
            is_mod_receiver: false,
            is_pv_receiver: false,
        }
    }
}

impl ModParams {
    /// DA-modulated excitation for the current phase
    pub fn ge(&self, da: f32, ge: f32, plus_phase: bool) -> f32 {
        if plus_phase {
            self.plus * da * ge
        } else {
            self.minus * da * ge
        }
    }

    /// DA-modulated gain for the current phase
    pub fn gain(&self, da: f32, gain: f32, plus_phase: bool) -> f32 {
        let da = if plus_phase { da * self.plus } else { da * self.minus };
        if da < 0.0 {
            gain * (1.0 + da * self.neg_gain)
        } else {
            gain * (1.0 + da * self.pos_gain)
        }
    }
}

/// A registered modulation receiver
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModRcvr {
    pub name: String,
    pub scale: f32,
    #[serde(skip)]
    pub idx: usize,
}

/// Everything a modulated layer adds on top of the base layer
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModState {
    pub params: ModParams,
    pub da_mod: DaModParams,
    pub modulators: Modulators,
    #[serde(skip)]
    pub neurons: Vec<ModNeuron>,
    #[serde(skip)]
    pub pools: Vec<ModPool>,
    pub receivers: Vec<ModRcvr>,
}

impl ModState {
    pub fn build(&mut self, n_neurons: usize, n_pools: usize) {
        self.neurons = vec![ModNeuron::default(); n_neurons];
        self.pools = vec![ModPool::default(); n_pools];
    }

    pub fn init_acts(&mut self) {
        for mnr in &mut self.neurons {
            mnr.init_acts();
        }
        for mpl in &mut self.pools {
            mpl.init();
        }
        self.modulators.init();
    }

    /// Reset modulation without touching layer-level DA/ACh
    pub fn clear_mod_acts(&mut self) {
        for mnr in &mut self.neurons {
            mnr.init_acts();
        }
        for mpl in &mut self.pools {
            mpl.init();
        }
    }

    pub fn dalrn_from_da(&self, da: f32) -> f32 {
        self.da_mod.dalrn_from_da(da)
    }

    pub fn set_da(&mut self, da: f32) {
        self.modulators.da = da;
        for mnr in &mut self.neurons {
            mnr.mods.da = da;
        }
    }

    pub fn set_ach(&mut self, ach: f32) {
        self.modulators.ach = ach;
        for mnr in &mut self.neurons {
            mnr.mods.ach = ach;
        }
    }

    /// Sum above-threshold activity per pool into `mod_sent`
    pub fn send_mods(&mut self, neurons: &[Neuron], send_thr: f32) {
        for mpl in &mut self.pools {
            mpl.mod_sent = 0.0;
        }
        for nrn in neurons {
            if nrn.act.abs() > send_thr {
                if let Some(mpl) = self.pools.get_mut(nrn.sub_pool) {
                    mpl.mod_sent += nrn.act;
                }
            }
        }
    }

    /// Per-pool values most recently sent
    pub fn mod_sent(&self) -> Vec<f32> {
        self.pools.iter().map(|p| p.mod_sent).collect()
    }

    /// Copy a sender's per-pool values into ModNet, matching pools by index
    pub fn receive_mods(&mut self, neurons: &[Neuron], sent: &[f32], scale: f32) {
        for (nrn, mnr) in neurons.iter().zip(self.neurons.iter_mut()) {
            let val = sent.get(nrn.sub_pool).copied().unwrap_or(0.0);
            mnr.mod_net = val * scale;
        }
    }

    /// Pool-0 ModNet max from the previous statistics pass
    pub fn pool_max(&self) -> f32 {
        self.pools.first().map(|p| p.mod_net_stats.max).unwrap_or(0.0)
    }

    /// Gate ModLevel and ModLrn from incoming ModNet
    pub fn mods_from_inc(&mut self, neurons: &[Neuron]) {
        let pl_max = self.pool_max();
        let p = &self.params;
        for (nrn, mnr) in neurons.iter().zip(self.neurons.iter_mut()) {
            if nrn.is_off() {
                continue;
            }
            if p.is_mod_sender {
                mnr.mod_lrn = nrn.act;
                mnr.mod_level = nrn.act;
            } else if mnr.mod_net <= p.mod_net_threshold {
                mnr.mod_lrn = 0.0;
                mnr.mod_level = if p.act_mod_zero { 0.0 } else { 1.0 };
            } else {
                mnr.mod_lrn = guarded_ratio(mnr.mod_net, pl_max);
                mnr.mod_level = 1.0;
            }
        }
    }

    /// Per-pool ModNet statistics; a zero max is nudged positive so ratios stay finite-signed
    pub fn avg_max_mod(&mut self, neurons: &[Neuron], pools: &[Pool]) {
        for (mpl, pl) in self.pools.iter_mut().zip(pools.iter()) {
            mpl.mod_net_stats.init();
            for ni in pl.range() {
                if neurons[ni].is_off() {
                    continue;
                }
                mpl.mod_net_stats.update(self.neurons[ni].mod_net, ni);
            }
            mpl.mod_net_stats.calc_avg();
            if mpl.mod_net_stats.max == 0.0 {
                mpl.mod_net_stats.max = f32::MIN_POSITIVE;
            }
        }
    }

    /// Gate a freshly computed activation and derive the learning activation
    pub fn mod_act_from_act(&mut self, ni: usize, nrn: &mut Neuron) {
        let is_rcvr = self.params.is_mod_receiver;
        let dalrn = self.da_mod.dalrn_from_da(self.neurons[ni].mods.da);
        let mnr = &mut self.neurons[ni];
        if is_rcvr {
            let new_act = nrn.act * mnr.mod_level;
            let new_del = nrn.act - new_act;
            nrn.act = new_act;
            nrn.act_del -= new_del;
        }
        mnr.mod_act = nrn.act * (1.0 + dalrn);
        if mnr.pv_act > 0.01 {
            mnr.mod_act = mnr.pv_act;
        }
    }

    /// ModAct tracks Act directly
    pub fn set_mod_levels(&mut self, neurons: &[Neuron]) {
        for (nrn, mnr) in neurons.iter().zip(self.neurons.iter_mut()) {
            if nrn.is_off() {
                continue;
            }
            mnr.mod_act = nrn.act;
        }
    }
}

/// num / den clamped to [-1, 1], NaN mapped to 1
pub fn guarded_ratio(num: f32, den: f32) -> f32 {
    let r = num / den;
    if r.is_nan() {
        1.0
    } else {
        r.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neurons(acts: &[f32]) -> Vec<Neuron> {
        acts.iter()
            .map(|&a| Neuron {
                act: a,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_dalrn_gain_and_d2_reversal() {
        let mut p = DaModParams {
            burst_gain: 0.5,
            dip_gain: 2.0,
            ..Default::default()
        };
        assert_eq!(p.dalrn_from_da(1.0), 0.5);
        assert_eq!(p.dalrn_from_da(-1.0), -2.0);
        p.recep = DaRType::D2R;
        assert_eq!(p.dalrn_from_da(1.0), -0.5);
    }

    #[test]
    fn test_send_threshold() {
        let mut ms = ModState::default();
        ms.build(3, 1);
        let ns = neurons(&[0.05, 0.5, -0.4]);
        ms.send_mods(&ns, 0.1);
        assert!((ms.pools[0].mod_sent - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_gating_below_threshold() {
        let mut ms = ModState::default();
        ms.build(2, 1);
        ms.params.act_mod_zero = true;
        let ns = neurons(&[0.3, 0.3]);
        ms.mods_from_inc(&ns);
        assert!(ms.neurons.iter().all(|m| m.mod_level == 0.0 && m.mod_lrn == 0.0));
        ms.params.act_mod_zero = false;
        ms.mods_from_inc(&ns);
        assert!(ms.neurons.iter().all(|m| m.mod_level == 1.0));
    }

    #[test]
    fn test_gating_ratio_with_zero_max() {
        let mut ms = ModState::default();
        ms.build(1, 1);
        let ns = neurons(&[0.0]);
        let pools = vec![Pool::new(0, 1)];
        ms.avg_max_mod(&ns, &pools);
        assert!(ms.pool_max() > 0.0);
        ms.neurons[0].mod_net = 0.5;
        ms.mods_from_inc(&ns);
        assert_eq!(ms.neurons[0].mod_lrn, 1.0);
        assert_eq!(ms.neurons[0].mod_level, 1.0);
    }

    #[test]
    fn test_guarded_ratio() {
        assert_eq!(guarded_ratio(1.0, 0.0), 1.0);
        assert_eq!(guarded_ratio(-1.0, 0.0), -1.0);
        assert_eq!(guarded_ratio(0.0, 0.0), 1.0);
        assert_eq!(guarded_ratio(1.0, 4.0), 0.25);
    }

    #[test]
    fn test_pv_act_overrides_mod_act() {
        let mut ms = ModState::default();
        ms.build(1, 1);
        ms.neurons[0].pv_act = 0.8;
        let mut n = Neuron {
            act: 0.2,
            ..Default::default()
        };
        ms.mod_act_from_act(0, &mut n);
        assert_eq!(ms.neurons[0].mod_act, 0.8);
        assert_eq!(n.act, 0.2);
    }

    #[test]
    fn test_receiver_gate_zeroes_act() {
        let mut ms = ModState::default();
        ms.build(1, 1);
        ms.params.is_mod_receiver = true;
        ms.neurons[0].mod_level = 0.0;
        let mut n = Neuron {
            act: 0.6,
            act_del: 0.1,
            ..Default::default()
        };
        ms.mod_act_from_act(0, &mut n);
        assert_eq!(n.act, 0.0);
        assert!((n.act_del + 0.5).abs() < 1e-6);
    }
}
