//! Lateral habenula / RMTg: net dip or burst signal to the VTA
//!
//! Positive output drives DA dips, negative output disinhibits bursts.
//! Computed at the plus phase from the TotalAct of ventral striatum and
//! PV layers; all units carry the same value.

use crate::config::TotalActPolicy;
use crate::error::Result;
use crate::leabra::{ActInputs, ActParams, Layer, Neuron, Time};
use crate::rl::resolve_one;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LhbGains {
    pub all: f32,
    pub vs_patch_pos_d1: f32,
    pub vs_patch_pos_d2: f32,
    /// Scales a negative positive-patch net
    pub vs_patch_pos_disinhib: f32,
    pub vs_matrix_pos_d1: f32,
    pub vs_matrix_pos_d2: f32,
    pub vs_patch_neg_d1: f32,
    pub vs_patch_neg_d2: f32,
    pub vs_matrix_neg_d1: f32,
    pub vs_matrix_neg_d2: f32,
}

impl Default for LhbGains {
    fn default() -> Self {
        Self {
            all: 1.0,
            vs_patch_pos_d1: 1.0,
            vs_patch_pos_d2: 1.0,
            vs_patch_pos_disinhib: 0.2,
            vs_matrix_pos_d1: 1.0,
            vs_matrix_pos_d2: 1.0,
            vs_patch_neg_d1: 1.0,
            vs_patch_neg_d2: 1.0,
            vs_matrix_neg_d1: 1.0,
            vs_matrix_neg_d2: 1.0,
        }
    }
}

/// TotalAct of the layers feeding the LHb, keyed by source layer name
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LhbInputs {
    pub vs_patch_pos_d1: f32,
    pub vs_patch_pos_d2: f32,
    pub vs_patch_neg_d1: f32,
    pub vs_patch_neg_d2: f32,
    pub vs_matrix_pos_d1: f32,
    pub vs_matrix_pos_d2: f32,
    pub vs_matrix_neg_d1: f32,
    pub vs_matrix_neg_d2: f32,
    pub pos_pv: f32,
    pub neg_pv: f32,
}

impl LhbInputs {
    pub const NAMES: [&'static str; 10] = [
        "VSPatchPosD1",
        "VSPatchPosD2",
        "VSPatchNegD1",
        "VSPatchNegD2",
        "VSMatrixPosD1",
        "VSMatrixPosD2",
        "VSMatrixNegD1",
        "VSMatrixNegD2",
        "PosPV",
        "NegPV",
    ];

    fn slot(&mut self, name: &str) -> Option<&mut f32> {
        Some(match name {
            "VSPatchPosD1" => &mut self.vs_patch_pos_d1,
            "VSPatchPosD2" => &mut self.vs_patch_pos_d2,
            "VSPatchNegD1" => &mut self.vs_patch_neg_d1,
            "VSPatchNegD2" => &mut self.vs_patch_neg_d2,
            "VSMatrixPosD1" => &mut self.vs_matrix_pos_d1,
            "VSMatrixPosD2" => &mut self.vs_matrix_pos_d2,
            "VSMatrixNegD1" => &mut self.vs_matrix_neg_d1,
            "VSMatrixNegD2" => &mut self.vs_matrix_neg_d2,
            "PosPV" => &mut self.pos_pv,
            "NegPV" => &mut self.neg_pv,
            _ => return None,
        })
    }

    /// Set by source layer name; names outside the known set are ignored
    pub fn set(&mut self, name: &str, val: f32) {
        if let Some(v) = self.slot(name) {
            *v = val;
        }
    }

    pub fn is_known(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }
}

/// Intermediate values of the last plus-phase computation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LhbInternal {
    #[serde(skip)]
    pub inputs: LhbInputs,
    pub vs_patch_pos_net: f32,
    pub vs_patch_neg_net: f32,
    pub vs_matrix_pos_net: f32,
    pub vs_matrix_neg_net: f32,
    pub net_pos: f32,
    pub net_neg: f32,
}

impl LhbInternal {
    pub fn val(&self, name: &str) -> Option<f32> {
        let inp = &self.inputs;
        Some(match name {
            "VSPatchPosD1" => inp.vs_patch_pos_d1,
            "VSPatchPosD2" => inp.vs_patch_pos_d2,
            "VSPatchNegD1" => inp.vs_patch_neg_d1,
            "VSPatchNegD2" => inp.vs_patch_neg_d2,
            "VSMatrixPosD1" => inp.vs_matrix_pos_d1,
            "VSMatrixPosD2" => inp.vs_matrix_pos_d2,
            "VSMatrixNegD1" => inp.vs_matrix_neg_d1,
            "VSMatrixNegD2" => inp.vs_matrix_neg_d2,
            "PosPV" => inp.pos_pv,
            "NegPV" => inp.neg_pv,
            "VSPatchPosNet" => self.vs_patch_pos_net,
            "VSPatchNegNet" => self.vs_patch_neg_net,
            "VSMatrixPosNet" => self.vs_matrix_pos_net,
            "VSMatrixNegNet" => self.vs_matrix_neg_net,
            "NetPos" => self.net_pos,
            "NetNeg" => self.net_neg,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LhbState {
    /// Source layers, by name
    pub rcv_from: Vec<String>,
    pub gains: LhbGains,
    /// Scales a positive negative-patch net
    pub pv_neg_discount: f32,
    #[serde(skip)]
    pub internal: LhbInternal,
    #[serde(skip)]
    rcv_idx: Vec<(String, usize)>,
}

impl Default for LhbState {
    fn default() -> Self {
        Self {
            rcv_from: Vec::new(),
            gains: LhbGains::default(),
            pv_neg_discount: 0.8,
            internal: LhbInternal::default(),
            rcv_idx: Vec::new(),
        }
    }
}

impl LhbState {
    pub fn resolve<F>(&mut self, owner: &str, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<usize>,
    {
        self.rcv_idx.clear();
        for nm in &self.rcv_from {
            if !LhbInputs::is_known(nm) {
                log::warn!("{}: source {} is not an LHb input and will be ignored", owner, nm);
            }
            let idx = resolve_one(owner, nm, &lookup)?;
            self.rcv_idx.push((nm.clone(), idx));
        }
        Ok(())
    }

    pub fn inputs(&self, layers: &[Layer], policy: TotalActPolicy) -> ActInputs {
        let mut inp = LhbInputs::default();
        for (nm, idx) in &self.rcv_idx {
            if let Some(ly) = layers.get(*idx) {
                inp.set(nm, ly.total_act(policy));
            }
        }
        ActInputs::Lhb(inp)
    }

    fn net(&mut self, inp: &LhbInputs) -> f32 {
        let g = &self.gains;
        let mut vs_patch_pos_net =
            g.vs_patch_pos_d1 * inp.vs_patch_pos_d1 - g.vs_patch_pos_d2 * inp.vs_patch_pos_d2;
        if vs_patch_pos_net < 0.0 {
            vs_patch_pos_net *= g.vs_patch_pos_disinhib;
        }
        let mut vs_patch_neg_net =
            g.vs_patch_neg_d2 * inp.vs_patch_neg_d2 - g.vs_patch_neg_d1 * inp.vs_patch_neg_d1;
        if vs_patch_neg_net > 0.0 {
            vs_patch_neg_net *= self.pv_neg_discount;
        }
        let vs_matrix_pos_net =
            g.vs_matrix_pos_d1 * inp.vs_matrix_pos_d1 - g.vs_matrix_pos_d2 * inp.vs_matrix_pos_d2;
        let vs_matrix_neg_net =
            g.vs_matrix_neg_d2 * inp.vs_matrix_neg_d2 - g.vs_matrix_neg_d1 * inp.vs_matrix_neg_d1;

        let mut net_pos = vs_matrix_pos_net;
        if inp.pos_pv != 0.0 {
            net_pos = inp.pos_pv.max(vs_matrix_pos_net);
        }
        let mut net_neg = vs_matrix_neg_net;
        if inp.neg_pv != 0.0 {
            // negative PV with a disappointing CS: the CS dip carries over
            if vs_matrix_pos_net < 0.0 {
                net_neg = net_neg.max(vs_matrix_pos_net.abs());
                net_pos = 0.0;
            }
            net_neg = inp.neg_pv.max(net_neg);
        }
        let net = (net_neg - net_pos + vs_patch_pos_net - vs_patch_neg_net) * g.all;
        self.internal = LhbInternal {
            inputs: inp.clone(),
            vs_patch_pos_net,
            vs_patch_neg_net,
            vs_matrix_pos_net,
            vs_matrix_neg_net,
            net_pos,
            net_neg,
        };
        net
    }

    pub fn act_from_g(
        &mut self,
        time: &Time,
        inputs: &ActInputs,
        act: &ActParams,
        neurons: &mut [Neuron],
    ) {
        if time.quarter != 3 {
            return;
        }
        let ActInputs::Lhb(inp) = inputs else {
            return;
        };
        let val = act.clamp.range.clip(self.net(inp));
        for nrn in neurons.iter_mut() {
            if nrn.is_off() {
                continue;
            }
            nrn.act = val;
            nrn.act_lrn = val;
            nrn.act_avg = val;
            nrn.ext = val;
            nrn.ge = val;
        }
    }

    pub fn find_nan(&self) -> Option<String> {
        let i = &self.internal;
        if (i.net_pos - i.net_neg).is_finite() {
            None
        } else {
            Some(format!("LHb net pos {} neg {}", i.net_pos, i.net_neg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plus() -> Time {
        Time {
            quarter: 3,
            plus_phase: true,
            ..Default::default()
        }
    }

    fn lhb_act() -> ActParams {
        let mut ac = ActParams::default();
        ac.clamp.range.min = -2.0;
        ac.clamp.range.max = 2.0;
        ac
    }

    fn run(ls: &mut LhbState, inp: LhbInputs) -> f32 {
        let mut ns = vec![Neuron::default(); 2];
        ls.act_from_g(&plus(), &ActInputs::Lhb(inp), &lhb_act(), &mut ns);
        assert_eq!(ns[0].act, ns[1].act);
        ns[0].act
    }

    #[test]
    fn test_positive_pv_drives_negative_output() {
        let mut ls = LhbState::default();
        let mut inp = LhbInputs::default();
        inp.set("PosPV", 0.8);
        assert!((run(&mut ls, inp) + 0.8).abs() < 1e-6);
        assert_eq!(ls.internal.val("NetPos"), Some(0.8));
    }

    #[test]
    fn test_patch_disinhibition_and_discount() {
        let mut ls = LhbState::default();
        let mut inp = LhbInputs::default();
        inp.set("VSPatchPosD2", 0.5);
        // -.5 * .2
        assert!((run(&mut ls, inp) + 0.1).abs() < 1e-6);

        let mut inp = LhbInputs::default();
        inp.set("VSPatchNegD2", 0.5);
        // -(.5 * .8)
        assert!((run(&mut ls, inp) + 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_neg_pv_absorbs_cs_dip() {
        let mut ls = LhbState::default();
        let mut inp = LhbInputs::default();
        inp.set("VSMatrixPosD2", 0.6);
        inp.set("NegPV", 0.3);
        // matrix pos net -.6 folds into net neg; net pos is zeroed
        assert!((run(&mut ls, inp) - 0.6).abs() < 1e-6);
        assert_eq!(ls.internal.net_pos, 0.0);
    }

    #[test]
    fn test_unknown_names_ignored_and_minus_phase_untouched() {
        let mut inp = LhbInputs::default();
        inp.set("Hippocampus", 1.0);
        assert_eq!(inp, LhbInputs::default());

        let mut ls = LhbState::default();
        let mut ns = vec![Neuron::default()];
        ns[0].act = 0.25;
        ls.act_from_g(&Time::default(), &ActInputs::Lhb(inp), &lhb_act(), &mut ns);
        assert_eq!(ns[0].act, 0.25);
    }
}
