//! Rescorla-Wagner reward prediction
//!
//! `RWPred` is a linear clipped readout of its net input. `RWDa`
//! subtracts that prediction from the reward layer's clamped value and
//! broadcasts the difference as dopamine. `Rw` pathways learn
//! `DA * SendAct` with no receiver term.

use super::send::{resolve_one, SendList};
use crate::error::Result;
use crate::leabra::{norm_max, ActInputs, Conns, Layer, LearnSynParams, Neuron, Range, Synapse};
use crate::neuromod::ModulatorSink;
use crate::leabra::flags;
use serde::{Deserialize, Serialize};

/// Prediction layer parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RwPredParams {
    /// Act is Ge clipped into this range
    pub pred_range: Range,
}

impl Default for RwPredParams {
    fn default() -> Self {
        Self {
            pred_range: Range::new(0.01, 0.99),
        }
    }
}

/// Act = clipped Ge
pub fn rw_pred_act(p: &RwPredParams, neurons: &mut [Neuron]) {
    for nrn in neurons.iter_mut().filter(|n| !n.is_off()) {
        nrn.act = p.pred_range.clip(nrn.ge);
        nrn.act_lrn = nrn.act;
    }
}

/// Reward-prediction-error layer parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RwDaParams {
    /// Layer holding the clamped reward; no reward, no DA
    pub rew_lay: String,
    pub rw_pred_lay: String,
    pub send_da: SendList,
    #[serde(skip)]
    pub rew_idx: usize,
    #[serde(skip)]
    pub pred_idx: usize,
}

impl Default for RwDaParams {
    fn default() -> Self {
        Self {
            rew_lay: "Rew".to_string(),
            rw_pred_lay: "RWPred".to_string(),
            send_da: SendList::default(),
            rew_idx: 0,
            pred_idx: 0,
        }
    }
}

impl RwDaParams {
    pub fn resolve<F>(&mut self, owner: &str, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<usize>,
    {
        self.rew_idx = resolve_one(owner, &self.rew_lay, &lookup)?;
        self.pred_idx = resolve_one(owner, &self.rw_pred_lay, &lookup)?;
        self.send_da.resolve(owner, lookup)
    }

    /// Gather reward and prediction from unit 0 of each source layer
    pub fn inputs(&self, layers: &[Layer]) -> ActInputs {
        let rew = layers.get(self.rew_idx).and_then(|l| l.neurons.first());
        let pred = layers.get(self.pred_idx).and_then(|l| l.neurons.first());
        ActInputs::RwDa {
            has_rew: rew.map(|n| n.has_flag(flags::HAS_EXT)).unwrap_or(false),
            rew_act: rew.map(|n| n.act).unwrap_or(0.0),
            pred_act: pred.map(|n| n.act).unwrap_or(0.0),
        }
    }
}

/// Act = reward - prediction when a reward is clamped, else 0
pub fn rw_da_act(inputs: &ActInputs, neurons: &mut [Neuron]) {
    let da = match *inputs {
        ActInputs::RwDa {
            has_rew: true,
            rew_act,
            pred_act,
        } => rew_act - pred_act,
        _ => 0.0,
    };
    for nrn in neurons.iter_mut().filter(|n| !n.is_off()) {
        nrn.act = da;
    }
}

/// Rescorla-Wagner pathway parameters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RwPathParams {
    /// |DA| at or below this gives no learning at all
    pub da_tol: f32,
}

/// DWt = DA * SendAct, zeroed where the receiver is already saturated in
/// the direction DA would push it
pub fn rw_dwt(
    p: &RwPathParams,
    learn: &LearnSynParams,
    conns: &Conns,
    syns: &mut [Synapse],
    send: &Layer,
    recv: &Layer,
) {
    let lda = recv.da();
    if p.da_tol > 0.0 && lda.abs() <= p.da_tol {
        return;
    }
    for (si, sn) in send.neurons.iter().enumerate() {
        let range = conns.send_range(si);
        for k in range.clone() {
            let rn = &recv.neurons[conns.send_idx[k]];
            let mut da = lda;
            if (rn.ge > rn.act && da > 0.0) || (rn.ge < rn.act && da < 0.0) {
                da = 0.0;
            }
            let sy = &mut syns[k];
            let dwt = learn.norm_moment(&mut sy.norm, &mut sy.moment, da * sn.act);
            sy.dwt += learn.lrate * dwt;
        }
        norm_max(learn, &mut syns[range]);
    }
}
