//! Temporal-difference reward prediction
//!
//! `TDRewPred` holds the value estimate, `TDRewInteg` adds the discounted
//! next-step estimate to the current reward in the plus phase, and `TDDa`
//! reports the plus minus minus difference of the integrator as DA.
//! Each layer is a single readout unit, so only unit 0 of a source layer
//! is read.

use super::send::{resolve_one, SendList};
use crate::error::Result;
use crate::leabra::{norm_max, ActInputs, Conns, Layer, LearnSynParams, Neuron, Synapse, Time};
use crate::neuromod::ModulatorSink;
use serde::{Deserialize, Serialize};

/// Plus phase: linear Ge; otherwise hold the previous plus-phase value
pub fn td_rew_pred_act(time: &Time, neurons: &mut [Neuron]) {
    for nrn in neurons.iter_mut().filter(|n| !n.is_off()) {
        nrn.act = if time.quarter == 3 { nrn.ge } else { nrn.act_p };
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TdRewIntegParams {
    pub discount: f32,
    pub rew_pred_lay: String,
    #[serde(skip)]
    pub rew_pred_idx: usize,
}

impl Default for TdRewIntegParams {
    fn default() -> Self {
        Self {
            discount: 0.9,
            rew_pred_lay: "RewPred".to_string(),
            rew_pred_idx: 0,
        }
    }
}

impl TdRewIntegParams {
    pub fn resolve<F>(&mut self, owner: &str, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<usize>,
    {
        self.rew_pred_idx = resolve_one(owner, &self.rew_pred_lay, lookup)?;
        Ok(())
    }

    pub fn inputs(&self, layers: &[Layer]) -> ActInputs {
        match layers.get(self.rew_pred_idx).and_then(|l| l.neurons.first()) {
            Some(n) => ActInputs::TdInteg {
                rp_act_p: n.act_p,
                rp_act: n.act,
            },
            None => ActInputs::None,
        }
    }
}

/// Plus phase: reward plus discounted prediction; otherwise the prediction's last ActP
pub fn td_rew_integ_act(
    p: &TdRewIntegParams,
    time: &Time,
    inputs: &ActInputs,
    neurons: &mut [Neuron],
) {
    let ActInputs::TdInteg { rp_act_p, rp_act } = *inputs else {
        return;
    };
    for nrn in neurons.iter_mut().filter(|n| !n.is_off()) {
        nrn.act = if time.quarter == 3 {
            nrn.ge + p.discount * rp_act
        } else {
            rp_act_p
        };
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TdDaParams {
    pub rew_integ_lay: String,
    pub send_da: SendList,
    #[serde(skip)]
    pub rew_integ_idx: usize,
}

impl Default for TdDaParams {
    fn default() -> Self {
        Self {
            rew_integ_lay: "RewInteg".to_string(),
            send_da: SendList::default(),
            rew_integ_idx: 0,
        }
    }
}

impl TdDaParams {
    pub fn resolve<F>(&mut self, owner: &str, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<usize>,
    {
        self.rew_integ_idx = resolve_one(owner, &self.rew_integ_lay, &lookup)?;
        self.send_da.resolve(owner, lookup)
    }

    pub fn inputs(&self, layers: &[Layer]) -> ActInputs {
        match layers.get(self.rew_integ_idx).and_then(|l| l.neurons.first()) {
            Some(n) => ActInputs::TdDa {
                ri_act: n.act,
                ri_act_m: n.act_m,
            },
            None => ActInputs::None,
        }
    }
}

/// Plus phase: integrator Act minus its ActM; 0 otherwise
pub fn td_da_act(time: &Time, inputs: &ActInputs, neurons: &mut [Neuron]) {
    let ActInputs::TdDa { ri_act, ri_act_m } = *inputs else {
        return;
    };
    let da = ri_act - ri_act_m;
    for nrn in neurons.iter_mut().filter(|n| !n.is_off()) {
        nrn.act = if time.quarter == 3 { da } else { 0.0 };
    }
}

/// DWt = DA * ActQ0 of the sender (its activity on the previous trial)
pub fn td_rew_pred_dwt(
    learn: &LearnSynParams,
    conns: &Conns,
    syns: &mut [Synapse],
    send: &Layer,
    recv: &Layer,
) {
    let da = recv.da();
    for (si, sn) in send.neurons.iter().enumerate() {
        let range = conns.send_range(si);
        for k in range.clone() {
            let sy = &mut syns[k];
            let dwt = learn.norm_moment(&mut sy.norm, &mut sy.moment, da * sn.act_q0);
            sy.dwt += learn.lrate * dwt;
        }
        norm_max(learn, &mut syns[range]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_at(quarter: usize) -> Time {
        Time {
            quarter,
            ..Default::default()
        }
    }

    #[test]
    fn test_rew_pred_holds_act_p_in_minus_phase() {
        let mut ns = vec![Neuron {
            ge: 0.4,
            act_p: 0.25,
            ..Default::default()
        }];
        td_rew_pred_act(&time_at(1), &mut ns);
        assert_eq!(ns[0].act, 0.25);
        td_rew_pred_act(&time_at(3), &mut ns);
        assert_eq!(ns[0].act, 0.4);
    }

    #[test]
    fn test_integ_discounts_prediction() {
        let p = TdRewIntegParams::default();
        let inp = ActInputs::TdInteg {
            rp_act_p: 0.3,
            rp_act: 0.5,
        };
        let mut ns = vec![Neuron {
            ge: 1.0,
            ..Default::default()
        }];
        td_rew_integ_act(&p, &time_at(3), &inp, &mut ns);
        assert!((ns[0].act - 1.45).abs() < 1e-6);
        td_rew_integ_act(&p, &time_at(0), &inp, &mut ns);
        assert_eq!(ns[0].act, 0.3);
    }

    #[test]
    fn test_da_only_in_plus_phase() {
        let inp = ActInputs::TdDa {
            ri_act: 0.9,
            ri_act_m: 0.4,
        };
        let mut ns = vec![Neuron::default()];
        td_da_act(&time_at(2), &inp, &mut ns);
        assert_eq!(ns[0].act, 0.0);
        td_da_act(&time_at(3), &inp, &mut ns);
        assert!((ns[0].act - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_missing_source_is_reported() {
        let mut p = TdDaParams::default();
        assert!(p.resolve("TDDa", |_| None).is_err());
    }
}
