//! Dorsal striatum matrix: Go (D1) and NoGo (D2) units
//!
//! Learning uses an ACh-decayed eligibility trace. DA applies to the
//! trace left by earlier trials before this trial's co-activity is added,
//! so credit lands on the gating event that preceded the outcome.

use crate::leabra::{norm_max, Conns, Layer, LayerKind, LearnSynParams, Synapse, TraceSyn};
use crate::neuromod::DaRType;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixParams {
    /// Gain on positive DA before receptor reversal
    pub burst_gain: f32,
    /// Gain on negative DA before receptor reversal
    pub dip_gain: f32,
}

impl Default for MatrixParams {
    fn default() -> Self {
        Self {
            burst_gain: 1.0,
            dip_gain: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixState {
    pub dar: DaRType,
    pub params: MatrixParams,
    /// Learning DA: gains and receptor sign applied
    #[serde(skip)]
    pub dalrn: f32,
}

impl MatrixState {
    pub fn new(dar: DaRType) -> Self {
        Self {
            dar,
            ..Default::default()
        }
    }

    pub fn dalrn_from_da(&self, da: f32) -> f32 {
        let da = if da > 0.0 {
            da * self.params.burst_gain
        } else {
            da * self.params.dip_gain
        };
        match self.dar {
            DaRType::D1R => da,
            DaRType::D2R => -da,
        }
    }
}

pub fn matrix_layer_defaults(ly: &mut Layer) {
    let inh = &mut ly.inhib;
    inh.layer.gi = 1.9;
    inh.layer.fb = 0.5;
    inh.pool.on = true;
    inh.pool.gi = 1.9;
    inh.pool.fb = 0.0;
    inh.self_inhib.on = true;
    inh.self_inhib.gi = 0.3;
    inh.act_avg.fixed = true;
    inh.act_avg.init = 0.2;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixTraceParams {
    /// Add this trial's co-activity to the trace before DA is applied
    pub cur_trl_da: bool,
    /// Use 2 * act * (1 - act) for receiver activity
    pub deriv: bool,
    /// Multiplier on ACh for trace decay, capped at full decay
    pub decay: f32,
}

impl Default for MatrixTraceParams {
    fn default() -> Self {
        Self {
            cur_trl_da: false,
            deriv: true,
            decay: 2.0,
        }
    }
}

impl MatrixTraceParams {
    pub fn lrn_factor(&self, act: f32) -> f32 {
        if self.deriv {
            2.0 * act * (1.0 - act)
        } else {
            act
        }
    }
}

/// One trace step: returns the raw dWt and leaves the new trace in `trs`
pub(crate) fn trace_step(
    trs: &mut TraceSyn,
    ntr: f32,
    da: f32,
    da_lrn: f32,
    dk: f32,
    cur_trl_da: bool,
) -> f32 {
    let mut tr = trs.tr;
    if cur_trl_da {
        tr += ntr;
    }
    let dwt = if da != 0.0 { da_lrn * tr } else { 0.0 };
    tr -= dk * tr;
    if !cur_trl_da {
        tr += ntr;
    }
    trs.tr = tr;
    trs.ntr = ntr;
    dwt
}

pub fn matrix_trace_dwt(
    p: &MatrixTraceParams,
    learn: &LearnSynParams,
    conns: &Conns,
    syns: &mut [Synapse],
    trace: &mut [TraceSyn],
    send: &Layer,
    recv: &Layer,
) {
    let LayerKind::Matrix(ms) = &recv.kind else {
        log::warn!("MatrixTrace pathway into {} which is not a matrix layer", recv.name);
        return;
    };
    let da = recv.modulators.da;
    let da_lrn = ms.dalrn;
    let dk = (recv.modulators.ach * p.decay).min(1.0);
    for (si, sn) in send.neurons.iter().enumerate() {
        let range = conns.send_range(si);
        for k in range.clone() {
            let rn = &recv.neurons[conns.send_idx[k]];
            let ntr = p.lrn_factor(rn.act) * sn.act;
            let trs = &mut trace[k];
            let dwt = trace_step(trs, ntr, da, da_lrn, dk, p.cur_trl_da);
            let sy = &mut syns[k];
            if !learn.norm.on {
                // Norm and Moment expose the trace when unused
                sy.norm = trs.ntr;
                sy.moment = trs.tr;
            }
            let dwt = learn.norm_moment(&mut sy.norm, &mut sy.moment, dwt);
            sy.dwt += learn.lrate * dwt;
        }
        norm_max(learn, &mut syns[range]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leabra::{connect_pattern, LayerType, Pattern};
    use crate::neuromod::ModulatorSink;

    fn setup(dar: DaRType) -> (Layer, Layer, Conns) {
        let mut send = Layer::new("PFC", &[1, 1], LayerType::Input);
        send.build().unwrap();
        let mut recv = Layer::with_kind(
            "MtxGo",
            &[1, 1, 1, 1],
            LayerType::Hidden,
            LayerKind::Matrix(MatrixState::new(dar)),
        );
        recv.build().unwrap();
        let conns = Conns::from_pairs(
            connect_pattern(Pattern::Full, 1, &send.pools, 1, &recv.pools),
            1,
            1,
        );
        (send, recv, conns)
    }

    #[test]
    fn test_dalrn_gains_and_reversal() {
        let mut ms = MatrixState::new(DaRType::D2R);
        ms.params.burst_gain = 2.0;
        assert_eq!(ms.dalrn_from_da(0.5), -1.0);
        assert_eq!(ms.dalrn_from_da(-0.5), 0.5);
        assert_eq!(MatrixState::new(DaRType::D1R).dalrn_from_da(0.3), 0.3);
    }

    #[test]
    fn test_full_decay_with_no_new_trace() {
        let (send, mut recv, conns) = setup(DaRType::D1R);
        let p = MatrixTraceParams {
            decay: 1.0,
            ..Default::default()
        };
        let learn = LearnSynParams::plain();
        let mut syns = vec![Synapse::default()];
        let mut trace = vec![TraceSyn { ntr: 0.0, tr: 0.6 }];
        recv.set_ach(1.0);
        // sender silent: NTr is 0
        matrix_trace_dwt(&p, &learn, &conns, &mut syns, &mut trace, &send, &recv);
        assert_eq!(trace[0].tr, 0.0);
        assert_eq!(trace[0].ntr, 0.0);
    }

    #[test]
    fn test_da_reads_prior_trace() {
        let (mut send, mut recv, conns) = setup(DaRType::D1R);
        let p = MatrixTraceParams::default();
        let learn = LearnSynParams::plain();
        let mut syns = vec![Synapse::default()];
        let mut trace = vec![TraceSyn::default()];
        send.neurons[0].act = 1.0;
        recv.neurons[0].act = 0.5;
        recv.set_da(1.0);
        if let LayerKind::Matrix(ms) = &mut recv.kind {
            ms.dalrn = 1.0;
        }
        matrix_trace_dwt(&p, &learn, &conns, &mut syns, &mut trace, &send, &recv);
        assert_eq!(syns[0].dwt, 0.0);
        assert!((trace[0].tr - 0.5).abs() < 1e-6);
        assert_eq!(syns[0].moment, trace[0].tr);

        send.neurons[0].act = 0.0;
        matrix_trace_dwt(&p, &learn, &conns, &mut syns, &mut trace, &send, &recv);
        assert!((syns[0].dwt - learn.lrate * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cur_trl_da_learns_immediately() {
        let mut trs = TraceSyn::default();
        let dwt = trace_step(&mut trs, 0.4, 1.0, -1.0, 0.0, true);
        assert!((dwt + 0.4).abs() < 1e-6);
        assert!((trs.tr - 0.4).abs() < 1e-6);
    }
}
