//! Ventral tegmental area: dopamine arbitration
//!
//! Evaluated in the plus phase only. Burst drive is the strongest of
//! primary value, PPTg and LHb disinhibition; dip drive comes from LHb
//! excitation. Patch (PVi) populations shunt both before they are
//! netted. Outside the plus phase the layer is silent and sends 0.

use super::amyg::Valence;
use crate::config::TotalActPolicy;
use crate::error::Result;
use crate::leabra::{ActInputs, ActParams, Layer, Neuron, Time};
use crate::rl::{resolve_one, SendList};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VtaGains {
    /// Overall gain on net DA
    pub da: f32,
    pub pptg: f32,
    pub lhb: f32,
    pub pv: f32,
    pub pvi_burst_shunt: f32,
    pub pvi_anti_burst_shunt: f32,
    pub pvi_dip_shunt: f32,
    pub pvi_anti_dip_shunt: f32,
}

impl Default for VtaGains {
    fn default() -> Self {
        Self {
            da: 1.0,
            pptg: 1.1,
            lhb: 1.0,
            pv: 1.0,
            pvi_burst_shunt: 1.9,
            pvi_anti_burst_shunt: 2.0,
            pvi_dip_shunt: 0.0,
            pvi_anti_dip_shunt: 0.0,
        }
    }
}

/// Names of the upstream layers read by TotalAct
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VtaSources {
    pub pptg: String,
    pub lhb: String,
    pub pos_pv: String,
    pub neg_pv: String,
    pub vs_patch_pos_d1: String,
    pub vs_patch_pos_d2: String,
    pub vs_patch_neg_d1: String,
    pub vs_patch_neg_d2: String,
}

impl Default for VtaSources {
    fn default() -> Self {
        Self {
            pptg: "PPTg".into(),
            lhb: "LHbRMTg".into(),
            pos_pv: "PosPV".into(),
            neg_pv: "NegPV".into(),
            vs_patch_pos_d1: "VSPatchPosD1".into(),
            vs_patch_pos_d2: "VSPatchPosD2".into(),
            vs_patch_neg_d1: "VSPatchNegD1".into(),
            vs_patch_neg_d2: "VSPatchNegD2".into(),
        }
    }
}

/// TotalAct of each upstream layer, gathered before `act_from_g`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VtaInputs {
    pub pptg: f32,
    pub lhb: f32,
    pub pos_pv: f32,
    pub neg_pv: f32,
    pub vs_patch_pos_d1: f32,
    pub vs_patch_pos_d2: f32,
    pub vs_patch_neg_d1: f32,
    pub vs_patch_neg_d2: f32,
}

/// Intermediate values of the last plus-phase computation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VtaInternal {
    pub pptg_dap: f32,
    pub lhb_da: f32,
    pub pos_pv_act: f32,
    pub vs_pos_pvi: f32,
    pub vs_neg_pvi: f32,
    pub burst_lhb_da: f32,
    pub dip_lhb_da: f32,
    pub tot_burst_da: f32,
    pub tot_dip_da: f32,
    pub net_dip_da: f32,
    pub net_da: f32,
    pub send_val: f32,
}

impl VtaInternal {
    pub const NAMES: [&'static str; 12] = [
        "PPTgDAp",
        "LHbDA",
        "PosPVAct",
        "VSPosPVI",
        "VSNegPVI",
        "BurstLHbDA",
        "DipLHbDA",
        "TotBurstDA",
        "TotDipDA",
        "NetDipDA",
        "NetDA",
        "SendVal",
    ];

    pub fn val(&self, name: &str) -> Option<f32> {
        Some(match name {
            "PPTgDAp" => self.pptg_dap,
            "LHbDA" => self.lhb_da,
            "PosPVAct" => self.pos_pv_act,
            "VSPosPVI" => self.vs_pos_pvi,
            "VSNegPVI" => self.vs_neg_pvi,
            "BurstLHbDA" => self.burst_lhb_da,
            "DipLHbDA" => self.dip_lhb_da,
            "TotBurstDA" => self.tot_burst_da,
            "TotDipDA" => self.tot_dip_da,
            "NetDipDA" => self.net_dip_da,
            "NetDA" => self.net_da,
            "SendVal" => self.send_val,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct VtaSourceIdx {
    pptg: Option<usize>,
    lhb: Option<usize>,
    pos_pv: Option<usize>,
    neg_pv: Option<usize>,
    vs_patch_pos_d1: Option<usize>,
    vs_patch_pos_d2: Option<usize>,
    vs_patch_neg_d1: Option<usize>,
    vs_patch_neg_d2: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VtaState {
    pub valence: Valence,
    pub tonic_da: f32,
    pub gains: VtaGains,
    pub sources: VtaSources,
    pub send_da: SendList,
    /// Value broadcast as DA this cycle
    #[serde(skip)]
    pub send_val: f32,
    #[serde(skip)]
    pub internal: VtaInternal,
    #[serde(skip)]
    idx: VtaSourceIdx,
}

impl VtaState {
    pub fn new(valence: Valence) -> Self {
        Self {
            valence,
            ..Default::default()
        }
    }

    /// Resolve the sources this valence reads, plus the send list
    pub fn resolve<F>(&mut self, owner: &str, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<usize>,
    {
        let s = &self.sources;
        let one = |nm: &str| resolve_one(owner, nm, &lookup).map(Some);
        let mut idx = VtaSourceIdx {
            lhb: one(&s.lhb)?,
            vs_patch_neg_d1: one(&s.vs_patch_neg_d1)?,
            vs_patch_neg_d2: one(&s.vs_patch_neg_d2)?,
            ..Default::default()
        };
        match self.valence {
            Valence::Pos => {
                idx.pptg = one(&s.pptg)?;
                idx.pos_pv = one(&s.pos_pv)?;
                idx.vs_patch_pos_d1 = one(&s.vs_patch_pos_d1)?;
                idx.vs_patch_pos_d2 = one(&s.vs_patch_pos_d2)?;
            }
            Valence::Neg => {
                idx.neg_pv = one(&s.neg_pv)?;
            }
        }
        self.idx = idx;
        self.send_da.resolve(owner, lookup)
    }

    pub fn inputs(&self, layers: &[Layer], policy: TotalActPolicy) -> ActInputs {
        let tot = |i: Option<usize>| {
            i.and_then(|i| layers.get(i))
                .map(|l| l.total_act(policy))
                .unwrap_or(0.0)
        };
        let ix = &self.idx;
        ActInputs::Vta(VtaInputs {
            pptg: tot(ix.pptg),
            lhb: tot(ix.lhb),
            pos_pv: tot(ix.pos_pv),
            neg_pv: tot(ix.neg_pv),
            vs_patch_pos_d1: tot(ix.vs_patch_pos_d1),
            vs_patch_pos_d2: tot(ix.vs_patch_pos_d2),
            vs_patch_neg_d1: tot(ix.vs_patch_neg_d1),
            vs_patch_neg_d2: tot(ix.vs_patch_neg_d2),
        })
    }

    /// Net DA for positive valence
    fn net_da_pos(&mut self, inp: &VtaInputs) -> f32 {
        let g = &self.gains;
        let vs_pos_pvi = if g.pvi_anti_burst_shunt > 0.0 {
            g.pvi_burst_shunt * inp.vs_patch_pos_d1 - g.pvi_anti_burst_shunt * inp.vs_patch_pos_d2
        } else {
            g.pvi_burst_shunt * inp.vs_patch_pos_d1
        }
        .max(0.0);
        let vs_neg_pvi = if g.pvi_dip_shunt > 0.0 && g.pvi_anti_dip_shunt > 0.0 {
            g.pvi_dip_shunt * inp.vs_patch_neg_d2 - g.pvi_anti_dip_shunt * inp.vs_patch_neg_d1
        } else if g.pvi_dip_shunt > 0.0 {
            g.pvi_dip_shunt * inp.vs_patch_neg_d2
        } else {
            0.0
        };
        // negative LHb promotes bursting, positive promotes dipping
        let burst_lhb = inp.lhb.min(0.0);
        let dip_lhb = inp.lhb.max(0.0);
        let tot_burst = (g.pv * inp.pos_pv)
            .max(g.pptg * inp.pptg)
            .max(-g.lhb * burst_lhb);
        let net_burst = (tot_burst - vs_pos_pvi).max(0.0);
        let tot_dip = g.lhb * dip_lhb;
        let net_dip = (tot_dip - vs_neg_pvi).max(0.0);
        let net_da = (net_burst - net_dip) * g.da;
        self.internal = VtaInternal {
            pptg_dap: inp.pptg,
            lhb_da: inp.lhb,
            pos_pv_act: inp.pos_pv,
            vs_pos_pvi,
            vs_neg_pvi,
            burst_lhb_da: burst_lhb,
            dip_lhb_da: dip_lhb,
            tot_burst_da: tot_burst,
            tot_dip_da: tot_dip,
            net_dip_da: net_dip,
            net_da,
            send_val: 0.0,
        };
        net_da
    }

    /// Net DA for negative valence: roles of burst and dip are swapped
    fn net_da_neg(&mut self, inp: &VtaInputs) -> f32 {
        let g = &self.gains;
        let vs_pvi = if g.pvi_anti_burst_shunt > 0.0 {
            g.pvi_burst_shunt * inp.vs_patch_neg_d2 - g.pvi_anti_burst_shunt * inp.vs_patch_neg_d1
        } else {
            g.pvi_burst_shunt * inp.vs_patch_neg_d2
        };
        let burst_lhb = inp.lhb.max(0.0);
        let dip_lhb = inp.lhb.min(0.0);
        let tot_burst = (g.pv * inp.neg_pv.max(0.0)).max(g.lhb * burst_lhb);
        let net_burst = (tot_burst - vs_pvi).max(0.0);
        let tot_dip = g.lhb * dip_lhb;
        let net_da = (net_burst + tot_dip) * g.da;
        self.internal = VtaInternal {
            lhb_da: inp.lhb,
            vs_neg_pvi: vs_pvi,
            burst_lhb_da: burst_lhb,
            dip_lhb_da: dip_lhb,
            tot_burst_da: tot_burst,
            tot_dip_da: tot_dip,
            net_da,
            ..Default::default()
        };
        net_da
    }

    pub fn act_from_g(
        &mut self,
        time: &Time,
        inputs: &ActInputs,
        act: &ActParams,
        neurons: &mut [Neuron],
    ) {
        let ActInputs::Vta(inp) = inputs else {
            return;
        };
        let Some(nrn) = neurons.first_mut() else {
            return;
        };
        if time.quarter != 3 {
            nrn.act_lrn = 0.0;
            nrn.act = 0.0;
            nrn.ge = 0.0;
            self.send_val = 0.0;
            return;
        }
        let net_da = match self.valence {
            Valence::Pos => self.net_da_pos(inp),
            Valence::Neg => self.net_da_neg(inp),
        };
        let val = act.clamp.range.clip(self.tonic_da + net_da);
        nrn.ext = val;
        nrn.act_lrn = val;
        nrn.act = val;
        nrn.ge = val;
        nrn.act_del = 0.0;
        self.send_val = val;
        self.internal.send_val = val;
    }

    pub fn find_nan(&self) -> Option<String> {
        if self.internal.net_da.is_finite() {
            None
        } else {
            Some(format!("VTA net DA is {}", self.internal.net_da))
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

    fn vta_act() -> ActParams {
        let mut ac = ActParams::default();
        ac.clamp.range.min = -2.0;
        ac.clamp.range.max = 2.0;
        ac
    }

    fn run(vs: &mut VtaState, inp: VtaInputs, t: &Time) -> f32 {
        let mut ns = vec![Neuron::default()];
        vs.act_from_g(t, &ActInputs::Vta(inp), &vta_act(), &mut ns);
        ns[0].act
    }

    #[test]
    fn test_pv_burst_shunted_by_patch() {
        let mut vs = VtaState::new(Valence::Pos);
        let inp = VtaInputs {
            pos_pv: 1.0,
            ..Default::default()
        };
        assert!((run(&mut vs, inp.clone(), &plus()) - 1.0).abs() < 1e-6);
        let shunted = VtaInputs {
            vs_patch_pos_d1: 0.4,
            ..inp
        };
        // 1 - 1.9 * .4
        assert!((run(&mut vs, shunted, &plus()) - 0.24).abs() < 1e-5);
        assert!((vs.internal.vs_pos_pvi - 0.76).abs() < 1e-5);
    }

    #[test]
    fn test_lhb_sign_conventions() {
        let mut vs = VtaState::new(Valence::Pos);
        let dip = VtaInputs {
            lhb: 0.5,
            ..Default::default()
        };
        assert!((run(&mut vs, dip, &plus()) + 0.5).abs() < 1e-6);
        let burst = VtaInputs {
            lhb: -0.5,
            ..Default::default()
        };
        assert!((run(&mut vs, burst, &plus()) - 0.5).abs() < 1e-6);

        let mut neg = VtaState::new(Valence::Neg);
        let inp = VtaInputs {
            lhb: -0.3,
            ..Default::default()
        };
        assert!((run(&mut neg, inp, &plus()) + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_silent_outside_plus_phase_and_clipped() {
        let mut vs = VtaState::new(Valence::Pos);
        let inp = VtaInputs {
            pptg: 5.0,
            ..Default::default()
        };
        assert_eq!(run(&mut vs, inp.clone(), &Time::default()), 0.0);
        assert_eq!(vs.send_val, 0.0);
        assert_eq!(run(&mut vs, inp, &plus()), 2.0);
        assert_eq!(vs.send_val, 2.0);
    }

    #[test]
    fn test_resolve_only_needs_valence_sources() {
        let mut vs = VtaState::new(Valence::Neg);
        let known = ["LHbRMTg", "NegPV", "VSPatchNegD1", "VSPatchNegD2"];
        let lookup = |n: &str| known.iter().position(|k| *k == n);
        vs.resolve("VTAn", lookup).unwrap();
        let mut vp = VtaState::new(Valence::Pos);
        assert!(vp.resolve("VTAp", lookup).is_err());
    }
}
