//! Closed set of layer variants
//!
//! Each variant carries only what it adds to the base layer. The base
//! fields (neurons, pools, act / inhib / learn params, modulation state)
//! stay on `Layer`, and the few steps where a variant differs switch on
//! this enum.

use super::act::ActParams;
use super::layer::{ActInputs, Layer};
use crate::bgate::{self, CinParams, GpState, MatrixState, StnState, STN_VAR_NAMES};
use crate::config::TotalActPolicy;
use crate::error::Result;
use crate::leabra::Range;
use crate::neuromod::Modulators;
use crate::pvlv::{
    BlaParams, CelParams, LhbState, MsnState, PptgState, PvParams, VtaState, MSN_VAR_NAMES,
};
use crate::rl::{
    ClampAchParams, ClampDaParams, RwDaParams, RwPredParams, TdDaParams, TdRewIntegParams,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum LayerKind {
    #[default]
    Standard,
    /// Generic modulated layer: sends or receives ModNet
    Mod,
    RwPred(RwPredParams),
    RwDa(RwDaParams),
    TdRewPred,
    TdRewInteg(TdRewIntegParams),
    TdDa(TdDaParams),
    ClampDa(ClampDaParams),
    ClampAch(ClampAchParams),
    Bla(BlaParams),
    Cel(CelParams),
    Msn(MsnState),
    Vta(VtaState),
    LhbRmtg(LhbState),
    Pv(PvParams),
    Pptg(PptgState),
    Matrix(MatrixState),
    /// GPeOut, GPeIn or GPeTA, told apart by name suffix
    Gp(GpState),
    Gpi(GpState),
    Stn(StnState),
    VThal,
    Cin(CinParams),
}

const DA_VARS: [&str; 1] = ["DA"];
const ACH_VARS: [&str; 1] = ["ACh"];
const DA_ACH_VARS: [&str; 2] = ["DA", "ACh"];
const MATRIX_VARS: [&str; 3] = ["DA", "DALrn", "ACh"];
const PPTG_VARS: [&str; 1] = ["GePrev"];

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Standard => "Standard",
            LayerKind::Mod => "Mod",
            LayerKind::RwPred(_) => "RWPred",
            LayerKind::RwDa(_) => "RWDa",
            LayerKind::TdRewPred => "TDRewPred",
            LayerKind::TdRewInteg(_) => "TDRewInteg",
            LayerKind::TdDa(_) => "TDDa",
            LayerKind::ClampDa(_) => "ClampDa",
            LayerKind::ClampAch(_) => "ClampACh",
            LayerKind::Bla(_) => "BLA",
            LayerKind::Cel(_) => "CEl",
            LayerKind::Msn(_) => "MSN",
            LayerKind::Vta(_) => "VTA",
            LayerKind::LhbRmtg(_) => "LHbRMTg",
            LayerKind::Pv(_) => "PV",
            LayerKind::Pptg(_) => "PPTg",
            LayerKind::Matrix(_) => "Matrix",
            LayerKind::Gp(_) => "GP",
            LayerKind::Gpi(_) => "GPi",
            LayerKind::Stn(_) => "STN",
            LayerKind::VThal => "VThal",
            LayerKind::Cin(_) => "CIN",
        }
    }

    /// Variants that carry `ModState`
    pub fn has_mods(&self) -> bool {
        matches!(
            self,
            LayerKind::Mod | LayerKind::Bla(_) | LayerKind::Cel(_) | LayerKind::Msn(_)
        )
    }

    pub fn accepts_da(&self) -> bool {
        matches!(
            self,
            LayerKind::Mod
                | LayerKind::RwPred(_)
                | LayerKind::RwDa(_)
                | LayerKind::TdRewPred
                | LayerKind::TdDa(_)
                | LayerKind::ClampDa(_)
                | LayerKind::Bla(_)
                | LayerKind::Cel(_)
                | LayerKind::Msn(_)
                | LayerKind::Matrix(_)
                | LayerKind::Gp(_)
                | LayerKind::Gpi(_)
                | LayerKind::Stn(_)
                | LayerKind::VThal
        )
    }

    pub fn accepts_ach(&self) -> bool {
        matches!(
            self,
            LayerKind::Mod
                | LayerKind::ClampAch(_)
                | LayerKind::Bla(_)
                | LayerKind::Cel(_)
                | LayerKind::Msn(_)
                | LayerKind::Matrix(_)
                | LayerKind::Gp(_)
                | LayerKind::Gpi(_)
                | LayerKind::Cin(_)
        )
    }

    /// Set the layer parameters this variant needs
    pub fn apply_defaults(&self, ly: &mut Layer) {
        match self {
            LayerKind::ClampDa(_) => ly.act.clamp.range = Range::new(-1.0, 1.0),
            LayerKind::TdDa(_) => ly.act.clamp.range = Range::new(-100.0, 100.0),
            LayerKind::Vta(_) | LayerKind::LhbRmtg(_) => {
                ly.act.clamp.range = Range::new(-2.0, 2.0);
                ly.act.vm_range = Range::new(-2.0, 2.0);
            }
            LayerKind::Bla(p) => {
                ly.act.init.vm = 0.55;
                if let Some(ms) = &mut ly.mods {
                    ms.params.act_mod_zero = true;
                    ms.params.minus = 1.0;
                    ms.params.plus = 1.0;
                    ms.params.neg_gain = 0.1;
                    ms.params.pos_gain = 0.1;
                    ms.da_mod.on = true;
                    ms.da_mod.burst_gain = 0.04;
                    ms.da_mod.dip_gain = 0.1;
                    ms.da_mod.recep = p.dar;
                }
            }
            LayerKind::Cel(p) => {
                ly.act.init.vm = 0.55;
                if let Some(ms) = &mut ly.mods {
                    ms.params.act_mod_zero = false;
                    ms.da_mod.burst_gain = 0.04;
                    ms.da_mod.dip_gain = 0.1;
                    ms.da_mod.recep = p.dar;
                }
            }
            LayerKind::Msn(msn) => {
                // striatal inhibition is shared with the BG matrix
                bgate::matrix_layer_defaults(ly);
                if let Some(ms) = &mut ly.mods {
                    ms.da_mod.on = true;
                    ms.da_mod.recep = msn.dar;
                }
            }
            LayerKind::Matrix(_) => bgate::matrix_layer_defaults(ly),
            LayerKind::Gp(_) | LayerKind::Gpi(_) => bgate::gp_layer_defaults(ly),
            LayerKind::Stn(_) => bgate::stn_layer_defaults(ly),
            LayerKind::VThal => bgate::vthal_layer_defaults(ly),
            _ => {}
        }
    }

    pub fn build(&mut self, n: usize) {
        match self {
            LayerKind::Msn(ms) => ms.build(n),
            LayerKind::Pptg(ps) => ps.build(n),
            LayerKind::Gp(gs) | LayerKind::Gpi(gs) => gs.build(n),
            LayerKind::Stn(ss) => ss.build(n),
            _ => {}
        }
    }

    pub fn init_acts(&mut self, act: &ActParams) {
        match self {
            LayerKind::Msn(ms) => ms.init_acts(),
            LayerKind::Pptg(ps) => ps.init_acts(),
            LayerKind::Gp(gs) | LayerKind::Gpi(gs) => gs.reset_min_act(act),
            LayerKind::Stn(ss) => ss.init_acts(),
            LayerKind::Matrix(ms) => ms.dalrn = 0.0,
            LayerKind::Vta(vs) => {
                vs.send_val = 0.0;
                vs.internal = Default::default();
            }
            LayerKind::LhbRmtg(ls) => ls.internal = Default::default(),
            _ => {}
        }
    }

    /// Resolve named layer references against the network
    pub fn resolve<F>(&mut self, owner: &str, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<usize>,
    {
        match self {
            LayerKind::RwDa(p) => p.resolve(owner, lookup),
            LayerKind::TdRewInteg(p) => p.resolve(owner, lookup),
            LayerKind::TdDa(p) => p.resolve(owner, lookup),
            LayerKind::ClampDa(p) => p.send_da.resolve(owner, lookup),
            LayerKind::ClampAch(p) => p.send_ach.resolve(owner, lookup),
            LayerKind::Vta(vs) => vs.resolve(owner, lookup),
            LayerKind::LhbRmtg(ls) => ls.resolve(owner, lookup),
            LayerKind::Pv(p) => p.receivers.resolve(owner, lookup),
            LayerKind::Cin(p) => p.resolve(owner, lookup),
            _ => Ok(()),
        }
    }

    /// Variants whose activation reads other layers
    pub fn reads_layers(&self) -> bool {
        matches!(
            self,
            LayerKind::RwDa(_)
                | LayerKind::TdRewInteg(_)
                | LayerKind::TdDa(_)
                | LayerKind::Vta(_)
                | LayerKind::LhbRmtg(_)
                | LayerKind::Cin(_)
        )
    }

    /// Gather the other-layer values `act_from_g` needs
    pub fn inputs(&self, layers: &[Layer], policy: TotalActPolicy) -> ActInputs {
        match self {
            LayerKind::RwDa(p) => p.inputs(layers),
            LayerKind::TdRewInteg(p) => p.inputs(layers),
            LayerKind::TdDa(p) => p.inputs(layers),
            LayerKind::Vta(vs) => vs.inputs(layers, policy),
            LayerKind::LhbRmtg(ls) => ls.inputs(layers, policy),
            LayerKind::Cin(p) => p.inputs(layers),
            _ => ActInputs::None,
        }
    }

    /// Unit variables added by the variant
    pub fn unit_var_names(&self) -> &'static [&'static str] {
        match self {
            LayerKind::RwPred(_)
            | LayerKind::RwDa(_)
            | LayerKind::TdRewPred
            | LayerKind::TdDa(_)
            | LayerKind::ClampDa(_)
            | LayerKind::VThal => &DA_VARS,
            LayerKind::ClampAch(_) | LayerKind::Cin(_) => &ACH_VARS,
            LayerKind::Gp(_) | LayerKind::Gpi(_) => &DA_ACH_VARS,
            LayerKind::Matrix(_) => &MATRIX_VARS,
            LayerKind::Msn(_) => &MSN_VAR_NAMES,
            LayerKind::Stn(_) => &STN_VAR_NAMES,
            LayerKind::Pptg(_) => &PPTG_VARS,
            _ => &[],
        }
    }

    pub fn unit_val(&self, var: &str, ni: usize, mods: &Modulators) -> Option<f32> {
        if !self.unit_var_names().contains(&var) {
            return None;
        }
        match (self, var) {
            (LayerKind::Msn(ms), _) => ms.unit_val(var, ni),
            (LayerKind::Stn(ss), _) => ss.unit_val(var, ni),
            (LayerKind::Pptg(ps), "GePrev") => ps.ge_prev.get(ni).copied(),
            (LayerKind::Matrix(ms), "DALrn") => Some(ms.dalrn),
            (_, "DA") => Some(mods.da),
            (_, "ACh") => Some(mods.ach),
            _ => None,
        }
    }

    /// Layer-level internal state by name
    pub fn layer_val(&self, var: &str) -> Option<f32> {
        match self {
            LayerKind::Vta(vs) => vs.internal.val(var),
            LayerKind::LhbRmtg(ls) => ls.internal.val(var),
            LayerKind::Matrix(ms) if var == "DALrn" => Some(ms.dalrn),
            LayerKind::Pptg(ps) if var == "GePrev" => ps.ge_prev.first().copied(),
            _ => None,
        }
    }

    pub fn find_nan(&self) -> Option<String> {
        match self {
            LayerKind::Vta(vs) => vs.find_nan(),
            LayerKind::LhbRmtg(ls) => ls.find_nan(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leabra::LayerType;
    use crate::pvlv::Valence;

    #[test]
    fn test_mod_state_only_on_modulated_kinds() {
        let bla = Layer::with_kind("BLA", &[1, 2], LayerType::Hidden, LayerKind::Bla(BlaParams::default()));
        let ms = bla.mods.as_ref().unwrap();
        assert!(ms.params.act_mod_zero);
        assert!(ms.da_mod.on);
        assert_eq!(bla.act.init.vm, 0.55);
        let vta = Layer::with_kind(
            "VTAp",
            &[1, 1],
            LayerType::Hidden,
            LayerKind::Vta(VtaState::new(Valence::Pos)),
        );
        assert!(vta.mods.is_none());
        assert_eq!(vta.act.clamp.range, Range::new(-2.0, 2.0));
    }

    #[test]
    fn test_variant_unit_vars() {
        let mods = Modulators {
            da: 0.3,
            ach: 0.8,
            se: 0.0,
        };
        let gp = LayerKind::Gp(GpState::default());
        assert_eq!(gp.unit_val("ACh", 0, &mods), Some(0.8));
        assert_eq!(gp.unit_val("Ca", 0, &mods), None);
        assert_eq!(LayerKind::Standard.unit_val("DA", 0, &mods), None);
        let mut stn = LayerKind::Stn(StnState::default());
        stn.build(2);
        assert_eq!(stn.unit_val("KCa", 1, &mods), Some(0.0));
        assert_eq!(stn.unit_val("KCa", 5, &mods), None);
    }

    #[test]
    fn test_tonic_kinds_skip_fffb() {
        for kind in [
            LayerKind::Gp(GpState::default()),
            LayerKind::Stn(StnState::default()),
            LayerKind::VThal,
        ] {
            let ly = Layer::with_kind("X", &[1, 1], LayerType::Hidden, kind);
            assert!(!ly.inhib.layer.on && !ly.inhib.pool.on && ly.inhib.self_inhib.on);
        }
    }
}
