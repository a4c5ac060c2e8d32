//! # PVLV: primary value / learned value
//!
//! Amygdala and ventral striatum learn CS associations under DA; LHb,
//! PPTg and PV layers feed the VTA, which arbitrates them into a single
//! phasic DA value broadcast back to the learners.
//!
//! | Layer | Computes |
//! |-------|----------|
//! | BLA / CEl | Modulated activity, `amyg_mod_dwt` learning |
//! | MSN (patch / matrix) | DA-gated activity, delayed inhibition, trace learning |
//! | PosPV / NegPV | US input written into receivers' PVAct |
//! | LHbRMTg | Net dip / burst drive |
//! | PPTg | Rectified Ge rise |
//! | VTA | Net DA |

mod amyg;
mod lhb;
mod msn;
mod pptg;
mod pv;
mod vta;

pub use amyg::{amyg_mod_dwt, set_scale_wts, AcqExt, AmygModParams, BlaParams, CelParams, Valence};
pub use lhb::{LhbGains, LhbInputs, LhbInternal, LhbState};
pub use msn::{
    msn_dwt, DaLrnRule, DelayedInhibParams, MsnNeuron, MsnParams, MsnPathParams, MsnState,
    MsnTraceParams, StriatalCompartment, MSN_VAR_NAMES,
};
pub use pptg::PptgState;
pub use pv::PvParams;
pub use vta::{VtaGains, VtaInputs, VtaInternal, VtaSources, VtaState};
