//! # Reinforcement learning layers
//!
//! Dopamine sources that compute reward prediction errors, and the
//! prediction pathways that learn from them.
//!
//! | Layer | Act | Broadcasts |
//! |-------|-----|------------|
//! | RWPred | Ge clipped to [.01, .99] | - |
//! | RWDa | Rew - RWPred when reward is clamped | DA |
//! | TDRewPred | Ge in plus phase, ActP otherwise | - |
//! | TDRewInteg | Ge + Discount * RewPred | - |
//! | TDDa | RewInteg Act - ActM in plus phase | DA |
//! | ClampDa / ClampACh | clamped input | DA / ACh |
//!
//! Broadcast targets are listed by name and resolved when the network is
//! built; a name that is not a layer aborts the build.

mod clamp;
mod rw;
mod send;
mod td;

pub use clamp::{ClampAchParams, ClampDaParams};
pub use rw::{rw_da_act, rw_dwt, rw_pred_act, RwDaParams, RwPathParams, RwPredParams};
pub use send::{resolve_one, SendList};
pub use td::{
    td_da_act, td_rew_integ_act, td_rew_pred_act, td_rew_pred_dwt, TdDaParams, TdRewIntegParams,
};
