//! # Basal ganglia gating
//!
//! Dorsal striatum, pallidum, subthalamic nucleus and thalamic relay
//! layers for PBWM-style gating.
//!
//! | Layer | Role |
//! |-------|------|
//! | Matrix (Go / NoGo) | DA-signed trace learning, ACh resets the trace |
//! | GPeOut / GPeIn / GPeTA | Tonic pallidum, indirect pathway |
//! | GPi | Tonic output; a pause disinhibits the thalamus |
//! | STNp / STNs | Burst then KCa pause |
//! | VThal | Tonic relay driven by GPi disinhibition |
//! | CIN | ACh = reward magnitude |
//!
//! Receiving pathway defaults depend on which class of layer sends and
//! on the receiver's name suffix; `recv_path_defaults` applies them once
//! when the network is built.

mod cin;
mod gp;
mod matrix;
mod stn;
mod vthal;

pub use cin::{cin_act, CinParams};
pub use gp::{
    gp_layer_defaults, gp_path_defaults, gpe_in_dwt, gpi_path_defaults, gpi_trace_dwt, GpState,
    GpiTraceParams,
};
pub use matrix::{matrix_layer_defaults, matrix_trace_dwt, MatrixParams, MatrixState, MatrixTraceParams};
pub use stn::{stn_layer_defaults, stn_path_defaults, CaParams, StnNeuron, StnState, STN_VAR_NAMES};
pub use vthal::{vthal_layer_defaults, vthal_path_defaults};

use crate::leabra::{Layer, LayerKind, Pathway};

/// Class of a sending layer as far as BG weight scales are concerned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BgSender {
    Matrix,
    /// GPe layers; GPi counts as `Other`
    Gp,
    Stn,
    Other,
}

impl BgSender {
    pub fn of(kind: &LayerKind) -> Self {
        match kind {
            LayerKind::Matrix(_) => BgSender::Matrix,
            LayerKind::Gp(_) => BgSender::Gp,
            LayerKind::Stn(_) => BgSender::Stn,
            _ => BgSender::Other,
        }
    }
}

/// Apply the receiver's BG pathway defaults, if it is a BG layer
pub fn recv_path_defaults(recv: &Layer, send: &Layer, pj: &mut Pathway) {
    let sender = BgSender::of(&send.kind);
    match &recv.kind {
        LayerKind::Gp(_) => gp_path_defaults(&recv.name, sender, pj),
        LayerKind::Gpi(_) => gpi_path_defaults(&recv.name, sender, &send.name, pj),
        LayerKind::Stn(_) => stn_path_defaults(&recv.name, sender, pj),
        LayerKind::VThal => vthal_path_defaults(&send.name, pj),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leabra::{LayerType, PathType, PathwayRole, Pattern};
    use crate::neuromod::DaRType;

    fn path() -> Pathway {
        Pathway::new("P".into(), 0, 1, PathType::Inhib, Pattern::OneToOne, PathwayRole::Standard)
    }

    #[test]
    fn test_gpi_sender_is_not_gp_class() {
        assert_eq!(BgSender::of(&LayerKind::Gp(GpState::default())), BgSender::Gp);
        assert_eq!(BgSender::of(&LayerKind::Gpi(GpState::default())), BgSender::Other);
        assert_eq!(
            BgSender::of(&LayerKind::Matrix(MatrixState::new(DaRType::D2R))),
            BgSender::Matrix
        );
    }

    #[test]
    fn test_dispatch_on_receiver_kind() {
        let shape = [1, 1];
        let gpi = Layer::with_kind("GPi", &shape, LayerType::Hidden, LayerKind::Gpi(GpState::default()));
        let stn = Layer::with_kind("STNs", &shape, LayerType::Hidden, LayerKind::Stn(StnState::default()));
        let vthal = Layer::with_kind("VThal", &shape, LayerType::Hidden, LayerKind::VThal);
        let plain = Layer::new("PFC", &shape, LayerType::Hidden);

        let mut pj = path();
        recv_path_defaults(&gpi, &stn, &mut pj);
        assert_eq!(pj.wt_scale.abs, 0.2);

        let mut pj = path();
        recv_path_defaults(&vthal, &gpi, &mut pj);
        assert_eq!(pj.wt_scale.abs, 2.0);

        let mut pj = path();
        recv_path_defaults(&stn, &plain, &mut pj);
        assert_eq!(pj.wt_scale.abs, 0.2);

        let mut pj = path();
        recv_path_defaults(&plain, &stn, &mut pj);
        assert_eq!(pj, path());
    }
}
