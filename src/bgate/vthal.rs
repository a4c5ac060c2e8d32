//! Ventral thalamus relay: tonically active, disinhibited when GPi pauses

use super::gp::tonic_layer_defaults;
use crate::leabra::{Layer, Pathway};

pub fn vthal_layer_defaults(ly: &mut Layer) {
    tonic_layer_defaults(ly);
    let ac = &mut ly.act;
    ac.init.vm = 0.9;
    ac.init.act = 0.5;
    ac.erev.l = 0.9;
    ac.gbar.l = 0.2;
    ac.dt.vm_tau = 4.0;
    ac.dt.g_tau = 5.0;
}

/// Fixed receiving weights; the GPi input is doubled
pub fn vthal_path_defaults(send_name: &str, pj: &mut Pathway) {
    pj.learn.learn = false;
    pj.learn.wt_sig.gain = 1.0;
    pj.wt_init.rnd.mean = 0.9;
    pj.wt_init.rnd.var = 0.0;
    pj.wt_init.sym = false;
    if send_name.ends_with("GPi") {
        pj.wt_scale.abs = 2.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leabra::{LayerKind, LayerType, PathType, PathwayRole, Pattern};

    #[test]
    fn test_relay_defaults() {
        let ly = Layer::with_kind("VThal", &[1, 4], LayerType::Hidden, LayerKind::VThal);
        assert_eq!(ly.act.erev.l, 0.9);
        assert_eq!(ly.act.dt.g_tau, 5.0);
        assert!(!ly.inhib.layer.on);
        assert!(ly.inhib.self_inhib.on);
    }

    #[test]
    fn test_gpi_input_doubled() {
        let mut pj = Pathway::new("GPiToVThal".into(), 0, 1, PathType::Inhib, Pattern::OneToOne, PathwayRole::Standard);
        vthal_path_defaults("BgGPi", &mut pj);
        assert_eq!(pj.wt_scale.abs, 2.0);
        assert!(!pj.learn.learn);
        let mut pj = Pathway::new("PFCToVThal".into(), 0, 1, PathType::Forward, Pattern::Full, PathwayRole::Standard);
        vthal_path_defaults("PFC", &mut pj);
        assert_eq!(pj.wt_scale.abs, 1.0);
    }
}
