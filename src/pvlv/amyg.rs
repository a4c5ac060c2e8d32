//! Amygdala layers and their DA-modulated Hebbian pathway

use crate::leabra::{Conns, Layer, LearnSynParams, Synapse, WtInitParams};
use crate::neuromod::DaRType;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Appetitive or aversive
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Valence {
    #[default]
    Pos,
    Neg,
}

/// Acquisition or extinction population
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcqExt {
    #[default]
    Acq,
    Ext,
}

/// Basolateral amygdala
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlaParams {
    pub valence: Valence,
    pub dar: DaRType,
}

/// Central lateral amygdala
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CelParams {
    pub acq_ext: AcqExt,
    pub valence: Valence,
    pub dar: DaRType,
    /// Acquisition units are gated by deep modulation input
    pub acq_deep_mod: bool,
}

impl Default for CelParams {
    fn default() -> Self {
        Self {
            acq_ext: AcqExt::Acq,
            valence: Valence::Pos,
            dar: DaRType::D1R,
            acq_deep_mod: true,
        }
    }
}

/// DA-modulated Hebbian learning into amygdala layers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmygModParams {
    /// Draw a per-synapse scale from `wt_init` and use a constant weight
    pub set_scale: bool,
    pub set_scale_min: f32,
    pub set_scale_max: f32,
    /// Weight used with `set_scale`
    pub init_wt_val: f32,
    pub dalr_gain: f32,
    pub dalr_base: f32,
    /// |DA| below this counts as no DA
    pub da_lrn_thr: f32,
    /// |ModAct - ActQ0| below this counts as no change
    pub act_delta_thr: f32,
    /// Gate learning by ModLrn > `act_lrn_thr`
    pub act_lrn_mod: bool,
    pub act_lrn_thr: f32,
}

impl Default for AmygModParams {
    fn default() -> Self {
        Self {
            set_scale: false,
            set_scale_min: 0.0,
            set_scale_max: 1.0,
            init_wt_val: 0.1,
            dalr_gain: 1.0,
            dalr_base: 1.0,
            da_lrn_thr: 0.0,
            act_delta_thr: 0.05,
            act_lrn_mod: true,
            act_lrn_thr: 0.05,
        }
    }
}

/// Weight init for `set_scale`: constant weight, clipped random scale
pub fn set_scale_wts<R: Rng + ?Sized>(
    p: &AmygModParams,
    wt_init: &WtInitParams,
    learn: &LearnSynParams,
    syns: &mut [Synapse],
    rng: &mut R,
) {
    let lwt = learn.wt_sig.lin_from_sig_wt(p.init_wt_val);
    for sy in syns {
        let scale = wt_init
            .rnd
            .gen(rng)
            .max(p.set_scale_min)
            .min(p.set_scale_max);
        sy.scale = scale;
        sy.lwt = lwt;
        sy.wt = p.init_wt_val * scale;
        sy.dwt = 0.0;
        sy.norm = 0.0;
        sy.moment = 0.0;
    }
}

/// DWt = (DALRBase + DALRGain*|DA|) * lrate * SendActQ0 * (ModAct - ActQ0)
pub fn amyg_mod_dwt(
    p: &AmygModParams,
    learn: &LearnSynParams,
    conns: &Conns,
    syns: &mut [Synapse],
    send: &Layer,
    recv: &Layer,
) {
    let Some(ms) = &recv.mods else {
        log::warn!("AmygMod pathway into {} which has no modulation state", recv.name);
        return;
    };
    for (si, sn) in send.neurons.iter().enumerate() {
        let sn_act = sn.act_q0;
        for k in conns.send_range(si) {
            let ri = conns.send_idx[k];
            let rn = &recv.neurons[ri];
            if rn.is_off() {
                continue;
            }
            let mn = &ms.neurons[ri];
            let da = if mn.mods.da.abs() < p.da_lrn_thr {
                0.0
            } else {
                mn.mods.da
            };
            let mut lr = learn.lrate;
            if p.act_lrn_mod && mn.mod_lrn <= p.act_lrn_thr {
                lr = 0.0;
            }
            let mut delta = mn.mod_act - rn.act_q0;
            if delta.abs() < p.act_delta_thr {
                delta = 0.0;
            }
            let da_lr = p.dalr_base + p.dalr_gain * da.abs();
            syns[k].dwt += da_lr * lr * sn_act * delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leabra::{connect_pattern, LayerKind, LayerType, Pattern};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (Layer, Layer, Conns) {
        let mut send = Layer::new("CS", &[1, 1], LayerType::Input);
        send.build().unwrap();
        send.neurons[0].act_q0 = 1.0;
        let mut recv = Layer::with_kind(
            "BLA",
            &[1, 1],
            LayerType::Hidden,
            LayerKind::Bla(BlaParams::default()),
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
    fn test_small_delta_snaps_to_zero() {
        let (send, mut recv, conns) = setup();
        let learn = LearnSynParams::default();
        let p = AmygModParams::default();
        let ms = recv.mods.as_mut().unwrap();
        ms.neurons[0].mod_lrn = 1.0;
        ms.neurons[0].mod_act = 0.53;
        recv.neurons[0].act_q0 = 0.5;
        let mut syns = vec![Synapse::default()];
        amyg_mod_dwt(&p, &learn, &conns, &mut syns, &send, &recv);
        assert_eq!(syns[0].dwt, 0.0);

        recv.mods.as_mut().unwrap().neurons[0].mod_act = 0.9;
        recv.mods.as_mut().unwrap().neurons[0].mods.da = 0.5;
        amyg_mod_dwt(&p, &learn, &conns, &mut syns, &send, &recv);
        let want = 1.5 * learn.lrate * 0.4;
        assert!((syns[0].dwt - want).abs() < 1e-6);
    }

    #[test]
    fn test_mod_lrn_gates_learning() {
        let (send, mut recv, conns) = setup();
        let learn = LearnSynParams::default();
        let ms = recv.mods.as_mut().unwrap();
        ms.neurons[0].mod_lrn = 0.0;
        ms.neurons[0].mod_act = 0.9;
        let mut syns = vec![Synapse::default()];
        amyg_mod_dwt(&AmygModParams::default(), &learn, &conns, &mut syns, &send, &recv);
        assert_eq!(syns[0].dwt, 0.0);
    }

    #[test]
    fn test_set_scale_wts() {
        let p = AmygModParams {
            set_scale: true,
            ..Default::default()
        };
        let mut wt_init = WtInitParams::default();
        wt_init.rnd.mean = 0.5;
        wt_init.rnd.var = 0.5;
        let learn = LearnSynParams::default();
        let mut syns = vec![Synapse::default(); 200];
        let mut rng = StdRng::seed_from_u64(3);
        set_scale_wts(&p, &wt_init, &learn, &mut syns, &mut rng);
        for sy in &syns {
            assert!((0.0..=1.0).contains(&sy.scale));
            assert!((sy.wt - 0.1 * sy.scale).abs() < 1e-6);
            assert_eq!(sy.dwt, 0.0);
        }
    }
}
