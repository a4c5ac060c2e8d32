//! Activation parameters and the per-neuron activation update
//!
//! Membrane potential integrates the net current from E, L, I and K
//! channels. Activation comes either from Vm directly (below threshold,
//! capturing onset latency) or from NXX1 of excitation above the
//! threshold conductance `geThr`, time-integrated with `VmTau`.

use super::chans::Chans;
use super::knadapt::KnaParams;
use super::minmax::Range;
use super::neuron::{flags, Neuron};
use super::nxx1::Nxx1Params;
use super::rnd::{RndDist, RndParams};
use serde::{Deserialize, Serialize};

/// Thresholds for skipping work
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptThreshParams {
    /// Don't send activation at or below this
    pub send: f32,
    /// Don't send activation changes smaller than this
    pub delta: f32,
}

impl Default for OptThreshParams {
    fn default() -> Self {
        Self {
            send: 0.1,
            delta: 0.005,
        }
    }
}

/// Initial state values, also the decay targets between trials
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActInitParams {
    /// Proportion of state decayed toward init at each trial start
    pub decay: f32,
    pub vm: f32,
    pub act: f32,
    /// Baseline excitatory conductance
    pub ge: f32,
}

impl Default for ActInitParams {
    fn default() -> Self {
        Self {
            decay: 1.0,
            vm: 0.4,
            act: 0.0,
            ge: 0.0,
        }
    }
}

/// Time constants
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DtParams {
    /// Overall integration rate multiplier
    pub integ: f32,
    /// Membrane and activation time constant in cycles
    pub vm_tau: f32,
    /// Conductance integration time constant in cycles
    pub g_tau: f32,
    /// ActAvg time constant in trials
    pub avg_tau: f32,
}

impl Default for DtParams {
    fn default() -> Self {
        Self {
            integ: 1.0,
            vm_tau: 3.3,
            g_tau: 1.4,
            avg_tau: 200.0,
        }
    }
}

impl DtParams {
    #[inline]
    pub fn vm_dt(&self) -> f32 {
        self.integ / self.vm_tau
    }

    #[inline]
    pub fn g_dt(&self) -> f32 {
        self.integ / self.g_tau
    }

    #[inline]
    pub fn avg_dt(&self) -> f32 {
        1.0 / self.avg_tau
    }

    /// Integrate a conductance toward its raw value
    #[inline]
    pub fn g_from_raw(&self, raw: f32, g: &mut f32) {
        *g += self.g_dt() * (raw - *g);
    }
}

/// How external input drives activation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClampParams {
    /// Act = Ext directly, otherwise Ext is added into Ge
    pub hard: bool,
    /// Allowed range of clamped activation
    pub range: Range,
    /// Soft clamp gain
    pub gain: f32,
    /// Soft clamp as weighted average with current Ge rather than sum
    pub avg: bool,
    pub avg_gain: f32,
}

impl Default for ClampParams {
    fn default() -> Self {
        Self {
            hard: true,
            range: Range::new(0.0, 0.95),
            gain: 0.2,
            avg: false,
            avg_gain: 0.2,
        }
    }
}

impl ClampParams {
    pub fn avg_ge(&self, ext: f32, ge: f32) -> f32 {
        self.avg_gain * self.gain * ext + (1.0 - self.avg_gain) * ge
    }
}

/// Where noise is added
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseType {
    #[default]
    None,
    Vm,
    Ge,
    Act,
    GeMult,
}

/// Activation noise
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActNoiseParams {
    pub rnd: RndParams,
    pub typ: NoiseType,
    /// Hold one noise value over the whole alpha cycle
    pub fixed: bool,
}

impl Default for ActNoiseParams {
    fn default() -> Self {
        Self {
            rnd: RndParams::default(),
            typ: NoiseType::None,
            fixed: true,
        }
    }
}

impl ActNoiseParams {
    /// Noise is active and drawn per alpha cycle
    pub fn is_fixed_active(&self) -> bool {
        self.typ != NoiseType::None && self.fixed && self.rnd.dist != RndDist::Mean
    }

    /// Noise is active and drawn every cycle
    pub fn is_cycle_active(&self) -> bool {
        self.typ != NoiseType::None && !self.fixed && self.rnd.dist != RndDist::Mean
    }
}

/// Activation function parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActParams {
    pub xx1: Nxx1Params,
    pub opt_thresh: OptThreshParams,
    pub init: ActInitParams,
    pub dt: DtParams,
    /// Maximal channel conductances
    pub gbar: Chans,
    /// Channel reversal potentials
    pub erev: Chans,
    pub clamp: ClampParams,
    pub noise: ActNoiseParams,
    pub vm_range: Range,
    pub kna: KnaParams,
}

impl Default for ActParams {
    fn default() -> Self {
        Self {
            xx1: Nxx1Params::default(),
            opt_thresh: OptThreshParams::default(),
            init: ActInitParams::default(),
            dt: DtParams::default(),
            gbar: Chans::new(1.0, 0.1, 1.0, 1.0),
            erev: Chans::new(1.0, 0.3, 0.25, 0.25),
            clamp: ClampParams::default(),
            noise: ActNoiseParams::default(),
            vm_range: Range::new(0.0, 2.0),
            kna: KnaParams::default(),
        }
    }
}

impl ActParams {
    /// Recompute derived values after field changes
    pub fn update(&mut self) {
        self.xx1.update();
    }

    #[inline]
    fn erev_sub_thr(&self) -> Chans {
        self.erev.minus(self.xx1.thr)
    }

    #[inline]
    fn thr_sub_erev(&self) -> Chans {
        self.erev.sub_from(self.xx1.thr)
    }

    /// Reset per-trial conductance accumulators
    pub fn init_g_inc(&self, nrn: &mut Neuron) {
        nrn.act_sent = 0.0;
        nrn.ge_raw = 0.0;
        nrn.ge_inc = 0.0;
        nrn.gi_raw = 0.0;
        nrn.gi_inc = 0.0;
    }

    /// Decay state toward init values by a proportion
    pub fn decay_state(&self, nrn: &mut Neuron, decay: f32) {
        if decay > 0.0 {
            nrn.act -= decay * (nrn.act - self.init.act);
            nrn.ge -= decay * (nrn.ge - self.init.ge);
            nrn.gi -= decay * nrn.gi;
            nrn.gi_self -= decay * nrn.gi_self;
            nrn.gk -= decay * nrn.gk;
            nrn.vm -= decay * (nrn.vm - self.init.vm);
        }
        nrn.act_del = 0.0;
        nrn.inet = 0.0;
    }

    /// Full activation reset
    pub fn init_acts(&self, nrn: &mut Neuron) {
        nrn.act = self.init.act;
        nrn.act_lrn = self.init.act;
        nrn.ge = self.init.ge;
        nrn.gi = 0.0;
        nrn.gk = 0.0;
        nrn.gkna_fast = 0.0;
        nrn.gkna_med = 0.0;
        nrn.gkna_slow = 0.0;
        nrn.gi_self = 0.0;
        nrn.gi_syn = 0.0;
        nrn.inet = 0.0;
        nrn.vm = self.init.vm;
        nrn.targ = 0.0;
        nrn.ext = 0.0;
        nrn.act_del = 0.0;
        nrn.spike = 0.0;
        nrn.isi = -1.0;
        nrn.isi_avg = -1.0;
        nrn.act_q0 = 0.0;
        nrn.act_q1 = 0.0;
        nrn.act_q2 = 0.0;
        nrn.act_m = 0.0;
        nrn.act_p = 0.0;
        nrn.act_dif = 0.0;
        self.init_g_inc(nrn);
    }

    /// Fold increments into raw conductances
    pub fn g_raw_from_inc(&self, nrn: &mut Neuron) {
        nrn.ge_raw += nrn.ge_inc;
        nrn.ge_inc = 0.0;
        nrn.gi_raw += nrn.gi_inc;
        nrn.gi_inc = 0.0;
    }

    /// Integrate Ge from raw input, adding soft-clamped external input
    pub fn ge_from_raw(&self, nrn: &mut Neuron, ge_raw: f32) {
        let mut ge_raw = ge_raw;
        if !self.clamp.hard && nrn.has_flag(flags::HAS_EXT) {
            if self.clamp.avg {
                ge_raw = self.clamp.avg_ge(nrn.ext, ge_raw);
            } else {
                ge_raw += nrn.ext * self.clamp.gain;
            }
        }
        self.dt.g_from_raw(ge_raw, &mut nrn.ge);
        match self.noise.typ {
            NoiseType::Ge => nrn.ge += nrn.noise,
            NoiseType::GeMult => nrn.ge *= 1.0 + nrn.noise,
            _ => {}
        }
    }

    /// Integrate synaptic inhibition, never negative
    pub fn gi_from_raw(&self, nrn: &mut Neuron, gi_raw: f32) {
        self.dt.g_from_raw(gi_raw, &mut nrn.gi_syn);
        nrn.gi_syn = nrn.gi_syn.max(0.0);
    }

    pub fn inet_from_g(&self, vm: f32, ge: f32, gi: f32, gk: f32) -> f32 {
        ge * (self.erev.e - vm)
            + self.gbar.l * (self.erev.l - vm)
            + gi * (self.erev.i - vm)
            + gk * (self.erev.k - vm)
    }

    /// Membrane potential update
    pub fn vm_from_g(&self, nrn: &mut Neuron) {
        let ge = nrn.ge * self.gbar.e;
        let gi = nrn.gi * self.gbar.i;
        let gk = nrn.gk * self.gbar.k;
        nrn.inet = self.inet_from_g(nrn.vm, ge, gi, gk);
        let mut vm = nrn.vm + self.dt.vm_dt() * nrn.inet;
        if self.noise.typ == NoiseType::Vm {
            vm += nrn.noise;
        }
        nrn.vm = self.vm_range.clip(vm);
    }

    /// Excitatory conductance that would hold Vm at threshold
    pub fn ge_thr_from_g(&self, nrn: &Neuron) -> f32 {
        let est = self.erev_sub_thr();
        (self.gbar.i * nrn.gi * est.i + self.gbar.l * est.l + self.gbar.k * nrn.gk * est.k)
            / self.thr_sub_erev().e
    }

    /// Threshold conductance ignoring potassium adaptation
    pub fn ge_thr_from_g_no_k(&self, nrn: &Neuron) -> f32 {
        let est = self.erev_sub_thr();
        (self.gbar.i * nrn.gi * est.i + self.gbar.l * est.l) / self.thr_sub_erev().e
    }

    pub fn has_hard_clamp(&self, nrn: &Neuron) -> bool {
        self.clamp.hard && nrn.has_flag(flags::HAS_EXT)
    }

    /// Set activation directly from external input
    pub fn hard_clamp(&self, nrn: &mut Neuron) {
        let mut ext = nrn.ext;
        if self.noise.typ == NoiseType::Act {
            ext += nrn.noise;
        }
        let clmp = self.clamp.range.clip(ext);
        nrn.act = clmp;
        nrn.act_lrn = clmp;
        nrn.vm = self.xx1.thr + nrn.act / self.xx1.gain;
        nrn.act_del = 0.0;
        nrn.inet = 0.0;
    }

    /// Rate-code activation from conductances
    pub fn act_from_g(&self, nrn: &mut Neuron) {
        if self.has_hard_clamp(nrn) {
            self.hard_clamp(nrn);
            return;
        }
        let (nw_act, nw_act_lrn) = if nrn.act < self.xx1.vm_act_thr && nrn.vm <= self.xx1.thr {
            let a = self.xx1.noisy_xx1(nrn.vm - self.xx1.thr);
            (a, a)
        } else {
            let ge = nrn.ge * self.gbar.e;
            let a = self.xx1.noisy_xx1(ge - self.ge_thr_from_g(nrn));
            let l = self.xx1.noisy_xx1(ge - self.ge_thr_from_g_no_k(nrn));
            (a, l)
        };
        let vm_dt = self.dt.vm_dt();
        let cur = nrn.act;
        let mut act = cur + vm_dt * (nw_act - cur);
        nrn.act_del = act - cur;
        if self.noise.typ == NoiseType::Act {
            act += nrn.noise;
        }
        nrn.act = act;
        nrn.act_lrn += vm_dt * (nw_act_lrn - nrn.act_lrn);
        if self.kna.on {
            self.kna
                .gc_from_rate(&mut nrn.gkna_fast, &mut nrn.gkna_med, &mut nrn.gkna_slow, nrn.act);
            nrn.gk = nrn.gkna_fast + nrn.gkna_med + nrn.gkna_slow;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(ac: &ActParams, ge: f32, gi: f32, cycles: usize) -> Neuron {
        let mut n = Neuron::default();
        ac.init_acts(&mut n);
        for _ in 0..cycles {
            ac.ge_from_raw(&mut n, ge);
            n.gi = gi;
            ac.vm_from_g(&mut n);
            ac.act_from_g(&mut n);
        }
        n
    }

    #[test]
    fn test_no_input_stays_quiet() {
        let ac = ActParams::default();
        let n = settle(&ac, 0.0, 0.0, 100);
        assert!(n.act < 0.01);
        assert!((n.vm - ac.erev.l).abs() < 0.05);
    }

    #[test]
    fn test_strong_input_activates_within_range() {
        let ac = ActParams::default();
        let n = settle(&ac, 1.0, 0.3, 100);
        assert!(n.act > 0.5);
        assert!(n.act < 1.0);
    }

    #[test]
    fn test_inhibition_reduces_activity() {
        let ac = ActParams::default();
        let lo = settle(&ac, 0.6, 0.2, 100);
        let hi = settle(&ac, 0.6, 1.0, 100);
        assert!(hi.act < lo.act);
    }

    #[test]
    fn test_hard_clamp() {
        let ac = ActParams::default();
        let mut n = Neuron::default();
        n.ext = 1.0;
        n.set_flag(flags::HAS_EXT);
        ac.act_from_g(&mut n);
        assert_eq!(n.act, 0.95);
        assert_eq!(n.act_lrn, 0.95);
        assert_eq!(n.act_del, 0.0);
    }

    #[test]
    fn test_decay_full() {
        let ac = ActParams::default();
        let mut n = Neuron {
            act: 0.8,
            ge: 0.5,
            gi: 0.4,
            vm: 0.9,
            ..Default::default()
        };
        ac.decay_state(&mut n, 1.0);
        assert_eq!(n.act, 0.0);
        assert_eq!(n.ge, 0.0);
        assert_eq!(n.gi, 0.0);
        assert!((n.vm - ac.init.vm).abs() < 1e-6);
    }

    #[test]
    fn test_gi_syn_floor() {
        let ac = ActParams::default();
        let mut n = Neuron::default();
        ac.gi_from_raw(&mut n, -1.0);
        assert_eq!(n.gi_syn, 0.0);
    }
}
