//! XCAL learning
//!
//! Neuron-side running averages (super-short, short, medium, long) and
//! the synapse-side rule: error-driven XCAL against the medium-term
//! product plus BCM-style Hebbian XCAL against the receiver's long-term
//! average, followed by normalization, momentum, soft bounding, weight
//! balance and sigmoidal contrast enhancement.

use super::neuron::Neuron;
use super::rnd::{RndDist, RndParams};
use serde::{Deserialize, Serialize};

/// Multi-timescale running averages of ActLrn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LrnActAvgParams {
    pub ss_tau: f32,
    pub s_tau: f32,
    pub m_tau: f32,
    /// Proportion of medium-term average mixed into AvgSLrn
    pub lrn_m: f32,
    pub init: f32,
}

impl Default for LrnActAvgParams {
    fn default() -> Self {
        Self {
            ss_tau: 2.0,
            s_tau: 2.0,
            m_tau: 10.0,
            lrn_m: 0.1,
            init: 0.15,
        }
    }
}

impl LrnActAvgParams {
    pub fn avgs_from_act(&self, act: f32, nrn: &mut Neuron) {
        nrn.avg_ss += (act - nrn.avg_ss) / self.ss_tau;
        nrn.avg_s += (nrn.avg_ss - nrn.avg_s) / self.s_tau;
        nrn.avg_m += (nrn.avg_s - nrn.avg_m) / self.m_tau;
        nrn.avg_s_lrn = (1.0 - self.lrn_m) * nrn.avg_s + self.lrn_m * nrn.avg_m;
    }
}

/// Long-term average that sets the BCM floating threshold
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvgLParams {
    pub init: f32,
    /// Gain on AvgM driving AvgL
    pub gain: f32,
    pub min: f32,
    /// Time constant in trials
    pub tau: f32,
    /// AvgLLrn at AvgL = gain
    pub lrn_max: f32,
    /// AvgLLrn at AvgL = min
    pub lrn_min: f32,
    /// Modulate AvgLLrn by the layer's cosine-difference error
    pub err_mod: bool,
    pub mod_min: f32,
}

impl Default for AvgLParams {
    fn default() -> Self {
        Self {
            init: 0.4,
            gain: 2.5,
            min: 0.2,
            tau: 10.0,
            lrn_max: 0.5,
            lrn_min: 0.0001,
            err_mod: true,
            mod_min: 0.01,
        }
    }
}

impl AvgLParams {
    #[inline]
    pub fn lrn_fact(&self) -> f32 {
        (self.lrn_max - self.lrn_min) / (self.gain - self.min)
    }

    pub fn avg_l_from_avg_m(&self, nrn: &mut Neuron) {
        nrn.avg_l += (self.gain * nrn.avg_m - nrn.avg_l) / self.tau;
        if nrn.avg_l < self.min {
            nrn.avg_l = self.min;
        }
        nrn.avg_l_lrn = self.lrn_fact() * (nrn.avg_l - self.min);
    }

    /// Modulation factor on AvgLLrn from layer error level
    pub fn err_mod_from_lay_err(&self, lay_cos_diff_avg: f32) -> f32 {
        if !self.err_mod {
            return 1.0;
        }
        lay_cos_diff_avg.max(self.mod_min)
    }
}

/// Cosine difference running-average time constant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CosDiffParams {
    pub tau: f32,
}

impl Default for CosDiffParams {
    fn default() -> Self {
        Self { tau: 100.0 }
    }
}

impl CosDiffParams {
    pub fn avg_var_from_cos(&self, avg: &mut f32, var: &mut f32, cos: f32) {
        let dt = 1.0 / self.tau;
        if *avg == 0.0 {
            *avg = cos;
            *var = 0.0;
        } else {
            let del = cos - *avg;
            let incr = dt * del;
            *avg += incr;
            if *var == 0.0 {
                *var = 2.0 * (1.0 - dt) * del * incr;
            } else {
                *var = (1.0 - dt) * (*var + del * incr);
            }
        }
    }
}

/// Layer statistics of minus / plus phase similarity
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CosDiffStats {
    pub cos: f32,
    pub avg: f32,
    pub var: f32,
    /// 1 - avg, 0 for non-hidden layers
    pub avg_lrn: f32,
    /// Multiplier on AvgLLrn
    pub mod_avg_l_lrn: f32,
}

impl CosDiffStats {
    pub fn init(&mut self) {
        *self = Self::default();
    }
}

/// Neuron-level learning parameters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnNeurParams {
    pub act_avg: LrnActAvgParams,
    pub avg_l: AvgLParams,
    pub cos_diff: CosDiffParams,
}

impl LearnNeurParams {
    pub fn init_act_avg(&self, nrn: &mut Neuron) {
        nrn.avg_ss = self.act_avg.init;
        nrn.avg_s = self.act_avg.init;
        nrn.avg_m = self.act_avg.init;
        nrn.avg_l = self.avg_l.init;
        nrn.avg_s_lrn = 0.0;
        nrn.act_avg = self.act_avg.init;
    }

    pub fn avgs_from_act(&self, nrn: &mut Neuron) {
        let act = nrn.act_lrn;
        self.act_avg.avgs_from_act(act, nrn);
    }
}

/// The XCAL piecewise-linear dWt function
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XcalParams {
    /// Multiplier on the error-driven (medium-term) component
    pub m_lrn: f32,
    /// Use fixed `l_lrn` instead of AvgLLrn for the Hebbian component
    pub set_l_lrn: bool,
    pub l_lrn: f32,
    /// Proportion of the threshold at which the function reverses
    pub d_rev: f32,
    /// Minimum co-product below which dWt is zero
    pub d_thr: f32,
    /// Sender activity below which learning is skipped
    pub lrn_thr: f32,
}

impl Default for XcalParams {
    fn default() -> Self {
        Self {
            m_lrn: 1.0,
            set_l_lrn: false,
            l_lrn: 1.0,
            d_rev: 0.1,
            d_thr: 0.0001,
            lrn_thr: 0.01,
        }
    }
}

impl XcalParams {
    #[inline]
    fn d_rev_ratio(&self) -> f32 {
        if self.d_rev > 0.0 {
            -(1.0 - self.d_rev) / self.d_rev
        } else {
            -1.0
        }
    }

    pub fn dwt(&self, srval: f32, thr_p: f32) -> f32 {
        if srval < self.d_thr {
            0.0
        } else if srval > thr_p * self.d_rev {
            srval - thr_p
        } else {
            srval * self.d_rev_ratio()
        }
    }

    pub fn long_lrate(&self, avg_l_lrn: f32) -> f32 {
        if self.set_l_lrn {
            self.l_lrn
        } else {
            avg_l_lrn
        }
    }
}

/// Sigmoidal contrast enhancement between LWt and Wt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WtSigParams {
    pub gain: f32,
    pub off: f32,
    /// Exponential approach to the 0 / 1 bounds
    pub soft_bound: bool,
}

impl Default for WtSigParams {
    fn default() -> Self {
        Self {
            gain: 6.0,
            off: 1.0,
            soft_bound: true,
        }
    }
}

pub fn sig_fun(w: f32, gain: f32, off: f32) -> f32 {
    if w <= 0.0 {
        return 0.0;
    }
    if w >= 1.0 {
        return 1.0;
    }
    1.0 / (1.0 + ((off * (1.0 - w)) / w).powf(gain))
}

pub fn sig_fun61(w: f32) -> f32 {
    if w <= 0.0 {
        return 0.0;
    }
    if w >= 1.0 {
        return 1.0;
    }
    let pw = (1.0 - w) / w;
    1.0 / (1.0 + pw * pw * pw * pw * pw * pw)
}

pub fn sig_inv_fun(w: f32, gain: f32, off: f32) -> f32 {
    if w <= 0.0 {
        return 0.0;
    }
    if w >= 1.0 {
        return 1.0;
    }
    1.0 / (1.0 + ((1.0 - w) / w).powf(1.0 / gain) / off)
}

pub fn sig_inv_fun61(w: f32) -> f32 {
    if w <= 0.0 {
        return 0.0;
    }
    if w >= 1.0 {
        return 1.0;
    }
    1.0 / (1.0 + ((1.0 - w) / w).powf(1.0 / 6.0))
}

impl WtSigParams {
    pub fn linear() -> Self {
        Self {
            gain: 1.0,
            ..Default::default()
        }
    }

    pub fn sig_from_lin_wt(&self, lw: f32) -> f32 {
        if self.gain == 1.0 && self.off == 1.0 {
            lw
        } else if self.gain == 6.0 && self.off == 1.0 {
            sig_fun61(lw)
        } else {
            sig_fun(lw, self.gain, self.off)
        }
    }

    pub fn lin_from_sig_wt(&self, sw: f32) -> f32 {
        if self.gain == 1.0 && self.off == 1.0 {
            sw
        } else if self.gain == 6.0 && self.off == 1.0 {
            sig_inv_fun61(sw)
        } else {
            sig_inv_fun(sw, self.gain, self.off)
        }
    }
}

/// Adaptive dWt normalization by running max of |dWt|
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwtNormParams {
    pub on: bool,
    pub decay_tau: f32,
    pub norm_min: f32,
    /// Learning rate compensation applied with normalization
    pub lr_comp: f32,
}

impl Default for DwtNormParams {
    fn default() -> Self {
        Self {
            on: true,
            decay_tau: 1000.0,
            norm_min: 0.001,
            lr_comp: 0.15,
        }
    }
}

impl DwtNormParams {
    pub fn norm_from_abs_dwt(&self, norm: &mut f32, abs_dwt: f32) -> f32 {
        let decay_dt_c = 1.0 - 1.0 / self.decay_tau;
        *norm = (decay_dt_c * *norm).max(abs_dwt);
        if *norm == 0.0 {
            return 1.0;
        }
        self.lr_comp / norm.max(self.norm_min)
    }
}

/// Momentum on dWt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    pub on: bool,
    pub m_tau: f32,
    pub lr_comp: f32,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            on: true,
            m_tau: 10.0,
            lr_comp: 0.1,
        }
    }
}

impl MomentumParams {
    pub fn moment_from_dwt(&self, moment: &mut f32, dwt: f32) -> f32 {
        let m_dt_c = 1.0 - 1.0 / self.m_tau;
        *moment = m_dt_c * *moment + dwt;
        self.lr_comp * *moment
    }
}

/// Receiver-level weight balance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WtBalParams {
    pub on: bool,
    /// Also apply to target layers
    pub targs: bool,
    /// Only weights at or above this count toward the average
    pub avg_thr: f32,
    pub hi_thr: f32,
    pub hi_gain: f32,
    pub lo_thr: f32,
    pub lo_gain: f32,
}

impl Default for WtBalParams {
    fn default() -> Self {
        Self {
            on: false,
            targs: false,
            avg_thr: 0.25,
            hi_thr: 0.4,
            hi_gain: 4.0,
            lo_thr: 0.4,
            lo_gain: 6.0,
        }
    }
}

impl WtBalParams {
    /// Returns (fact, inc, dec) for a receiver's average weight
    pub fn wt_bal(&self, wb_avg: f32) -> (f32, f32, f32) {
        let mut fact = 0.0;
        let mut inc = 1.0;
        let mut dec = 1.0;
        if wb_avg < self.lo_thr {
            let avg = wb_avg.max(self.avg_thr);
            fact = self.lo_gain * (self.lo_thr - avg);
            dec = 1.0 / (1.0 + fact);
            inc = 2.0 - dec;
        } else if wb_avg > self.hi_thr {
            fact = self.hi_gain * (wb_avg - self.hi_thr);
            inc = 1.0 / (1.0 + fact);
            dec = 2.0 - inc;
        }
        (fact, inc, dec)
    }
}

/// Weight balance state per receiving neuron
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WtBalRecv {
    pub avg: f32,
    pub fact: f32,
    pub inc: f32,
    pub dec: f32,
}

impl Default for WtBalRecv {
    fn default() -> Self {
        Self {
            avg: 0.0,
            fact: 0.0,
            inc: 1.0,
            dec: 1.0,
        }
    }
}

/// Synapse-level learning parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnSynParams {
    pub learn: bool,
    pub lrate: f32,
    /// Initial learning rate, base for schedules
    pub lrate_init: f32,
    pub xcal: XcalParams,
    pub wt_sig: WtSigParams,
    pub norm: DwtNormParams,
    pub momentum: MomentumParams,
    pub wt_bal: WtBalParams,
}

impl Default for LearnSynParams {
    fn default() -> Self {
        Self {
            learn: true,
            lrate: 0.04,
            lrate_init: 0.04,
            xcal: XcalParams::default(),
            wt_sig: WtSigParams::default(),
            norm: DwtNormParams::default(),
            momentum: MomentumParams::default(),
            wt_bal: WtBalParams::default(),
        }
    }
}

impl LearnSynParams {
    /// Parameters for linear weights with no norm, momentum or balance
    pub fn plain() -> Self {
        Self {
            wt_sig: WtSigParams::linear(),
            norm: DwtNormParams {
                on: false,
                ..Default::default()
            },
            momentum: MomentumParams {
                on: false,
                ..Default::default()
            },
            wt_bal: WtBalParams::default(),
            ..Default::default()
        }
    }

    /// (err, bcm) components for one synapse
    pub fn chl_dwt(
        &self,
        su_avg_s_lrn: f32,
        su_avg_m: f32,
        ru_avg_s_lrn: f32,
        ru_avg_m: f32,
        ru_avg_l: f32,
    ) -> (f32, f32) {
        let srs = su_avg_s_lrn * ru_avg_s_lrn;
        let srm = su_avg_m * ru_avg_m;
        (self.xcal.dwt(srs, srm), self.xcal.dwt(srs, ru_avg_l))
    }

    /// Apply norm and momentum to a raw dWt, updating the synapse accumulators
    pub fn norm_moment(&self, norm_acc: &mut f32, moment_acc: &mut f32, dwt: f32) -> f32 {
        let norm = if self.norm.on {
            self.norm.norm_from_abs_dwt(norm_acc, dwt.abs())
        } else {
            1.0
        };
        if self.momentum.on {
            norm * self.momentum.moment_from_dwt(moment_acc, dwt)
        } else {
            dwt * norm
        }
    }

    /// Soft-bounded update of LWt and Wt; resets dWt
    pub fn wt_from_dwt(
        &self,
        wb_inc: f32,
        wb_dec: f32,
        dwt: &mut f32,
        wt: &mut f32,
        lwt: &mut f32,
        scale: f32,
    ) {
        if *dwt == 0.0 {
            return;
        }
        if self.wt_sig.soft_bound {
            if *dwt > 0.0 {
                *dwt *= wb_inc * (1.0 - *lwt);
            } else {
                *dwt *= wb_dec * *lwt;
            }
        } else if *dwt > 0.0 {
            *dwt *= wb_inc;
        } else {
            *dwt *= wb_dec;
        }
        *lwt = (*lwt + *dwt).clamp(0.0, 1.0);
        *wt = scale * self.wt_sig.sig_from_lin_wt(*lwt);
        *dwt = 0.0;
    }
}

/// Initial weight distribution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WtInitParams {
    pub rnd: RndParams,
    /// Copy weights into the reciprocal pathway
    pub sym: bool,
}

impl Default for WtInitParams {
    fn default() -> Self {
        Self {
            rnd: RndParams::new(RndDist::Uniform, 0.5, 0.25),
            sym: true,
        }
    }
}

impl WtInitParams {
    /// Constant initial weight, no symmetry
    pub fn fixed(mean: f32) -> Self {
        Self {
            rnd: RndParams::new(RndDist::Uniform, mean, 0.0),
            sym: false,
        }
    }
}

/// Pathway input scaling
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WtScaleParams {
    /// Absolute multiplier, not normalized
    pub abs: f32,
    /// Relative multiplier, normalized across pathways into a layer
    pub rel: f32,
}

impl Default for WtScaleParams {
    fn default() -> Self {
        Self { abs: 1.0, rel: 1.0 }
    }
}

impl WtScaleParams {
    /// Scaling by the expected number of active senders
    pub fn s_lay_act_scale(&self, savg: f32, snu: f32, ncon: f32) -> f32 {
        let ncon = ncon.max(1.0);
        let sem_extra = 2i32;
        let slay_act_n = ((savg * snu).round() as i32).max(1);
        if ncon == snu {
            1.0 / slay_act_n as f32
        } else {
            let r_max_act_n = (ncon.min(slay_act_n as f32)) as i32;
            let r_avg_act_n = ((savg * ncon).round() as i32).max(1);
            let r_exp_act_n = (r_avg_act_n + sem_extra).min(r_max_act_n).max(1);
            1.0 / r_exp_act_n as f32
        }
    }

    pub fn full_scale(&self, savg: f32, snu: f32, ncon: f32) -> f32 {
        self.abs * self.rel * self.s_lay_act_scale(savg, snu, ncon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_xcal_below_dthr_is_zero() {
        let x = XcalParams::default();
        assert_eq!(x.dwt(0.00005, 0.3), 0.0);
        assert_eq!(x.dwt(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_xcal_continuous_at_reversal() {
        let x = XcalParams::default();
        let th = 0.4f32;
        let brk = th * x.d_rev;
        let at = x.dwt(brk, th);
        let just_above = x.dwt(brk + 1e-6, th);
        assert!((at - just_above).abs() < 1e-5);
        assert!((at - (brk - th)).abs() < 1e-6);
    }

    #[test]
    fn test_xcal_linear_above_reversal() {
        let x = XcalParams::default();
        for &(sr, th) in &[(0.5f32, 0.3f32), (0.3, 0.3), (0.1, 0.6)] {
            assert!((x.dwt(sr, th) - (sr - th)).abs() < 1e-7);
        }
        assert_eq!(x.dwt(0.3, 0.3), 0.0);
    }

    #[test]
    fn test_soft_bound_samples() {
        let ls = LearnSynParams::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10_000 {
            let lwt0: f32 = rng.gen_range(0.01..0.99);
            let mag: f32 = rng.gen_range(0.001..2.0);
            let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            let mut dwt = sign * mag;
            let mut lwt = lwt0;
            let mut wt = ls.wt_sig.sig_from_lin_wt(lwt);
            ls.wt_from_dwt(1.0, 1.0, &mut dwt, &mut wt, &mut lwt, 1.0);
            if sign > 0.0 {
                assert!(lwt > lwt0 && lwt <= 1.0, "lwt {} -> {}", lwt0, lwt);
            } else {
                assert!(lwt < lwt0 && lwt >= 0.0, "lwt {} -> {}", lwt0, lwt);
            }
            assert_eq!(dwt, 0.0);
            assert!((wt - ls.wt_sig.sig_from_lin_wt(lwt)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sig_inverse() {
        let ws = WtSigParams::default();
        for w in [0.1f32, 0.3, 0.5, 0.7, 0.9] {
            let back = ws.sig_from_lin_wt(ws.lin_from_sig_wt(w));
            assert!((back - w).abs() < 1e-4);
        }
        let gen = WtSigParams {
            gain: 3.0,
            off: 1.2,
            soft_bound: true,
        };
        for w in [0.2f32, 0.5, 0.8] {
            let back = gen.sig_from_lin_wt(gen.lin_from_sig_wt(w));
            assert!((back - w).abs() < 1e-4);
        }
    }

    #[test]
    fn test_wt_bal() {
        let wb = WtBalParams::default();
        let (_, inc, dec) = wb.wt_bal(0.1);
        assert!(inc > 1.0 && dec < 1.0);
        let (_, inc, dec) = wb.wt_bal(0.8);
        assert!(inc < 1.0 && dec > 1.0);
        assert_eq!(wb.wt_bal(0.4), (0.0, 1.0, 1.0));
    }

    #[test]
    fn test_norm_and_momentum() {
        let ls = LearnSynParams::default();
        let (mut norm, mut moment) = (0.0f32, 0.0f32);
        let d = ls.norm_moment(&mut norm, &mut moment, 0.5);
        assert_eq!(norm, 0.5);
        assert!((d - (0.15 / 0.5) * 0.1 * 0.5).abs() < 1e-6);
        let (mut norm, mut moment) = (0.0f32, 0.0f32);
        assert_eq!(ls.norm_moment(&mut norm, &mut moment, 0.0), 0.0);
    }

    #[test]
    fn test_s_lay_act_scale() {
        let ws = WtScaleParams::default();
        assert_eq!(ws.s_lay_act_scale(0.15, 1.0, 1.0), 1.0);
        assert!((ws.s_lay_act_scale(0.2, 10.0, 10.0) - 0.5).abs() < 1e-6);
        assert!((ws.s_lay_act_scale(0.1, 100.0, 20.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_avg_l_floor() {
        let p = AvgLParams::default();
        let mut n = Neuron {
            avg_l: 0.21,
            avg_m: 0.0,
            ..Default::default()
        };
        for _ in 0..100 {
            p.avg_l_from_avg_m(&mut n);
        }
        assert_eq!(n.avg_l, p.min);
        assert_eq!(n.avg_l_lrn, 0.0);
    }
}
