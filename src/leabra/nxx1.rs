//! Noisy X/(X+1) rate-code activation function
//!
//! The x/(x+1) saturating response convolved with gaussian noise,
//! approximated piecewise: a sigmoid below threshold, a linear
//! interpolation just above it, and a gain-corrected x/(x+1) beyond.

use serde::{Deserialize, Serialize};

/// NXX1 parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nxx1Params {
    /// Threshold value in normalized membrane units
    pub thr: f32,
    /// Gain (1/noise) of the rate code
    pub gain: f32,
    /// Variance of the gaussian noise kernel
    pub n_var: f32,
    /// Activation below which the membrane potential drives activation
    pub vm_act_thr: f32,
    pub sig_mult: f32,
    pub sig_mult_pow: f32,
    pub sig_gain: f32,
    /// Interpolation range above zero
    pub interp_range: f32,
    /// Range in units of n_var over which gain correction applies
    pub gain_cor_range: f32,
    pub gain_cor: f32,

    #[serde(skip)]
    sig_gain_n_var: f32,
    #[serde(skip)]
    sig_mult_eff: f32,
    #[serde(skip)]
    sig_val_at_0: f32,
    #[serde(skip)]
    interp_val: f32,
}

impl Default for Nxx1Params {
    fn default() -> Self {
        let mut p = Self {
            thr: 0.5,
            gain: 100.0,
            n_var: 0.005,
            vm_act_thr: 0.01,
            sig_mult: 0.33,
            sig_mult_pow: 0.8,
            sig_gain: 3.0,
            interp_range: 0.01,
            gain_cor_range: 10.0,
            gain_cor: 0.1,
            sig_gain_n_var: 0.0,
            sig_mult_eff: 0.0,
            sig_val_at_0: 0.0,
            interp_val: 0.0,
        };
        p.update();
        p
    }
}

impl Nxx1Params {
    /// Recompute derived constants after any field change
    pub fn update(&mut self) {
        self.sig_gain_n_var = self.sig_gain / self.n_var;
        self.sig_mult_eff = self.sig_mult * (self.gain * self.n_var).powf(self.sig_mult_pow);
        self.sig_val_at_0 = 0.5 * self.sig_mult_eff;
        self.interp_val = self.xx1_gain_cor(self.interp_range) - self.sig_val_at_0;
    }

    #[inline]
    pub fn xx1(&self, x: f32) -> f32 {
        x / (x + 1.0)
    }

    /// x/(x+1) with gain reduced close to threshold
    pub fn xx1_gain_cor(&self, x: f32) -> f32 {
        let gain_cor_fact = (self.gain_cor_range - (x / self.n_var)) / self.gain_cor_range;
        if gain_cor_fact < 0.0 {
            return self.xx1(self.gain * x);
        }
        let new_gain = self.gain * (1.0 - self.gain_cor * gain_cor_fact);
        self.xx1(new_gain * x)
    }

    /// Noisy activation for x = net input above threshold
    pub fn noisy_xx1(&self, x: f32) -> f32 {
        if x < 0.0 {
            self.sig_mult_eff / (1.0 + (-(x * self.sig_gain_n_var)).exp())
        } else if x < self.interp_range {
            let interp = 1.0 - ((self.interp_range - x) / self.interp_range);
            self.sig_val_at_0 + interp * self.interp_val
        } else {
            self.xx1_gain_cor(x)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotone_and_bounded() {
        let p = Nxx1Params::default();
        let mut prev = p.noisy_xx1(-0.1);
        let mut x = -0.1f32;
        while x < 1.0 {
            x += 0.001;
            let y = p.noisy_xx1(x);
            assert!(y >= prev - 1e-6, "not monotone at {}", x);
            assert!((0.0..1.0).contains(&y));
            prev = y;
        }
    }

    #[test]
    fn test_continuity_at_breaks() {
        let p = Nxx1Params::default();
        let below = p.noisy_xx1(-1e-7);
        let at = p.noisy_xx1(0.0);
        assert!((below - at).abs() < 1e-3);
        let before = p.noisy_xx1(p.interp_range - 1e-6);
        let after = p.noisy_xx1(p.interp_range);
        assert!((before - after).abs() < 1e-3);
    }

    #[test]
    fn test_high_input_saturates() {
        let p = Nxx1Params::default();
        assert!(p.noisy_xx1(0.5) > 0.95);
    }
}
