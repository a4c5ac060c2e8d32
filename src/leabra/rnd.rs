//! Random value generation for weight init and noise

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Distribution family
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RndDist {
    /// Uniform over [mean - var, mean + var]
    #[default]
    Uniform,
    /// Gaussian with standard deviation var
    Gaussian,
    /// Always the mean
    Mean,
}

/// Random number parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RndParams {
    pub dist: RndDist,
    pub mean: f32,
    pub var: f32,
}

impl Default for RndParams {
    fn default() -> Self {
        Self {
            dist: RndDist::Uniform,
            mean: 0.0,
            var: 0.0,
        }
    }
}

impl RndParams {
    pub fn new(dist: RndDist, mean: f32, var: f32) -> Self {
        Self { dist, mean, var }
    }

    /// Draw one value
    pub fn gen<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.var == 0.0 {
            return self.mean;
        }
        match self.dist {
            RndDist::Mean => self.mean,
            RndDist::Uniform => self.mean + self.var * (2.0 * rng.gen::<f32>() - 1.0),
            RndDist::Gaussian => match Normal::new(self.mean, self.var.abs()) {
                Ok(n) => n.sample(rng),
                Err(_) => self.mean,
            },
        }
    }
}
