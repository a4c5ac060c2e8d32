//! Range and running-statistic helpers

use serde::{Deserialize, Serialize};

/// Closed value range
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clip value into [min, max]
    pub fn clip(&self, v: f32) -> f32 {
        if v < self.min {
            self.min
        } else if v > self.max {
            self.max
        } else {
            v
        }
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

/// Average and max of a value over a set of units
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvgMax {
    pub avg: f32,
    pub max: f32,
    /// Index of the unit holding the max, -1 if none
    pub max_idx: i32,
    pub sum: f32,
    pub n: u32,
}

impl Default for AvgMax {
    fn default() -> Self {
        Self {
            avg: 0.0,
            max: f32::MIN,
            max_idx: -1,
            sum: 0.0,
            n: 0,
        }
    }
}

impl AvgMax {
    /// Reset for a new accumulation pass
    pub fn init(&mut self) {
        *self = Self::default();
    }

    pub fn update(&mut self, val: f32, idx: usize) {
        if val > self.max {
            self.max = val;
            self.max_idx = idx as i32;
        }
        self.sum += val;
        self.n += 1;
    }

    /// Finish an accumulation pass; an empty pass leaves zeros
    pub fn calc_avg(&mut self) {
        if self.n > 0 {
            self.avg = self.sum / self.n as f32;
        } else {
            self.avg = 0.0;
            self.max = 0.0;
        }
    }

    /// Scale down stats, used for state decay between trials
    pub fn decay(&mut self, decay: f32) {
        self.avg -= decay * self.avg;
        self.max -= decay * self.max;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avg_max() {
        let mut am = AvgMax::default();
        for (i, v) in [0.2f32, 0.8, 0.5].iter().enumerate() {
            am.update(*v, i);
        }
        am.calc_avg();
        assert!((am.avg - 0.5).abs() < 1e-6);
        assert_eq!(am.max, 0.8);
        assert_eq!(am.max_idx, 1);
    }

    #[test]
    fn test_empty_pass() {
        let mut am = AvgMax::default();
        am.calc_avg();
        assert_eq!(am.avg, 0.0);
        assert_eq!(am.max, 0.0);
    }

    #[test]
    fn test_clip() {
        let r = Range::new(-2.0, 2.0);
        assert_eq!(r.clip(3.0), 2.0);
        assert_eq!(r.clip(-5.0), -2.0);
        assert_eq!(r.clip(0.3), 0.3);
    }
}
