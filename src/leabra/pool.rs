//! Inhibition pools
//!
//! Pool 0 always spans the whole layer. With a 4D layer shape each
//! outer (y, x) group of units gets its own sub-pool starting at 1.

use super::fffb::Inhib;
use super::minmax::AvgMax;
use serde::{Deserialize, Serialize};

/// Pool-level running averages of minus / plus phase activity
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolActAvg {
    pub act_m_avg: f32,
    pub act_p_avg: f32,
    /// ActPAvg scaled by Adjust, used for pathway scaling
    pub act_p_avg_eff: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    /// Start neuron index (inclusive)
    pub st_idx: usize,
    /// End neuron index (exclusive)
    pub ed_idx: usize,
    pub inhib: Inhib,
    /// Minus phase Act statistics
    pub act_m: AvgMax,
    /// Plus phase Act statistics
    pub act_p: AvgMax,
    pub act_avg: PoolActAvg,
}

impl Pool {
    pub fn new(st_idx: usize, ed_idx: usize) -> Self {
        Self {
            st_idx,
            ed_idx,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.ed_idx - self.st_idx
    }

    pub fn is_empty(&self) -> bool {
        self.ed_idx == self.st_idx
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.st_idx..self.ed_idx
    }

    pub fn init(&mut self) {
        self.inhib.init();
        self.act_m.init();
        self.act_p.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_range() {
        let p = Pool::new(4, 8);
        assert_eq!(p.len(), 4);
        assert_eq!(p.range().collect::<Vec<_>>(), vec![4, 5, 6, 7]);
        assert!(!p.is_empty());
    }
}
