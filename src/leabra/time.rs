//! Simulation time
//!
//! | Scale | Length |
//! |-------|--------|
//! | Cycle | 1 ms |
//! | Quarter | `cyc_per_qtr` cycles (25) |
//! | Alpha cycle / trial | 4 quarters |
//!
//! Quarters 0..2 are the minus phase, quarter 3 the plus phase.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Time {
    /// Accumulated time in seconds
    pub time: f32,
    /// Cycle within the current alpha cycle
    pub cycle: usize,
    /// Total cycles since init
    pub cycle_tot: usize,
    /// Current quarter, 0..3
    pub quarter: usize,
    pub plus_phase: bool,
    pub time_per_cyc: f32,
    pub cyc_per_qtr: usize,
}

impl Default for Time {
    fn default() -> Self {
        Self::new(25, 0.001)
    }
}

impl Time {
    pub fn new(cyc_per_qtr: usize, time_per_cyc: f32) -> Self {
        Self {
            time: 0.0,
            cycle: 0,
            cycle_tot: 0,
            quarter: 0,
            plus_phase: false,
            time_per_cyc,
            cyc_per_qtr,
        }
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
        self.cycle = 0;
        self.cycle_tot = 0;
        self.quarter = 0;
        self.plus_phase = false;
    }

    pub fn alpha_cyc_start(&mut self) {
        self.cycle = 0;
        self.quarter = 0;
        self.plus_phase = false;
    }

    pub fn cycle_inc(&mut self) {
        self.cycle += 1;
        self.cycle_tot += 1;
        self.time += self.time_per_cyc;
    }

    /// Advance to the next quarter; quarter 3 is the plus phase
    pub fn quarter_inc(&mut self) {
        self.quarter += 1;
        self.plus_phase = self.quarter == 3;
    }

    /// Cycles per alpha cycle
    pub fn cyc_per_alpha(&self) -> usize {
        self.cyc_per_qtr * 4
    }
}
