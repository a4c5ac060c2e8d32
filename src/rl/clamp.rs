//! Externally clamped neuromodulator sources
//!
//! The layer's unit 0 activity is taken as the modulator value each
//! cycle and broadcast to the send list.

use super::send::SendList;
use serde::{Deserialize, Serialize};

/// DA source clamped from outside; clamp range is [-1, 1]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClampDaParams {
    pub send_da: SendList,
}

/// ACh source clamped from outside
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClampAchParams {
    pub send_ach: SendList,
}
