//! Capability traits - the per-phase surface the network dispatches on
//!
//! ## ActivationUpdatable
//!
//! Every layer. `act_from_g` is the only place Act is written during a
//! cycle; variants that read other layers get those values pre-gathered
//! in `ActInputs`.
//!
//! ## ModulationSender / ModulationReceiver
//!
//! Layers carrying `ModState`. A sender publishes per-pool sums, the
//! network hands them to each registered receiver, and the receiver
//! gates itself in `mods_from_inc`.
//!
//! ## DopamineSource / AcetylcholineSource / ModulatorSink
//!
//! Broadcast of scalar DA / ACh. Sources name their targets at build
//! time; sinks report whether they accepted the value so that layers
//! without a DA or ACh slot are skipped without error.

use super::state::ModRcvr;
use crate::leabra::{ActInputs, Time};

/// Activation update for one layer, one cycle
pub trait ActivationUpdatable {
    /// Compute Vm and Act from the already integrated conductances
    fn act_from_g(&mut self, time: &Time, inputs: &ActInputs);

    /// Refresh per-pool Act statistics after `act_from_g`
    fn avg_max_act(&mut self);
}

/// Layer that sends pooled activation as modulation
pub trait ModulationSender {
    fn is_mod_sender(&self) -> bool;

    /// Sum above-threshold activation per pool
    fn send_mods(&mut self);

    /// Per-pool values produced by the last `send_mods`
    fn mod_sent(&self) -> Vec<f32>;

    /// Registered receivers with their scales
    fn mod_receivers(&self) -> &[ModRcvr];
}

/// Layer whose activation and learning are gated by incoming modulation
pub trait ModulationReceiver {
    fn is_mod_receiver(&self) -> bool;

    /// Copy a sender's pooled values into per-neuron ModNet
    fn receive_mods(&mut self, sent: &[f32], scale: f32);

    /// Derive ModLevel / ModLrn from ModNet
    fn mods_from_inc(&mut self, time: &Time);

    /// Per-pool ModNet statistics
    fn avg_max_mod(&mut self);
}

/// Layer that broadcasts a dopamine value each cycle
pub trait DopamineSource {
    /// DA to broadcast this cycle, if any
    fn da_out(&self) -> Option<f32>;

    /// Resolved layer indices receiving the broadcast
    fn da_targets(&self) -> &[usize];
}

/// Layer that broadcasts an acetylcholine value each cycle
pub trait AcetylcholineSource {
    fn ach_out(&self) -> Option<f32>;

    fn ach_targets(&self) -> &[usize];
}

/// Layer-level neuromodulator slots
///
/// Setters return false when the layer has no slot for that modulator.
pub trait ModulatorSink {
    fn da(&self) -> f32;
    fn set_da(&mut self, da: f32) -> bool;
    fn ach(&self) -> f32;
    fn set_ach(&mut self, ach: f32) -> bool;
}
