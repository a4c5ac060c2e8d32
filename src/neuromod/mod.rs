//! # Neuromodulation
//!
//! Modulator state and the capability traits that specialized layers
//! expose to the network's cycle loop.
//!
//! ## Signals
//!
//! | Signal | Carried by | Effect |
//! |--------|-----------|--------|
//! | ModNet | sender pool sums, scaled per receiver | gates Act via ModLevel, scales learning via ModLrn |
//! | DA | scalar broadcast from DA sources | learning sign / magnitude, some Ge gain |
//! | ACh | scalar broadcast from ACh sources | trace decay in striatal pathways |
//! | PVAct | direct copy from PV layers | overrides ModAct for learning |
//!
//! ## Timing
//!
//! Broadcasts happen in `CyclePost`, so receivers see a value one cycle
//! after it was computed.

// Per-layer and per-neuron modulator state
mod state;
pub use state::{
    guarded_ratio, DaModParams, DaRType, ModNeuron, ModNeuronVar, ModParams, ModPool, ModRcvr,
    ModState, Modulators,
};

// Capability traits
mod traits;
pub use traits::{
    AcetylcholineSource, ActivationUpdatable, DopamineSource, ModulationReceiver,
    ModulationSender, ModulatorSink,
};
