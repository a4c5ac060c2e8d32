//! # leabra-neuromod
//!
//! Leabra rate-code neural simulation with neuromodulation: dopamine,
//! acetylcholine and pooled-activity modulation routed between
//! specialized layers on a fixed per-cycle schedule.
//!
//! ## Core Components
//!
//! - **leabra**: neurons, FFFB inhibition, XCAL learning, layers, pathways and the `Network` cycle loop
//! - **neuromod**: modulator state (`ModState`) and the capability traits the cycle loop dispatches on
//! - **rl**: Rescorla-Wagner and TD reward prediction, clamped DA / ACh sources
//! - **pvlv**: amygdala, striatal MSN, VTA, LHbRMTg, PV and PPTg layers
//! - **bgate**: BG matrix, pallidum, STN, thalamic relay and cholinergic interneurons
//!
//! ## Design Principles
//!
//! - **Closed layer set**: one `LayerKind` enum, no trait objects for layers
//! - **Explicit phases**: every cycle runs the same ordered phase list
//! - **Names resolved once**: layer references are checked when the network is built
//! - **Halt on NaN**: numeric degeneracy stops the run with an error
//!
//! ## Example
//!
//! ```ignore
//! use leabra_neuromod::*;
//!
//! let mut net = Network::new("RW", NetworkConfig::default());
//! net.add_layer(Layer::new("Input", &[1, 1], LayerType::Input))?;
//! net.add_layer(Layer::new("Rew", &[1, 1], LayerType::Input))?;
//! net.add_layer(Layer::with_kind("RWPred", &[1, 1], LayerType::Hidden,
//!     LayerKind::RwPred(RwPredParams::default())))?;
//! let da = RwDaParams { send_da: SendList::new(&["RWPred"]), ..Default::default() };
//! net.add_layer(Layer::with_kind("RWDa", &[1, 1], LayerType::Hidden, LayerKind::RwDa(da)))?;
//! net.connect_layers("Input", "RWPred", PathType::Forward, Pattern::Full,
//!     PathwayRole::Rw(RwPathParams::default()))?;
//! net.build()?;
//! net.init_weights();
//! ```

// Error types
mod error;
pub use error::{LeabraError, Result};

// Run configuration and parameter bundles
pub mod config;
pub use config::{LayerParams, NetworkConfig, ParamBundle, PathParams, TotalActPolicy};

// Base engine
pub mod leabra;
pub use leabra::{
    ActInputs, ActParams, InhibParams, Layer, LayerKind, LayerType, LearnNeurParams,
    LearnSynParams, Neuron, NeuronVar, PathType, Pathway, PathwayRole, Pattern, Network, Range,
    SynVar, Synapse, Time, TraceSyn, WtInitParams, WtScaleParams,
};

// Modulator state and capability traits
pub mod neuromod;
pub use neuromod::{
    AcetylcholineSource, ActivationUpdatable, DaModParams, DaRType, DopamineSource, ModParams,
    ModState, ModulationReceiver, ModulationSender, ModulatorSink, Modulators,
};

// Reinforcement learning layers
pub mod rl;
pub use rl::{
    ClampAchParams, ClampDaParams, RwDaParams, RwPathParams, RwPredParams, SendList, TdDaParams,
    TdRewIntegParams,
};

// PVLV layers
pub mod pvlv;
pub use pvlv::{
    AmygModParams, BlaParams, CelParams, DaLrnRule, LhbState, MsnPathParams, MsnState,
    PptgState, PvParams, StriatalCompartment, Valence, VtaState,
};

// Basal ganglia gating layers
pub mod bgate;
pub use bgate::{CinParams, GpState, GpiTraceParams, MatrixState, MatrixTraceParams, StnState};
