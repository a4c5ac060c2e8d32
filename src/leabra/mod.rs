//! # Leabra base engine
//!
//! Rate-code point neurons, FFFB inhibition and XCAL learning, plus the
//! network that runs them on the cycle / quarter / trial schedule.
//!
//! ## Time scales
//!
//! | Scale | What happens |
//! |-------|--------------|
//! | Cycle | Ge propagation, modulation, inhibition, activation |
//! | Quarter | Phase snapshots (ActQ1, ActQ2, ActM, ActP) |
//! | Trial | Averages, input scaling, then DWt / WtFromDWt |
//!
//! ## Example
//!
//! ```ignore
//! use leabra_neuromod::{Layer, LayerType, Network, NetworkConfig, PathType, PathwayRole, Pattern};
//!
//! let mut net = Network::new("Net", NetworkConfig::default());
//! net.add_layer(Layer::new("Input", &[5, 5], LayerType::Input))?;
//! net.add_layer(Layer::new("Hidden", &[10, 10], LayerType::Hidden))?;
//! net.connect_layers("Input", "Hidden", PathType::Forward, Pattern::Full, PathwayRole::Standard)?;
//! net.build()?;
//! net.init_weights();
//!
//! let mut time = net.new_time();
//! net.apply_ext("Input", &pattern)?;
//! net.alpha_cycle(&mut time, true)?;
//! ```

// Numeric building blocks
mod chans;
mod minmax;
mod nxx1;
mod rnd;
pub use chans::Chans;
pub use minmax::{AvgMax, Range};
pub use nxx1::Nxx1Params;
pub use rnd::{RndDist, RndParams};

// Inhibition
mod fffb;
mod inhib;
pub use fffb::{FffbParams, Inhib};
pub use inhib::{ActAvgParams, InhibParams, InterInhibParams, SelfInhibParams};

// Activation
mod act;
mod knadapt;
pub use act::{
    ActInitParams, ActNoiseParams, ActParams, ClampParams, DtParams, NoiseType, OptThreshParams,
};
pub use knadapt::{KnaChan, KnaParams};

// Learning
mod learn;
pub use learn::{
    sig_fun, sig_fun61, sig_inv_fun, sig_inv_fun61, AvgLParams, CosDiffParams, CosDiffStats,
    DwtNormParams, LearnNeurParams, LearnSynParams, LrnActAvgParams, MomentumParams, WtBalParams,
    WtBalRecv, WtInitParams, WtScaleParams, WtSigParams, XcalParams,
};

// Units and synapses
mod neuron;
mod pool;
mod synapse;
pub use neuron::{flags, Neuron, NeuronVar};
pub use pool::{Pool, PoolActAvg};
pub use synapse::{SynVar, Synapse, TraceSyn};

// Layers, pathways, network
mod kind;
mod layer;
mod network;
mod pathway;
mod time;
pub use kind::LayerKind;
pub use layer::{ActInputs, Layer, LayerType};
pub use network::Network;
pub use pathway::{
    connect_pattern, norm_max, xcal_dwt, Conns, PathType, Pathway, PathwayRole, Pattern,
};
pub use time::Time;
