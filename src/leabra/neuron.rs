//! Neuron state
//!
//! Rate-coded point neuron: membrane potential, conductances,
//! activation, phase snapshots and the multi-timescale running averages
//! that drive learning.

use serde::{Deserialize, Serialize};

/// Neuron flag bits
pub mod flags {
    /// Lesioned or otherwise inactive
    pub const OFF: u8 = 1 << 0;
    /// External input present in Ext
    pub const HAS_EXT: u8 = 1 << 1;
    /// Target value present in Targ
    pub const HAS_TARG: u8 = 1 << 2;
    /// Comparison value present in Targ
    pub const HAS_CMPR: u8 = 1 << 3;
}

/// One rate-coded unit
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    pub flags: u8,
    /// Index of the sub-pool this neuron belongs to (0 if none)
    pub sub_pool: usize,

    /// Rate-code activation
    pub act: f32,
    /// Activation for learning, without KNa adaptation
    pub act_lrn: f32,
    /// Excitatory conductance
    pub ge: f32,
    /// Total inhibitory conductance
    pub gi: f32,
    /// Potassium conductance from KNa or afterhyperpolarization
    pub gk: f32,
    /// Net current
    pub inet: f32,
    /// Membrane potential
    pub vm: f32,

    pub targ: f32,
    pub ext: f32,

    pub avg_ss: f32,
    pub avg_s: f32,
    pub avg_m: f32,
    pub avg_l: f32,
    pub avg_l_lrn: f32,
    pub avg_s_lrn: f32,

    /// Previous-trial plus phase activation
    pub act_q0: f32,
    pub act_q1: f32,
    pub act_q2: f32,
    /// Minus phase activation
    pub act_m: f32,
    /// Plus phase activation
    pub act_p: f32,
    pub act_dif: f32,
    pub act_del: f32,
    /// Long running average activation
    pub act_avg: f32,

    pub noise: f32,
    /// Synaptic inhibition integrated from GiRaw
    pub gi_syn: f32,
    pub gi_self: f32,
    /// Last activation value sent to receivers
    pub act_sent: f32,
    pub ge_raw: f32,
    pub gi_raw: f32,
    pub ge_inc: f32,
    pub gi_inc: f32,
    pub gkna_fast: f32,
    pub gkna_med: f32,
    pub gkna_slow: f32,
    pub spike: f32,
    pub isi: f32,
    pub isi_avg: f32,
}

impl Neuron {
    #[inline]
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    pub fn set_flag(&mut self, flag: u8) {
        self.flags |= flag;
    }

    #[inline]
    pub fn clear_flag(&mut self, flag: u8) {
        self.flags &= !flag;
    }

    #[inline]
    pub fn is_off(&self) -> bool {
        self.has_flag(flags::OFF)
    }

    /// Value of a named variable
    pub fn var(&self, v: NeuronVar) -> f32 {
        use NeuronVar::*;
        match v {
            Act => self.act,
            ActLrn => self.act_lrn,
            Ge => self.ge,
            Gi => self.gi,
            Gk => self.gk,
            Inet => self.inet,
            Vm => self.vm,
            Targ => self.targ,
            Ext => self.ext,
            AvgSS => self.avg_ss,
            AvgS => self.avg_s,
            AvgM => self.avg_m,
            AvgL => self.avg_l,
            AvgLLrn => self.avg_l_lrn,
            AvgSLrn => self.avg_s_lrn,
            ActQ0 => self.act_q0,
            ActQ1 => self.act_q1,
            ActQ2 => self.act_q2,
            ActM => self.act_m,
            ActP => self.act_p,
            ActDif => self.act_dif,
            ActDel => self.act_del,
            ActAvg => self.act_avg,
            Noise => self.noise,
            GiSyn => self.gi_syn,
            GiSelf => self.gi_self,
            ActSent => self.act_sent,
            GeRaw => self.ge_raw,
            GiRaw => self.gi_raw,
            GknaFast => self.gkna_fast,
            GknaMed => self.gkna_med,
            GknaSlow => self.gkna_slow,
            Spike => self.spike,
            ISI => self.isi,
            ISIAvg => self.isi_avg,
        }
    }
}

/// Stable names of the base neuron variables
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronVar {
    Act,
    ActLrn,
    Ge,
    Gi,
    Gk,
    Inet,
    Vm,
    Targ,
    Ext,
    AvgSS,
    AvgS,
    AvgM,
    AvgL,
    AvgLLrn,
    AvgSLrn,
    ActQ0,
    ActQ1,
    ActQ2,
    ActM,
    ActP,
    ActDif,
    ActDel,
    ActAvg,
    Noise,
    GiSyn,
    GiSelf,
    ActSent,
    GeRaw,
    GiRaw,
    GknaFast,
    GknaMed,
    GknaSlow,
    Spike,
    ISI,
    ISIAvg,
}

impl NeuronVar {
    /// All variables in index order
    pub const ALL: [NeuronVar; 35] = [
        NeuronVar::Act,
        NeuronVar::ActLrn,
        NeuronVar::Ge,
        NeuronVar::Gi,
        NeuronVar::Gk,
        NeuronVar::Inet,
        NeuronVar::Vm,
        NeuronVar::Targ,
        NeuronVar::Ext,
        NeuronVar::AvgSS,
        NeuronVar::AvgS,
        NeuronVar::AvgM,
        NeuronVar::AvgL,
        NeuronVar::AvgLLrn,
        NeuronVar::AvgSLrn,
        NeuronVar::ActQ0,
        NeuronVar::ActQ1,
        NeuronVar::ActQ2,
        NeuronVar::ActM,
        NeuronVar::ActP,
        NeuronVar::ActDif,
        NeuronVar::ActDel,
        NeuronVar::ActAvg,
        NeuronVar::Noise,
        NeuronVar::GiSyn,
        NeuronVar::GiSelf,
        NeuronVar::ActSent,
        NeuronVar::GeRaw,
        NeuronVar::GiRaw,
        NeuronVar::GknaFast,
        NeuronVar::GknaMed,
        NeuronVar::GknaSlow,
        NeuronVar::Spike,
        NeuronVar::ISI,
        NeuronVar::ISIAvg,
    ];

    pub fn name(self) -> &'static str {
        use NeuronVar::*;
        match self {
            Act => "Act",
            ActLrn => "ActLrn",
            Ge => "Ge",
            Gi => "Gi",
            Gk => "Gk",
            Inet => "Inet",
            Vm => "Vm",
            Targ => "Targ",
            Ext => "Ext",
            AvgSS => "AvgSS",
            AvgS => "AvgS",
            AvgM => "AvgM",
            AvgL => "AvgL",
            AvgLLrn => "AvgLLrn",
            AvgSLrn => "AvgSLrn",
            ActQ0 => "ActQ0",
            ActQ1 => "ActQ1",
            ActQ2 => "ActQ2",
            ActM => "ActM",
            ActP => "ActP",
            ActDif => "ActDif",
            ActDel => "ActDel",
            ActAvg => "ActAvg",
            Noise => "Noise",
            GiSyn => "GiSyn",
            GiSelf => "GiSelf",
            ActSent => "ActSent",
            GeRaw => "GeRaw",
            GiRaw => "GiRaw",
            GknaFast => "GknaFast",
            GknaMed => "GknaMed",
            GknaSlow => "GknaSlow",
            Spike => "Spike",
            ISI => "ISI",
            ISIAvg => "ISIAvg",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.name() == name)
    }

    /// Stable index of this variable
    pub fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for (i, v) in NeuronVar::ALL.iter().enumerate() {
            assert_eq!(v.index(), i);
            assert_eq!(NeuronVar::from_name(v.name()), Some(*v));
        }
        assert_eq!(NeuronVar::from_name("Bogus"), None);
    }

    #[test]
    fn test_flags() {
        let mut n = Neuron::default();
        n.set_flag(flags::HAS_EXT);
        assert!(n.has_flag(flags::HAS_EXT));
        assert!(!n.is_off());
        n.clear_flag(flags::HAS_EXT);
        assert_eq!(n.flags, 0);
    }
}
