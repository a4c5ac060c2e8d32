//! Layers: neurons, pools and the per-phase update steps
//!
//! The base steps follow the Leabra cycle. Specialized behavior is
//! selected by `LayerKind` at the few points where variants differ
//! (activation, inhibition extras, modulation gating, cycle post and
//! quarter final), always on disjoint borrows of the layer's fields.

use super::act::ActParams;
use super::inhib::InhibParams;
use super::kind::LayerKind;
use super::learn::{CosDiffStats, LearnNeurParams};
use super::neuron::{flags, Neuron, NeuronVar};
use super::pathway::Pathway;
use super::pool::Pool;
use super::time::Time;
use crate::bgate;
use crate::config::TotalActPolicy;
use crate::error::{LeabraError, Result};
use crate::neuromod::{
    AcetylcholineSource, ActivationUpdatable, DopamineSource, ModNeuronVar, ModRcvr, ModState,
    ModulationReceiver, ModulationSender, ModulatorSink, Modulators,
};
use crate::pvlv::{LhbInputs, VtaInputs};
use crate::rl;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Role of a layer in the input / output sense
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerType {
    /// Hard clamped from Ext
    Input,
    #[default]
    Hidden,
    /// Clamped to Targ in the plus phase
    Target,
    /// Targ recorded for comparison only
    Compare,
}

/// Other layers' values a variant needs to compute its activation
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ActInputs {
    #[default]
    None,
    RwDa {
        has_rew: bool,
        rew_act: f32,
        pred_act: f32,
    },
    TdInteg {
        rp_act_p: f32,
        rp_act: f32,
    },
    TdDa {
        ri_act: f32,
        ri_act_m: f32,
    },
    Vta(VtaInputs),
    Lhb(LhbInputs),
    Cin {
        rew_act: f32,
    },
}

/// A named group of neurons with shared inhibition and parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub typ: LayerType,
    /// 2D [y, x] or 4D [pool y, pool x, unit y, unit x]
    pub shape: Vec<usize>,
    pub index: usize,
    pub off: bool,
    pub act: ActParams,
    pub inhib: InhibParams,
    pub learn: LearnNeurParams,
    /// Layer-level DA / ACh / SE for layers that hold them
    pub modulators: Modulators,
    pub mods: Option<ModState>,
    pub kind: LayerKind,
    #[serde(skip)]
    pub neurons: Vec<Neuron>,
    #[serde(skip)]
    pub pools: Vec<Pool>,
    #[serde(skip)]
    pub cos_diff: CosDiffStats,
    #[serde(skip)]
    pub rcv_paths: Vec<usize>,
    #[serde(skip)]
    pub snd_paths: Vec<usize>,
    /// Resolved InterInhib source layers
    #[serde(skip)]
    pub inter_idx: Vec<usize>,
}

impl Layer {
    pub fn new(name: &str, shape: &[usize], typ: LayerType) -> Self {
        Self {
            name: name.to_string(),
            typ,
            shape: shape.to_vec(),
            index: 0,
            off: false,
            act: ActParams::default(),
            inhib: InhibParams::default(),
            learn: LearnNeurParams::default(),
            modulators: Modulators::default(),
            mods: None,
            kind: LayerKind::Standard,
            neurons: Vec::new(),
            pools: Vec::new(),
            cos_diff: CosDiffStats::default(),
            rcv_paths: Vec::new(),
            snd_paths: Vec::new(),
            inter_idx: Vec::new(),
        }
    }

    /// New layer of a specialized kind with that kind's defaults applied
    pub fn with_kind(name: &str, shape: &[usize], typ: LayerType, kind: LayerKind) -> Self {
        let mut ly = Self::new(name, shape, typ);
        if kind.has_mods() {
            ly.mods = Some(ModState::default());
        }
        kind.apply_defaults(&mut ly);
        ly.kind = kind;
        ly.act.update();
        ly
    }

    pub fn is_input(&self) -> bool {
        self.typ == LayerType::Input
    }

    pub fn is_target(&self) -> bool {
        self.typ == LayerType::Target
    }

    pub fn n_neurons(&self) -> usize {
        self.neurons.len()
    }

    /// Allocate neurons, pools and variant state
    pub fn build(&mut self) -> Result<()> {
        let nu: usize = self.shape.iter().product();
        if nu == 0 || self.shape.is_empty() {
            return Err(LeabraError::Build(format!(
                "layer {}: no units in shape {:?}",
                self.name, self.shape
            )));
        }
        self.neurons = vec![Neuron::default(); nu];
        self.pools = vec![Pool::new(0, nu)];
        if self.shape.len() == 4 {
            let npools = self.shape[0] * self.shape[1];
            let per = self.shape[2] * self.shape[3];
            for pi in 0..npools {
                let st = pi * per;
                self.pools.push(Pool::new(st, st + per));
                for nrn in &mut self.neurons[st..st + per] {
                    nrn.sub_pool = pi + 1;
                }
            }
        }
        let np = self.pools.len();
        if let Some(ms) = &mut self.mods {
            ms.build(nu, np);
        }
        self.kind.build(nu);
        self.act.update();
        Ok(())
    }

    /// Reset activity state
    pub fn init_acts(&mut self) {
        for nrn in &mut self.neurons {
            self.act.init_acts(nrn);
        }
        for pl in &mut self.pools {
            pl.init();
        }
        self.modulators.init();
        if let Some(ms) = &mut self.mods {
            ms.init_acts();
        }
        self.kind.init_acts(&self.act);
    }

    /// Reset long-running averages to their initial values
    pub fn init_act_avg(&mut self) {
        for nrn in &mut self.neurons {
            self.learn.init_act_avg(nrn);
        }
    }

    /// Layer part of weight init: averages, activity and CosDiff
    pub fn init_wts_state(&mut self) {
        self.act.update();
        let aa = &self.inhib.act_avg;
        for pl in &mut self.pools {
            pl.act_avg.act_m_avg = aa.init;
            pl.act_avg.act_p_avg = aa.init;
            pl.act_avg.act_p_avg_eff = aa.eff_init();
        }
        self.init_act_avg();
        self.init_acts();
        self.cos_diff.init();
    }

    /// Clear modulation values while leaving layer-level DA / ACh alone
    pub fn clear_mod_acts(&mut self) {
        if let Some(ms) = &mut self.mods {
            ms.clear_mod_acts();
        }
    }

    /// Clear external input and its flags
    pub fn init_ext(&mut self) {
        for nrn in &mut self.neurons {
            nrn.ext = 0.0;
            nrn.targ = 0.0;
            nrn.clear_flag(flags::HAS_EXT | flags::HAS_TARG | flags::HAS_CMPR);
        }
    }

    /// Apply external values in neuron order, routed by layer type
    pub fn apply_ext(&mut self, vals: &[f32]) -> Result<()> {
        if vals.len() != self.neurons.len() {
            return Err(LeabraError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: vec![vals.len()],
            });
        }
        self.init_ext();
        let typ = self.typ;
        for (nrn, &v) in self.neurons.iter_mut().zip(vals) {
            if nrn.is_off() {
                continue;
            }
            match typ {
                LayerType::Target => {
                    nrn.targ = v;
                    nrn.set_flag(flags::HAS_TARG);
                }
                LayerType::Compare => {
                    nrn.targ = v;
                    nrn.set_flag(flags::HAS_CMPR);
                }
                _ => {
                    nrn.ext = v;
                    nrn.set_flag(flags::HAS_EXT);
                }
            }
        }
        Ok(())
    }

    pub fn gen_noise<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for nrn in &mut self.neurons {
            nrn.noise = self.act.noise.rnd.gen(rng);
        }
    }

    /// First half of alpha-cycle init: long averages, pool averages, ActQ0
    pub fn alpha_cyc_init_avgs(&mut self) {
        if let LayerKind::Msn(ms) = &mut self.kind {
            ms.save_prv_trl(&self.neurons);
        }
        let mod_l = self.cos_diff.mod_avg_l_lrn;
        let err_mod = self.learn.avg_l.err_mod;
        for nrn in &mut self.neurons {
            if nrn.is_off() {
                continue;
            }
            self.learn.avg_l.avg_l_from_avg_m(nrn);
            if err_mod {
                nrn.avg_l_lrn *= mod_l;
            }
        }
        let aa = &self.inhib.act_avg;
        for pl in &mut self.pools {
            aa.avg_from_act(&mut pl.act_avg.act_m_avg, pl.act_m.avg);
            aa.avg_from_act(&mut pl.act_avg.act_p_avg, pl.act_p.avg);
            aa.eff_from_avg(&mut pl.act_avg.act_p_avg_eff, pl.act_avg.act_p_avg);
        }
        for nrn in &mut self.neurons {
            nrn.act_q0 = nrn.act_p;
        }
    }

    /// Second half of alpha-cycle init, after pathway scales are set
    pub fn alpha_cyc_init_state<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.act.noise.is_fixed_active() {
            self.gen_noise(rng);
        }
        self.decay_state(self.act.init.decay);
        for nrn in &mut self.neurons {
            self.act.init_g_inc(nrn);
        }
        if self.act.clamp.hard && self.is_input() {
            for nrn in &mut self.neurons {
                self.act.hard_clamp(nrn);
            }
        }
        match &mut self.kind {
            LayerKind::Gp(gs) | LayerKind::Gpi(gs) => gs.reset_min_act(&self.act),
            LayerKind::Stn(ss) => ss.alpha_cyc_init(&mut self.neurons),
            _ => {}
        }
    }

    pub fn decay_state(&mut self, decay: f32) {
        for nrn in &mut self.neurons {
            if nrn.is_off() {
                continue;
            }
            self.act.decay_state(nrn, decay);
        }
        for pl in &mut self.pools {
            pl.inhib.decay(decay);
        }
    }

    /// Delayed-inhibition snapshots taken at the start of each cycle
    pub fn quarter_init_prvs(&mut self, time: &Time) {
        if let LayerKind::Msn(ms) = &mut self.kind {
            ms.quarter_init_prvs(&self.neurons, time);
        }
    }

    /// Activation changes to send, as (neuron, delta); updates ActSent
    pub fn send_g_delta(&mut self) -> Vec<(usize, f32)> {
        let ot = &self.act.opt_thresh;
        let mut out = Vec::new();
        for (ni, nrn) in self.neurons.iter_mut().enumerate() {
            if nrn.is_off() {
                continue;
            }
            if nrn.act > ot.send {
                let delta = nrn.act - nrn.act_sent;
                if delta.abs() > ot.delta {
                    out.push((ni, delta));
                    nrn.act_sent = nrn.act;
                }
            } else if nrn.act_sent > ot.send {
                out.push((ni, -nrn.act_sent));
                nrn.act_sent = 0.0;
            }
        }
        out
    }

    /// Take pending increments from one receiving pathway
    pub fn recv_g_inc(&mut self, pj: &mut Pathway) {
        if pj.off {
            return;
        }
        pj.recv_g_inc(&mut self.neurons);
    }

    /// Integrate Ge and GiSyn from the raw conductances
    pub fn g_from_inc_neur(&mut self) {
        for nrn in &mut self.neurons {
            if nrn.is_off() {
                continue;
            }
            let (ge_raw, gi_raw) = (nrn.ge_raw, nrn.gi_raw);
            self.act.ge_from_raw(nrn, ge_raw);
            self.act.gi_from_raw(nrn, gi_raw);
        }
    }

    /// Per-pool Ge statistics
    pub fn avg_max_ge(&mut self) {
        for pl in &mut self.pools {
            pl.inhib.ge.init();
            for ni in pl.range() {
                let nrn = &self.neurons[ni];
                if nrn.is_off() {
                    continue;
                }
                pl.inhib.ge.update(nrn.ge, ni);
            }
            pl.inhib.ge.calc_avg();
        }
    }

    /// Pool-0 Gi before inter-layer additions, as seen by other layers
    pub fn pool_gi(&self) -> f32 {
        self.pools.first().map(|p| p.inhib.gi_orig).unwrap_or(0.0)
    }

    /// Layer FFFB, inter-layer inhibition, pool FFFB, then per-neuron Gi
    pub fn inhib_from_ge_act(&mut self, inter_gi: Option<f32>) {
        let Some((lpl, subs)) = self.pools.split_first_mut() else {
            return;
        };
        self.inhib.layer.inhib(&mut lpl.inhib);
        if let Some(ogi) = inter_gi {
            self.inhib.inter.apply(&mut lpl.inhib.gi, ogi);
        }
        let lay_on = self.inhib.layer.on;
        for pl in subs.iter_mut() {
            self.inhib.pool.inhib(&mut pl.inhib);
            if lay_on {
                pl.inhib.lay_gi = lpl.inhib.gi;
                pl.inhib.gi = pl.inhib.gi.max(lpl.inhib.gi);
            }
        }
        for nrn in &mut self.neurons {
            if nrn.is_off() {
                continue;
            }
            let pgi = self.pools[nrn.sub_pool].inhib.gi;
            self.inhib.self_inhib.inhib(&mut nrn.gi_self, nrn.act);
            nrn.gi = pgi + nrn.gi_self + nrn.gi_syn;
        }
        if let LayerKind::Msn(ms) = &self.kind {
            ms.add_delayed_inhib(&mut self.neurons);
        }
    }

    /// Variant hook run before broadcasts; DA / ACh sources take unit 0
    pub fn cycle_post(&mut self) {
        let act0 = self.neurons.first().map(|n| n.act).unwrap_or(0.0);
        match &self.kind {
            LayerKind::RwDa(_) | LayerKind::TdDa(_) | LayerKind::ClampDa(_) => {
                self.modulators.da = act0;
            }
            LayerKind::ClampAch(_) | LayerKind::Cin(_) => {
                self.modulators.ach = act0;
            }
            _ => {}
        }
    }

    /// PV values to write into receivers this cycle
    pub fn pv_out(&self, time: &Time) -> Option<(Vec<f32>, &[usize])> {
        match &self.kind {
            LayerKind::Pv(p) if time.quarter == p.send_pv_quarter => Some((
                self.neurons.iter().map(|n| n.act.max(n.ext)).collect(),
                &p.receivers.idxs,
            )),
            _ => None,
        }
    }

    /// Write PV values into this layer's ModNeurons
    pub fn receive_pv(&mut self, vals: &[f32]) {
        if let Some(ms) = &mut self.mods {
            for (mnr, &v) in ms.neurons.iter_mut().zip(vals) {
                mnr.pv_act = v;
            }
        }
    }

    /// Phase snapshots at the end of a quarter
    pub fn quarter_final(&mut self, time: &Time) {
        for pl in &mut self.pools {
            match time.quarter {
                2 => pl.act_m = pl.inhib.act,
                3 => pl.act_p = pl.inhib.act,
                _ => {}
            }
        }
        let avg_dt = self.act.dt.avg_dt();
        for nrn in &mut self.neurons {
            if nrn.is_off() {
                continue;
            }
            match time.quarter {
                0 => nrn.act_q1 = nrn.act,
                1 => nrn.act_q2 = nrn.act,
                2 => {
                    nrn.act_m = nrn.act;
                    if nrn.has_flag(flags::HAS_TARG) {
                        nrn.ext = nrn.targ;
                        nrn.set_flag(flags::HAS_EXT);
                    }
                }
                3 => {
                    nrn.act_p = nrn.act;
                    nrn.act_dif = nrn.act_p - nrn.act_m;
                    nrn.act_avg += avg_dt * (nrn.act - nrn.act_avg);
                }
                _ => {}
            }
        }
        if time.quarter == 3 {
            self.cos_diff_from_acts();
        }
        if let LayerKind::Pptg(ps) = &mut self.kind {
            ps.quarter_final(&self.neurons, time);
        }
    }

    /// Cosine similarity of minus and plus phase activity
    pub fn cos_diff_from_acts(&mut self) {
        let lpl = &self.pools[0];
        let avg_m = lpl.act_m.avg;
        let avg_p = lpl.act_p.avg;
        let (mut cosv, mut ssm, mut ssp) = (0.0f32, 0.0f32, 0.0f32);
        for nrn in &self.neurons {
            if nrn.is_off() {
                continue;
            }
            let ap = nrn.act_p - avg_p;
            let am = nrn.act_m - avg_m;
            cosv += ap * am;
            ssm += am * am;
            ssp += ap * ap;
        }
        let dist = (ssm * ssp).sqrt();
        if dist != 0.0 {
            cosv /= dist;
        }
        let cd = &mut self.cos_diff;
        cd.cos = cosv;
        self.learn
            .cos_diff
            .avg_var_from_cos(&mut cd.avg, &mut cd.var, cosv);
        if self.typ == LayerType::Target {
            cd.avg_lrn = 0.0;
            cd.mod_avg_l_lrn = 0.0;
        } else {
            cd.avg_lrn = 1.0 - cd.avg;
            cd.mod_avg_l_lrn = self.learn.avg_l.err_mod_from_lay_err(cd.avg_lrn);
        }
    }

    /// Summed activity of the layer under the configured policy
    pub fn total_act(&self, policy: TotalActPolicy) -> f32 {
        let Some(pl) = self.pools.first() else {
            return 0.0;
        };
        let a = &pl.inhib.act;
        match policy {
            TotalActPolicy::PoolAvgTimesN => a.avg * a.n as f32,
            TotalActPolicy::PoolMax => a.max,
            TotalActPolicy::PoolAvg => a.avg,
            TotalActPolicy::Sum => self
                .neurons
                .iter()
                .filter(|n| !n.is_off())
                .map(|n| n.act)
                .sum(),
        }
    }

    /// Variable names this layer's units expose, in index order
    pub fn unit_var_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = NeuronVar::ALL.iter().map(|v| v.name()).collect();
        if self.mods.is_some() {
            names.extend(ModNeuronVar::ALL.iter().map(|v| v.name()));
        }
        names.extend_from_slice(self.kind.unit_var_names());
        names
    }

    /// One unit variable by name
    pub fn unit_val(&self, var: &str, ni: usize) -> Result<f32> {
        if ni >= self.neurons.len() {
            return Err(LeabraError::IndexOutOfRange {
                index: ni,
                len: self.neurons.len(),
                scope: format!("layer {}", self.name),
            });
        }
        if let Some(v) = NeuronVar::from_name(var) {
            return Ok(self.neurons[ni].var(v));
        }
        if let (Some(ms), Some(v)) = (&self.mods, ModNeuronVar::from_name(var)) {
            return Ok(ms.neurons[ni].var(v));
        }
        if let Some(val) = self.kind.unit_val(var, ni, &self.modulators) {
            return Ok(val);
        }
        Err(LeabraError::UnknownVariable {
            name: var.to_string(),
            scope: format!("layer {}", self.name),
        })
    }

    /// A unit variable for every neuron
    pub fn unit_vals(&self, var: &str) -> Result<Vec<f32>> {
        (0..self.neurons.len())
            .map(|ni| self.unit_val(var, ni))
            .collect()
    }

    /// Layer-level scalar: DA, ACh, SE or a variant's internal state field
    pub fn layer_val(&self, var: &str) -> Result<f32> {
        match var {
            "DA" => Ok(self.da()),
            "ACh" => Ok(self.ach()),
            "SE" => Ok(self.modulators.se),
            _ => self
                .kind
                .layer_val(var)
                .ok_or_else(|| LeabraError::UnknownVariable {
                    name: var.to_string(),
                    scope: format!("layer {}", self.name),
                }),
        }
    }

    /// First NaN or Inf in Act, Ge, Vm or Gi, if any
    pub fn find_nan(&self) -> Option<String> {
        for (ni, nrn) in self.neurons.iter().enumerate() {
            if !nrn.act.is_finite() {
                return Some(format!("Act of unit {} is {}", ni, nrn.act));
            }
            if !nrn.ge.is_finite() {
                return Some(format!("Ge of unit {} is {}", ni, nrn.ge));
            }
            if !nrn.vm.is_finite() {
                return Some(format!("Vm of unit {} is {}", ni, nrn.vm));
            }
            if !nrn.gi.is_finite() {
                return Some(format!("Gi of unit {} is {}", ni, nrn.gi));
            }
        }
        self.kind.find_nan()
    }
}

/// Base rate-code activation
fn base_act_from_g(act: &ActParams, learn: &LearnNeurParams, neurons: &mut [Neuron]) {
    for nrn in neurons.iter_mut() {
        if nrn.is_off() {
            continue;
        }
        act.vm_from_g(nrn);
        act.act_from_g(nrn);
        learn.avgs_from_act(nrn);
    }
}

/// Activation gated and scaled by modulation state
fn mod_act_from_g(act: &ActParams, learn: &LearnNeurParams, ms: &mut ModState, neurons: &mut [Neuron]) {
    for (ni, nrn) in neurons.iter_mut().enumerate() {
        if nrn.is_off() {
            continue;
        }
        act.vm_from_g(nrn);
        act.act_from_g(nrn);
        ms.mod_act_from_act(ni, nrn);
        learn.avgs_from_act(nrn);
    }
}

impl ActivationUpdatable for Layer {
    fn act_from_g(&mut self, time: &Time, inputs: &ActInputs) {
        let Layer {
            kind,
            act,
            learn,
            neurons,
            modulators,
            mods,
            ..
        } = self;
        match kind {
            LayerKind::Standard
            | LayerKind::ClampDa(_)
            | LayerKind::ClampAch(_)
            | LayerKind::Pv(_)
            | LayerKind::VThal => base_act_from_g(act, learn, neurons),
            LayerKind::Mod | LayerKind::Bla(_) | LayerKind::Cel(_) => match mods {
                Some(ms) => mod_act_from_g(act, learn, ms, neurons),
                None => base_act_from_g(act, learn, neurons),
            },
            LayerKind::RwPred(p) => rl::rw_pred_act(p, neurons),
            LayerKind::RwDa(_) => rl::rw_da_act(inputs, neurons),
            LayerKind::TdRewPred => rl::td_rew_pred_act(time, neurons),
            LayerKind::TdRewInteg(p) => rl::td_rew_integ_act(p, time, inputs, neurons),
            LayerKind::TdDa(_) => rl::td_da_act(time, inputs, neurons),
            LayerKind::Msn(msn) => match mods {
                Some(ms) => msn.act_from_g(act, learn, ms, neurons),
                None => base_act_from_g(act, learn, neurons),
            },
            LayerKind::Vta(vs) => vs.act_from_g(time, inputs, act, neurons),
            LayerKind::LhbRmtg(ls) => ls.act_from_g(time, inputs, act, neurons),
            LayerKind::Pptg(ps) => ps.act_from_g(act, learn, neurons),
            LayerKind::Matrix(ms) => {
                ms.dalrn = ms.dalrn_from_da(modulators.da);
                base_act_from_g(act, learn, neurons);
            }
            LayerKind::Gp(gs) | LayerKind::Gpi(gs) => {
                base_act_from_g(act, learn, neurons);
                gs.track_min_act(time, neurons);
            }
            LayerKind::Stn(ss) => ss.act_from_g(act, learn, neurons),
            LayerKind::Cin(_) => bgate::cin_act(inputs, neurons),
        }
    }

    fn avg_max_act(&mut self) {
        for pl in &mut self.pools {
            pl.inhib.act.init();
            for ni in pl.range() {
                let nrn = &self.neurons[ni];
                if nrn.is_off() {
                    continue;
                }
                pl.inhib.act.update(nrn.act, ni);
            }
            pl.inhib.act.calc_avg();
        }
    }
}

impl ModulationSender for Layer {
    fn is_mod_sender(&self) -> bool {
        self.mods
            .as_ref()
            .map(|m| m.params.is_mod_sender)
            .unwrap_or(false)
    }

    fn send_mods(&mut self) {
        let thr = self.act.opt_thresh.send;
        if let Some(ms) = &mut self.mods {
            if ms.params.is_mod_sender {
                ms.send_mods(&self.neurons, thr);
            }
        }
    }

    fn mod_sent(&self) -> Vec<f32> {
        self.mods.as_ref().map(|m| m.mod_sent()).unwrap_or_default()
    }

    fn mod_receivers(&self) -> &[ModRcvr] {
        self.mods
            .as_ref()
            .map(|m| m.receivers.as_slice())
            .unwrap_or(&[])
    }
}

impl ModulationReceiver for Layer {
    fn is_mod_receiver(&self) -> bool {
        self.mods
            .as_ref()
            .map(|m| m.params.is_mod_receiver)
            .unwrap_or(false)
    }

    fn receive_mods(&mut self, sent: &[f32], scale: f32) {
        if let Some(ms) = &mut self.mods {
            ms.receive_mods(&self.neurons, sent, scale);
        }
    }

    fn mods_from_inc(&mut self, _time: &Time) {
        let Some(ms) = &mut self.mods else {
            return;
        };
        match &mut self.kind {
            LayerKind::Msn(msn) => {
                let lay = self.modulators;
                msn.mods_from_inc(ms, &lay, &self.neurons);
            }
            _ => ms.mods_from_inc(&self.neurons),
        }
    }

    fn avg_max_mod(&mut self) {
        if let Some(ms) = &mut self.mods {
            ms.avg_max_mod(&self.neurons, &self.pools);
        }
    }
}

impl DopamineSource for Layer {
    fn da_out(&self) -> Option<f32> {
        match &self.kind {
            LayerKind::RwDa(_) | LayerKind::TdDa(_) | LayerKind::ClampDa(_) => {
                Some(self.modulators.da)
            }
            LayerKind::Vta(vs) => Some(vs.send_val),
            _ => None,
        }
    }

    fn da_targets(&self) -> &[usize] {
        match &self.kind {
            LayerKind::RwDa(p) => &p.send_da.idxs,
            LayerKind::TdDa(p) => &p.send_da.idxs,
            LayerKind::ClampDa(p) => &p.send_da.idxs,
            LayerKind::Vta(vs) => &vs.send_da.idxs,
            _ => &[],
        }
    }
}

impl AcetylcholineSource for Layer {
    fn ach_out(&self) -> Option<f32> {
        match &self.kind {
            LayerKind::ClampAch(_) | LayerKind::Cin(_) => Some(self.modulators.ach),
            _ => None,
        }
    }

    fn ach_targets(&self) -> &[usize] {
        match &self.kind {
            LayerKind::ClampAch(p) => &p.send_ach.idxs,
            LayerKind::Cin(p) => &p.send_ach.idxs,
            _ => &[],
        }
    }
}

impl ModulatorSink for Layer {
    fn da(&self) -> f32 {
        self.modulators.da
    }

    fn set_da(&mut self, da: f32) -> bool {
        if !self.kind.accepts_da() {
            return false;
        }
        self.modulators.da = da;
        if let Some(ms) = &mut self.mods {
            ms.set_da(da);
        }
        true
    }

    fn ach(&self) -> f32 {
        self.modulators.ach
    }

    fn set_ach(&mut self, ach: f32) -> bool {
        if !self.kind.accepts_ach() {
            return false;
        }
        self.modulators.ach = ach;
        if let Some(ms) = &mut self.mods {
            ms.set_ach(ach);
        }
        true
    }
}
