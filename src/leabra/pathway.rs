//! Pathways: typed bundles of synapses between two layers
//!
//! Synapses are stored in sender order. `Conns` carries both the
//! sender-side view (`send_st`/`send_n`/`send_idx` giving receiver
//! indices) and the receiver-side view (`recv_st`/`recv_n` with the
//! sender index and synapse index of each incoming connection).
//!
//! The learning rule is picked by `PathwayRole`, set once when the
//! pathway is connected.

use super::layer::Layer;
use super::learn::{LearnSynParams, WtBalRecv, WtInitParams, WtScaleParams};
use super::neuron::Neuron;
use super::pool::Pool;
use super::synapse::{SynVar, Synapse, TraceSyn};
use crate::bgate::{self, GpiTraceParams, MatrixTraceParams};
use crate::error::{LeabraError, Result};
use crate::pvlv::{self, AmygModParams, MsnPathParams};
use crate::rl::{self, RwPathParams};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Functional direction of a pathway
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathType {
    #[default]
    Forward,
    Back,
    Lateral,
    /// Feeds GiRaw instead of GeRaw
    Inhib,
}

/// Connectivity pattern
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    #[default]
    Full,
    /// Unit i to unit i
    OneToOne,
    /// Sub-pool i fully to sub-pool i
    PoolOneToOne,
}

/// Learning rule and default policy of a pathway
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum PathwayRole {
    /// XCAL
    #[default]
    Standard,
    /// Rescorla-Wagner delta rule onto a reward predictor
    Rw(RwPathParams),
    /// TD delta rule using the previous trial's sender activity
    TdRewPred,
    /// DA-modulated Hebbian into amygdala layers
    AmygMod(AmygModParams),
    /// Trace or DA-Hebbian into striatal MSN layers
    Msn(MsnPathParams),
    /// ACh-decayed trace into BG matrix layers
    MatrixTrace(MatrixTraceParams),
    /// DA-Hebbian into GPe layers
    GpeIn,
    /// Gate-relative trace into GPi
    GpiTrace(GpiTraceParams),
}

impl PathwayRole {
    pub fn name(&self) -> &'static str {
        match self {
            PathwayRole::Standard => "Standard",
            PathwayRole::Rw(_) => "Rw",
            PathwayRole::TdRewPred => "TdRewPred",
            PathwayRole::AmygMod(_) => "AmygMod",
            PathwayRole::Msn(_) => "Msn",
            PathwayRole::MatrixTrace(_) => "MatrixTrace",
            PathwayRole::GpeIn => "GpeIn",
            PathwayRole::GpiTrace(_) => "GpiTrace",
        }
    }

    /// Roles that keep per-synapse trace state
    pub fn has_trace(&self) -> bool {
        matches!(
            self,
            PathwayRole::Msn(_) | PathwayRole::MatrixTrace(_) | PathwayRole::GpiTrace(_)
        )
    }

    /// Weight update is a straight add with no bounds
    pub fn straight_wt_update(&self) -> bool {
        matches!(self, PathwayRole::Rw(_) | PathwayRole::TdRewPred)
    }

    /// Learning and init defaults implied by the role
    fn defaults(&self, learn: &mut LearnSynParams, wt_init: &mut WtInitParams) {
        match self {
            PathwayRole::Standard | PathwayRole::AmygMod(_) => {}
            PathwayRole::Rw(_)
            | PathwayRole::TdRewPred
            | PathwayRole::Msn(_)
            | PathwayRole::MatrixTrace(_) => {
                *learn = LearnSynParams::plain();
            }
            PathwayRole::GpeIn => {
                *learn = LearnSynParams::plain();
                learn.lrate = 0.01;
                learn.lrate_init = 0.01;
                *wt_init = WtInitParams::fixed(0.9);
            }
            PathwayRole::GpiTrace(_) => {
                *learn = LearnSynParams::plain();
                learn.lrate = 0.01;
                learn.lrate_init = 0.01;
            }
        }
    }
}

/// Index tables for both directions of a pathway
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conns {
    /// Synapses per sender
    pub send_n: Vec<usize>,
    /// First synapse of each sender
    pub send_st: Vec<usize>,
    /// Receiver index of each synapse
    pub send_idx: Vec<usize>,
    /// Connections per receiver
    pub recv_n: Vec<usize>,
    pub recv_st: Vec<usize>,
    /// Sender index of each receiver-side connection
    pub recv_idx: Vec<usize>,
    /// Synapse index of each receiver-side connection
    pub recv_syn: Vec<usize>,
    /// Average receiver fan-in
    pub recv_n_avg: f32,
}

impl Conns {
    /// Build tables from (sender, receiver) pairs
    pub fn from_pairs(mut pairs: Vec<(usize, usize)>, n_send: usize, n_recv: usize) -> Self {
        pairs.sort_unstable();
        pairs.dedup();
        let mut c = Conns {
            send_n: vec![0; n_send],
            send_st: vec![0; n_send],
            send_idx: Vec::with_capacity(pairs.len()),
            recv_n: vec![0; n_recv],
            recv_st: vec![0; n_recv],
            recv_idx: vec![0; pairs.len()],
            recv_syn: vec![0; pairs.len()],
            recv_n_avg: 0.0,
        };
        for &(si, ri) in &pairs {
            c.send_n[si] += 1;
            c.recv_n[ri] += 1;
            c.send_idx.push(ri);
        }
        let mut st = 0;
        for si in 0..n_send {
            c.send_st[si] = st;
            st += c.send_n[si];
        }
        st = 0;
        for ri in 0..n_recv {
            c.recv_st[ri] = st;
            st += c.recv_n[ri];
        }
        let mut fill = vec![0usize; n_recv];
        for (syn, &(si, ri)) in pairs.iter().enumerate() {
            let k = c.recv_st[ri] + fill[ri];
            fill[ri] += 1;
            c.recv_idx[k] = si;
            c.recv_syn[k] = syn;
        }
        let with_conns = c.recv_n.iter().filter(|&&n| n > 0).count();
        if with_conns > 0 {
            c.recv_n_avg = pairs.len() as f32 / with_conns as f32;
        }
        c
    }

    #[inline]
    pub fn send_range(&self, si: usize) -> std::ops::Range<usize> {
        self.send_st[si]..self.send_st[si] + self.send_n[si]
    }

    #[inline]
    pub fn recv_range(&self, ri: usize) -> std::ops::Range<usize> {
        self.recv_st[ri]..self.recv_st[ri] + self.recv_n[ri]
    }

    pub fn n_syns(&self) -> usize {
        self.send_idx.len()
    }

    /// Synapse index for sender si to receiver ri
    pub fn syn_index(&self, si: usize, ri: usize) -> Option<usize> {
        if si >= self.send_n.len() {
            return None;
        }
        self.send_range(si).find(|&k| self.send_idx[k] == ri)
    }
}

/// Unit index groups for pool-wise patterns: the sub-pools if any, else the whole layer
fn pool_groups(pools: &[Pool]) -> Vec<std::ops::Range<usize>> {
    if pools.len() > 1 {
        pools[1..].iter().map(|p| p.range()).collect()
    } else {
        pools.iter().map(|p| p.range()).collect()
    }
}

/// (sender, receiver) pairs for a pattern
pub fn connect_pattern(
    pattern: Pattern,
    n_send: usize,
    send_pools: &[Pool],
    n_recv: usize,
    recv_pools: &[Pool],
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    match pattern {
        Pattern::Full => {
            for si in 0..n_send {
                for ri in 0..n_recv {
                    pairs.push((si, ri));
                }
            }
        }
        Pattern::OneToOne => {
            for i in 0..n_send.min(n_recv) {
                pairs.push((i, i));
            }
        }
        Pattern::PoolOneToOne => {
            let sg = pool_groups(send_pools);
            let rg = pool_groups(recv_pools);
            for (sr, rr) in sg.iter().zip(rg.iter()) {
                for si in sr.clone() {
                    for ri in rr.clone() {
                        pairs.push((si, ri));
                    }
                }
            }
        }
    }
    pairs
}

/// A directed bundle of synapses from `send` to `recv`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pathway {
    pub name: String,
    /// Sending layer index
    pub send: usize,
    /// Receiving layer index
    pub recv: usize,
    pub typ: PathType,
    pub pattern: Pattern,
    pub off: bool,
    pub wt_init: WtInitParams,
    pub wt_scale: WtScaleParams,
    pub learn: LearnSynParams,
    pub role: PathwayRole,
    /// Effective input scale, recomputed every alpha cycle
    #[serde(skip)]
    pub gscale: f32,
    #[serde(skip)]
    pub syns: Vec<Synapse>,
    /// Parallel to `syns` for roles that keep a trace
    #[serde(skip)]
    pub trace: Vec<TraceSyn>,
    #[serde(skip)]
    pub conns: Conns,
    /// Per-receiver weight balance factors
    #[serde(skip)]
    pub wb_recv: Vec<WtBalRecv>,
    /// Per-receiver conductance increments pending integration
    #[serde(skip)]
    pub g_inc: Vec<f32>,
}

impl Pathway {
    pub fn new(
        name: String,
        send: usize,
        recv: usize,
        typ: PathType,
        pattern: Pattern,
        role: PathwayRole,
    ) -> Self {
        let mut learn = LearnSynParams::default();
        let mut wt_init = WtInitParams::default();
        role.defaults(&mut learn, &mut wt_init);
        Self {
            name,
            send,
            recv,
            typ,
            pattern,
            off: false,
            wt_init,
            wt_scale: WtScaleParams::default(),
            learn,
            role,
            gscale: 1.0,
            syns: Vec::new(),
            trace: Vec::new(),
            conns: Conns::default(),
            wb_recv: Vec::new(),
            g_inc: Vec::new(),
        }
    }

    /// Allocate synapses for the two layers' current shapes
    pub fn build(&mut self, send: &Layer, recv: &Layer) {
        let pairs = connect_pattern(
            self.pattern,
            send.neurons.len(),
            &send.pools,
            recv.neurons.len(),
            &recv.pools,
        );
        if pairs.is_empty() {
            log::warn!("Pathway {} has no synapses", self.name);
        }
        self.conns = Conns::from_pairs(pairs, send.neurons.len(), recv.neurons.len());
        let n = self.conns.n_syns();
        self.syns = vec![Synapse::default(); n];
        self.trace = if self.role.has_trace() {
            vec![TraceSyn::default(); n]
        } else {
            Vec::new()
        };
        self.wb_recv = vec![WtBalRecv::default(); recv.neurons.len()];
        self.g_inc = vec![0.0; recv.neurons.len()];
    }

    /// Initialize weights from `wt_init`, clearing learning and trace state
    pub fn init_wts<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match &self.role {
            PathwayRole::AmygMod(p) if p.set_scale => {
                pvlv::set_scale_wts(p, &self.wt_init, &self.learn, &mut self.syns, rng);
            }
            _ => {
                for sy in &mut self.syns {
                    if sy.scale == 0.0 {
                        sy.scale = 1.0;
                    }
                    let wt = self.wt_init.rnd.gen(rng).clamp(0.0, 1.0);
                    sy.lwt = self.learn.wt_sig.lin_from_sig_wt(wt);
                    sy.wt = wt * sy.scale;
                    sy.dwt = 0.0;
                    sy.norm = 0.0;
                    sy.moment = 0.0;
                }
            }
        }
        self.clear_trace();
        for wb in &mut self.wb_recv {
            *wb = WtBalRecv::default();
        }
        self.init_g_inc();
    }

    /// Copy weights from `self` (s -> r) into the reciprocal pathway (r -> s)
    pub fn init_wt_sym(&self, recip: &mut Pathway) {
        for si in 0..self.conns.send_n.len() {
            for k in self.conns.send_range(si) {
                let ri = self.conns.send_idx[k];
                if let Some(rk) = recip.conns.syn_index(ri, si) {
                    let sy = self.syns[k];
                    let rsy = &mut recip.syns[rk];
                    rsy.wt = sy.wt;
                    rsy.lwt = sy.lwt;
                    rsy.scale = sy.scale;
                }
            }
        }
    }

    pub fn init_g_inc(&mut self) {
        for g in &mut self.g_inc {
            *g = 0.0;
        }
    }

    pub fn clear_trace(&mut self) {
        for tr in &mut self.trace {
            *tr = TraceSyn::default();
        }
    }

    /// Accumulate a sender's activation change into receivers' GInc
    pub fn send_g_delta(&mut self, si: usize, delta: f32) {
        let scdel = delta * self.gscale;
        for k in self.conns.send_range(si) {
            let ri = self.conns.send_idx[k];
            self.g_inc[ri] += scdel * self.syns[k].wt;
        }
    }

    /// Move pending GInc into the receivers' raw conductances
    pub fn recv_g_inc(&mut self, neurons: &mut [Neuron]) {
        let inhib = self.typ == PathType::Inhib;
        for (nrn, g) in neurons.iter_mut().zip(self.g_inc.iter_mut()) {
            if inhib {
                nrn.gi_raw += *g;
            } else {
                nrn.ge_raw += *g;
            }
            *g = 0.0;
        }
    }

    /// Compute DWt with the role's rule
    pub fn dwt(&mut self, send: &Layer, recv: &Layer) {
        if self.off || !self.learn.learn {
            return;
        }
        let Pathway {
            role,
            learn,
            conns,
            syns,
            trace,
            ..
        } = self;
        match role {
            PathwayRole::Standard => xcal_dwt(learn, conns, syns, send, recv),
            PathwayRole::Rw(p) => rl::rw_dwt(p, learn, conns, syns, send, recv),
            PathwayRole::TdRewPred => rl::td_rew_pred_dwt(learn, conns, syns, send, recv),
            PathwayRole::AmygMod(p) => pvlv::amyg_mod_dwt(p, learn, conns, syns, send, recv),
            PathwayRole::Msn(p) => pvlv::msn_dwt(p, learn, conns, syns, trace, send, recv),
            PathwayRole::MatrixTrace(p) => {
                bgate::matrix_trace_dwt(p, learn, conns, syns, trace, send, recv)
            }
            PathwayRole::GpeIn => bgate::gpe_in_dwt(learn, conns, syns, send, recv),
            PathwayRole::GpiTrace(p) => {
                bgate::gpi_trace_dwt(p, learn, conns, syns, trace, send, recv)
            }
        }
    }

    /// Apply accumulated DWt
    pub fn wt_from_dwt(&mut self) {
        if self.off || !self.learn.learn {
            return;
        }
        if self.role.straight_wt_update() {
            for sy in &mut self.syns {
                if sy.dwt != 0.0 {
                    sy.wt += sy.dwt;
                    sy.lwt = sy.wt;
                    sy.dwt = 0.0;
                }
            }
            return;
        }
        for (k, sy) in self.syns.iter_mut().enumerate() {
            let wb = self.wb_recv[self.conns.send_idx[k]];
            self.learn
                .wt_from_dwt(wb.inc, wb.dec, &mut sy.dwt, &mut sy.wt, &mut sy.lwt, sy.scale);
        }
    }

    /// Recompute per-receiver weight balance factors
    pub fn wt_bal_from_wt(&mut self, recv_is_target: bool) {
        let wb_p = &self.learn.wt_bal;
        if self.off || !self.learn.learn || !wb_p.on {
            return;
        }
        if !wb_p.targs && recv_is_target {
            return;
        }
        for ri in 0..self.wb_recv.len() {
            if self.conns.recv_n[ri] < 1 {
                continue;
            }
            let mut sum = 0.0;
            let mut n = 0;
            for k in self.conns.recv_range(ri) {
                let wt = self.syns[self.conns.recv_syn[k]].wt;
                if wt >= wb_p.avg_thr {
                    sum += wt;
                    n += 1;
                }
            }
            let avg = if n > 0 { sum / n as f32 } else { 0.0 };
            let (fact, inc, dec) = wb_p.wt_bal(avg);
            self.wb_recv[ri] = WtBalRecv { avg, fact, inc, dec };
        }
    }

    /// Scale the learning rate relative to its initial value
    pub fn lrate_mult(&mut self, mult: f32) {
        self.learn.lrate = self.learn.lrate_init * mult;
    }

    /// One synapse variable by sender and receiver index
    pub fn syn_val(&self, var: &str, si: usize, ri: usize) -> Result<f32> {
        let v = self.syn_var(var)?;
        let k = self
            .conns
            .syn_index(si, ri)
            .ok_or_else(|| LeabraError::IndexOutOfRange {
                index: ri,
                len: self.wb_recv.len(),
                scope: format!("pathway {} sender {}", self.name, si),
            })?;
        self.syn_val_at(v, k)
    }

    /// A synapse variable for all synapses in sender order
    pub fn syn_vals(&self, var: &str) -> Result<Vec<f32>> {
        let v = self.syn_var(var)?;
        (0..self.syns.len()).map(|k| self.syn_val_at(v, k)).collect()
    }

    fn syn_var(&self, var: &str) -> Result<SynVar> {
        SynVar::from_name(var)
            .filter(|v| self.role.has_trace() || !v.is_trace())
            .ok_or_else(|| LeabraError::UnknownVariable {
                name: var.to_string(),
                scope: format!("pathway {}", self.name),
            })
    }

    fn syn_val_at(&self, v: SynVar, k: usize) -> Result<f32> {
        let val = if v.is_trace() {
            self.trace.get(k).and_then(|tr| tr.var(v))
        } else {
            self.syns[k].var(v)
        };
        val.ok_or_else(|| LeabraError::UnknownVariable {
            name: v.name().to_string(),
            scope: format!("pathway {}", self.name),
        })
    }

    /// Names of synapse variables this pathway exposes
    pub fn syn_var_names(&self) -> Vec<&'static str> {
        SynVar::ALL
            .iter()
            .filter(|v| self.role.has_trace() || !v.is_trace())
            .map(|v| v.name())
            .collect()
    }
}

/// Share each sender's max Norm across its synapses
pub fn norm_max(learn: &LearnSynParams, syns: &mut [Synapse]) {
    if !learn.norm.on {
        return;
    }
    let max = syns.iter().fold(0.0f32, |m, sy| m.max(sy.norm));
    for sy in syns {
        sy.norm = max;
    }
}

/// Standard XCAL: error-driven plus BCM Hebbian
pub fn xcal_dwt(
    learn: &LearnSynParams,
    conns: &Conns,
    syns: &mut [Synapse],
    send: &Layer,
    recv: &Layer,
) {
    for (si, sn) in send.neurons.iter().enumerate() {
        if sn.is_off() {
            continue;
        }
        if sn.avg_s < learn.xcal.lrn_thr && sn.avg_m < learn.xcal.lrn_thr {
            continue;
        }
        let range = conns.send_range(si);
        for k in range.clone() {
            let rn = &recv.neurons[conns.send_idx[k]];
            if rn.is_off() {
                continue;
            }
            let (err, bcm) =
                learn.chl_dwt(sn.avg_s_lrn, sn.avg_m, rn.avg_s_lrn, rn.avg_m, rn.avg_l);
            let bcm = bcm * learn.xcal.long_lrate(rn.avg_l_lrn);
            let err = err * learn.xcal.m_lrn;
            let sy = &mut syns[k];
            let dwt = learn.norm_moment(&mut sy.norm, &mut sy.moment, bcm + err);
            sy.dwt += learn.lrate * dwt;
        }
        norm_max(learn, &mut syns[range]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leabra::{flags, LayerType};

    fn pools(n: usize, groups: &[(usize, usize)]) -> Vec<Pool> {
        let mut p = vec![Pool::new(0, n)];
        p.extend(groups.iter().map(|&(s, e)| Pool::new(s, e)));
        p
    }

    #[test]
    fn test_full_conns_tables() {
        let pairs = connect_pattern(Pattern::Full, 2, &pools(2, &[]), 3, &pools(3, &[]));
        let c = Conns::from_pairs(pairs, 2, 3);
        assert_eq!(c.n_syns(), 6);
        assert_eq!(c.send_n, vec![3, 3]);
        assert_eq!(c.recv_n, vec![2, 2, 2]);
        assert_eq!(c.syn_index(1, 2), Some(5));
        for ri in 0..3 {
            for k in c.recv_range(ri) {
                assert_eq!(c.send_idx[c.recv_syn[k]], ri);
            }
        }
        assert_eq!(c.recv_n_avg, 2.0);
    }

    #[test]
    fn test_pool_one_to_one() {
        let sp = pools(4, &[(0, 2), (2, 4)]);
        let rp = pools(2, &[(0, 1), (1, 2)]);
        let pairs = connect_pattern(Pattern::PoolOneToOne, 4, &sp, 2, &rp);
        assert_eq!(pairs, vec![(0, 0), (1, 0), (2, 1), (3, 1)]);
    }

    #[test]
    fn test_role_defaults() {
        let pj = Pathway::new(
            "AToB".into(),
            0,
            1,
            PathType::Forward,
            Pattern::Full,
            PathwayRole::GpeIn,
        );
        assert_eq!(pj.learn.lrate, 0.01);
        assert_eq!(pj.wt_init.rnd.mean, 0.9);
        assert!(!pj.learn.norm.on);
        assert!(PathwayRole::Msn(MsnPathParams::default()).has_trace());
        assert!(!PathwayRole::Standard.has_trace());
    }

    #[test]
    fn test_off_sender_skipped_by_xcal() {
        let mut send = Layer::new("In", &[1, 2], LayerType::Input);
        let mut recv = Layer::new("Hid", &[1, 2], LayerType::Hidden);
        send.build().unwrap();
        recv.build().unwrap();
        for sn in &mut send.neurons {
            sn.avg_s = 0.8;
            sn.avg_s_lrn = 0.8;
            sn.avg_m = 0.5;
        }
        send.neurons[1].set_flag(flags::OFF);
        for rn in &mut recv.neurons {
            rn.avg_s_lrn = 0.8;
            rn.avg_m = 0.2;
            rn.avg_l = 0.4;
        }
        let pairs = connect_pattern(Pattern::Full, 2, &send.pools, 2, &recv.pools);
        let conns = Conns::from_pairs(pairs, 2, 2);
        let mut syns = vec![Synapse::default(); conns.n_syns()];
        xcal_dwt(&LearnSynParams::default(), &conns, &mut syns, &send, &recv);
        for k in conns.send_range(0) {
            assert!(syns[k].dwt != 0.0);
        }
        for k in conns.send_range(1) {
            assert_eq!(syns[k].dwt, 0.0);
        }
    }

    #[test]
    fn test_norm_max_shared() {
        let learn = LearnSynParams::default();
        let mut syns = vec![
            Synapse {
                norm: 0.2,
                ..Default::default()
            },
            Synapse {
                norm: 0.7,
                ..Default::default()
            },
        ];
        norm_max(&learn, &mut syns);
        assert!(syns.iter().all(|s| s.norm == 0.7));
    }
}
