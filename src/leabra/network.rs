//! Network: layers, pathways and the ordered cycle loop
//!
//! One cycle runs these phases over all layers, each phase finishing on
//! every layer before the next one starts:
//!
//! | # | Phase | Reads other layers |
//! |---|-------|--------------------|
//! | 1 | MSN delayed-inhibition snapshots | no |
//! | 2 | Send Ge deltas, integrate Ge / GiSyn | senders |
//! | 3 | Send and receive modulation | senders |
//! | 4 | Gate modulation (`mods_from_inc`) | no |
//! | 5 | Ge and ModNet pool statistics | no |
//! | 6 | FFFB plus inter-layer inhibition | inter-inhib sources |
//! | 7 | Activation | RW / TD / VTA / LHb / CIN sources |
//! | 8 | Act pool statistics | no |
//! | 9 | Cycle post: DA / ACh / PV broadcast | - |
//!
//! Broadcasts land after activation, so receivers use a value computed
//! on the previous cycle. Learning runs only at trial boundaries.

use super::layer::{ActInputs, Layer};
use super::kind::LayerKind;
use super::pathway::{PathType, Pathway, PathwayRole, Pattern};
use super::time::Time;
use crate::bgate;
use crate::config::{merge_params, NetworkConfig, ParamBundle};
use crate::error::{LeabraError, Result};
use crate::neuromod::{
    AcetylcholineSource, ActivationUpdatable, DopamineSource, ModRcvr, ModulationReceiver,
    ModulationSender, ModulatorSink,
};
use crate::rl::resolve_one;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

pub struct Network {
    pub name: String,
    pub config: NetworkConfig,
    pub layers: Vec<Layer>,
    pub paths: Vec<Pathway>,
    wt_bal_ctr: usize,
    rng: StdRng,
}

impl Network {
    pub fn new(name: &str, config: NetworkConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            name: name.to_string(),
            config,
            layers: Vec::new(),
            paths: Vec::new(),
            wt_bal_ctr: 0,
            rng,
        }
    }

    /// A time counter matching the configured cycle length
    pub fn new_time(&self) -> Time {
        Time::new(self.config.cyc_per_qtr, self.config.time_per_cyc)
    }

    /// Add a layer; names must be unique
    pub fn add_layer(&mut self, mut ly: Layer) -> Result<usize> {
        if self.layer_index(&ly.name).is_some() {
            return Err(LeabraError::Build(format!(
                "network {}: duplicate layer name {}",
                self.name, ly.name
            )));
        }
        let idx = self.layers.len();
        ly.index = idx;
        self.layers.push(ly);
        Ok(idx)
    }

    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.name == name)
    }

    pub fn path_index(&self, name: &str) -> Option<usize> {
        self.paths.iter().position(|p| p.name == name)
    }

    pub fn path(&self, name: &str) -> Option<&Pathway> {
        self.paths.iter().find(|p| p.name == name)
    }

    pub fn path_mut(&mut self, name: &str) -> Option<&mut Pathway> {
        self.paths.iter_mut().find(|p| p.name == name)
    }

    fn require_layer(&self, name: &str, referenced_by: &str) -> Result<usize> {
        self.layer_index(name).ok_or_else(|| LeabraError::MissingLayer {
            layer: name.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }

    /// Connect `send` to `recv`; the pathway is named `<send>To<recv>`
    pub fn connect_layers(
        &mut self,
        send: &str,
        recv: &str,
        typ: PathType,
        pattern: Pattern,
        role: PathwayRole,
    ) -> Result<usize> {
        let name = format!("{}To{}", send, recv);
        let si = self.require_layer(send, &name)?;
        let ri = self.require_layer(recv, &name)?;
        if self.path_index(&name).is_some() {
            return Err(LeabraError::Build(format!(
                "network {}: duplicate pathway {}",
                self.name, name
            )));
        }
        self.paths
            .push(Pathway::new(name, si, ri, typ, pattern, role));
        Ok(self.paths.len() - 1)
    }

    /// Register `rcvr` to receive `sender`'s pooled activity as ModNet
    pub fn connect_layers_act_mod(&mut self, sender: &str, rcvr: &str, scale: f32) -> Result<()> {
        let si = self.require_layer(sender, rcvr)?;
        let ri = self.require_layer(rcvr, sender)?;
        let Some(rms) = self.layers[ri].mods.as_mut() else {
            return Err(LeabraError::Build(format!(
                "layer {} cannot receive modulation",
                rcvr
            )));
        };
        rms.params.is_mod_receiver = true;
        let Some(sms) = self.layers[si].mods.as_mut() else {
            return Err(LeabraError::Build(format!(
                "layer {} cannot send modulation",
                sender
            )));
        };
        sms.params.is_mod_sender = true;
        if sms.receivers.iter().any(|r| r.name == rcvr) {
            log::warn!("{} already sends modulation to {}", sender, rcvr);
            return Ok(());
        }
        sms.receivers.push(ModRcvr {
            name: rcvr.to_string(),
            scale,
            idx: ri,
        });
        Ok(())
    }

    /// Allocate all state and resolve every named layer reference
    pub fn build(&mut self) -> Result<()> {
        for ly in &mut self.layers {
            ly.build()?;
            ly.rcv_paths.clear();
            ly.snd_paths.clear();
        }
        for (pi, pj) in self.paths.iter_mut().enumerate() {
            let send = &self.layers[pj.send];
            let recv = &self.layers[pj.recv];
            bgate::recv_path_defaults(recv, send, pj);
            pj.build(send, recv);
            self.layers[pj.send].snd_paths.push(pi);
            self.layers[pj.recv].rcv_paths.push(pi);
        }

        let names: HashMap<String, usize> = self
            .layers
            .iter()
            .enumerate()
            .map(|(i, l)| (l.name.clone(), i))
            .collect();
        let lookup = |nm: &str| names.get(nm).copied();
        for ly in &mut self.layers {
            ly.kind.resolve(&ly.name, &lookup)?;
            if let Some(ms) = &mut ly.mods {
                for r in &mut ms.receivers {
                    r.idx = resolve_one(&ly.name, &r.name, &lookup)?;
                }
            }
            ly.inter_idx = ly
                .inhib
                .inter
                .lays
                .iter()
                .map(|nm| resolve_one(&ly.name, nm, &lookup))
                .collect::<Result<Vec<_>>>()?;
        }

        let mut pv_rcvrs = Vec::new();
        for ly in &self.layers {
            if let LayerKind::Pv(p) = &ly.kind {
                p.check_receivers(ly, &self.layers)?;
                pv_rcvrs.extend_from_slice(&p.receivers.idxs);
            }
            for &ti in ly.da_targets() {
                if !self.layers[ti].kind.accepts_da() {
                    log::warn!("{} sends DA to {}, which ignores it", ly.name, self.layers[ti].name);
                }
            }
            for &ti in ly.ach_targets() {
                if !self.layers[ti].kind.accepts_ach() {
                    log::warn!("{} sends ACh to {}, which ignores it", ly.name, self.layers[ti].name);
                }
            }
        }
        for ri in pv_rcvrs {
            if let Some(ms) = &mut self.layers[ri].mods {
                ms.params.is_pv_receiver = true;
            }
        }

        log::debug!(
            "built network {}: {} layers, {} pathways",
            self.name,
            self.layers.len(),
            self.paths.len()
        );
        Ok(())
    }

    /// Initialize weights and all long-running state
    pub fn init_weights(&mut self) {
        for pj in &mut self.paths {
            pj.init_wts(&mut self.rng);
        }
        self.init_wt_sym();
        for ly in &mut self.layers {
            ly.init_wts_state();
        }
        self.wt_bal_ctr = 0;
    }

    /// Copy weights of each symmetric pathway into its reciprocal
    fn init_wt_sym(&mut self) {
        for i in 0..self.paths.len() {
            for j in (i + 1)..self.paths.len() {
                let (a, b) = (&self.paths[i], &self.paths[j]);
                let recip = a.send == b.recv && a.recv == b.send;
                if !recip || !a.wt_init.sym || !b.wt_init.sym {
                    continue;
                }
                let (lo, hi) = self.paths.split_at_mut(j);
                lo[i].init_wt_sym(&mut hi[0]);
            }
        }
    }

    pub fn init_acts(&mut self) {
        for ly in self.layers.iter_mut().filter(|l| !l.off) {
            ly.init_acts();
        }
    }

    pub fn clear_mod_acts(&mut self) {
        for ly in &mut self.layers {
            ly.clear_mod_acts();
        }
    }

    /// Reset the trace on every pathway into an MSN layer
    pub fn clear_msn_traces(&mut self) {
        for pj in &mut self.paths {
            if matches!(self.layers[pj.recv].kind, LayerKind::Msn(_)) {
                pj.clear_trace();
            }
        }
    }

    pub fn init_ext(&mut self) {
        for ly in &mut self.layers {
            ly.init_ext();
        }
    }

    /// Apply external input to a named layer
    pub fn apply_ext(&mut self, name: &str, vals: &[f32]) -> Result<()> {
        let li = self.require_layer(name, &self.name)?;
        self.layers[li].apply_ext(vals)
    }

    /// Apply a parameter bundle; every named target must exist
    pub fn apply_params(&mut self, bundle: &ParamBundle) -> Result<()> {
        let owner = format!("param bundle {}", bundle.name);
        for (name, lp) in &bundle.layers {
            let li = self.require_layer(name, &owner)?;
            let ly = &mut self.layers[li];
            if let Some(v) = &lp.act {
                merge_params(&mut ly.act, v)?;
            }
            if let Some(v) = &lp.inhib {
                merge_params(&mut ly.inhib, v)?;
            }
            if let Some(v) = &lp.learn {
                merge_params(&mut ly.learn, v)?;
            }
            if lp.mods.is_some() || lp.da_mod.is_some() {
                let Some(ms) = &mut ly.mods else {
                    return Err(LeabraError::Build(format!(
                        "{}: layer {} has no modulation state",
                        owner, name
                    )));
                };
                if let Some(v) = &lp.mods {
                    merge_params(&mut ms.params, v)?;
                }
                if let Some(v) = &lp.da_mod {
                    merge_params(&mut ms.da_mod, v)?;
                }
            }
            ly.act.update();
        }
        for (name, pp) in &bundle.paths {
            let pi = self.path_index(name).ok_or_else(|| {
                LeabraError::Build(format!("{}: no pathway named {}", owner, name))
            })?;
            let pj = &mut self.paths[pi];
            if let Some(v) = &pp.wt_init {
                merge_params(&mut pj.wt_init, v)?;
            }
            if let Some(v) = &pp.wt_scale {
                merge_params(&mut pj.wt_scale, v)?;
            }
            if let Some(v) = &pp.learn {
                merge_params(&mut pj.learn, v)?;
            }
        }
        log::debug!("applied {} to network {}", owner, self.name);
        Ok(())
    }

    /// Run `f` on every active layer, in parallel when configured
    fn for_each_layer<F>(&mut self, f: F)
    where
        F: Fn(&mut Layer) + Send + Sync,
    {
        #[cfg(feature = "parallel")]
        {
            if self.config.parallel {
                use rayon::prelude::*;
                self.layers
                    .par_iter_mut()
                    .filter(|l| !l.off)
                    .for_each(|l| f(l));
                return;
            }
        }
        for ly in self.layers.iter_mut().filter(|l| !l.off) {
            f(ly);
        }
    }

    /// Start of a trial: averages, input scaling, state decay
    pub fn alpha_cyc_init(&mut self) {
        for ly in self.layers.iter_mut().filter(|l| !l.off) {
            ly.alpha_cyc_init_avgs();
        }
        self.gscale_from_avg_act();
        for ly in self.layers.iter_mut().filter(|l| !l.off) {
            ly.alpha_cyc_init_state(&mut self.rng);
        }
        for pj in &mut self.paths {
            pj.init_g_inc();
        }
    }

    /// Per-pathway GScale from the sender's expected activity, with Rel
    /// normalized separately over excitatory and inhibitory inputs
    /// A PV receiver adds one to its excitatory Rel sum once per layer.
    pub fn gscale_from_avg_act(&mut self) {
        for ly in self.layers.iter().filter(|l| !l.off) {
            let mut tot_ge_rel = 0.0f32;
            let mut tot_gi_rel = 0.0f32;
            for &pi in &ly.rcv_paths {
                let pj = &mut self.paths[pi];
                let send = &self.layers[pj.send];
                if pj.off || send.off {
                    continue;
                }
                let savg = send
                    .pools
                    .first()
                    .map(|p| p.act_avg.act_p_avg_eff)
                    .unwrap_or(0.0);
                pj.gscale =
                    pj.wt_scale
                        .full_scale(savg, send.neurons.len() as f32, pj.conns.recv_n_avg);
                if pj.typ == PathType::Inhib {
                    tot_gi_rel += pj.wt_scale.rel;
                } else {
                    tot_ge_rel += pj.wt_scale.rel;
                }
            }
            if ly.mods.as_ref().is_some_and(|m| m.params.is_pv_receiver) {
                tot_ge_rel += 1.0;
            }
            for &pi in &ly.rcv_paths {
                let pj = &mut self.paths[pi];
                let tot = if pj.typ == PathType::Inhib {
                    tot_gi_rel
                } else {
                    tot_ge_rel
                };
                if tot > 0.0 {
                    pj.gscale /= tot;
                }
            }
        }
    }

    /// One cycle of every phase, then a NaN check
    pub fn cycle(&mut self, time: &Time) -> Result<()> {
        for ly in self.layers.iter_mut().filter(|l| !l.off) {
            ly.quarter_init_prvs(time);
        }
        self.send_g_delta();
        self.send_mods();
        self.for_each_layer(|ly| ly.mods_from_inc(time));
        self.for_each_layer(|ly| {
            ly.avg_max_ge();
            ly.avg_max_mod();
        });
        self.inhib_from_ge_act();
        self.act_from_g(time);
        self.for_each_layer(|ly| ly.avg_max_act());
        self.cycle_post(time);
        self.check_nan()
    }

    /// Propagate activation changes, then integrate conductances
    fn send_g_delta(&mut self) {
        for li in 0..self.layers.len() {
            if self.layers[li].off {
                continue;
            }
            let deltas = self.layers[li].send_g_delta();
            if deltas.is_empty() {
                continue;
            }
            for &pi in &self.layers[li].snd_paths {
                let pj = &mut self.paths[pi];
                if pj.off {
                    continue;
                }
                for &(si, delta) in &deltas {
                    pj.send_g_delta(si, delta);
                }
            }
        }
        for pj in &mut self.paths {
            let ly = &mut self.layers[pj.recv];
            if !ly.off {
                ly.recv_g_inc(pj);
            }
        }
        self.for_each_layer(|ly| ly.g_from_inc_neur());
    }

    /// Senders publish pooled activity to their registered receivers
    fn send_mods(&mut self) {
        for li in 0..self.layers.len() {
            let ly = &mut self.layers[li];
            if ly.off || !ly.is_mod_sender() {
                continue;
            }
            ly.send_mods();
            let sent = ly.mod_sent();
            let rcvrs: Vec<(usize, f32)> =
                ly.mod_receivers().iter().map(|r| (r.idx, r.scale)).collect();
            for (ri, scale) in rcvrs {
                self.layers[ri].receive_mods(&sent, scale);
            }
        }
    }

    /// Inter-layer Gi is read from every layer before any is updated
    fn inhib_from_ge_act(&mut self) {
        let inter: Vec<Option<f32>> = self
            .layers
            .iter()
            .map(|ly| {
                if ly.inter_idx.is_empty() {
                    return None;
                }
                let others = ly.inter_idx.iter().map(|&oi| self.layers[oi].pool_gi());
                Some(ly.inhib.inter.other_gi(others))
            })
            .collect();
        for (ly, ogi) in self.layers.iter_mut().zip(inter) {
            if !ly.off {
                ly.inhib_from_ge_act(ogi);
            }
        }
    }

    fn act_from_g(&mut self, time: &Time) {
        let policy = self.config.total_act;
        for li in 0..self.layers.len() {
            if self.layers[li].off {
                continue;
            }
            let inputs = if self.layers[li].kind.reads_layers() {
                self.layers[li].kind.inputs(&self.layers, policy)
            } else {
                ActInputs::None
            };
            self.layers[li].act_from_g(time, &inputs);
        }
    }

    /// Variant post-processing and modulator broadcasts
    fn cycle_post(&mut self, time: &Time) {
        for li in 0..self.layers.len() {
            if self.layers[li].off {
                continue;
            }
            self.layers[li].cycle_post();
            let ly = &self.layers[li];
            let da = ly.da_out().map(|v| (v, ly.da_targets().to_vec()));
            let ach = ly.ach_out().map(|v| (v, ly.ach_targets().to_vec()));
            let pv = ly.pv_out(time).map(|(v, r)| (v, r.to_vec()));
            if let Some((v, targets)) = da {
                for ti in targets {
                    self.layers[ti].set_da(v);
                }
            }
            if let Some((v, targets)) = ach {
                for ti in targets {
                    self.layers[ti].set_ach(v);
                }
            }
            if let Some((vals, rcvrs)) = pv {
                for ri in rcvrs {
                    self.layers[ri].receive_pv(&vals);
                }
            }
        }
    }

    fn check_nan(&self) -> Result<()> {
        for ly in self.layers.iter().filter(|l| !l.off) {
            if let Some(what) = ly.find_nan() {
                log::error!("NaN in layer {}: {}", ly.name, what);
                return Err(LeabraError::NumericDegeneracy {
                    layer: ly.name.clone(),
                    what,
                });
            }
        }
        Ok(())
    }

    /// End-of-quarter snapshots; MSN-to-MSN pathways learn after quarter 1
    pub fn quarter_final(&mut self, time: &Time) {
        for ly in self.layers.iter_mut().filter(|l| !l.off) {
            ly.quarter_final(time);
        }
        if time.quarter == 1 {
            let Network { layers, paths, .. } = self;
            for pj in paths.iter_mut() {
                let (send, recv) = (&layers[pj.send], &layers[pj.recv]);
                let msn_pair = matches!(send.kind, LayerKind::Msn(_))
                    && matches!(recv.kind, LayerKind::Msn(_));
                if msn_pair && !send.off && !recv.off {
                    pj.dwt(send, recv);
                }
            }
        }
    }

    /// Compute weight changes on every pathway
    pub fn dwt(&mut self) {
        let Network { layers, paths, .. } = self;
        for pj in paths.iter_mut() {
            let (send, recv) = (&layers[pj.send], &layers[pj.recv]);
            if send.off || recv.off {
                continue;
            }
            pj.dwt(send, recv);
        }
    }

    /// Apply weight changes; weight balance is refreshed every
    /// `wt_bal_interval` calls
    pub fn wt_from_dwt(&mut self) {
        for pj in &mut self.paths {
            pj.wt_from_dwt();
        }
        self.wt_bal_ctr += 1;
        if self.wt_bal_ctr >= self.config.wt_bal_interval {
            self.wt_bal_ctr = 0;
            self.wt_bal_from_wt();
        }
    }

    pub fn wt_bal_from_wt(&mut self) {
        for pj in &mut self.paths {
            let recv_is_target = self.layers[pj.recv].is_target();
            pj.wt_bal_from_wt(recv_is_target);
        }
    }

    /// Scale every pathway's learning rate relative to its initial value
    pub fn lrate_mult(&mut self, mult: f32) {
        for pj in &mut self.paths {
            pj.lrate_mult(mult);
        }
    }

    /// A full trial: init, four quarters of cycles, then learning if `train`
    pub fn alpha_cycle(&mut self, time: &mut Time, train: bool) -> Result<()> {
        time.alpha_cyc_start();
        self.alpha_cyc_init();
        for _ in 0..4 {
            for _ in 0..time.cyc_per_qtr {
                self.cycle(time)?;
                time.cycle_inc();
            }
            self.quarter_final(time);
            time.quarter_inc();
        }
        if train {
            self.dwt();
            self.wt_from_dwt();
        }
        Ok(())
    }

    /// Unit variable of every neuron in a named layer
    pub fn unit_vals(&self, layer: &str, var: &str) -> Result<Vec<f32>> {
        self.layer(layer)
            .ok_or_else(|| LeabraError::MissingLayer {
                layer: layer.to_string(),
                referenced_by: self.name.clone(),
            })?
            .unit_vals(var)
    }

    /// Synapse variable of every synapse in a named pathway
    pub fn syn_vals(&self, path: &str, var: &str) -> Result<Vec<f32>> {
        self.path(path)
            .ok_or_else(|| LeabraError::UnknownVariable {
                name: path.to_string(),
                scope: format!("network {} pathways", self.name),
            })?
            .syn_vals(var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerParams;
    use crate::leabra::LayerType;
    use crate::neuromod::DaRType;
    use crate::pvlv::{
        BlaParams, DaLrnRule, MsnPathParams, MsnState, MsnTraceParams, StriatalCompartment,
    };
    use crate::rl::{ClampDaParams, RwDaParams, RwPathParams, RwPredParams, SendList};
    use serde_json::json;

    fn seeded(name: &str) -> Network {
        Network::new(
            name,
            NetworkConfig {
                seed: Some(42),
                ..Default::default()
            },
        )
    }

    fn rw_net() -> Network {
        let mut net = seeded("RW");
        net.add_layer(Layer::new("Input", &[1, 1], LayerType::Input))
            .unwrap();
        let mut rew = Layer::new("Rew", &[1, 1], LayerType::Input);
        rew.act.clamp.range.max = 1.0;
        net.add_layer(rew).unwrap();
        net.add_layer(Layer::with_kind(
            "RWPred",
            &[1, 1],
            LayerType::Hidden,
            LayerKind::RwPred(RwPredParams::default()),
        ))
        .unwrap();
        let da = RwDaParams {
            send_da: SendList::new(&["RWPred"]),
            ..Default::default()
        };
        net.add_layer(Layer::with_kind(
            "RWDa",
            &[1, 1],
            LayerType::Hidden,
            LayerKind::RwDa(da),
        ))
        .unwrap();
        net.connect_layers(
            "Input",
            "RWPred",
            PathType::Forward,
            Pattern::Full,
            PathwayRole::Rw(RwPathParams::default()),
        )
        .unwrap();
        net.build().unwrap();
        net.init_weights();
        net
    }

    #[test]
    fn test_rw_prediction_converges_to_reward_rate() {
        let mut net = rw_net();
        let mut time = net.new_time();
        let mut preds = Vec::new();
        let mut das = Vec::new();
        for trial in 0..50 {
            let rew = if trial % 2 == 0 { 1.0 } else { 0.0 };
            net.apply_ext("Input", &[1.0]).unwrap();
            net.apply_ext("Rew", &[rew]).unwrap();
            net.alpha_cycle(&mut time, true).unwrap();
            preds.push(net.unit_vals("RWPred", "Act").unwrap()[0]);
            das.push(net.unit_vals("RWDa", "Act").unwrap()[0]);
        }
        let mean = |v: &[f32]| v.iter().sum::<f32>() / v.len() as f32;
        let pred = mean(&preds[preds.len() - 10..]);
        let da = mean(&das[das.len() - 10..]);
        assert!((pred - 0.5).abs() < 0.05, "pred {}", pred);
        assert!(da.abs() < 0.05, "da {}", da);
    }

    #[test]
    fn test_missing_reward_layer_aborts_build() {
        let mut net = seeded("Bad");
        net.add_layer(Layer::with_kind(
            "RWDa",
            &[1, 1],
            LayerType::Hidden,
            LayerKind::RwDa(RwDaParams::default()),
        ))
        .unwrap();
        match net.build() {
            Err(LeabraError::MissingLayer {
                layer,
                referenced_by,
            }) => {
                assert_eq!(layer, "Rew");
                assert_eq!(referenced_by, "RWDa");
            }
            other => panic!("expected missing layer, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut net = seeded("Dup");
        net.add_layer(Layer::new("A", &[1, 1], LayerType::Input))
            .unwrap();
        assert!(matches!(
            net.add_layer(Layer::new("A", &[1, 1], LayerType::Hidden)),
            Err(LeabraError::Build(_))
        ));
        assert!(matches!(
            net.connect_layers("A", "B", PathType::Forward, Pattern::Full, PathwayRole::Standard),
            Err(LeabraError::MissingLayer { .. })
        ));
    }

    #[test]
    fn test_unmodulated_receiver_stays_silent() {
        let mut net = seeded("Amyg");
        net.add_layer(Layer::new("In", &[1, 2], LayerType::Input))
            .unwrap();
        let mut bla = Layer::with_kind(
            "BLA",
            &[1, 2],
            LayerType::Hidden,
            LayerKind::Bla(BlaParams::default()),
        );
        if let Some(ms) = &mut bla.mods {
            ms.params.is_mod_receiver = true;
        }
        net.add_layer(bla).unwrap();
        net.connect_layers("In", "BLA", PathType::Forward, Pattern::Full, PathwayRole::Standard)
            .unwrap();
        net.build().unwrap();
        net.init_weights();

        let mut time = net.new_time();
        net.apply_ext("In", &[1.0, 1.0]).unwrap();
        time.alpha_cyc_start();
        net.alpha_cyc_init();
        let mut saw_ge = false;
        for _ in 0..4 {
            for _ in 0..time.cyc_per_qtr {
                net.cycle(&time).unwrap();
                let bla = net.layer("BLA").unwrap();
                saw_ge |= bla.neurons.iter().any(|n| n.ge > 0.1);
                assert!(bla.neurons.iter().all(|n| n.act == 0.0));
                time.cycle_inc();
            }
            net.quarter_final(&time);
            time.quarter_inc();
        }
        assert!(saw_ge);
    }

    fn msn_trace_net() -> Network {
        let mut net = seeded("MSN");
        net.add_layer(Layer::new("Stim", &[1, 1], LayerType::Input))
            .unwrap();
        let da = ClampDaParams {
            send_da: SendList::new(&["MSN"]),
        };
        net.add_layer(Layer::with_kind(
            "DA",
            &[1, 1],
            LayerType::Input,
            LayerKind::ClampDa(da),
        ))
        .unwrap();
        let mut msn = Layer::with_kind(
            "MSN",
            &[1, 1],
            LayerType::Hidden,
            LayerKind::Msn(MsnState::new(StriatalCompartment::Patch, DaRType::D1R)),
        );
        msn.inhib.layer.on = false;
        msn.inhib.pool.on = false;
        if let Some(ms) = &mut msn.mods {
            ms.params.act_mod_zero = false;
        }
        net.add_layer(msn).unwrap();
        let role = PathwayRole::Msn(MsnPathParams {
            rule: DaLrnRule::TraceNoThalVs,
            trace: MsnTraceParams {
                deriv: false,
                decay: 1.0,
            },
            ..Default::default()
        });
        net.connect_layers("Stim", "MSN", PathType::Forward, Pattern::Full, role)
            .unwrap();
        net.build().unwrap();
        net.init_weights();
        net
    }

    #[test]
    fn test_trace_bridges_gap_to_later_dopamine() {
        let mut net = msn_trace_net();
        let mut time = net.new_time();
        let wt = |net: &Network| net.syn_vals("StimToMSN", "Wt").unwrap()[0];
        let w0 = wt(&net);

        // T: gating event, no DA
        net.apply_ext("Stim", &[1.0]).unwrap();
        net.apply_ext("DA", &[0.0]).unwrap();
        net.alpha_cycle(&mut time, true).unwrap();
        assert_eq!(wt(&net), w0);
        let tr = net.syn_vals("StimToMSN", "Tr").unwrap()[0];
        assert!(tr > 0.0);

        // T+1: nothing
        net.apply_ext("Stim", &[0.0]).unwrap();
        net.apply_ext("DA", &[0.0]).unwrap();
        net.alpha_cycle(&mut time, true).unwrap();
        assert_eq!(wt(&net), w0);

        // T+2: DA arrives
        net.apply_ext("Stim", &[0.0]).unwrap();
        net.apply_ext("DA", &[1.0]).unwrap();
        net.alpha_cycle(&mut time, true).unwrap();
        assert!(wt(&net) > w0);
        assert_eq!(net.layer("MSN").unwrap().da(), 1.0);
    }

    #[test]
    fn test_da_broadcast_arrives_after_cycle() {
        let mut net = msn_trace_net();
        let time = net.new_time();
        net.apply_ext("DA", &[0.6]).unwrap();
        net.alpha_cyc_init();
        assert_eq!(net.layer("MSN").unwrap().da(), 0.0);
        net.cycle(&time).unwrap();
        assert!((net.layer("MSN").unwrap().da() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_clear_msn_traces() {
        let mut net = msn_trace_net();
        let mut time = net.new_time();
        net.apply_ext("Stim", &[1.0]).unwrap();
        net.alpha_cycle(&mut time, true).unwrap();
        assert!(net.syn_vals("StimToMSN", "Tr").unwrap()[0] > 0.0);
        net.clear_msn_traces();
        assert_eq!(net.syn_vals("StimToMSN", "Tr").unwrap()[0], 0.0);
    }

    #[test]
    fn test_nan_halts_cycle() {
        let mut net = rw_net();
        net.paths[0].syns[0].wt = f32::NAN;
        let time = net.new_time();
        net.apply_ext("Input", &[1.0]).unwrap();
        net.alpha_cyc_init();
        assert!(matches!(
            net.cycle(&time),
            Err(LeabraError::NumericDegeneracy { .. })
        ));
    }

    #[test]
    fn test_gscale_rel_normalized() {
        let mut net = seeded("Scale");
        for nm in ["A", "B"] {
            net.add_layer(Layer::new(nm, &[1, 1], LayerType::Input))
                .unwrap();
        }
        net.add_layer(Layer::new("H", &[1, 1], LayerType::Hidden))
            .unwrap();
        net.connect_layers("A", "H", PathType::Forward, Pattern::Full, PathwayRole::Standard)
            .unwrap();
        let bi = net
            .connect_layers("B", "H", PathType::Forward, Pattern::Full, PathwayRole::Standard)
            .unwrap();
        net.paths[bi].wt_scale.rel = 3.0;
        net.build().unwrap();
        net.init_weights();
        net.alpha_cyc_init();
        // one sender, one connection: the activity scale is 1
        assert!((net.paths[0].gscale - 0.25).abs() < 1e-6);
        assert!((net.paths[1].gscale - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_constant_input_settles_weights() {
        let mut net = seeded("Settle");
        net.add_layer(Layer::new("In", &[2, 2], LayerType::Input))
            .unwrap();
        net.add_layer(Layer::new("Hid", &[2, 2], LayerType::Hidden))
            .unwrap();
        net.connect_layers("In", "Hid", PathType::Forward, Pattern::Full, PathwayRole::Standard)
            .unwrap();
        net.build().unwrap();
        net.init_weights();
        let mut time = net.new_time();
        let mut prev = net.syn_vals("InToHid", "Wt").unwrap();
        let mut last_delta = f32::MAX;
        for _ in 0..200 {
            net.apply_ext("In", &[1.0, 0.0, 1.0, 0.0]).unwrap();
            net.alpha_cycle(&mut time, true).unwrap();
            let wts = net.syn_vals("InToHid", "Wt").unwrap();
            last_delta = wts
                .iter()
                .zip(&prev)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f32::max);
            prev = wts;
        }
        assert!(last_delta < 5e-3, "still moving by {}", last_delta);
        assert!(prev.iter().all(|w| (0.0..=1.0).contains(w)));
    }

    #[test]
    fn test_mod_senders_reach_receivers() {
        let mut net = seeded("Mod");
        net.add_layer(Layer::new("In", &[1, 2], LayerType::Input))
            .unwrap();
        for nm in ["Src", "Dst"] {
            let mut ly = Layer::with_kind(nm, &[1, 2], LayerType::Hidden, LayerKind::Mod);
            ly.inhib.layer.on = false;
            net.add_layer(ly).unwrap();
        }
        net.connect_layers("In", "Src", PathType::Forward, Pattern::OneToOne, PathwayRole::Standard)
            .unwrap();
        net.connect_layers_act_mod("Src", "Dst", 0.5).unwrap();
        // a second registration is ignored
        net.connect_layers_act_mod("Src", "Dst", 0.5).unwrap();
        assert!(matches!(
            net.connect_layers_act_mod("In", "Dst", 1.0),
            Err(LeabraError::Build(_))
        ));
        net.build().unwrap();
        net.init_weights();
        assert_eq!(net.layer("Src").unwrap().mod_receivers().len(), 1);

        let mut time = net.new_time();
        net.apply_ext("In", &[1.0, 1.0]).unwrap();
        net.alpha_cycle(&mut time, false).unwrap();
        let mod_net = net.unit_vals("Dst", "ModNet").unwrap();
        assert!(mod_net.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_apply_params() {
        let mut net = rw_net();
        let mut bundle = ParamBundle {
            name: "Base".into(),
            ..Default::default()
        };
        bundle.layers.insert(
            "RWPred".into(),
            LayerParams {
                inhib: Some(json!({ "layer": { "gi": 2.5 } })),
                ..Default::default()
            },
        );
        bundle.paths.insert(
            "InputToRWPred".into(),
            crate::config::PathParams {
                learn: Some(json!({ "lrate": 0.1 })),
                ..Default::default()
            },
        );
        net.apply_params(&bundle).unwrap();
        assert_eq!(net.layer("RWPred").unwrap().inhib.layer.gi, 2.5);
        assert_eq!(net.path("InputToRWPred").unwrap().learn.lrate, 0.1);

        bundle.layers.insert(
            "RWDa".into(),
            LayerParams {
                mods: Some(json!({ "act_mod_zero": true })),
                ..Default::default()
            },
        );
        assert!(matches!(net.apply_params(&bundle), Err(LeabraError::Build(_))));

        let mut bad = ParamBundle::default();
        bad.layers.insert("Nope".into(), LayerParams::default());
        assert!(matches!(
            net.apply_params(&bad),
            Err(LeabraError::MissingLayer { .. })
        ));
    }
}
