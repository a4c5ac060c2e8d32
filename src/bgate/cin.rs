//! Cholinergic interneurons (TANs)
//!
//! Activity tracks the magnitude of reward, whether positive or
//! negative, and is broadcast as ACh to the matrix layers where it
//! resets their traces.

use crate::error::Result;
use crate::leabra::{ActInputs, Layer, Neuron};
use crate::rl::{resolve_one, SendList};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CinParams {
    /// Layer whose unit 0 carries reward
    pub rew_lay: String,
    pub send_ach: SendList,
    #[serde(skip)]
    pub rew_idx: usize,
}

impl Default for CinParams {
    fn default() -> Self {
        Self {
            rew_lay: "Rew".to_string(),
            send_ach: SendList::default(),
            rew_idx: 0,
        }
    }
}

impl CinParams {
    pub fn resolve<F>(&mut self, owner: &str, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<usize>,
    {
        self.rew_idx = resolve_one(owner, &self.rew_lay, &lookup)?;
        self.send_ach.resolve(owner, lookup)
    }

    pub fn inputs(&self, layers: &[Layer]) -> ActInputs {
        match layers.get(self.rew_idx).and_then(|l| l.neurons.first()) {
            Some(n) => ActInputs::Cin { rew_act: n.act },
            None => ActInputs::None,
        }
    }
}

/// Act = |reward| on every unit
pub fn cin_act(inputs: &ActInputs, neurons: &mut [Neuron]) {
    let ActInputs::Cin { rew_act } = *inputs else {
        return;
    };
    for nrn in neurons.iter_mut().filter(|n| !n.is_off()) {
        nrn.act = rew_act.abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LeabraError;

    #[test]
    fn test_act_is_reward_magnitude() {
        let mut ns = vec![Neuron::default(); 3];
        cin_act(&ActInputs::Cin { rew_act: -0.7 }, &mut ns);
        assert!(ns.iter().all(|n| (n.act - 0.7).abs() < 1e-6));
        // no reward source, no change
        cin_act(&ActInputs::None, &mut ns);
        assert!((ns[0].act - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_missing_rew_layer() {
        let mut p = CinParams::default();
        let err = p.resolve("CIN", |_| None).unwrap_err();
        assert!(matches!(err, LeabraError::MissingLayer { .. }));
    }
}
