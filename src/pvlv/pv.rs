//! Primary value layers
//!
//! Activity is driven by external input. At the send quarter each unit
//! writes max(Act, Ext) into the matching unit's PVAct on every receiver,
//! which overrides that receiver's modulated activity.

use crate::error::{LeabraError, Result};
use crate::leabra::Layer;
use crate::rl::SendList;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PvParams {
    /// Quarter in which PV is written to receivers
    pub send_pv_quarter: usize,
    pub receivers: SendList,
}

impl Default for PvParams {
    fn default() -> Self {
        Self {
            send_pv_quarter: 3,
            receivers: SendList::default(),
        }
    }
}

impl PvParams {
    /// Receivers must carry modulation state and match the sender's size
    pub fn check_receivers(&self, owner: &Layer, layers: &[Layer]) -> Result<()> {
        for &ri in &self.receivers.idxs {
            let Some(rl) = layers.get(ri) else {
                continue;
            };
            if rl.mods.is_none() {
                return Err(LeabraError::Build(format!(
                    "PV layer {}: receiver {} has no modulation state",
                    owner.name, rl.name
                )));
            }
            if rl.neurons.len() != owner.neurons.len() {
                return Err(LeabraError::ShapeMismatch {
                    expected: owner.shape.clone(),
                    actual: rl.shape.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leabra::{LayerKind, LayerType};

    #[test]
    fn test_receivers_must_match() {
        let mut pv = Layer::with_kind(
            "PosPV",
            &[1, 2],
            LayerType::Input,
            LayerKind::Pv(PvParams::default()),
        );
        pv.build().unwrap();
        let mut good = Layer::with_kind("M", &[1, 2], LayerType::Hidden, LayerKind::Mod);
        good.build().unwrap();
        let mut plain = Layer::new("P", &[1, 2], LayerType::Hidden);
        plain.build().unwrap();
        let mut small = Layer::with_kind("S", &[1, 1], LayerType::Hidden, LayerKind::Mod);
        small.build().unwrap();
        let layers = vec![good, plain, small];

        let mut p = PvParams::default();
        p.receivers.idxs = vec![0];
        assert!(p.check_receivers(&pv, &layers).is_ok());
        p.receivers.idxs = vec![1];
        assert!(matches!(
            p.check_receivers(&pv, &layers),
            Err(LeabraError::Build(_))
        ));
        p.receivers.idxs = vec![2];
        assert!(matches!(
            p.check_receivers(&pv, &layers),
            Err(LeabraError::ShapeMismatch { .. })
        ));
    }
}
