//! Named broadcast target lists for DA and ACh sources

use crate::error::{LeabraError, Result};
use serde::{Deserialize, Serialize};

/// Layers that receive a modulator broadcast, resolved to indices at build
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SendList {
    pub names: Vec<String>,
    #[serde(skip)]
    pub idxs: Vec<usize>,
}

impl SendList {
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            idxs: Vec::new(),
        }
    }

    pub fn add(&mut self, name: &str) {
        if self.names.iter().any(|n| n == name) {
            log::warn!("send list already contains {}", name);
            return;
        }
        self.names.push(name.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve every name; the first unknown one is an error
    pub fn resolve<F>(&mut self, owner: &str, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<usize>,
    {
        self.idxs = self
            .names
            .iter()
            .map(|nm| {
                lookup(nm).ok_or_else(|| LeabraError::MissingLayer {
                    layer: nm.clone(),
                    referenced_by: owner.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }
}

/// Resolve a single named reference
pub fn resolve_one<F>(owner: &str, name: &str, lookup: F) -> Result<usize>
where
    F: Fn(&str) -> Option<usize>,
{
    lookup(name).ok_or_else(|| LeabraError::MissingLayer {
        layer: name.to_string(),
        referenced_by: owner.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_reports_missing_name() {
        let mut sl = SendList::new(&["A", "B"]);
        let lookup = |n: &str| if n == "A" { Some(3) } else { None };
        match sl.resolve("DA", lookup) {
            Err(LeabraError::MissingLayer {
                layer,
                referenced_by,
            }) => {
                assert_eq!(layer, "B");
                assert_eq!(referenced_by, "DA");
            }
            other => panic!("unexpected {:?}", other),
        }
        sl.names.pop();
        sl.resolve("DA", lookup).unwrap();
        assert_eq!(sl.idxs, vec![3]);
    }

    #[test]
    fn test_add_dedups() {
        let mut sl = SendList::default();
        sl.add("X");
        sl.add("X");
        assert_eq!(sl.names.len(), 1);
    }
}
