//! C3 linearization of the inheritance graph.

use crate::error::{GraphError, GraphResult};
use std::collections::{HashMap, HashSet, VecDeque};

/// Computes and caches linearizations.
///
/// `bases` maps each modeled contract to its direct bases in evaluation order
/// (rightmost declared base first). Names absent from `bases` linearize to
/// themselves.
pub struct Linearizer<'a> {
    bases: &'a HashMap<String, Vec<String>>,
    cache: HashMap<String, Vec<String>>,
    in_progress: HashSet<String>,
}

impl<'a> Linearizer<'a> {
    pub fn new(bases: &'a HashMap<String, Vec<String>>) -> Self {
        Self {
            bases,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// `L(C) = [C] + merge(L(B1), .., L(Bn), [B1, .., Bn])`
    pub fn linearize(&mut self, contract: &str) -> GraphResult<Vec<String>> {
        if let Some(cached) = self.cache.get(contract) {
            return Ok(cached.clone());
        }
        let Some(direct) = self.bases.get(contract) else {
            return Ok(vec![contract.to_string()]);
        };
        if !self.in_progress.insert(contract.to_string()) {
            return Err(GraphError::CyclicInheritance {
                contract: contract.to_string(),
            });
        }

        let mut sequences = Vec::with_capacity(direct.len() + 1);
        for base in direct {
            sequences.push(VecDeque::from(self.linearize(base)?));
        }
        sequences.push(direct.iter().cloned().collect());

        let mut result = vec![contract.to_string()];
        result.extend(merge(contract, sequences)?);

        self.in_progress.remove(contract);
        self.cache.insert(contract.to_string(), result.clone());
        Ok(result)
    }
}

fn merge(contract: &str, mut sequences: Vec<VecDeque<String>>) -> GraphResult<Vec<String>> {
    let mut merged = Vec::new();
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            return Ok(merged);
        }

        // First head that does not appear in the tail of any sequence.
        let head = sequences
            .iter()
            .filter_map(|s| s.front())
            .find(|candidate| {
                sequences
                    .iter()
                    .all(|s| !s.iter().skip(1).any(|name| name == *candidate))
            })
            .cloned()
            .ok_or_else(|| GraphError::Linearization {
                contract: contract.to_string(),
            })?;

        for sequence in sequences.iter_mut() {
            if sequence.front() == Some(&head) {
                sequence.pop_front();
            }
        }
        merged.push(head);
    }
}
