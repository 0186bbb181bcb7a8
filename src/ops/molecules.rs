//! Assignment of molecule ids from the bond graph.

use crate::model::topology::Topology;
use std::collections::HashMap;

/// Returns one molecule id per atom.
///
/// Atoms connected through bonds share an id. Ids are dense and numbered in the order in
/// which their first atom appears, so the first atom always belongs to molecule `0`.
pub fn guess_molecules(topology: &Topology) -> Vec<usize> {
    let mut ids: Vec<usize> = (0..topology.atom_count()).collect();

    for bond in topology.bonds() {
        let (a, b) = (ids[bond.a1_idx], ids[bond.a2_idx]);
        if a == b {
            continue;
        }
        let (keep, replace) = (a.min(b), a.max(b));
        for id in ids.iter_mut().filter(|id| **id == replace) {
            *id = keep;
        }
    }

    let mut dense = HashMap::new();
    ids.into_iter()
        .map(|id| {
            let next = dense.len();
            *dense.entry(id).or_insert(next)
        })
        .collect()
}
