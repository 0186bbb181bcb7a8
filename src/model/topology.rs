//! Atoms, bonds and residues describing the chemistry of a frame.
//!
//! The topology stores canonicalized atom-to-atom bonds together with their orders,
//! groups atoms into residues, and derives angles, dihedrals and impropers from the bond
//! graph on demand. Indices are the only way atoms are referenced, so every mutation that
//! introduces an index is validated against the current atom count.

use super::atom::Atom;
use super::connectivity::{Angle, Connectivity, Dihedral, Improper};
use super::residue::Residue;
use super::types::BondOrder;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Undirected bond connecting two atoms of a topology.
///
/// Bonds store canonical atom indices (ascending order) so equality, hashing, and sorting
/// remain stable regardless of the order in which the connection was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bond {
    /// Index of the first atom (always the lesser index after canonicalization).
    pub a1_idx: usize,
    /// Index of the second atom (greater-or-equal to `a1_idx`).
    pub a2_idx: usize,
    /// Chemical multiplicity assigned to the bond.
    pub order: BondOrder,
}

impl Bond {
    /// Creates a new bond while canonicalizing the endpoint ordering.
    ///
    /// # Arguments
    ///
    /// * `idx1` - Index of one bonded atom.
    /// * `idx2` - Index of the partner atom.
    /// * `order` - Chemical bond order.
    ///
    /// # Returns
    ///
    /// A `Bond` whose indices are sorted so `a1_idx <= a2_idx`.
    pub fn new(idx1: usize, idx2: usize, order: BondOrder) -> Self {
        Self {
            a1_idx: idx1.min(idx2),
            a2_idx: idx1.max(idx2),
            order,
        }
    }
}

/// Violations of the topology invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("atom index {index} is out of range for a topology with {size} atoms")]
    AtomOutOfRange { index: usize, size: usize },

    #[error("atom {atom} already belongs to residue '{residue}'")]
    AtomInResidue { atom: usize, residue: String },

    #[error("can not bond atom {index} to itself")]
    SelfBond { index: usize },
}

/// Atoms, bonds and residues of a frame.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    atoms: Vec<Atom>,
    bonds: BTreeMap<(usize, usize), BondOrder>,
    residues: Vec<Residue>,
    residue_of_atom: Vec<Option<usize>>,
    connectivity: OnceLock<Connectivity>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atom_mut(&mut self, index: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(index)
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn add_atom(&mut self, atom: Atom) {
        self.atoms.push(atom);
        self.residue_of_atom.push(None);
    }

    /// Grows or shrinks the atom list.
    ///
    /// New atoms are default-constructed. Shrinking drops every bond and residue membership
    /// touching a removed atom.
    pub fn resize(&mut self, size: usize) {
        if size < self.atoms.len() {
            self.bonds.retain(|&(_, j), _| j < size);
            for residue in &mut self.residues {
                residue.retain_atoms(|i| i < size);
            }
            self.invalidate();
        }
        self.atoms.resize_with(size, Atom::default);
        self.residue_of_atom.resize(size, None);
    }

    /// Removes every atom, bond and residue.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Adds a bond between two atoms.
    ///
    /// Adding an existing pair keeps the stored order unless it was
    /// [`BondOrder::Unknown`], in which case the new order replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] when an index is out of range or both indices are equal.
    pub fn add_bond(&mut self, i: usize, j: usize, order: BondOrder) -> Result<(), TopologyError> {
        self.check_index(i)?;
        self.check_index(j)?;
        if i == j {
            return Err(TopologyError::SelfBond { index: i });
        }

        let bond = Bond::new(i, j, order);
        let entry = self
            .bonds
            .entry((bond.a1_idx, bond.a2_idx))
            .or_insert(order);
        if *entry == BondOrder::Unknown {
            *entry = order;
        }
        self.invalidate();
        Ok(())
    }

    pub fn remove_bond(&mut self, i: usize, j: usize) -> Option<BondOrder> {
        let removed = self.bonds.remove(&(i.min(j), i.max(j)));
        if removed.is_some() {
            self.invalidate();
        }
        removed
    }

    /// Returns the order of the bond between `i` and `j`, if they are bonded.
    pub fn bond_order(&self, i: usize, j: usize) -> Option<BondOrder> {
        self.bonds.get(&(i.min(j), i.max(j))).copied()
    }

    pub fn are_bonded(&self, i: usize, j: usize) -> bool {
        self.bond_order(i, j).is_some()
    }

    /// Iterates over all bonds in ascending `(a1_idx, a2_idx)` order.
    pub fn bonds(&self) -> impl Iterator<Item = Bond> + '_ {
        self.bonds
            .iter()
            .map(|(&(i, j), &order)| Bond::new(i, j, order))
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Enumerates the neighboring atom indices for the provided atom.
    pub fn neighbors_of(&self, atom_idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.bonds.keys().filter_map(move |&(i, j)| {
            if i == atom_idx {
                Some(j)
            } else if j == atom_idx {
                Some(i)
            } else {
                None
            }
        })
    }

    /// Adds a residue to the topology.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] when one of the residue atoms is out of range or already
    /// belongs to another residue.
    pub fn add_residue(&mut self, residue: Residue) -> Result<(), TopologyError> {
        for atom in residue.atoms() {
            self.check_index(atom)?;
            if let Some(existing) = self.residue_of_atom[atom] {
                return Err(TopologyError::AtomInResidue {
                    atom,
                    residue: self.residues[existing].name.clone(),
                });
            }
        }

        let index = self.residues.len();
        for atom in residue.atoms() {
            self.residue_of_atom[atom] = Some(index);
        }
        self.residues.push(residue);
        Ok(())
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn residue(&self, index: usize) -> Option<&Residue> {
        self.residues.get(index)
    }

    pub fn residue_for_atom(&self, atom: usize) -> Option<&Residue> {
        self.residue_of_atom
            .get(atom)
            .copied()
            .flatten()
            .map(|index| &self.residues[index])
    }

    pub fn angles(&self) -> &[Angle] {
        self.connectivity().angles()
    }

    pub fn dihedrals(&self) -> &[Dihedral] {
        self.connectivity().dihedrals()
    }

    pub fn impropers(&self) -> &[Improper] {
        self.connectivity().impropers()
    }

    fn connectivity(&self) -> &Connectivity {
        self.connectivity.get_or_init(|| {
            Connectivity::from_bonds(self.atoms.len(), self.bonds.keys().copied())
        })
    }

    fn invalidate(&mut self) {
        self.connectivity = OnceLock::new();
    }

    fn check_index(&self, index: usize) -> Result<(), TopologyError> {
        if index >= self.atoms.len() {
            Err(TopologyError::AtomOutOfRange {
                index,
                size: self.atoms.len(),
            })
        } else {
            Ok(())
        }
    }
}

impl PartialEq for Topology {
    fn eq(&self, other: &Self) -> bool {
        self.atoms == other.atoms && self.bonds == other.bonds && self.residues == other.residues
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Topology {{ atoms: {}, bonds: {}, residues: {} }}",
            self.atom_count(),
            self.bond_count(),
            self.residues.len()
        )
    }
}
