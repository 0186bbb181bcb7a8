//! Bonded n-body terms derived from a bond graph.
//!
//! Angles, dihedrals and impropers are never read from files; they are enumerated from the
//! bond list whenever a consumer (typically a typed export format) asks for them. Every term
//! is stored in a canonical orientation so that the same physical term always compares equal.

use std::collections::BTreeSet;

/// Three atoms `i-j-k` bonded in sequence, with `j` at the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Angle([usize; 3]);

/// Four atoms `i-j-k-m` bonded in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dihedral([usize; 4]);

/// A central atom `j` bonded to three peripheral atoms `i`, `k` and `m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Improper([usize; 4]);

impl Angle {
    /// Creates an angle, storing the outer atoms in ascending order.
    pub fn new(i: usize, j: usize, k: usize) -> Self {
        if i < k {
            Self([i, j, k])
        } else {
            Self([k, j, i])
        }
    }

    pub fn atoms(&self) -> [usize; 3] {
        self.0
    }
}

impl Dihedral {
    /// Creates a dihedral oriented so that the pair holding the largest index comes last.
    pub fn new(i: usize, j: usize, k: usize, m: usize) -> Self {
        let forward = [i, j, k, m];
        let reverse = [m, k, j, i];
        let (max_ij, max_km) = (i.max(j), k.max(m));
        if max_ij == max_km {
            let (min_ij, min_km) = (i.min(j), k.min(m));
            if min_ij == min_km {
                Self(forward.min(reverse))
            } else if min_ij < min_km {
                Self(forward)
            } else {
                Self(reverse)
            }
        } else if max_ij < max_km {
            Self(forward)
        } else {
            Self(reverse)
        }
    }

    pub fn atoms(&self) -> [usize; 4] {
        self.0
    }
}

impl Improper {
    /// Creates an improper around `j`, storing the peripheral atoms in ascending order.
    pub fn new(i: usize, j: usize, k: usize, m: usize) -> Self {
        let mut others = [i, k, m];
        others.sort_unstable();
        Self([others[0], j, others[1], others[2]])
    }

    pub fn atoms(&self) -> [usize; 4] {
        self.0
    }

    pub fn center(&self) -> usize {
        self.0[1]
    }
}

/// Angles, dihedrals and impropers enumerated from one bond list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Connectivity {
    angles: Vec<Angle>,
    dihedrals: Vec<Dihedral>,
    impropers: Vec<Improper>,
}

impl Connectivity {
    /// Enumerates every bonded term reachable through the given bonds.
    ///
    /// # Arguments
    ///
    /// * `atom_count` - Number of atoms; every bond index must be smaller.
    /// * `bonds` - Canonical `(i, j)` pairs.
    pub fn from_bonds(atom_count: usize, bonds: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut neighbors = vec![Vec::new(); atom_count];
        let bonds: Vec<(usize, usize)> = bonds.into_iter().collect();
        for &(i, j) in &bonds {
            neighbors[i].push(j);
            neighbors[j].push(i);
        }

        let mut angles = BTreeSet::new();
        for &(i, j) in &bonds {
            for &k in neighbors[i].iter().filter(|&&k| k != j) {
                angles.insert(Angle::new(k, i, j));
            }
            for &k in neighbors[j].iter().filter(|&&k| k != i) {
                angles.insert(Angle::new(i, j, k));
            }
        }

        let mut dihedrals = BTreeSet::new();
        for angle in &angles {
            let [i, j, k] = angle.atoms();
            for &m in neighbors[i].iter().filter(|&&m| m != j && m != k) {
                dihedrals.insert(Dihedral::new(m, i, j, k));
            }
            for &m in neighbors[k].iter().filter(|&&m| m != i && m != j) {
                dihedrals.insert(Dihedral::new(i, j, k, m));
            }
        }

        let mut impropers = BTreeSet::new();
        for (center, bonded) in neighbors.iter().enumerate() {
            let n = bonded.len();
            for a in 0..n {
                for b in (a + 1)..n {
                    for c in (b + 1)..n {
                        impropers.insert(Improper::new(bonded[a], center, bonded[b], bonded[c]));
                    }
                }
            }
        }

        Self {
            angles: angles.into_iter().collect(),
            dihedrals: dihedrals.into_iter().collect(),
            impropers: impropers.into_iter().collect(),
        }
    }

    pub fn angles(&self) -> &[Angle] {
        &self.angles
    }

    pub fn dihedrals(&self) -> &[Dihedral] {
        &self.dihedrals
    }

    pub fn impropers(&self) -> &[Improper] {
        &self.impropers
    }
}
