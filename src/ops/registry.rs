//! Canonical type registry used by typed export formats.
//!
//! Typed formats such as LAMMPS data files do not store per-atom labels; they store dense
//! integer type ids for atoms and for every bonded term. The registry collects the distinct
//! atom types of a topology (a type label together with a mass) and derives bond, angle,
//! dihedral and improper types from the atom type ids of their members. Every term is
//! normalized before lookup so that a term and its reversal share one id.

use crate::model::atom::Atom;
use crate::model::topology::Topology;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::hash::Hash;

/// Distinct atom type, identified by its label and mass.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomType {
    pub name: SmolStr,
    pub mass: f64,
}

/// Bond type as a pair of atom type ids.
pub type BondType = [usize; 2];
/// Angle type as a triplet of atom type ids, center in the middle.
pub type AngleType = [usize; 3];
/// Dihedral type as four atom type ids along the bond path.
pub type DihedralType = [usize; 4];
/// Improper type as four atom type ids, center in second position.
pub type ImproperType = [usize; 4];

/// Set that hands out dense ids in first-insertion order.
#[derive(Debug, Clone)]
struct OrderedSet<K> {
    items: Vec<K>,
    ids: HashMap<K, usize>,
}

impl<K> Default for OrderedSet<K> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            ids: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> OrderedSet<K> {
    fn insert(&mut self, key: K) -> usize {
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        let id = self.items.len();
        self.items.push(key.clone());
        self.ids.insert(key, id);
        id
    }

    fn get(&self, key: &K) -> Option<usize> {
        self.ids.get(key).copied()
    }
}

/// Immutable registry of the atom and bonded-term types of one topology.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    atom_keys: OrderedSet<(SmolStr, u64)>,
    atom_types: Vec<AtomType>,
    atom_ids: Vec<usize>,
    bonds: OrderedSet<BondType>,
    angles: OrderedSet<AngleType>,
    dihedrals: OrderedSet<DihedralType>,
    impropers: OrderedSet<ImproperType>,
}

impl TypeRegistry {
    /// Collects every type used by `topology`.
    ///
    /// Atom types are registered in atom order, bonded types in the order in which the
    /// topology lists its bonds, angles, dihedrals and impropers.
    pub fn new(topology: &Topology) -> Self {
        let mut registry = Self::default();

        for atom in topology.atoms() {
            let key = atom_key(atom);
            let id = registry.atom_keys.insert(key);
            if id == registry.atom_types.len() {
                registry.atom_types.push(AtomType {
                    name: atom.atom_type.clone(),
                    mass: atom.mass(),
                });
            }
            registry.atom_ids.push(id);
        }

        for bond in topology.bonds() {
            let key = normalize_bond(registry.atom_types_of([bond.a1_idx, bond.a2_idx]));
            registry.bonds.insert(key);
        }
        for angle in topology.angles() {
            let key = normalize_angle(registry.atom_types_of(angle.atoms()));
            registry.angles.insert(key);
        }
        for dihedral in topology.dihedrals() {
            let key = normalize_dihedral(registry.atom_types_of(dihedral.atoms()));
            registry.dihedrals.insert(key);
        }
        for improper in topology.impropers() {
            let key = normalize_improper(registry.atom_types_of(improper.atoms()));
            registry.impropers.insert(key);
        }

        log::debug!(
            "registered {} atom, {} bond, {} angle, {} dihedral and {} improper type(s)",
            registry.atom_types.len(),
            registry.bonds.items.len(),
            registry.angles.items.len(),
            registry.dihedrals.items.len(),
            registry.impropers.items.len()
        );
        registry
    }

    pub fn atoms(&self) -> &[AtomType] {
        &self.atom_types
    }

    pub fn bonds(&self) -> &[BondType] {
        &self.bonds.items
    }

    pub fn angles(&self) -> &[AngleType] {
        &self.angles.items
    }

    pub fn dihedrals(&self) -> &[DihedralType] {
        &self.dihedrals.items
    }

    pub fn impropers(&self) -> &[ImproperType] {
        &self.impropers.items
    }

    /// Type id of an atom, looked up by label and mass.
    ///
    /// # Panics
    ///
    /// Panics when the atom type was not registered.
    pub fn atom_type_id(&self, atom: &Atom) -> usize {
        self.atom_keys
            .get(&atom_key(atom))
            .unwrap_or_else(|| panic!("atom type '{}' is not registered, this is a bug", atom.atom_type))
    }

    /// Type id of the atom at `index` in the registered topology.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range.
    pub fn atom_type_of(&self, index: usize) -> usize {
        match self.atom_ids.get(index) {
            Some(&id) => id,
            None => panic!("atom {} is not part of the registered topology, this is a bug", index),
        }
    }

    /// Id of a bond type given as two atom type ids, in either order.
    ///
    /// # Panics
    ///
    /// Panics when the bond type was not registered.
    pub fn bond_type_id(&self, bond: BondType) -> usize {
        let key = normalize_bond(bond);
        self.bonds
            .get(&key)
            .unwrap_or_else(|| panic!("bond type {:?} is not registered, this is a bug", key))
    }

    /// # Panics
    ///
    /// Panics when the angle type was not registered.
    pub fn angle_type_id(&self, angle: AngleType) -> usize {
        let key = normalize_angle(angle);
        self.angles
            .get(&key)
            .unwrap_or_else(|| panic!("angle type {:?} is not registered, this is a bug", key))
    }

    /// # Panics
    ///
    /// Panics when the dihedral type was not registered.
    pub fn dihedral_type_id(&self, dihedral: DihedralType) -> usize {
        let key = normalize_dihedral(dihedral);
        self.dihedrals
            .get(&key)
            .unwrap_or_else(|| panic!("dihedral type {:?} is not registered, this is a bug", key))
    }

    /// The central atom type sits in second position.
    ///
    /// # Panics
    ///
    /// Panics when the improper type was not registered.
    pub fn improper_type_id(&self, improper: ImproperType) -> usize {
        let key = normalize_improper(improper);
        self.impropers
            .get(&key)
            .unwrap_or_else(|| panic!("improper type {:?} is not registered, this is a bug", key))
    }

    /// Bond type id of the bond between the atoms at `i` and `j`.
    pub fn bond_type_of(&self, i: usize, j: usize) -> usize {
        self.bond_type_id(self.atom_types_of([i, j]))
    }

    pub fn angle_type_of(&self, i: usize, j: usize, k: usize) -> usize {
        self.angle_type_id(self.atom_types_of([i, j, k]))
    }

    pub fn dihedral_type_of(&self, i: usize, j: usize, k: usize, m: usize) -> usize {
        self.dihedral_type_id(self.atom_types_of([i, j, k, m]))
    }

    /// `j` is the central atom.
    pub fn improper_type_of(&self, i: usize, j: usize, k: usize, m: usize) -> usize {
        self.improper_type_id(self.atom_types_of([i, j, k, m]))
    }

    fn atom_types_of<const N: usize>(&self, atoms: [usize; N]) -> [usize; N] {
        atoms.map(|index| self.atom_type_of(index))
    }
}

fn atom_key(atom: &Atom) -> (SmolStr, u64) {
    let mass = atom.mass();
    // -0.0 and 0.0 are the same mass
    let mass = if mass == 0.0 { 0.0 } else { mass };
    (atom.atom_type.clone(), mass.to_bits())
}

pub fn normalize_bond([i, j]: BondType) -> BondType {
    [i.min(j), i.max(j)]
}

pub fn normalize_angle([i, j, k]: AngleType) -> AngleType {
    if i <= k { [i, j, k] } else { [k, j, i] }
}

/// Orients a dihedral so that the outer pair holding the larger id comes last.
///
/// Ties on the maxima are broken by the minima; a full tie keeps the lexicographically
/// smaller orientation.
pub fn normalize_dihedral([i, j, k, m]: DihedralType) -> DihedralType {
    use std::cmp::Ordering;

    let forward = [i, j, k, m];
    let reverse = [m, k, j, i];
    let ordering = i
        .max(j)
        .cmp(&k.max(m))
        .then_with(|| i.min(j).cmp(&k.min(m)));
    match ordering {
        Ordering::Less => forward,
        Ordering::Greater => reverse,
        Ordering::Equal => forward.min(reverse),
    }
}

pub fn normalize_improper([i, j, k, m]: ImproperType) -> ImproperType {
    let mut others = [i, k, m];
    others.sort_unstable();
    [others[0], j, others[1], others[2]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::BondOrder;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn topology(types: &[&str], bonds: &[(usize, usize)]) -> Topology {
        let mut topology = Topology::new();
        for (n, ty) in types.iter().enumerate() {
            topology.add_atom(Atom::with_type(&format!("X{n}"), ty));
        }
        for &(i, j) in bonds {
            topology.add_bond(i, j, BondOrder::Single).unwrap();
        }
        topology
    }

    #[test]
    fn water_has_one_bond_and_one_angle_type() {
        let topology = topology(&["O", "H", "H"], &[(0, 1), (0, 2)]);
        let registry = TypeRegistry::new(&topology);

        assert_eq!(registry.atoms().len(), 2);
        assert_eq!(registry.atoms()[0].name, "O");
        assert!((registry.atoms()[0].mass - 15.999).abs() < 1e-2);
        assert_eq!(registry.bonds(), &[[0, 1]]);
        assert_eq!(registry.angles(), &[[1, 0, 1]]);
        assert!(registry.dihedrals().is_empty());
        assert_eq!(registry.bond_type_of(2, 0), 0);
        assert_eq!(registry.angle_type_of(2, 0, 1), 0);
    }

    #[test]
    fn atom_types_follow_first_appearance() {
        let topology = topology(&["H", "C", "H", "O", "C"], &[]);
        let registry = TypeRegistry::new(&topology);

        let names: Vec<&str> = registry.atoms().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["H", "C", "O"]);
        assert_eq!(registry.atom_type_of(4), 1);
        assert_eq!(registry.atom_type_id(&Atom::new("O")), 2);
    }

    #[test]
    fn same_label_with_different_mass_is_a_different_type() {
        let mut topology = Topology::new();
        let mut heavy = Atom::new("H");
        heavy.set_mass(2.014);
        topology.add_atom(Atom::new("H"));
        topology.add_atom(heavy);

        let registry = TypeRegistry::new(&topology);
        assert_eq!(registry.atoms().len(), 2);
    }

    #[test]
    fn butane_like_chain_registers_reversible_terms_once() {
        // C-C-C-C with hydrogen ends: H0-C1-C2-C3-C4-H5
        let topology = topology(
            &["H", "C", "C", "C", "C", "H"],
            &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)],
        );
        let registry = TypeRegistry::new(&topology);

        assert_eq!(registry.bonds().len(), 2);
        assert_eq!(registry.angles().len(), 2);
        assert_eq!(registry.dihedrals().len(), 2);
        assert_eq!(
            registry.dihedral_type_of(0, 1, 2, 3),
            registry.dihedral_type_of(5, 4, 3, 2)
        );
    }

    #[test]
    fn improper_types_ignore_peripheral_order() {
        let topology = topology(&["N", "C", "O", "H"], &[(0, 1), (0, 2), (0, 3)]);
        let registry = TypeRegistry::new(&topology);

        assert_eq!(registry.impropers().len(), 1);
        assert_eq!(registry.impropers()[0][1], 0);
        assert_eq!(
            registry.improper_type_of(1, 0, 2, 3),
            registry.improper_type_of(3, 0, 1, 2)
        );
    }

    #[test]
    fn type_id_lookups_accept_either_orientation() {
        // H0-C1-C2-O3
        let topology = topology(&["H", "C", "C", "O"], &[(0, 1), (1, 2), (2, 3)]);
        let registry = TypeRegistry::new(&topology);
        let [h, c, o] = [0, 1, 2];

        assert_eq!(registry.bond_type_id([c, h]), registry.bond_type_id([h, c]));
        assert_eq!(registry.bond_type_id([c, h]), registry.bond_type_of(0, 1));
        assert_eq!(registry.angle_type_id([o, c, c]), registry.angle_type_id([c, c, o]));
        assert_eq!(
            registry.dihedral_type_id([o, c, c, h]),
            registry.dihedral_type_id([h, c, c, o])
        );
        assert_eq!(
            registry.dihedral_type_id([h, c, c, o]),
            registry.dihedral_type_of(3, 2, 1, 0)
        );
    }

    #[test]
    #[should_panic(expected = "this is a bug")]
    fn unregistered_bond_type_panics() {
        let registry = TypeRegistry::new(&topology(&["O", "H"], &[(0, 1)]));
        registry.bond_type_id([0, 0]);
    }

    #[test]
    fn building_twice_gives_identical_ids() {
        let types = ["C", "C", "O", "H", "H", "N"];
        let bonds = [(0, 1), (1, 2), (0, 3), (0, 4), (1, 5), (2, 4)];
        let topology = topology(&types, &bonds);

        let first = TypeRegistry::new(&topology);
        let second = TypeRegistry::new(&topology);

        assert_eq!(first.atoms(), second.atoms());
        assert_eq!(first.bonds(), second.bonds());
        assert_eq!(first.angles(), second.angles());
        assert_eq!(first.dihedrals(), second.dihedrals());
        assert_eq!(first.impropers(), second.impropers());
        assert!(!first.dihedrals().is_empty());
        assert!(!first.impropers().is_empty());

        for i in 0..topology.atom_count() {
            assert_eq!(first.atom_type_of(i), second.atom_type_of(i));
        }
        for bond in topology.bonds() {
            let (i, j) = (bond.a1_idx, bond.a2_idx);
            assert_eq!(first.bond_type_of(i, j), second.bond_type_of(i, j));
        }
        for angle in topology.angles() {
            let [i, j, k] = angle.atoms();
            assert_eq!(first.angle_type_of(i, j, k), second.angle_type_of(i, j, k));
        }
        for dihedral in topology.dihedrals() {
            let [i, j, k, m] = dihedral.atoms();
            assert_eq!(
                first.dihedral_type_of(i, j, k, m),
                second.dihedral_type_of(i, j, k, m)
            );
        }
        for improper in topology.impropers() {
            let [i, j, k, m] = improper.atoms();
            assert_eq!(
                first.improper_type_of(i, j, k, m),
                second.improper_type_of(i, j, k, m)
            );
        }
    }

    #[test]
    #[should_panic(expected = "this is a bug")]
    fn unknown_atom_type_panics() {
        let registry = TypeRegistry::new(&topology(&["C"], &[]));
        registry.atom_type_id(&Atom::new("Xe"));
    }

    #[test]
    fn dihedral_normalization_is_reversal_invariant() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let d: [usize; 4] = std::array::from_fn(|_| rng.random_range(0..4));
            let reversed = [d[3], d[2], d[1], d[0]];
            assert_eq!(normalize_dihedral(d), normalize_dihedral(reversed), "{d:?}");
        }
        assert_eq!(normalize_dihedral([1, 0, 0, 1]), [1, 0, 0, 1]);
        assert_eq!(normalize_dihedral([3, 0, 1, 2]), [2, 1, 0, 3]);
    }

    #[test]
    fn type_sets_do_not_depend_on_bond_insertion_order() {
        let types = ["C", "C", "O", "H", "H", "N"];
        let mut bonds = vec![(0, 1), (1, 2), (0, 3), (0, 4), (1, 5), (2, 4)];
        let reference = TypeRegistry::new(&topology(&types, &bonds));

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            bonds.shuffle(&mut rng);
            let registry = TypeRegistry::new(&topology(&types, &bonds));

            let mut expected = reference.bonds().to_vec();
            let mut actual = registry.bonds().to_vec();
            expected.sort();
            actual.sort();
            assert_eq!(actual, expected);

            let mut expected = reference.dihedrals().to_vec();
            let mut actual = registry.dihedrals().to_vec();
            expected.sort();
            actual.sort();
            assert_eq!(actual, expected);
        }
    }
}
