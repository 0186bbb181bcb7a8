//! Operations that derive chemistry from decoded frames.
//!
//! Connectivity inference lives in `remap`, `linking` and `secondary`; typed export relies
//! on the `registry` and on `molecules`.

mod linking;
mod molecules;
mod registry;
mod remap;
mod secondary;

pub use linking::ResidueLinker;
pub use molecules::guess_molecules;
pub use registry::{
    AngleType, AtomType, BondType, DihedralType, ImproperType, TypeRegistry, normalize_angle,
    normalize_bond, normalize_dihedral, normalize_improper,
};
pub use remap::AtomIdRemap;
pub use secondary::{ResidueKey, SecondaryStructure, helix_label};
