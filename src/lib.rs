//! # ChemForge
//!
//! **ChemForge** is a pure-Rust library for reading and writing molecular structure and trajectory files. Every format decodes into one shared `Frame` model (atoms, positions, velocities, unit cell, bonds and residues) and can be re-encoded into any other, with connectivity recovered from the files and from residue templates along the way.
//!
//! ## Features
//!
//! - **Step-addressable trajectories** – `Trajectory` records the byte offset of each frame while reading, so steps can be revisited or read out of order without rescanning the file.
//! - **Six text formats** – PDB, GRO, MOL2, SDF, CSSR and LAMMPS data, with transparent gzip support through `flate2`.
//! - **Connectivity inference** – Atom serial remapping, template-driven intra-residue bonds, peptide and phosphodiester links between consecutive residues, and secondary structure labels from PDB records.
//! - **Typed export** – `TypeRegistry` and `guess_molecules` assign dense atom, bond, angle, dihedral and improper type ids and molecule ids for force-field oriented writers.
//! - **Recoverable diagnostics** – Malformed but salvageable input is reported through a pluggable `WarningSink` instead of aborting the read.

mod db;
mod model;

pub mod io;
pub mod ops;
pub mod templates;
pub mod warnings;

pub use model::atom::Atom;
pub use model::cell::{CellShape, UnitCell};
pub use model::connectivity::{Angle, Dihedral, Improper};
pub use model::element::Element;
pub use model::frame::Frame;
pub use model::property::{Properties, Property};
pub use model::residue::Residue;
pub use model::topology::{Bond, Topology, TopologyError};
pub use model::types::{BondOrder, Point, ResidueKind, Vector};
