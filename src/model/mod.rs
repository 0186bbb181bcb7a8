//! Core data structures modeling molecular systems.
//!
//! This module defines the in-memory representation every format decodes into and encodes
//! from: atoms, residues, bonds and derived bonded terms, unit cells, and frames. The types
//! are consumed and mutated by the format readers, the connectivity operations, and the
//! typed export routines.

pub mod atom;
pub mod cell;
pub mod connectivity;
pub mod element;
pub mod frame;
pub mod property;
pub mod residue;
pub mod topology;
pub mod types;
