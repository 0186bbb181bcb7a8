//! Atom identity and per-atom chemical data.
//!
//! Atoms carry a name (as found in the file), a chemical type label used for typing and
//! mass lookup, optional explicit mass and charge, and an open property set. Positions and
//! velocities are stored by the owning [`Frame`](super::frame::Frame) so that the topology can
//! be shared between snapshots without copying coordinates.

use super::element::Element;
use super::property::{Properties, Property};
use smol_str::SmolStr;
use std::fmt;

/// A single atom of a topology.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Atom {
    /// Atom name as it appears in the source file (e.g., `CA`, `O121`).
    pub name: SmolStr,
    /// Chemical type label, usually an element symbol.
    pub atom_type: SmolStr,
    mass: Option<f64>,
    charge: Option<f64>,
    properties: Properties,
}

impl Atom {
    /// Creates an atom whose type is the same as its name.
    pub fn new(name: &str) -> Self {
        Self::with_type(name, name)
    }

    /// Creates an atom with distinct name and type labels.
    pub fn with_type(name: &str, atom_type: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            atom_type: SmolStr::new(atom_type),
            mass: None,
            charge: None,
            properties: Properties::new(),
        }
    }

    /// Returns the atomic mass in Da.
    ///
    /// An explicitly set mass wins; otherwise the periodic table entry matching the type
    /// label is used, and `0.0` when the type is not an element.
    pub fn mass(&self) -> f64 {
        self.mass.unwrap_or_else(|| {
            Element::find_ignore_case(&self.atom_type)
                .map(|e| e.mass)
                .unwrap_or(0.0)
        })
    }

    pub fn explicit_mass(&self) -> Option<f64> {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f64) {
        self.mass = Some(mass);
    }

    /// Returns the partial charge, defaulting to neutral.
    pub fn charge(&self) -> f64 {
        self.charge.unwrap_or(0.0)
    }

    pub fn explicit_charge(&self) -> Option<f64> {
        self.charge
    }

    pub fn set_charge(&mut self, charge: f64) {
        self.charge = Some(charge);
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Property>) {
        self.properties.insert(name.to_string(), value.into());
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Atom {{ name: \"{}\", type: \"{}\", mass: {:.3}, charge: {:.3} }}",
            self.name,
            self.atom_type,
            self.mass(),
            self.charge()
        )
    }
}
