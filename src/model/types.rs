use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Cartesian position in Ångström.
pub type Point = Point3<f64>;

/// Cartesian displacement, used for velocities and cell vectors.
pub type Vector = Vector3<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
pub enum BondOrder {
    #[default]
    Unknown,
    Single,
    Double,
    Triple,
    Aromatic,
    Amide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ResidueKind {
    Protein,
    Nucleic,
    Solvent,
}

impl BondOrder {
    pub fn value(&self) -> f64 {
        match self {
            BondOrder::Unknown => 0.0,
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
            BondOrder::Amide => 1.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BondOrder::Unknown => "Unknown",
            BondOrder::Single => "Single",
            BondOrder::Double => "Double",
            BondOrder::Triple => "Triple",
            BondOrder::Aromatic => "Aromatic",
            BondOrder::Amide => "Amide",
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for BondOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" | "Single" => Ok(BondOrder::Single),
            "2" | "Double" => Ok(BondOrder::Double),
            "3" | "Triple" => Ok(BondOrder::Triple),
            "ar" | "1.5" | "Aromatic" => Ok(BondOrder::Aromatic),
            "am" | "Amide" => Ok(BondOrder::Amide),
            "du" | "un" | "nc" | "Unknown" => Ok(BondOrder::Unknown),
            _ => Err(format!("Invalid bond order: {}", s)),
        }
    }
}

impl ResidueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResidueKind::Protein => "Protein",
            ResidueKind::Nucleic => "Nucleic",
            ResidueKind::Solvent => "Solvent",
        }
    }
}

impl fmt::Display for ResidueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
