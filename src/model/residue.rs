use super::property::{Properties, Property};
use std::collections::BTreeSet;
use std::fmt;

/// Named group of atom indices with structural metadata.
///
/// Residues reference atoms by their index in the owning topology. The atom set is kept
/// sorted and unique so membership tests are cheap and iteration is deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Residue {
    pub name: String,
    pub id: Option<i64>,
    atoms: BTreeSet<usize>,
    properties: Properties,
}

impl Residue {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_id(name: &str, id: i64) -> Self {
        Self {
            name: name.to_string(),
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn add_atom(&mut self, index: usize) {
        self.atoms.insert(index);
    }

    pub(crate) fn retain_atoms(&mut self, mut keep: impl FnMut(usize) -> bool) {
        self.atoms.retain(|&i| keep(i));
    }

    pub fn contains(&self, index: usize) -> bool {
        self.atoms.contains(&index)
    }

    pub fn atoms(&self) -> impl Iterator<Item = usize> + '_ {
        self.atoms.iter().copied()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
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

    /// Returns the chain identifier recorded by the reader, if any.
    pub fn chain_id(&self) -> Option<&str> {
        self.get("chainid").and_then(Property::as_str)
    }
}

impl fmt::Display for Residue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "Residue {{ name: \"{}\", id: {}", self.name, id)?,
            None => write!(f, "Residue {{ name: \"{}\"", self.name)?,
        }
        write!(f, ", atoms: {} }}", self.atom_count())
    }
}
