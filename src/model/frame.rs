use super::atom::Atom;
use super::cell::UnitCell;
use super::property::{Properties, Property};
use super::topology::{Topology, TopologyError};
use super::types::{BondOrder, Point, Vector};

/// One snapshot of a system: topology, coordinates, optional velocities and cell.
///
/// Positions and velocities are indexed exactly like the topology atoms. Every mutation that
/// changes the atom count goes through the frame so that the per-atom arrays stay aligned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    topology: Topology,
    positions: Vec<Point>,
    velocities: Option<Vec<Vector>>,
    pub cell: UnitCell,
    properties: Properties,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Appends an atom with its position and, when the frame tracks velocities, its velocity.
    pub fn add_atom(&mut self, atom: Atom, position: Point, velocity: Option<Vector>) {
        self.topology.add_atom(atom);
        self.positions.push(position);
        if let Some(velocities) = &mut self.velocities {
            velocities.push(velocity.unwrap_or_else(Vector::zeros));
        }
    }

    /// Resizes every per-atom array, filling with default atoms at the origin.
    pub fn resize(&mut self, size: usize) {
        self.topology.resize(size);
        self.positions.resize(size, Point::origin());
        if let Some(velocities) = &mut self.velocities {
            velocities.resize(size, Vector::zeros());
        }
    }

    /// Resets the frame to an empty state before a decoder populates it.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Starts tracking velocities, initialized to zero. Does nothing if already tracked.
    pub fn add_velocities(&mut self) {
        if self.velocities.is_none() {
            self.velocities = Some(vec![Vector::zeros(); self.positions.len()]);
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Point] {
        &mut self.positions
    }

    pub fn velocities(&self) -> Option<&[Vector]> {
        self.velocities.as_deref()
    }

    pub fn velocities_mut(&mut self) -> Option<&mut [Vector]> {
        self.velocities.as_deref_mut()
    }

    pub fn add_bond(&mut self, i: usize, j: usize, order: BondOrder) -> Result<(), TopologyError> {
        self.topology.add_bond(i, j, order)
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

    /// Returns the `name` property, as set from titles and molecule names.
    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Property::as_str)
    }
}
