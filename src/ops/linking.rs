//! Template-driven bond reconstruction for standard residues.
//!
//! Formats such as PDB only list bonds for hetero groups, so the bonds inside amino acids,
//! nucleotides and water are rebuilt from the embedded residue templates. Consecutive
//! residues of a chain are joined through their backbone atoms: the carbonyl carbon of a
//! peptide to the amide nitrogen of the next one, and the O3' of a nucleotide to the
//! phosphorus of the next one.

use crate::db;
use crate::model::residue::Residue;
use crate::model::topology::{Topology, TopologyError};
use crate::model::types::BondOrder;
use crate::warnings::{WarningSink, warning};
use std::collections::HashMap;

/// Open link waiting for the next residue of a chain.
#[derive(Debug, Clone, Copy)]
struct PendingLink {
    atom: usize,
    resid: i64,
}

/// Builder that adds template bonds and chain links to a topology.
///
/// Both kinds of chain link are enabled by default and can be switched off with the
/// builder-style setters.
#[derive(Debug, Clone)]
pub struct ResidueLinker {
    link_peptides: bool,
    link_nucleic_acids: bool,
    context: &'static str,
}

impl Default for ResidueLinker {
    fn default() -> Self {
        Self {
            link_peptides: true,
            link_nucleic_acids: true,
            context: "residue linking",
        }
    }
}

impl ResidueLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables C to N bonds between consecutive amino acids.
    pub fn link_peptides(mut self, enabled: bool) -> Self {
        self.link_peptides = enabled;
        self
    }

    /// Enables or disables O3' to P bonds between consecutive nucleotides.
    pub fn link_nucleic_acids(mut self, enabled: bool) -> Self {
        self.link_nucleic_acids = enabled;
        self
    }

    /// Sets the prefix used for the warnings emitted while linking.
    pub fn context(mut self, context: &'static str) -> Self {
        self.context = context;
        self
    }

    /// Adds template and chain-link bonds to `topology`.
    ///
    /// Residues are visited in topology order. A residue is only considered when its name
    /// (or one of its aliases) has a template; a link is only closed when the residue id
    /// directly follows the id of the residue that opened it.
    ///
    /// # Returns
    ///
    /// The number of bond insertions performed, including pairs that were already bonded.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] if a residue references an atom outside the topology.
    pub fn link(&self, topology: &mut Topology, sink: &dyn WarningSink) -> Result<usize, TopologyError> {
        let mut bonds: Vec<(usize, usize, BondOrder)> = Vec::new();
        let mut peptide: Option<PendingLink> = None;
        let mut nucleic: Option<PendingLink> = None;

        for residue in topology.residues() {
            let Some(template) = db::get_template(&residue.name) else {
                continue;
            };

            let atoms: HashMap<&str, usize> = residue
                .atoms()
                .filter_map(|i| topology.atom(i).map(|atom| (atom.name.as_str(), i)))
                .collect();

            for (a1, a2, order) in template.bonds() {
                if let (Some(&i), Some(&j)) = (atoms.get(a1), atoms.get(a2)) {
                    bonds.push((i, j, order));
                }
            }
            for name in template.atom_names() {
                if !atoms.contains_key(name) {
                    self.report_missing(name, residue, sink);
                }
            }

            let Some(resid) = residue.id else {
                warning!(
                    sink,
                    self.context,
                    "residue '{}' has no id, it will not be linked to its neighbors",
                    residue.name
                );
                continue;
            };

            if self.link_peptides {
                if let (Some(open), Some(&n)) = (peptide.take(), atoms.get("N")) {
                    if open.resid.checked_add(1) == Some(resid) {
                        bonds.push((open.atom, n, BondOrder::Single));
                    }
                }
                peptide = atoms.get("C").map(|&atom| PendingLink { atom, resid });
            }

            if self.link_nucleic_acids {
                if let (Some(open), Some(&p)) = (nucleic.take(), atoms.get("P")) {
                    if open.resid.checked_add(1) == Some(resid) {
                        bonds.push((open.atom, p, BondOrder::Single));
                    }
                }
                nucleic = atoms.get("O3'").map(|&atom| PendingLink { atom, resid });
            }
        }

        let count = bonds.len();
        for (i, j, order) in bonds {
            topology.add_bond(i, j, order)?;
        }
        log::debug!("{}: added {} template and link bond(s)", self.context, count);
        Ok(count)
    }

    fn report_missing(&self, name: &str, residue: &Residue, sink: &dyn WarningSink) {
        if is_optional_atom(name) {
            return;
        }
        let resid = residue
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string());
        warning!(
            sink,
            self.context,
            "found unexpected, non-standard atom '{}' in residue '{}' (resid {})",
            name,
            residue.name,
            resid
        );
    }
}

/// Hydrogens, terminal oxygens and phosphate atoms are routinely absent from files.
fn is_optional_atom(name: &str) -> bool {
    name.starts_with('H') || name == "OXT" || name.starts_with('P') || name.starts_with("OP")
}
