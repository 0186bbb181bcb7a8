//! Internal database API exposing read-only views over residue bond templates.
//!
//! Callers obtain [`TemplateView`] handles keyed by residue name (or one of its aliases),
//! enabling the connectivity layer to iterate template bonds without cloning the underlying
//! schema.

mod loader;
mod schema;
mod store;

use crate::model::types::{BondOrder, ResidueKind};

/// Retrieves a template by its canonical name or one of its aliases.
///
/// # Arguments
///
/// * `name` - Residue name such as `"ALA"`, `"DA"` or `"WAT"`.
///
/// # Returns
///
/// `Some(TemplateView)` when the template exists, otherwise `None`.
pub fn get_template(name: &str) -> Option<TemplateView<'static>> {
    let store = store::get_store();
    let canonical = store
        .alias_to_name
        .get(name)
        .map(String::as_str)
        .unwrap_or(name);
    store
        .templates_by_name
        .get(canonical)
        .map(TemplateView::new)
}

/// Lightweight wrapper granting read-only access to a stored template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateView<'a> {
    inner: &'a store::InternalTemplate,
}

impl<'a> TemplateView<'a> {
    /// Creates a new view from the internal store entry.
    pub fn new(inner: &'a store::InternalTemplate) -> Self {
        Self { inner }
    }

    /// Returns the canonical residue name stored in the schema.
    pub fn name(&self) -> &'a str {
        &self.inner.schema.info.name
    }

    pub fn kind(&self) -> ResidueKind {
        self.inner.schema.info.kind
    }

    /// Iterates bonds as name pairs plus their bond order.
    ///
    /// # Returns
    ///
    /// An iterator over `(atom1, atom2, BondOrder)` tuples mirroring the schema definition.
    pub fn bonds(&self) -> impl Iterator<Item = (&'a str, &'a str, BondOrder)> {
        self.inner
            .schema
            .bonds
            .iter()
            .map(|b| (b.a1.as_str(), b.a2.as_str(), b.order))
    }

    /// Iterates every atom name referenced by a bond, in first-appearance order.
    pub fn atom_names(&self) -> impl Iterator<Item = &'a str> {
        let mut seen: Vec<&'a str> = Vec::new();
        for (a1, a2, _) in self.bonds() {
            for name in [a1, a2] {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        seen.into_iter()
    }
}
