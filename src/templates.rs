//! Read-only access to the embedded standard-residue bond templates.

use crate::db;

pub use crate::db::TemplateView;

/// Looks up a template by residue name or alias (for example `"ALA"`, `"DA"` or `"WAT"`).
pub fn get(name: &str) -> Option<TemplateView<'static>> {
    db::get_template(name)
}
