use crate::model::types::{BondOrder, ResidueKind};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ResidueTemplateFile {
    pub info: TemplateInfo,
    #[serde(default)]
    pub bonds: Vec<TemplateBond>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TemplateInfo {
    pub name: String,
    pub kind: ResidueKind,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TemplateBond {
    pub a1: String,
    pub a2: String,
    pub order: BondOrder,
}
