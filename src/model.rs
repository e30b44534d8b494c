//! Serde models for spike template documents, packs, and aliases.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Where a resolved spec came from. Never serialized to callers; precedence
/// is the only consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    #[default]
    Virtual,
    Physical,
}

/// One declared template parameter. Order in the list defines substitution
/// precedence during rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// A file the template creates. Both `path` and `template` may carry
/// `{{param}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTemplate {
    pub path: String,
    #[serde(default, alias = "content")]
    pub template: String,
}

/// A patch applied against an existing file rather than creating a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchTemplate {
    pub path: String,
    #[serde(default)]
    pub diff: String,
}

/// The unit of value: a parameterized code scaffold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    /// Overridden with the store key on read, so stored docs may omit it.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stack: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub files: Vec<FileTemplate>,
    #[serde(default)]
    pub patches: Vec<PatchTemplate>,
    #[serde(skip)]
    pub origin: Origin,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl TemplateSpec {
    /// Parameter defaults keyed by name, in declaration order.
    pub fn param_defaults(&self) -> BTreeMap<String, String> {
        self.params
            .iter()
            .filter_map(|param| {
                param
                    .default
                    .as_ref()
                    .map(|value| (param.name.clone(), value.clone()))
            })
            .collect()
    }
}

/// A named, reusable filter over the combined template space. Packs never own
/// templates; they only narrow enumeration and discovery.
#[derive(Debug, Clone)]
pub struct Pack {
    pub name: &'static str,
    pub lib: Option<&'static str>,
    pub pattern: Option<&'static str>,
    pub style: Option<&'static str>,
    pub lang: Option<&'static str>,
    pub id_filter: Option<&'static str>,
}

/// A curated shortcut mapping a human token to a canonical id plus default
/// parameters.
#[derive(Debug, Clone)]
pub struct AliasEntry {
    pub token: &'static str,
    pub canonical_id: &'static str,
    pub default_params: &'static [(&'static str, &'static str)],
}
