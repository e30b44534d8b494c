//! Pure template rendering: `{{param}}` substitution over paths, file
//! bodies, and patch bodies. Never touches a filesystem.
use crate::error::{Result, SpikeError};
use crate::model::TemplateSpec;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RenderedFile {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RenderedPatch {
    pub path: String,
    pub diff: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RenderedSpike {
    pub files: Vec<RenderedFile>,
    pub patches: Vec<RenderedPatch>,
}

/// Substitute caller params into a spec's file and patch templates.
///
/// A required parameter with no default and no caller value fails closed; an
/// empty string is never silently substituted.
pub fn render(spec: &TemplateSpec, params: &BTreeMap<String, String>) -> Result<RenderedSpike> {
    let resolved = resolve_params(spec, params)?;

    let files = spec
        .files
        .iter()
        .map(|file| RenderedFile {
            path: substitute(&file.path, &resolved),
            content: substitute(&file.template, &resolved),
        })
        .collect();
    let patches = spec
        .patches
        .iter()
        .map(|patch| RenderedPatch {
            path: substitute(&patch.path, &resolved),
            diff: substitute(&patch.diff, &resolved),
        })
        .collect();

    Ok(RenderedSpike { files, patches })
}

/// Defaults first, caller values second; declaration order defines the
/// substitution precedence between params.
fn resolve_params(
    spec: &TemplateSpec,
    params: &BTreeMap<String, String>,
) -> Result<Vec<(String, String)>> {
    let mut missing = Vec::new();
    let mut resolved = Vec::new();
    for decl in &spec.params {
        let value = params
            .get(&decl.name)
            .cloned()
            .or_else(|| decl.default.clone());
        match value {
            Some(value) => resolved.push((decl.name.clone(), value)),
            None if decl.required => missing.push(decl.name.clone()),
            None => {}
        }
    }
    if !missing.is_empty() {
        return Err(SpikeError::Validation(format!(
            "missing required parameters for {}: {}",
            spec.id,
            missing.join(", ")
        )));
    }
    // Caller-only params not declared by the spec still substitute.
    for (name, value) in params {
        if !resolved.iter().any(|(existing, _)| existing == name) {
            resolved.push((name.clone(), value.clone()));
        }
    }
    Ok(resolved)
}

fn substitute(template: &str, params: &[(String, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in params {
        out = out.replace(&format!("{{{{{name}}}}}"), value);
        out = out.replace(&format!("{{{{ {name} }}}}"), value);
    }
    out
}
