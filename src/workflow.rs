//! Application workflow: preview, apply, and validate a spike against a
//! caller-supplied snapshot of their tree.
//!
//! The engine never mutates a filesystem. Apply returns a resolution plan and
//! diffs; acting on them is the caller's responsibility.
use crate::catalog::Catalog;
use crate::diff::{self, MergeOutcome};
use crate::error::Result;
use crate::render::{self, RenderedSpike};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Caller-reported current file contents, keyed by relative path.
pub type FileSnapshot = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ApplyStrategy {
    Overwrite,
    ThreeWayMerge,
    Abort,
}

#[derive(Debug, Serialize)]
pub struct FileDiff {
    pub path: String,
    pub diff: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewReport {
    pub rendered: RenderedSpike,
    /// Diffs against the snapshot; absent entries mean no snapshot was given.
    pub diffs: Vec<FileDiff>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Unchanged,
    Overwrite,
    Merge,
    Conflict,
}

#[derive(Debug, Serialize)]
pub struct FileAction {
    pub path: String,
    pub kind: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    /// Merge candidate (possibly with conflict markers) for three-way merges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyPlan {
    pub strategy: ApplyStrategy,
    pub actions: Vec<FileAction>,
    pub conflicts: usize,
    /// Set under the `abort` strategy when any region conflicts; the caller
    /// should stop.
    pub should_abort: bool,
}

#[derive(Debug, Serialize)]
pub struct ApplyReport {
    pub rendered: RenderedSpike,
    pub plan: ApplyPlan,
}

#[derive(Debug, Serialize)]
pub struct DriftEntry {
    pub path: String,
    pub expected_sha256: String,
    pub actual_sha256: String,
}

#[derive(Debug, Serialize)]
pub struct DriftReport {
    pub expected_files: usize,
    pub matching: usize,
    pub missing: Vec<String>,
    pub modified: Vec<DriftEntry>,
    pub clean: bool,
}

/// Render and diff without mutating anything.
pub fn preview(
    catalog: &Catalog,
    id: &str,
    params: &BTreeMap<String, String>,
    snapshot: Option<&FileSnapshot>,
) -> Result<PreviewReport> {
    let spec = catalog.resolve(id)?;
    let rendered = render::render(&spec, params)?;

    let mut diffs = Vec::new();
    if let Some(snapshot) = snapshot {
        for file in &rendered.files {
            let current = snapshot.get(&file.path).map(String::as_str).unwrap_or("");
            let diff = diff::unified(&file.path, current, &file.content);
            if !diff.is_empty() {
                diffs.push(FileDiff {
                    path: file.path.clone(),
                    diff,
                });
            }
        }
    }
    Ok(PreviewReport { rendered, diffs })
}

/// Render plus a conflict-resolution plan. Returns diffs only; no file is
/// written here.
pub fn apply(
    catalog: &Catalog,
    id: &str,
    params: &BTreeMap<String, String>,
    strategy: ApplyStrategy,
    snapshot: &FileSnapshot,
    base: Option<&FileSnapshot>,
) -> Result<ApplyReport> {
    let spec = catalog.resolve(id)?;
    let rendered = render::render(&spec, params)?;

    let mut actions = Vec::new();
    let mut conflicts = 0usize;
    for file in &rendered.files {
        let current = snapshot.get(&file.path);
        let action = match current {
            None => FileAction {
                path: file.path.clone(),
                kind: ActionKind::Create,
                diff: Some(diff::unified(&file.path, "", &file.content)),
                merged: None,
            },
            Some(current) if current == &file.content => FileAction {
                path: file.path.clone(),
                kind: ActionKind::Unchanged,
                diff: None,
                merged: None,
            },
            Some(current) => match strategy {
                ApplyStrategy::Overwrite => FileAction {
                    path: file.path.clone(),
                    kind: ActionKind::Overwrite,
                    diff: Some(diff::unified(&file.path, current, &file.content)),
                    merged: None,
                },
                ApplyStrategy::Abort => {
                    conflicts += 1;
                    FileAction {
                        path: file.path.clone(),
                        kind: ActionKind::Conflict,
                        diff: Some(diff::unified(&file.path, current, &file.content)),
                        merged: None,
                    }
                }
                ApplyStrategy::ThreeWayMerge => {
                    let base_content = base
                        .and_then(|base| base.get(&file.path))
                        .map(String::as_str)
                        .unwrap_or("");
                    match diff::three_way(base_content, current, &file.content) {
                        MergeOutcome::Clean(merged) => FileAction {
                            path: file.path.clone(),
                            kind: ActionKind::Merge,
                            diff: Some(diff::unified(&file.path, current, &merged)),
                            merged: Some(merged),
                        },
                        MergeOutcome::Conflicted {
                            merged,
                            conflicts: regions,
                        } => {
                            conflicts += regions;
                            FileAction {
                                path: file.path.clone(),
                                kind: ActionKind::Conflict,
                                diff: Some(diff::unified(&file.path, current, &merged)),
                                merged: Some(merged),
                            }
                        }
                    }
                }
            },
        };
        actions.push(action);
    }

    let should_abort = strategy == ApplyStrategy::Abort && conflicts > 0;
    tracing::info!(
        spike = id,
        strategy = ?strategy,
        conflicts,
        should_abort,
        "apply plan computed"
    );
    Ok(ApplyReport {
        rendered,
        plan: ApplyPlan {
            strategy,
            actions,
            conflicts,
            should_abort,
        },
    })
}

/// Re-render and report drift between the expected artifacts and the
/// caller-reported current state. Mutates nothing.
pub fn validate(
    catalog: &Catalog,
    id: &str,
    params: &BTreeMap<String, String>,
    snapshot: &FileSnapshot,
) -> Result<DriftReport> {
    let spec = catalog.resolve(id)?;
    let rendered = render::render(&spec, params)?;

    let mut missing = Vec::new();
    let mut modified = Vec::new();
    let mut matching = 0usize;
    for file in &rendered.files {
        match snapshot.get(&file.path) {
            None => missing.push(file.path.clone()),
            Some(current) if current == &file.content => matching += 1,
            Some(current) => modified.push(DriftEntry {
                path: file.path.clone(),
                expected_sha256: sha256_hex(file.content.as_bytes()),
                actual_sha256: sha256_hex(current.as_bytes()),
            }),
        }
    }

    let clean = missing.is_empty() && modified.is_empty();
    Ok(DriftReport {
        expected_files: rendered.files.len(),
        matching,
        missing,
        modified,
        clean,
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
