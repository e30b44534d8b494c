//! Auto-selection: pick one spike for a natural-language task, or return
//! ranked fallbacks when no candidate clears the confidence threshold.
use crate::alias;
use crate::catalog::Catalog;
use crate::discover::{self, RankedSpike};
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Bonus applied when a curated alias already points at the candidate.
const ALIAS_COVERAGE_BONUS: f64 = 0.1;

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AutoSelection {
    Selected {
        selected_spike: String,
        coverage_score: f64,
    },
    /// Below-threshold outcome: the caller disambiguates from these instead
    /// of the engine guessing.
    Fallback { items: Vec<RankedSpike> },
}

/// Drive discovery with the task text, score the top slice against the full
/// requirement, and select only above the configured threshold.
pub fn select(
    catalog: &Catalog,
    task: &str,
    constraints: &BTreeMap<String, String>,
) -> Result<AutoSelection> {
    let config = catalog.config();

    let mut requirement = task.to_string();
    for value in constraints.values() {
        requirement.push(' ');
        requirement.push_str(value);
    }

    let page = discover::discover(catalog, &requirement, config.auto_batch, 0)?;
    if page.items.is_empty() {
        // No candidates is not an error; an empty fallback tells the caller
        // to narrow the query.
        return Ok(AutoSelection::Fallback { items: Vec::new() });
    }

    let tokens = discover::normalize_query(&requirement);
    let alias_targets: Vec<String> = if config.alias_enable {
        alias::resolve(&requirement)
            .into_iter()
            .map(|hit| hit.canonical_id)
            .collect()
    } else {
        Vec::new()
    };

    let top: Vec<RankedSpike> = page.items.into_iter().take(config.auto_top).collect();
    let mut best: Option<(String, f64)> = None;
    for item in &top {
        let Ok(spec) = catalog.resolve(&item.id) else {
            continue;
        };
        let mut coverage = coverage_score(&tokens, &spec.id, &spec.name, &spec.tags, &spec.stack);
        if alias_targets.iter().any(|target| target == &item.id) {
            coverage = (coverage + ALIAS_COVERAGE_BONUS).min(1.0);
        }
        let better = match &best {
            Some((_, best_score)) => coverage > *best_score,
            None => true,
        };
        if better {
            best = Some((item.id.clone(), coverage));
        }
    }

    match best {
        Some((id, coverage)) if coverage >= config.auto_threshold => {
            tracing::info!(spike = %id, coverage, "auto-selection confident");
            Ok(AutoSelection::Selected {
                selected_spike: id,
                coverage_score: coverage,
            })
        }
        _ => {
            tracing::info!(
                candidates = top.len(),
                threshold = config.auto_threshold,
                "auto-selection below threshold, returning fallbacks"
            );
            Ok(AutoSelection::Fallback { items: top })
        }
    }
}

/// Fraction of requirement tokens covered by the candidate's id, name, tags,
/// or stack.
fn coverage_score(
    tokens: &[String],
    id: &str,
    name: &str,
    tags: &std::collections::BTreeSet<String>,
    stack: &std::collections::BTreeSet<String>,
) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let name = name.to_lowercase();
    let covered = tokens
        .iter()
        .filter(|token| {
            tags.contains(token.as_str())
                || stack.contains(token.as_str())
                || id.contains(token.as_str())
                || name.contains(token.as_str())
        })
        .count();
    covered as f64 / tokens.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::store::SpikeStore;
    use tempfile::tempdir;

    fn catalog_with(config: EngineConfig) -> (tempfile::TempDir, Catalog) {
        let dir = tempdir().unwrap();
        let store = SpikeStore::open(dir.path()).unwrap();
        (dir, Catalog::new(store, config))
    }

    fn no_constraints() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn precise_task_selects_confidently() {
        let (_dir, catalog) = catalog_with(EngineConfig::default());
        let selection = select(&catalog, "nextjs route typed ts", &no_constraints()).unwrap();
        match selection {
            AutoSelection::Selected {
                selected_spike,
                coverage_score,
            } => {
                assert!(selected_spike.contains("nextjs-route-typed-ts"), "{selected_spike}");
                assert!(coverage_score >= 0.6);
            }
            other => panic!("expected confident selection, got {other:?}"),
        }
    }

    #[test]
    fn below_threshold_returns_nonempty_fallbacks() {
        let (_dir, catalog) = catalog_with(EngineConfig {
            auto_threshold: 1.1,
            alias_enable: false,
            ..EngineConfig::default()
        });
        let selection = select(&catalog, "express route", &no_constraints()).unwrap();
        match selection {
            AutoSelection::Fallback { items } => {
                assert!(!items.is_empty(), "discovery found candidates, so fallbacks must too");
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn constraints_feed_the_requirement() {
        let (_dir, catalog) = catalog_with(EngineConfig::default());
        let mut constraints = BTreeMap::new();
        constraints.insert("language".to_string(), "py".to_string());
        constraints.insert("framework".to_string(), "fastapi".to_string());
        let selection = select(&catalog, "http route", &constraints).unwrap();
        match selection {
            AutoSelection::Selected { selected_spike, .. } => {
                assert!(selected_spike.contains("fastapi"), "{selected_spike}");
            }
            AutoSelection::Fallback { items } => {
                assert!(items.iter().any(|item| item.id.contains("fastapi")));
            }
        }
    }

    #[test]
    fn empty_discovery_yields_empty_fallback() {
        let (_dir, catalog) = catalog_with(EngineConfig {
            alias_enable: false,
            ..EngineConfig::default()
        });
        let selection = select(&catalog, "qqqqxyzzy", &no_constraints()).unwrap();
        assert_eq!(selection, AutoSelection::Fallback { items: Vec::new() });
    }
}
