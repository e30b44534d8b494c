//! Two-phase discovery over the combined template space.
//!
//! CoarseScan scores ids and tags without loading file bodies over a
//! candidate universe capped by the metadata multiplier; FineScore reloads
//! full metadata for the surviving slice in fixed-size batches. Ranking is an
//! approximation by design, and `total` is an estimate, not an exact count of
//! the unbounded space.
use crate::alias;
use crate::catalog::Catalog;
use crate::error::Result;
use crate::id::{self, Prefix, SpikeId};
use crate::model::TemplateSpec;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// Fine-scoring batch size: how many specs are resolved per chunk while
/// re-ranking the surviving slice.
const FINE_SCORE_BATCH: usize = 16;

/// Base score for an alias-sourced candidate, multiplied by the configured
/// alias boost so curated shortcuts outrank generic text matches.
const ALIAS_BASE_SCORE: f64 = 10.0;

const DIM_EXACT_WEIGHT: f64 = 3.0;
const DIM_PARTIAL_WEIGHT: f64 = 1.5;
const ID_SUBSTRING_WEIGHT: f64 = 0.5;
const TAG_WEIGHT: f64 = 2.0;
const STACK_WEIGHT: f64 = 1.5;
const NAME_WEIGHT: f64 = 1.0;
const DESCRIPTION_WEIGHT: f64 = 0.5;

/// Known non-English query terms mapped to canonical English tokens.
const NON_ENGLISH_TERMS: &[(&str, &str)] = &[
    ("セキュア", "secure"),
    ("ルート", "route"),
    ("認証", "auth"),
    ("ミドルウェア", "middleware"),
    ("テスト", "testing"),
    ("データベース", "database"),
    ("キュー", "queue"),
    ("フック", "hook"),
    ("コンポーネント", "component"),
    ("決済", "payments"),
];

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "for", "i", "in", "me", "my", "need", "of", "the", "to", "want", "with",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedSpike {
    pub id: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryPage {
    pub items: Vec<RankedSpike>,
    /// Estimated match count; the space is never enumerated exhaustively.
    pub total: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateSource {
    Alias,
    Metadata,
}

struct Candidate {
    coarse: f64,
    source: CandidateSource,
}

/// Rank the combined space against a free-text query.
pub fn discover(catalog: &Catalog, query: &str, limit: usize, offset: usize) -> Result<DiscoveryPage> {
    let config = catalog.config();
    let limit = limit.clamp(1, config.list_limit);
    let start = Instant::now();

    let tokens = normalize_query(query);
    let universe_cap = limit.saturating_mul(config.metadata_multiplier).max(limit);

    let mut candidates: BTreeMap<String, Candidate> = BTreeMap::new();

    if config.alias_enable {
        for hit in alias::resolve(query) {
            candidates.insert(
                hit.canonical_id,
                Candidate {
                    coarse: ALIAS_BASE_SCORE * config.alias_boost,
                    source: CandidateSource::Alias,
                },
            );
        }
    }

    for id in catalog.physical_ids()? {
        let score = coarse_score(&tokens, &id);
        if score > 0.0 {
            candidates
                .entry(id)
                .or_insert(Candidate {
                    coarse: score,
                    source: CandidateSource::Metadata,
                });
        }
    }

    let mut virtual_seen = 0usize;
    'outer: for prefix in Prefix::ALL {
        for lib in matched_or_all(&tokens, id::LIBRARIES) {
            for pattern in matched_or_all(&tokens, id::PATTERNS) {
                for style in matched_or_all(&tokens, id::STYLES) {
                    for lang in matched_or_all(&tokens, id::LANGS) {
                        if virtual_seen >= universe_cap {
                            break 'outer;
                        }
                        virtual_seen += 1;
                        let id = SpikeId::new(prefix, lib, pattern, style, lang).to_string();
                        let score = coarse_score(&tokens, &id);
                        if score > 0.0 {
                            candidates.entry(id).or_insert(Candidate {
                                coarse: score,
                                source: CandidateSource::Metadata,
                            });
                        }
                    }
                }
            }
        }
    }

    let mut ranked: Vec<(String, Candidate)> = candidates.into_iter().collect();
    ranked.sort_by(|(id_a, a), (id_b, b)| {
        b.coarse
            .partial_cmp(&a.coarse)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| id_a.cmp(id_b))
    });
    let total = ranked.len();

    // Fine scoring only for the slice that can reach the requested page.
    let pool = (offset + limit).max(limit * 2).min(ranked.len());
    let mut fine: Vec<RankedSpike> = Vec::with_capacity(pool);
    for chunk in ranked[..pool].chunks(FINE_SCORE_BATCH) {
        for (id, candidate) in chunk {
            let score = match catalog.resolve(id) {
                Ok(spec) => candidate.coarse + fine_score(&tokens, &spec),
                // A candidate that stopped resolving keeps its coarse score.
                Err(_) => candidate.coarse,
            };
            let score = if candidate.source == CandidateSource::Alias {
                score.max(candidate.coarse)
            } else {
                score
            };
            fine.push(RankedSpike {
                id: id.clone(),
                score,
            });
        }
    }
    fine.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let items: Vec<RankedSpike> = fine.into_iter().skip(offset).take(limit).collect();
    tracing::debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        tokens = tokens.len(),
        total,
        returned = items.len(),
        "discovery complete"
    );
    Ok(DiscoveryPage {
        items,
        total,
        offset,
    })
}

/// Lowercase, map known non-English terms, then split on non-alphanumerics.
pub fn normalize_query(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for (term, canonical) in NON_ENGLISH_TERMS {
        if query.contains(term) {
            tokens.push((*canonical).to_string());
        }
    }
    let lowered = query.to_lowercase();
    for token in lowered.split(|ch: char| !ch.is_ascii_alphanumeric()) {
        if token.len() < 2 || STOPWORDS.contains(&token) {
            continue;
        }
        if !tokens.iter().any(|existing| existing == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Cheap textual match against the id alone; file bodies are never loaded
/// during the coarse phase.
fn coarse_score(tokens: &[String], id: &str) -> f64 {
    if tokens.is_empty() {
        return 1.0;
    }
    let dims = SpikeId::parse(id).ok();
    let mut score = 0.0;
    for token in tokens {
        if let Some(dims) = &dims {
            let slots = [
                dims.lib.as_str(),
                dims.pattern.as_str(),
                dims.style.as_str(),
                dims.lang.as_str(),
            ];
            if slots.contains(&token.as_str()) {
                score += DIM_EXACT_WEIGHT;
                continue;
            }
            if token.len() >= 3 && slots.iter().any(|slot| slot.contains(token.as_str())) {
                score += DIM_PARTIAL_WEIGHT;
                continue;
            }
        }
        if id.contains(token.as_str()) {
            score += ID_SUBSTRING_WEIGHT;
        }
    }
    score
}

fn fine_score(tokens: &[String], spec: &TemplateSpec) -> f64 {
    let name = spec.name.to_lowercase();
    let description = spec.description.to_lowercase();
    let mut score = 0.0;
    for token in tokens {
        if spec.tags.contains(token.as_str()) {
            score += TAG_WEIGHT;
        }
        if spec.stack.contains(token.as_str()) {
            score += STACK_WEIGHT;
        }
        if name.contains(token.as_str()) {
            score += NAME_WEIGHT;
        }
        if description.contains(token.as_str()) {
            score += DESCRIPTION_WEIGHT;
        }
    }
    score
}

/// Dimension values matched by any query token, or the whole vocabulary when
/// nothing matches (the cap still bounds the walk).
fn matched_or_all<'a>(tokens: &[String], vocabulary: &'a [&'a str]) -> Vec<&'a str> {
    let matched: Vec<&str> = vocabulary
        .iter()
        .copied()
        .filter(|value| {
            tokens.iter().any(|token| {
                token == value || (token.len() >= 3 && value.contains(token.as_str()))
            })
        })
        .collect();
    if matched.is_empty() {
        vocabulary.to_vec()
    } else {
        matched
    }
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

    #[test]
    fn total_is_never_below_returned_items() {
        let (_dir, catalog) = catalog_with(EngineConfig::default());
        let page = discover(&catalog, "nextjs route", 10, 0).unwrap();
        assert!(page.total >= page.items.len());
        assert!(!page.items.is_empty());
    }

    #[test]
    fn exact_dimension_hits_rank_first() {
        let (_dir, catalog) = catalog_with(EngineConfig {
            alias_enable: false,
            ..EngineConfig::default()
        });
        let page = discover(&catalog, "nextjs route typed ts", 5, 0).unwrap();
        let top = SpikeId::parse(&page.items[0].id).unwrap();
        assert_eq!(top.lib, "nextjs");
        assert_eq!(top.pattern, "route");
    }

    #[test]
    fn japanese_terms_map_to_canonical_tokens() {
        let tokens = normalize_query("セキュアなルートを作る");
        assert!(tokens.contains(&"secure".to_string()));
        assert!(tokens.contains(&"route".to_string()));

        let (_dir, catalog) = catalog_with(EngineConfig::default());
        let page = discover(&catalog, "セキュア ルート", 5, 0).unwrap();
        assert!(!page.items.is_empty());
        let top = SpikeId::parse(&page.items[0].id).unwrap();
        assert_eq!(top.style, "secure");
    }

    #[test]
    fn alias_candidates_outrank_text_matches_when_enabled() {
        let (_dir, catalog) = catalog_with(EngineConfig::default());
        let page = discover(&catalog, "[alias: rust-api]", 5, 0).unwrap();
        assert_eq!(page.items[0].id, "gen-axum-route-typed-rs");
    }

    #[test]
    fn disabled_aliases_add_no_candidates() {
        let (_dir, catalog) = catalog_with(EngineConfig {
            alias_enable: false,
            ..EngineConfig::default()
        });
        let page = discover(&catalog, "[alias: rust-api]", 5, 0).unwrap();
        assert!(page
            .items
            .iter()
            .all(|item| item.id != "gen-axum-route-typed-rs" || item.score < 10.0));
    }

    #[test]
    fn pagination_is_stable_for_a_fixed_catalog() {
        let (_dir, catalog) = catalog_with(EngineConfig::default());
        let first = discover(&catalog, "express", 5, 0).unwrap();
        let second = discover(&catalog, "express", 5, 5).unwrap();
        let again = discover(&catalog, "express", 5, 0).unwrap();
        assert_eq!(first.items, again.items);
        for item in &second.items {
            assert!(
                !first.items.iter().any(|earlier| earlier.id == item.id),
                "page overlap on {}",
                item.id
            );
        }
    }

    #[test]
    fn physical_entries_join_the_candidate_pool() {
        let (_dir, catalog) = catalog_with(EngineConfig::default());
        catalog
            .upsert(
                "gen-zebra-stack-route-basic-ts",
                "id: gen-zebra-stack-route-basic-ts\nname: Zebra route\ntags: [zebra]\n",
            )
            .unwrap();
        // No vocabulary dimension matches "zebra"; only the authored entry can.
        let page = discover(&catalog, "zebra", 10, 0).unwrap();
        assert!(page
            .items
            .iter()
            .any(|item| item.id == "gen-zebra-stack-route-basic-ts"));
    }

    #[test]
    fn empty_query_still_lists_bounded_results() {
        let (_dir, catalog) = catalog_with(EngineConfig::default());
        let page = discover(&catalog, "", 5, 0).unwrap();
        assert_eq!(page.items.len(), 5);
        assert!(page.total >= 5);
    }
}
