//! Alias resolver: curated shortcuts from human tokens to canonical spike
//! ids, fed into discovery as boosted candidates.
use crate::model::AliasEntry;
use regex::Regex;
use std::collections::BTreeMap;

/// Static alias table. Read-only at runtime; enablement and weighting come
/// from configuration.
pub const ALIASES: &[AliasEntry] = &[
    AliasEntry {
        token: "next-api",
        canonical_id: "gen-nextjs-route-typed-ts",
        default_params: &[("route_path", "/api/example")],
    },
    AliasEntry {
        token: "auth",
        canonical_id: "gen-next-auth-provider-secure-ts",
        default_params: &[],
    },
    AliasEntry {
        token: "login",
        canonical_id: "gen-next-auth-provider-secure-ts",
        default_params: &[],
    },
    AliasEntry {
        token: "jwt",
        canonical_id: "gen-express-middleware-secure-ts",
        default_params: &[("secret_var", "JWT_SECRET")],
    },
    AliasEntry {
        token: "crud",
        canonical_id: "gen-prisma-crud-typed-ts",
        default_params: &[("entity", "item")],
    },
    AliasEntry {
        token: "upload",
        canonical_id: "gen-express-route-advanced-ts",
        default_params: &[("route_path", "/upload")],
    },
    AliasEntry {
        token: "payments",
        canonical_id: "gen-stripe-webhook-secure-ts",
        default_params: &[],
    },
    AliasEntry {
        token: "queue-worker",
        canonical_id: "gen-rabbitmq-worker-advanced-ts",
        default_params: &[("service_name", "worker")],
    },
    AliasEntry {
        token: "component",
        canonical_id: "gen-react-component-typed-ts",
        default_params: &[],
    },
    AliasEntry {
        token: "rust-api",
        canonical_id: "gen-axum-route-typed-rs",
        default_params: &[],
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAlias {
    pub token: String,
    pub canonical_id: String,
    pub params: BTreeMap<String, String>,
}

/// Resolve aliases in free text.
///
/// An explicit `[alias: token]` marker is exact and wins outright: when any
/// marker matches the table, only marker hits are returned. Otherwise known
/// tokens are matched as substrings of the lowercased text.
pub fn resolve(text: &str) -> Vec<ResolvedAlias> {
    let marker_hits = marker_tokens(text)
        .into_iter()
        .filter_map(|token| {
            ALIASES
                .iter()
                .find(|entry| entry.token == token)
                .map(to_resolved)
        })
        .collect::<Vec<_>>();
    if !marker_hits.is_empty() {
        return dedupe(marker_hits);
    }

    let haystack = text.to_lowercase();
    let hits = ALIASES
        .iter()
        .filter(|entry| haystack.contains(entry.token))
        .map(to_resolved)
        .collect();
    dedupe(hits)
}

fn marker_tokens(text: &str) -> Vec<String> {
    let Ok(marker) = Regex::new(r"\[alias:\s*([a-z0-9_-]+)\]") else {
        return Vec::new();
    };
    marker
        .captures_iter(&text.to_lowercase())
        .map(|captures| captures[1].to_string())
        .collect()
}

fn to_resolved(entry: &AliasEntry) -> ResolvedAlias {
    ResolvedAlias {
        token: entry.token.to_string(),
        canonical_id: entry.canonical_id.to_string(),
        params: entry
            .default_params
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
    }
}

fn dedupe(hits: Vec<ResolvedAlias>) -> Vec<ResolvedAlias> {
    let mut seen = std::collections::BTreeSet::new();
    hits.into_iter()
        .filter(|hit| seen.insert(hit.canonical_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_takes_priority_over_free_text() {
        let hits = resolve("add login [alias: crud] to the app");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].canonical_id, "gen-prisma-crud-typed-ts");
    }

    #[test]
    fn free_text_matches_substrings() {
        let hits = resolve("I need JWT auth for the API");
        let ids: Vec<&str> = hits.iter().map(|hit| hit.canonical_id.as_str()).collect();
        assert!(ids.contains(&"gen-express-middleware-secure-ts"));
        assert!(ids.contains(&"gen-next-auth-provider-secure-ts"));
    }

    #[test]
    fn default_params_ride_along() {
        let hits = resolve("[alias: jwt]");
        assert_eq!(
            hits[0].params.get("secret_var").map(String::as_str),
            Some("JWT_SECRET")
        );
    }

    #[test]
    fn duplicate_targets_collapse() {
        let hits = resolve("login auth");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn no_match_is_empty_not_an_error() {
        assert!(resolve("completely unrelated prose").is_empty());
    }
}
