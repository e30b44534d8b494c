//! Spike id grammar: `<prefix><lib>-<pattern>-<style>-<lang>`.
//!
//! The grammar doubles as the index into the virtual template space: every
//! well-formed id maps to exactly one synthesizable spec, so the catalog can
//! advertise the full cartesian product without storing it.
use crate::error::{Result, SpikeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Library dimension. Longest-match order is derived from this list, so
/// compound names (`next-auth`, `drizzle-orm`) must appear verbatim.
pub const LIBRARIES: &[&str] = &[
    "nextjs", "react", "vue", "svelte", "angular", "solid", "astro", "remix", "express", "fastify",
    "hono", "koa", "nestjs", "django", "flask", "fastapi", "rails", "laravel", "spring", "axum",
    "actix", "rocket", "gin", "echo", "fiber", "prisma", "drizzle-orm", "typeorm", "sequelize",
    "mongoose", "sqlalchemy", "diesel", "redis", "postgres", "mysql", "sqlite", "mongodb", "kafka",
    "rabbitmq", "graphql", "trpc", "react-query", "next-auth", "passport", "jwt", "zod", "stripe",
    "tailwind",
];

pub const PATTERNS: &[&str] = &[
    "route",
    "middleware",
    "service",
    "client",
    "component",
    "hook",
    "schema",
    "model",
    "crud",
    "listener",
    "worker",
    "job",
    "config",
    "adapter",
    "provider",
    "migration",
    "webhook",
    "cli",
];

pub const STYLES: &[&str] = &[
    "basic", "typed", "advanced", "secure", "testing", "minimal", "edge",
];

pub const LANGS: &[&str] = &["ts", "js", "py", "go", "rs", "java", "kt", "rb", "php"];

/// Generation family. `gen-` spikes carry full scaffolds, `strike-` spikes a
/// minimal cut of the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prefix {
    Gen,
    Strike,
}

impl Prefix {
    pub const ALL: [Prefix; 2] = [Prefix::Gen, Prefix::Strike];

    pub fn as_str(self) -> &'static str {
        match self {
            Prefix::Gen => "gen-",
            Prefix::Strike => "strike-",
        }
    }

    pub fn parse(s: &str) -> Option<Prefix> {
        match s {
            "gen" | "gen-" => Some(Prefix::Gen),
            "strike" | "strike-" => Some(Prefix::Strike),
            _ => None,
        }
    }
}

/// Parsed spike id. `Display` is the inverse of [`SpikeId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpikeId {
    pub prefix: Prefix,
    pub lib: String,
    pub pattern: String,
    pub style: String,
    pub lang: String,
}

impl SpikeId {
    pub fn new(prefix: Prefix, lib: &str, pattern: &str, style: &str, lang: &str) -> SpikeId {
        SpikeId {
            prefix,
            lib: lib.to_string(),
            pattern: pattern.to_string(),
            style: style.to_string(),
            lang: lang.to_string(),
        }
    }

    /// Parse an id back into its dimensions.
    ///
    /// Library tokens may contain dashes, so the library slot is matched
    /// longest-first against the fixed vocabulary. When no vocabulary entry
    /// fits, everything except the final three segments is treated as the
    /// library (best-effort split, round-trip safe).
    pub fn parse(id: &str) -> Result<SpikeId> {
        let (prefix, rest) = if let Some(rest) = id.strip_prefix("gen-") {
            (Prefix::Gen, rest)
        } else if let Some(rest) = id.strip_prefix("strike-") {
            (Prefix::Strike, rest)
        } else {
            return Err(SpikeError::parse(id, "missing gen-/strike- prefix"));
        };

        let segments: Vec<&str> = rest.split('-').collect();
        if segments.len() < 4 {
            return Err(SpikeError::parse(id, "expected at least four dimension slots"));
        }
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(SpikeError::parse(id, "empty dimension segment"));
        }

        for lib in libraries_longest_first() {
            let Some(tail) = rest.strip_prefix(lib) else {
                continue;
            };
            let Some(tail) = tail.strip_prefix('-') else {
                continue;
            };
            let parts: Vec<&str> = tail.split('-').collect();
            if parts.len() == 3 {
                return Ok(SpikeId::new(prefix, lib, parts[0], parts[1], parts[2]));
            }
        }

        // Best-effort: the last three segments are pattern/style/lang, the
        // remainder is an unknown (possibly compound) library.
        let lib = segments[..segments.len() - 3].join("-");
        let tail = &segments[segments.len() - 3..];
        Ok(SpikeId::new(prefix, &lib, tail[0], tail[1], tail[2]))
    }

    /// True when every dimension comes from the fixed vocabularies, i.e. the
    /// id lies inside the advertised virtual space.
    pub fn in_vocabulary(&self) -> bool {
        LIBRARIES.contains(&self.lib.as_str())
            && PATTERNS.contains(&self.pattern.as_str())
            && STYLES.contains(&self.style.as_str())
            && LANGS.contains(&self.lang.as_str())
    }
}

impl fmt::Display for SpikeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}-{}-{}-{}",
            self.prefix.as_str(),
            self.lib,
            self.pattern,
            self.style,
            self.lang
        )
    }
}

fn libraries_longest_first() -> Vec<&'static str> {
    let mut libs: Vec<&'static str> = LIBRARIES.to_vec();
    libs.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    libs
}

/// Cardinality of the virtual space advertised by the catalog.
pub fn virtual_space_size() -> u64 {
    Prefix::ALL.len() as u64
        * LIBRARIES.len() as u64
        * PATTERNS.len() as u64
        * STYLES.len() as u64
        * LANGS.len() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_over_full_vocabulary() {
        for prefix in Prefix::ALL {
            for lib in LIBRARIES {
                for pattern in PATTERNS.iter().take(3) {
                    for style in STYLES.iter().take(2) {
                        for lang in LANGS.iter().take(2) {
                            let id = SpikeId::new(prefix, lib, pattern, style, lang);
                            let parsed = SpikeId::parse(&id.to_string()).unwrap();
                            assert_eq!(parsed, id, "round trip for {id}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn compound_library_prefers_longest_vocabulary_match() {
        let parsed = SpikeId::parse("gen-react-query-hook-typed-ts").unwrap();
        assert_eq!(parsed.lib, "react-query");
        assert_eq!(parsed.pattern, "hook");

        let parsed = SpikeId::parse("strike-next-auth-provider-secure-ts").unwrap();
        assert_eq!(parsed.lib, "next-auth");
        assert_eq!(parsed.pattern, "provider");
    }

    #[test]
    fn unknown_compound_library_round_trips() {
        let parsed = SpikeId::parse("gen-acme-billing-sdk-route-basic-ts").unwrap();
        assert_eq!(parsed.lib, "acme-billing-sdk");
        assert_eq!(parsed.pattern, "route");
        assert_eq!(parsed.style, "basic");
        assert_eq!(parsed.lang, "ts");
        assert_eq!(parsed.to_string(), "gen-acme-billing-sdk-route-basic-ts");
    }

    #[test]
    fn rejects_short_and_unprefixed_ids() {
        assert!(SpikeId::parse("gen-express-route-ts").is_err());
        assert!(SpikeId::parse("express-route-typed-ts").is_err());
        assert!(SpikeId::parse("gen-express--typed-ts").is_err());
    }

    #[test]
    fn advertised_space_exceeds_one_hundred_thousand() {
        assert!(virtual_space_size() > 100_000, "{}", virtual_space_size());
    }
}
