//! Catalog façade: one lookup/enumeration surface over the physical overlay
//! store and the virtual synthesizer.
//!
//! Precedence is resolved before any synthesis work is spent: a stored entry
//! shadows the virtual entry of the same id unconditionally. Enumeration
//! never materializes the combinatorial space; it walks it lazily under an
//! explicit cap.
use crate::config::EngineConfig;
use crate::error::{Result, SpikeError};
use crate::id::{self, Prefix, SpikeId};
use crate::model::{Pack, ParamDecl, TemplateSpec};
use crate::store::{self, SpikeStore};
use crate::synth;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Static pack definitions; read-only at runtime.
const PACKS: &[Pack] = &[
    Pack {
        name: "nextjs-core",
        lib: Some("nextjs"),
        pattern: None,
        style: None,
        lang: None,
        id_filter: None,
    },
    Pack {
        name: "secure-api",
        lib: None,
        pattern: Some("route"),
        style: Some("secure"),
        lang: None,
        id_filter: None,
    },
    Pack {
        name: "python-web",
        lib: None,
        pattern: None,
        style: None,
        lang: Some("py"),
        id_filter: None,
    },
    Pack {
        name: "rust-backend",
        lib: None,
        pattern: None,
        style: None,
        lang: Some("rs"),
        id_filter: None,
    },
    Pack {
        name: "data-layer",
        lib: None,
        pattern: None,
        style: None,
        lang: None,
        id_filter: Some("-(schema|model|crud|migration)-"),
    },
    Pack {
        name: "strike-minimal",
        lib: None,
        pattern: None,
        style: None,
        lang: None,
        id_filter: Some("^strike-"),
    },
    Pack {
        name: "testing",
        lib: None,
        pattern: None,
        style: Some("testing"),
        lang: None,
        id_filter: None,
    },
];

/// Dimension filter for enumeration. Empty vectors match everything.
#[derive(Debug, Default, Clone)]
pub struct EnumerateFilter {
    pub prefix: Option<Prefix>,
    pub libs: Vec<String>,
    pub patterns: Vec<String>,
    pub styles: Vec<String>,
    pub langs: Vec<String>,
    pub id_regex: Option<String>,
    pub pack: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogStats {
    pub physical: usize,
    pub virtual_space: u64,
    pub libraries: usize,
    pub patterns: usize,
    pub styles: usize,
    pub langs: usize,
    pub list_limit: usize,
    pub generated_limit: usize,
    pub packs: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct SeedMergeOptions {
    pub merge_metadata: bool,
    pub overwrite: bool,
    pub prefix: Option<String>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct SeedMergeReport {
    pub written: usize,
    pub merged: usize,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    spikes: Vec<TemplateSpec>,
}

pub struct Catalog {
    store: SpikeStore,
    config: EngineConfig,
}

impl Catalog {
    pub fn new(store: SpikeStore, config: EngineConfig) -> Catalog {
        Catalog { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &SpikeStore {
        &self.store
    }

    pub fn pack_names() -> Vec<&'static str> {
        PACKS.iter().map(|pack| pack.name).collect()
    }

    /// Resolve an id: physical entry first, virtual synthesis on a miss.
    /// Synthesis is never attempted for an id the store already holds.
    pub fn resolve(&self, id: &str) -> Result<TemplateSpec> {
        if let Some(spec) = self.store.read(id)? {
            return Ok(spec);
        }
        let parsed = SpikeId::parse(id).map_err(|_| SpikeError::NotFound(id.to_string()))?;
        Ok(synth::synthesize(&parsed))
    }

    /// All stored ids, in the store's stable order.
    pub fn physical_ids(&self) -> Result<Vec<String>> {
        self.store.ids()
    }

    /// Lazily walk the combined space: physical entries first (store order),
    /// then virtual entries in dimension-vocabulary order, truncated at the
    /// configured listing cap.
    pub fn enumerate(&self, filter: &EnumerateFilter, limit: Option<usize>) -> Result<Vec<String>> {
        let cap = limit
            .unwrap_or(self.config.list_limit)
            .min(self.config.list_limit);
        self.walk(filter, cap)
    }

    fn walk(&self, filter: &EnumerateFilter, cap: usize) -> Result<Vec<String>> {
        let matcher = FilterMatcher::compile(filter)?;
        let mut ids = Vec::new();

        let physical = self.store.ids()?;
        for id in &physical {
            if ids.len() >= cap {
                return Ok(ids);
            }
            if matcher.matches(id) {
                ids.push(id.clone());
            }
        }

        let shadowed: BTreeSet<&String> = physical.iter().collect();
        for prefix in Prefix::ALL {
            if filter.prefix.is_some_and(|wanted| wanted != prefix) {
                continue;
            }
            for lib in id::LIBRARIES {
                for pattern in id::PATTERNS {
                    for style in id::STYLES {
                        for lang in id::LANGS {
                            if ids.len() >= cap {
                                return Ok(ids);
                            }
                            let id =
                                SpikeId::new(prefix, lib, pattern, style, lang).to_string();
                            if shadowed.contains(&id) {
                                continue;
                            }
                            if matcher.matches(&id) {
                                ids.push(id);
                            }
                        }
                    }
                }
            }
        }
        Ok(ids)
    }

    /// Write or overwrite a physical entry from a raw document. The document
    /// must parse as a template spec; the stored bytes are exactly `doc`.
    pub fn upsert(&self, id: &str, doc: &str) -> Result<()> {
        store::validate_id(id)?;
        let _: TemplateSpec = serde_yaml::from_str(doc)
            .map_err(|err| SpikeError::Validation(format!("parse document for {id}: {err}")))?;
        self.store.write(id, doc)
    }

    /// Bulk-load a seed document into the overlay store.
    ///
    /// With `merge_metadata`, an existing target keeps its `files`/`patches`
    /// untouched: only `stack`/`tags` (set union) and `params` (name-keyed
    /// union) change.
    pub fn merge_from_seed(
        &self,
        seed_path: &Path,
        opts: &SeedMergeOptions,
    ) -> Result<SeedMergeReport> {
        let raw = fs::read_to_string(seed_path)
            .map_err(|err| SpikeError::io(format!("read seed {}", seed_path.display()), err))?;
        let seed: SeedFile = serde_yaml::from_str(&raw)
            .map_err(|err| SpikeError::Validation(format!("parse seed file: {err}")))?;

        let mut report = SeedMergeReport::default();
        for mut incoming in seed.spikes {
            let target_id = match &opts.prefix {
                Some(prefix) => format!("{prefix}{}", incoming.id),
                None => incoming.id.clone(),
            };
            store::validate_id(&target_id)?;
            incoming.id = target_id.clone();

            match self.store.read(&target_id)? {
                Some(mut existing) if opts.merge_metadata => {
                    merge_metadata(&mut existing, &incoming);
                    self.store.write_spec(&existing)?;
                    report.merged += 1;
                }
                Some(_) if opts.overwrite => {
                    self.store.write_spec(&incoming)?;
                    report.written += 1;
                }
                Some(_) => {
                    report.skipped += 1;
                }
                None => {
                    self.store.write_spec(&incoming)?;
                    report.written += 1;
                }
            }
        }
        tracing::info!(
            written = report.written,
            merged = report.merged,
            skipped = report.skipped,
            "seed merge complete"
        );
        Ok(report)
    }

    /// Materialize up to `count` virtual entries into the overlay store.
    /// Bounded by the generated-spikes cap, surfaced with the cap value.
    pub fn materialize(&self, filter: &EnumerateFilter, count: usize) -> Result<usize> {
        if count > self.config.generated_limit {
            return Err(SpikeError::GenerationLimit {
                requested: count,
                cap: self.config.generated_limit,
            });
        }
        let ids = self.walk(filter, count)?;
        let mut written = 0usize;
        for id in ids {
            if self.store.contains(&id) {
                continue;
            }
            let spec = self.resolve(&id)?;
            self.store.write_spec(&spec)?;
            written += 1;
        }
        Ok(written)
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        Ok(CatalogStats {
            physical: self.store.ids()?.len(),
            virtual_space: id::virtual_space_size(),
            libraries: id::LIBRARIES.len(),
            patterns: id::PATTERNS.len(),
            styles: id::STYLES.len(),
            langs: id::LANGS.len(),
            list_limit: self.config.list_limit,
            generated_limit: self.config.generated_limit,
            packs: Self::pack_names().iter().map(|name| name.to_string()).collect(),
        })
    }

    /// Human-readable description of a spike, derived from its metadata.
    pub fn explain(&self, id: &str) -> Result<String> {
        let spec = self.resolve(id)?;
        let mut out = String::new();
        out.push_str(&format!("{} ({})\n", spec.name, spec.id));
        out.push_str(&format!("version: {}\n", spec.version));
        if !spec.description.is_empty() {
            out.push_str(&format!("{}\n", spec.description));
        }
        if !spec.stack.is_empty() {
            let stack: Vec<&str> = spec.stack.iter().map(String::as_str).collect();
            out.push_str(&format!("stack: {}\n", stack.join(", ")));
        }
        if !spec.tags.is_empty() {
            let tags: Vec<&str> = spec.tags.iter().map(String::as_str).collect();
            out.push_str(&format!("tags: {}\n", tags.join(", ")));
        }
        if !spec.params.is_empty() {
            out.push_str("params:\n");
            for param in &spec.params {
                out.push_str(&format!("  - {}{}", param.name, param_suffix(param)));
                out.push('\n');
            }
        }
        out.push_str(&format!(
            "artifacts: {} file(s), {} patch(es)\n",
            spec.files.len(),
            spec.patches.len()
        ));
        Ok(out)
    }
}

fn param_suffix(param: &ParamDecl) -> String {
    match (&param.default, param.required) {
        (Some(default), _) => format!(" (default: {default})"),
        (None, true) => " (required)".to_string(),
        (None, false) => String::new(),
    }
}

fn merge_metadata(existing: &mut TemplateSpec, incoming: &TemplateSpec) {
    existing.stack.extend(incoming.stack.iter().cloned());
    existing.tags.extend(incoming.tags.iter().cloned());
    for param in &incoming.params {
        if !existing
            .params
            .iter()
            .any(|existing_param| existing_param.name == param.name)
        {
            existing.params.push(param.clone());
        }
    }
}

struct FilterMatcher<'a> {
    filter: &'a EnumerateFilter,
    id_regex: Option<Regex>,
    pack: Option<&'static Pack>,
    pack_regex: Option<Regex>,
}

impl<'a> FilterMatcher<'a> {
    fn compile(filter: &'a EnumerateFilter) -> Result<FilterMatcher<'a>> {
        let id_regex = match &filter.id_regex {
            Some(raw) => Some(
                Regex::new(raw)
                    .map_err(|err| SpikeError::Validation(format!("bad id filter: {err}")))?,
            ),
            None => None,
        };
        let pack = match &filter.pack {
            Some(name) => Some(
                PACKS
                    .iter()
                    .find(|pack| pack.name == name)
                    .ok_or_else(|| SpikeError::Validation(format!("unknown pack {name:?}")))?,
            ),
            None => None,
        };
        let pack_regex = match pack.and_then(|pack| pack.id_filter) {
            Some(raw) => Some(
                Regex::new(raw)
                    .map_err(|err| SpikeError::Validation(format!("bad pack filter: {err}")))?,
            ),
            None => None,
        };
        Ok(FilterMatcher {
            filter,
            id_regex,
            pack,
            pack_regex,
        })
    }

    fn matches(&self, id: &str) -> bool {
        if self.id_regex.as_ref().is_some_and(|regex| !regex.is_match(id)) {
            return false;
        }
        if self.pack_regex.as_ref().is_some_and(|regex| !regex.is_match(id)) {
            return false;
        }

        let dims = SpikeId::parse(id).ok();
        let needs_dims = self.filter.prefix.is_some()
            || !self.filter.libs.is_empty()
            || !self.filter.patterns.is_empty()
            || !self.filter.styles.is_empty()
            || !self.filter.langs.is_empty()
            || self.pack.is_some_and(|pack| {
                pack.lib.is_some() || pack.pattern.is_some() || pack.style.is_some() || pack.lang.is_some()
            });
        let Some(dims) = dims else {
            // Unparseable ids can only match filters that don't constrain dims.
            return !needs_dims;
        };

        if self.filter.prefix.is_some_and(|prefix| prefix != dims.prefix) {
            return false;
        }
        if !self.filter.libs.is_empty() && !self.filter.libs.contains(&dims.lib) {
            return false;
        }
        if !self.filter.patterns.is_empty() && !self.filter.patterns.contains(&dims.pattern) {
            return false;
        }
        if !self.filter.styles.is_empty() && !self.filter.styles.contains(&dims.style) {
            return false;
        }
        if !self.filter.langs.is_empty() && !self.filter.langs.contains(&dims.lang) {
            return false;
        }
        if let Some(pack) = self.pack {
            if pack.lib.is_some_and(|lib| lib != dims.lib) {
                return false;
            }
            if pack.pattern.is_some_and(|pattern| pattern != dims.pattern) {
                return false;
            }
            if pack.style.is_some_and(|style| style != dims.style) {
                return false;
            }
            if pack.lang.is_some_and(|lang| lang != dims.lang) {
                return false;
            }
        }
        true
    }
}
