//! Combinatorial spike-template catalog and discovery engine.
//!
//! The catalog advertises a virtual space of 100k+ parameterized scaffolds
//! synthesized on demand from an id grammar, overlaid by a flat-file store of
//! hand-authored entries that always take precedence. Discovery ranks that
//! combined space against free-text queries under explicit memory caps, and
//! the application workflow renders, diffs, and plans without ever mutating
//! the caller's tree.

pub mod alias;
pub mod autoselect;
pub mod catalog;
pub mod config;
pub mod diff;
pub mod discover;
pub mod error;
pub mod id;
pub mod model;
pub mod render;
pub mod store;
pub mod synth;
pub mod workflow;

pub use catalog::{Catalog, CatalogStats, EnumerateFilter, SeedMergeOptions, SeedMergeReport};
pub use config::EngineConfig;
pub use error::SpikeError;
pub use id::SpikeId;
pub use model::TemplateSpec;
pub use store::SpikeStore;
