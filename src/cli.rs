//! CLI argument parsing for the spike catalog.
//!
//! The CLI is intentionally thin: each subcommand maps onto one engine
//! operation and prints its report as JSON, so the same core logic can sit
//! behind any transport.
use clap::{Parser, Subcommand};
use fluorite_spikes::workflow::ApplyStrategy;
use std::path::PathBuf;

/// Root CLI entrypoint for the spike catalog.
#[derive(Parser, Debug)]
#[command(
    name = "fspike",
    version,
    about = "Spike template catalog and discovery engine",
    after_help = "Examples:\n  fspike discover \"nextjs secure route\"\n  fspike auto \"jwt middleware for express\" --constraint lang=ts\n  fspike preview gen-nextjs-route-typed-ts --param route_path=/api/users\n  fspike apply gen-nextjs-route-typed-ts --strategy three_way_merge --dir .\n  fspike list --pack secure-api --limit 20\n  fspike upsert my-custom-spike --file spec.yaml",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Overlay store root (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Discover(DiscoverArgs),
    Auto(AutoArgs),
    Preview(PreviewArgs),
    Apply(ApplyArgs),
    Validate(ValidateArgs),
    Explain(ExplainArgs),
    List(ListArgs),
    Upsert(UpsertArgs),
    Cat(CatArgs),
    MergeSeed(MergeSeedArgs),
    Materialize(MaterializeArgs),
    Stats,
}

/// Rank the catalog against a free-text query.
#[derive(Parser, Debug)]
#[command(about = "Discover spikes matching a natural-language query")]
pub struct DiscoverArgs {
    /// Free-text query (non-English terms are normalized)
    pub query: Option<String>,

    /// Maximum number of results
    #[arg(long)]
    pub limit: Option<usize>,

    /// Pagination offset into the ranked list
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

/// Auto-select one spike for a task, or return fallbacks.
#[derive(Parser, Debug)]
#[command(about = "Select the best spike for a task description")]
pub struct AutoArgs {
    /// Natural-language task description
    pub task: String,

    /// Constraints as KEY=VALUE (repeatable)
    #[arg(long, value_name = "KEY=VALUE")]
    pub constraint: Vec<String>,
}

/// Render a spike without mutating anything.
#[derive(Parser, Debug)]
#[command(about = "Render a spike and diff it against a directory")]
pub struct PreviewArgs {
    /// Spike id
    pub id: String,

    /// Template parameters as KEY=VALUE (repeatable)
    #[arg(long, value_name = "KEY=VALUE")]
    pub param: Vec<String>,

    /// Directory snapshot to diff against
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

/// Compute an apply plan; the caller performs any writes.
#[derive(Parser, Debug)]
#[command(about = "Render a spike and plan conflict resolution (no writes)")]
pub struct ApplyArgs {
    /// Spike id
    pub id: String,

    /// Template parameters as KEY=VALUE (repeatable)
    #[arg(long, value_name = "KEY=VALUE")]
    pub param: Vec<String>,

    /// Conflict-resolution strategy
    #[arg(long, value_enum)]
    pub strategy: ApplyStrategy,

    /// Current tree to plan against
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Base tree for three-way merges
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,
}

/// Re-check a previously applied spike.
#[derive(Parser, Debug)]
#[command(about = "Report drift between a spike and the current tree")]
pub struct ValidateArgs {
    /// Spike id
    pub id: String,

    /// Template parameters as KEY=VALUE (repeatable)
    #[arg(long, value_name = "KEY=VALUE")]
    pub param: Vec<String>,

    /// Current tree to compare against
    #[arg(long, value_name = "DIR")]
    pub dir: PathBuf,
}

/// Human-readable description from template metadata.
#[derive(Parser, Debug)]
#[command(about = "Explain a spike in human-readable form")]
pub struct ExplainArgs {
    /// Spike id
    pub id: String,
}

/// Enumerate ids from the combined space.
#[derive(Parser, Debug)]
#[command(about = "List spike ids, physical entries first")]
pub struct ListArgs {
    /// Restrict to one prefix family (gen or strike)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Library filter (repeatable)
    #[arg(long = "lib", value_name = "LIB")]
    pub libs: Vec<String>,

    /// Pattern filter (repeatable)
    #[arg(long = "pattern", value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Style filter (repeatable)
    #[arg(long = "style", value_name = "STYLE")]
    pub styles: Vec<String>,

    /// Language filter (repeatable)
    #[arg(long = "lang", value_name = "LANG")]
    pub langs: Vec<String>,

    /// Regex applied to the full id
    #[arg(long, value_name = "REGEX")]
    pub id_regex: Option<String>,

    /// Named pack to filter through
    #[arg(long, value_name = "PACK")]
    pub pack: Option<String>,

    /// Maximum number of ids (capped by FLUORITE_SPIKE_LIST_LIMIT)
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Write or overwrite a physical overlay entry.
#[derive(Parser, Debug)]
#[command(about = "Upsert a hand-authored spike document")]
pub struct UpsertArgs {
    /// Spike id to store the document under
    pub id: String,

    /// YAML document to store
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,
}

/// Raw document read-back (the `spec://<id>` resource).
#[derive(Parser, Debug)]
#[command(about = "Print the raw stored document for a spike")]
pub struct CatArgs {
    /// Spike id
    pub id: String,
}

/// Bulk-load a seed file into the overlay store.
#[derive(Parser, Debug)]
#[command(about = "Merge a seed document into the overlay store")]
pub struct MergeSeedArgs {
    /// Seed YAML file with a top-level `spikes:` list
    pub seed: PathBuf,

    /// Merge stack/tags/params into existing entries, leaving files intact
    #[arg(long)]
    pub merge_metadata: bool,

    /// Replace existing entries wholesale
    #[arg(long, conflicts_with = "merge_metadata")]
    pub overwrite: bool,

    /// Id prefix prepended to every seed entry
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,
}

/// Persist virtual entries into the overlay store.
#[derive(Parser, Debug)]
#[command(about = "Materialize virtual spikes into the overlay store")]
pub struct MaterializeArgs {
    /// Number of entries to write (capped by FLUORITE_GENERATED_SPIKES_LIMIT)
    pub count: usize,

    /// Library filter (repeatable)
    #[arg(long = "lib", value_name = "LIB")]
    pub libs: Vec<String>,

    /// Pattern filter (repeatable)
    #[arg(long = "pattern", value_name = "PATTERN")]
    pub patterns: Vec<String>,
}
