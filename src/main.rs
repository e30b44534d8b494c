use anyhow::{anyhow, Context, Result};
use clap::Parser;
use fluorite_spikes::id::Prefix;
use fluorite_spikes::workflow::{self, FileSnapshot};
use fluorite_spikes::{
    autoselect, discover, Catalog, EngineConfig, EnumerateFilter, SeedMergeOptions, SpikeStore,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{Command, RootArgs};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    let store_root = args
        .store
        .clone()
        .unwrap_or_else(SpikeStore::default_root);
    let store = SpikeStore::open(&store_root).context("open spike store")?;
    let catalog = Catalog::new(store, EngineConfig::from_env());

    match args.command {
        Command::Discover(args) => {
            let query = args.query.unwrap_or_default();
            let limit = args.limit.unwrap_or(10);
            let page = discover::discover(&catalog, &query, limit, args.offset)?;
            print_json(&page)
        }
        Command::Auto(args) => {
            let constraints = parse_kv_pairs(&args.constraint)?;
            let selection = autoselect::select(&catalog, &args.task, &constraints)?;
            print_json(&selection)
        }
        Command::Preview(args) => {
            let params = parse_kv_pairs(&args.param)?;
            let snapshot = args.dir.as_deref().map(snapshot_from_dir).transpose()?;
            let report = workflow::preview(&catalog, &args.id, &params, snapshot.as_ref())?;
            print_json(&report)
        }
        Command::Apply(args) => {
            let params = parse_kv_pairs(&args.param)?;
            let snapshot = match args.dir.as_deref() {
                Some(dir) => snapshot_from_dir(dir)?,
                None => FileSnapshot::new(),
            };
            let base = args.base_dir.as_deref().map(snapshot_from_dir).transpose()?;
            let report = workflow::apply(
                &catalog,
                &args.id,
                &params,
                args.strategy,
                &snapshot,
                base.as_ref(),
            )?;
            print_json(&report)
        }
        Command::Validate(args) => {
            let params = parse_kv_pairs(&args.param)?;
            let snapshot = snapshot_from_dir(&args.dir)?;
            let report = workflow::validate(&catalog, &args.id, &params, &snapshot)?;
            print_json(&report)
        }
        Command::Explain(args) => {
            let text = catalog.explain(&args.id)?;
            print!("{text}");
            Ok(())
        }
        Command::List(args) => {
            let prefix = args
                .prefix
                .as_deref()
                .map(|raw| Prefix::parse(raw).ok_or_else(|| anyhow!("unknown prefix {raw:?}")))
                .transpose()?;
            let filter = EnumerateFilter {
                prefix,
                libs: args.libs,
                patterns: args.patterns,
                styles: args.styles,
                langs: args.langs,
                id_regex: args.id_regex,
                pack: args.pack,
            };
            let ids = catalog.enumerate(&filter, args.limit)?;
            print_json(&ids)
        }
        Command::Upsert(args) => {
            let doc = fs::read_to_string(&args.file)
                .with_context(|| format!("read {}", args.file.display()))?;
            catalog.upsert(&args.id, &doc)?;
            println!("Stored spike {}", args.id);
            Ok(())
        }
        Command::Cat(args) => {
            // Physical documents come back byte-for-byte; virtual ids print
            // their synthesized form.
            match catalog.store().read_raw(&args.id)? {
                Some(raw) => print!("{raw}"),
                None => {
                    let spec = catalog.resolve(&args.id)?;
                    let doc = serde_yaml::to_string(&spec).context("serialize spike")?;
                    print!("{doc}");
                }
            }
            Ok(())
        }
        Command::MergeSeed(args) => {
            let report = catalog.merge_from_seed(
                &args.seed,
                &SeedMergeOptions {
                    merge_metadata: args.merge_metadata,
                    overwrite: args.overwrite,
                    prefix: args.prefix,
                },
            )?;
            print_json(&report)
        }
        Command::Materialize(args) => {
            let filter = EnumerateFilter {
                libs: args.libs,
                patterns: args.patterns,
                ..EnumerateFilter::default()
            };
            let written = catalog.materialize(&filter, args.count)?;
            println!("Materialized {written} spike(s)");
            Ok(())
        }
        Command::Stats => print_json(&catalog.stats()?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

fn parse_kv_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got {pair:?}"))?;
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}

/// Read a directory into a path→content snapshot for diffing. Files that are
/// not valid UTF-8 are skipped; the engine only diffs text.
fn snapshot_from_dir(root: &Path) -> Result<FileSnapshot> {
    let mut snapshot = FileSnapshot::new();
    for file in collect_files_recursive(root)? {
        let rel = file
            .strip_prefix(root)
            .context("strip snapshot prefix")?
            .to_string_lossy()
            .replace('\\', "/");
        match fs::read_to_string(&file) {
            Ok(content) => {
                snapshot.insert(rel, content);
            }
            Err(err) if err.kind() == std::io::ErrorKind::InvalidData => {
                tracing::debug!(path = %file.display(), "skipping non-text file");
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read {}", file.display()));
            }
        }
    }
    Ok(snapshot)
}

fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_files_recursive(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_pairs_parse_and_reject_malformed_input() {
        let parsed = parse_kv_pairs(&["a=1".to_string(), "b=two=three".to_string()]).unwrap();
        assert_eq!(parsed.get("a").map(String::as_str), Some("1"));
        assert_eq!(parsed.get("b").map(String::as_str), Some("two=three"));
        assert!(parse_kv_pairs(&["broken".to_string()]).is_err());
    }

    #[test]
    fn snapshot_collects_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.ts"), "// a\n").unwrap();
        fs::write(dir.path().join("top.md"), "# top\n").unwrap();
        let snapshot = snapshot_from_dir(dir.path()).unwrap();
        assert_eq!(snapshot.get("src/a.ts").map(String::as_str), Some("// a\n"));
        assert!(snapshot.contains_key("top.md"));
    }
}
