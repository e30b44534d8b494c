//! End-to-end exercises of the catalog over a temporary overlay store.

use fluorite_spikes::autoselect::{self, AutoSelection};
use fluorite_spikes::id::Prefix;
use fluorite_spikes::model::Origin;
use fluorite_spikes::workflow::{self, ApplyStrategy, FileSnapshot};
use fluorite_spikes::{
    discover, Catalog, EngineConfig, EnumerateFilter, SeedMergeOptions, SpikeStore,
};
use std::collections::BTreeMap;
use tempfile::tempdir;

fn fresh_catalog() -> (tempfile::TempDir, Catalog) {
    let dir = tempdir().expect("create temp store");
    let store = SpikeStore::open(dir.path()).expect("open store");
    (dir, Catalog::new(store, EngineConfig::default()))
}

#[test]
fn upsert_then_resource_read_round_trips_the_document() {
    let (_dir, catalog) = fresh_catalog();
    let doc = "id: gen-express-route-basic-ts\nname: Authored route\ntags: [express, http]\nfiles:\n  - path: src/app.ts\n    content: \"// authored\"\n";
    catalog.upsert("gen-express-route-basic-ts", doc).unwrap();
    let raw = catalog
        .store()
        .read_raw("gen-express-route-basic-ts")
        .unwrap()
        .expect("stored document");
    assert_eq!(raw, doc);
}

#[test]
fn physical_precedence_survives_discovery_and_resolution() {
    let (_dir, catalog) = fresh_catalog();
    let id = "gen-nextjs-route-typed-ts";
    catalog
        .upsert(id, "id: gen-nextjs-route-typed-ts\nname: Curated nextjs route\ntags: [nextjs, route]\n")
        .unwrap();

    let resolved = catalog.resolve(id).unwrap();
    assert_eq!(resolved.origin, Origin::Physical);
    assert_eq!(resolved.name, "Curated nextjs route");

    // The shadowed id stays discoverable; 25 covers every nextjs/route/typed
    // candidate, so the authored entry must be among the items.
    let page = discover::discover(&catalog, "nextjs route typed", 25, 0).unwrap();
    assert!(page.items.iter().any(|item| item.id == id));
    assert!(page.total >= page.items.len());
}

#[test]
fn strike_fixture_filter_yields_the_single_candidate() {
    let (_dir, catalog) = fresh_catalog();
    let filter = EnumerateFilter {
        prefix: Some(Prefix::Strike),
        libs: vec!["nextjs".to_string()],
        patterns: vec!["route".to_string()],
        styles: vec!["typed".to_string()],
        langs: vec!["ts".to_string()],
        ..EnumerateFilter::default()
    };
    let ids = catalog.enumerate(&filter, None).unwrap();
    assert_eq!(ids, vec!["strike-nextjs-route-typed-ts".to_string()]);
}

#[test]
fn preview_apply_validate_cycle_reports_consistently() {
    let (_dir, catalog) = fresh_catalog();
    let id = "gen-express-route-basic-ts";
    let params: BTreeMap<String, String> = BTreeMap::new();

    let preview = workflow::preview(&catalog, id, &params, None).unwrap();
    assert!(!preview.rendered.files.is_empty());

    // Simulate the caller applying the plan verbatim.
    let snapshot: FileSnapshot = preview
        .rendered
        .files
        .iter()
        .map(|file| (file.path.clone(), file.content.clone()))
        .collect();

    let apply = workflow::apply(
        &catalog,
        id,
        &params,
        ApplyStrategy::Abort,
        &snapshot,
        None,
    )
    .unwrap();
    assert!(!apply.plan.should_abort, "identical tree has no conflicts");

    let drift = workflow::validate(&catalog, id, &params, &snapshot).unwrap();
    assert!(drift.clean);
    assert_eq!(drift.matching, drift.expected_files);
}

#[test]
fn seed_merge_respects_existing_bodies() {
    let (dir, catalog) = fresh_catalog();
    let id = "gen-hono-route-basic-ts";
    catalog
        .upsert(
            id,
            "id: gen-hono-route-basic-ts\nname: Authored\ntags: [hono]\nfiles:\n  - path: src/index.ts\n    content: \"// keep me\"\n",
        )
        .unwrap();
    let before = catalog.resolve(id).unwrap();

    let seed_path = dir.path().join("seed.yaml");
    std::fs::write(
        &seed_path,
        "spikes:\n  - id: gen-hono-route-basic-ts\n    name: Seeded\n    tags: [edge]\n    files:\n      - path: src/replaced.ts\n        content: \"// must not land\"\n  - id: gen-hono-middleware-basic-ts\n    name: Brand new\n",
    )
    .unwrap();

    let report = catalog
        .merge_from_seed(
            &seed_path,
            &SeedMergeOptions {
                merge_metadata: true,
                ..SeedMergeOptions::default()
            },
        )
        .unwrap();
    assert_eq!(report.merged, 1);
    assert_eq!(report.written, 1);

    let after = catalog.resolve(id).unwrap();
    assert_eq!(after.files, before.files);
    assert!(after.tags.contains("edge"));
    assert!(after.tags.contains("hono"));
    assert_eq!(catalog.resolve("gen-hono-middleware-basic-ts").unwrap().name, "Brand new");
}

#[test]
fn auto_selection_threshold_law_holds() {
    let (_dir, catalog) = fresh_catalog();
    let constraints = BTreeMap::new();

    // A precise task clears the threshold.
    match autoselect::select(&catalog, "fastapi route py", &constraints).unwrap() {
        AutoSelection::Selected { coverage_score, .. } => {
            assert!(coverage_score >= EngineConfig::default().auto_threshold);
        }
        AutoSelection::Fallback { .. } => panic!("expected confident selection"),
    }

    // An impossible threshold forces fallbacks whenever discovery found
    // anything at all.
    let store = SpikeStore::open(catalog.store().root()).unwrap();
    let strict = Catalog::new(
        store,
        EngineConfig {
            auto_threshold: 2.0,
            ..EngineConfig::default()
        },
    );
    match autoselect::select(&strict, "fastapi route py", &constraints).unwrap() {
        AutoSelection::Fallback { items } => assert!(!items.is_empty()),
        AutoSelection::Selected { .. } => panic!("nothing can reach coverage 2.0"),
    }
}

#[test]
fn listing_stays_bounded_with_a_tiny_limit() {
    let dir = tempdir().unwrap();
    let store = SpikeStore::open(dir.path()).unwrap();
    let catalog = Catalog::new(
        store,
        EngineConfig {
            list_limit: 7,
            ..EngineConfig::default()
        },
    );
    let ids = catalog.enumerate(&EnumerateFilter::default(), Some(1000)).unwrap();
    assert_eq!(ids.len(), 7);
}
