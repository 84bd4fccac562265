//! End-to-end analysis tests against the fixture addon.
//!
//! The fixture is a small CRM-ish module with a manifest, an import chain,
//! two models, a form view with an inline subview, and a cron record with
//! embedded code. Symbols are planted to be dead or alive in specific ways.

use deadfield::analysis::SymbolVerdict;
use deadfield::graph::UsageEdge;
use deadfield::{
    AnalysisSummary, Confidence, Config, GraphBuilder, Location, ModelRegistry, ModuleFinder,
    ParallelGraphBuilder, ReachabilityAnalyzer, SymbolId, SymbolKind, UsageGraph, UsageKind,
};
use std::path::PathBuf;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_config() -> Config {
    // The default exclude list drops **/tests/**, which is where the
    // fixture addon lives.
    Config {
        exclude: vec![],
        ..Config::default()
    }
}

fn analyze() -> (ModelRegistry, UsageGraph, Vec<SymbolVerdict>) {
    let config = fixture_config();
    let finder = ModuleFinder::new(&config);
    let files = finder
        .find_files(&fixtures_path().join("crm"))
        .expect("fixture discovery failed");
    assert!(!files.is_empty(), "fixture addon should be discovered");

    let mut builder = GraphBuilder::new();
    for file in &files {
        builder.process_file(file).expect("fixture should parse");
    }
    let (registry, graph) = builder.build();
    let verdicts = ReachabilityAnalyzer::new().analyze(&registry, &graph);
    (registry, graph, verdicts)
}

fn find<'a>(verdicts: &'a [SymbolVerdict], model: &str, name: &str) -> &'a SymbolVerdict {
    verdicts
        .iter()
        .find(|v| v.symbol.model == model && v.symbol.name == name)
        .unwrap_or_else(|| panic!("no verdict for {model}.{name}"))
}

#[test]
fn test_fixture_registry() {
    let (registry, _, _) = analyze();
    assert_eq!(registry.model_count(), 2);
    assert!(registry.contains("res.partner"));
    assert!(registry.contains("crm.lead"));
    assert_eq!(
        registry.field_comodel("res.partner", "lead_ids"),
        Some("crm.lead")
    );
}

#[test]
fn test_untouched_field_is_dead_high() {
    let (_, _, verdicts) = analyze();
    let legacy = find(&verdicts, "res.partner", "legacy_code");
    assert!(legacy.is_dead());
    assert_eq!(legacy.confidence, Confidence::High);
    assert!(legacy.usage_locations.is_empty());
}

#[test]
fn test_write_only_fields_are_dead_low() {
    let (_, _, verdicts) = analyze();
    // Assigned in action_check_email, never read anywhere.
    let score = find(&verdicts, "res.partner", "score");
    assert!(score.is_dead());
    assert_eq!(score.confidence, Confidence::Low);

    // Written through self.write({...}), never read.
    let probability = find(&verdicts, "crm.lead", "probability");
    assert!(probability.is_dead());
    assert_eq!(probability.confidence, Confidence::Low);
}

#[test]
fn test_uncalled_method_is_dead_high() {
    let (_, _, verdicts) = analyze();
    let helper = find(&verdicts, "res.partner", "_forgotten_helper");
    assert_eq!(helper.symbol.kind, SymbolKind::Method);
    assert!(helper.is_dead());
    assert_eq!(helper.confidence, Confidence::High);
}

#[test]
fn test_view_and_body_reads_make_fields_live() {
    let (_, _, verdicts) = analyze();
    let email = find(&verdicts, "res.partner", "email");
    assert!(email.used);
    assert_eq!(email.confidence, Confidence::High);
    // Read by the form view and by action_check_email.
    assert!(email.usage_locations.len() >= 2);

    let lead_count = find(&verdicts, "res.partner", "lead_count");
    assert!(lead_count.used);
    assert_eq!(lead_count.confidence, Confidence::High);
}

#[test]
fn test_subview_binds_comodel_and_inverse() {
    let (_, _, verdicts) = analyze();
    // Read inside the inline tree, against crm.lead.
    let revenue = find(&verdicts, "crm.lead", "revenue");
    assert!(revenue.used);

    // The One2many's inverse column is read to assemble the subview.
    let partner_id = find(&verdicts, "crm.lead", "partner_id");
    assert!(partner_id.used);
}

#[test]
fn test_button_and_cron_make_methods_live() {
    let (_, _, verdicts) = analyze();
    let button_target = find(&verdicts, "res.partner", "action_check_email");
    assert!(button_target.used);
    assert_eq!(button_target.confidence, Confidence::High);

    // Only the cron's embedded code calls this.
    let cron_target = find(&verdicts, "crm.lead", "action_mark_won");
    assert!(cron_target.used);
    assert_eq!(cron_target.confidence, Confidence::High);
}

#[test]
fn test_fixture_has_no_dangling_references() {
    let (_, graph, _) = analyze();
    assert!(
        graph.dangling().is_empty(),
        "unexpected dangling: {:?}",
        graph.dangling()
    );
}

#[test]
fn test_summary_counts() {
    let (_, _, verdicts) = analyze();
    let summary = AnalysisSummary::from_verdicts(&verdicts);
    assert_eq!(summary.total_fields, 10);
    assert_eq!(summary.total_methods, 3);
    assert_eq!(summary.dead_fields, 3);
    assert_eq!(summary.dead_methods, 1);
    assert_eq!(summary.high_confidence_dead, 2);
}

fn shape(verdicts: &[SymbolVerdict]) -> Vec<(String, String, bool, Confidence, Vec<Location>)> {
    verdicts
        .iter()
        .map(|v| {
            (
                v.symbol.model.clone(),
                v.symbol.name.clone(),
                v.used,
                v.confidence,
                v.usage_locations.clone(),
            )
        })
        .collect()
}

#[test]
fn test_repeated_runs_yield_identical_verdicts() {
    // Full discovery, build and analysis, twice over the unchanged fixture.
    let (_, _, first) = analyze();
    let (_, _, second) = analyze();
    assert_eq!(shape(&first), shape(&second));
}

#[test]
fn test_reanalysis_of_same_graph_is_idempotent() {
    let (registry, graph, first) = analyze();
    let second = ReachabilityAnalyzer::new().analyze(&registry, &graph);
    assert_eq!(shape(&first), shape(&second));
}

#[test]
fn test_added_high_reference_never_downgrades_verdicts() {
    let (registry, mut graph, before) = analyze();

    // A new call site reaching the previously untouched helper.
    graph.add_edge(UsageEdge {
        symbol: SymbolId::method("res.partner", "_forgotten_helper"),
        kind: UsageKind::MethodCall,
        confidence: Confidence::High,
        location: Location::new(PathBuf::from("models/new_caller.py"), 12),
    });
    let after = ReachabilityAnalyzer::new().analyze(&registry, &graph);

    let helper = find(&after, "res.partner", "_forgotten_helper");
    assert!(helper.used);
    assert_eq!(helper.confidence, Confidence::High);

    // Every other verdict is unchanged: nothing flips used -> unused and no
    // used verdict loses confidence.
    for b in before.iter().filter(|v| v.used) {
        let a = find(&after, &b.symbol.model, &b.symbol.name);
        assert!(a.used, "{} flipped to unused", b.symbol);
        assert!(
            !(b.confidence == Confidence::High && a.confidence == Confidence::Low),
            "{} lost confidence",
            b.symbol
        );
    }
}

#[test]
fn test_parallel_builder_matches_sequential() {
    let config = fixture_config();
    let finder = ModuleFinder::new(&config);
    let files = finder
        .find_files(&fixtures_path().join("crm"))
        .expect("fixture discovery failed");

    let (registry, graph) = ParallelGraphBuilder::new()
        .build_from_files(&files)
        .expect("parallel build failed");
    let parallel = ReachabilityAnalyzer::new().analyze(&registry, &graph);

    let (_, _, sequential) = analyze();
    let dead = |verdicts: &[SymbolVerdict]| -> Vec<String> {
        verdicts
            .iter()
            .filter(|v| v.is_dead())
            .map(|v| format!("{}.{}", v.symbol.model, v.symbol.name))
            .collect()
    };
    assert_eq!(dead(&parallel), dead(&sequential));
}
