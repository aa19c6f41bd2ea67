//! End-to-end runs of the command-line surface.

mod common;

use common::TestContext;
use srs_core::Algorithm;

#[test]
fn answer_then_next() {
    let ctx = TestContext::new();
    let out = ctx
        .cli(
            Algorithm::Fsrs,
            &["answer", "hola", "20", "--at", "2024-01-01T10:00:00Z"],
        )
        .unwrap();
    assert!(out.starts_with("hola: 20% recorded, due 2024-01-01T"));

    let out = ctx
        .cli(Algorithm::Fsrs, &["next", "--at", "2024-01-02T10:00:00Z"])
        .unwrap();
    assert_eq!(out, "hola\n");

    let out = ctx
        .cli(Algorithm::Fsrs, &["next", "--at", "2024-01-01T10:00:00Z"])
        .unwrap();
    assert_eq!(out, "No cards due\n");
}

#[test]
fn next_due_on_empty_database() {
    let ctx = TestContext::new();
    let out = ctx.cli(Algorithm::Ebisu, &["next-due"]).unwrap();
    assert_eq!(out, "No cards\n");
}

#[test]
fn rejects_out_of_range_correctness() {
    let ctx = TestContext::new();
    let err = ctx
        .cli(Algorithm::Fsrs, &["answer", "hola", "150"])
        .unwrap_err();
    assert!(err.to_string().contains("correctness"));
    assert_eq!(ctx.count_rows("fsrs_cards"), 0);
}

#[test]
fn show_and_history_as_json() {
    let ctx = TestContext::new();
    ctx.cli(
        Algorithm::Ebisu,
        &["answer", "agua", "75", "--at", "2024-01-01T10:00:00Z"],
    )
    .unwrap();

    let card: serde_json::Value =
        serde_json::from_str(&ctx.cli(Algorithm::Ebisu, &["show", "agua", "--json"]).unwrap())
            .unwrap();
    assert_eq!(card["key"], "agua");
    assert_eq!(card["state"]["algorithm"], "ebisu");

    let history: serde_json::Value = serde_json::from_str(
        &ctx.cli(Algorithm::Ebisu, &["history", "agua", "--json"])
            .unwrap(),
    )
    .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["correctness"], 75.0);
}

#[test]
fn show_missing_card_fails() {
    let ctx = TestContext::new();
    assert!(ctx.cli(Algorithm::Fsrs, &["show", "nothing"]).is_err());
}

#[test]
fn thresholds_flag_changes_rating() {
    let ctx = TestContext::new();
    ctx.cli(
        Algorithm::Fsrs,
        &["--thresholds", "10,20,30", "answer", "q", "35"],
    )
    .unwrap();
    let out = ctx.cli(Algorithm::Fsrs, &["show", "q"]).unwrap();
    assert!(out.contains("State: Review"));
}

#[test]
fn demo_populates_database() {
    let ctx = TestContext::new();
    let out = ctx.cli(Algorithm::Fsrs, &["demo"]).unwrap();
    assert!(out.starts_with("Day 0: initial learning"));
    assert_eq!(ctx.count_rows("fsrs_cards"), 10);
    assert!(ctx.count_rows("fsrs_reviews") > 10);

    let stats = ctx.cli(Algorithm::Fsrs, &["stats"]).unwrap();
    assert!(stats.contains("Total cards: 10"));
    assert!(stats.contains("spanish_hello"));
}

#[test]
fn demo_respects_days() {
    let ctx = TestContext::new();
    ctx.cli(Algorithm::Ebisu, &["demo", "--days", "0"]).unwrap();
    assert_eq!(ctx.count_rows("ebisu_reviews"), 10);
}

#[test]
fn ebisu_demo_uses_concepts_journey() {
    let ctx = TestContext::new();
    let out = ctx
        .cli(Algorithm::Ebisu, &["demo", "--days", "1"])
        .unwrap();
    assert!(out.contains("learned python_decorator"));
    assert!(out.contains("Day 1: difficult concepts, 4 cards"));
    assert!(!out.contains("spanish_"));
    assert_eq!(ctx.count_rows("ebisu_cards"), 10);
    assert_eq!(ctx.count_rows("ebisu_reviews"), 14);

    let history: serde_json::Value = serde_json::from_str(
        &ctx.cli(Algorithm::Ebisu, &["history", "python_decorator", "--json"])
            .unwrap(),
    )
    .unwrap();
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["correctness"], 45.0);
    assert_eq!(history[1]["correctness"], 75.0);
}

#[test]
fn demo_starts_on_new_year_morning() {
    let ctx = TestContext::new();
    ctx.cli(Algorithm::Fsrs, &["demo", "--days", "0"]).unwrap();
    let card: serde_json::Value = serde_json::from_str(
        &ctx.cli(Algorithm::Fsrs, &["show", "spanish_hello", "--json"])
            .unwrap(),
    )
    .unwrap();
    assert_eq!(card["last_review"], "2024-01-01T09:00:00Z");
    assert_eq!(ctx.count_rows("fsrs_cards"), 10);
}
