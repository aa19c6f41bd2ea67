use crate::db::{SqliteStore, StatsRepository, StoreStats};
use anyhow::Result;
use chrono::SecondsFormat;
use serde::Serialize;
use srs_core::Scheduler;
use std::io::Write;

#[derive(Serialize)]
struct Report<'a> {
    stats: &'a StoreStats,
    cards: &'a [crate::db::CardSummary],
}

pub fn stats(scheduler: &Scheduler<SqliteStore>, out: &mut dyn Write, json: bool) -> Result<()> {
    let store = scheduler.store();
    let stats = store.stats()?;
    let cards = store.card_summaries()?;

    if json {
        let report = Report {
            stats: &stats,
            cards: &cards,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    match &stats {
        StoreStats::Fsrs(s) => {
            writeln!(out, "FSRS statistics")?;
            writeln!(out, "  Total cards: {}", s.total_cards)?;
            writeln!(out, "  Total reviews: {}", s.total_reviews)?;
            writeln!(
                out,
                "  By state: {} new, {} learning, {} review, {} relearn",
                s.new_cards, s.learning_cards, s.review_cards, s.relearn_cards
            )?;
            writeln!(out, "  Average difficulty: {:.2}", s.average_difficulty)?;
            writeln!(out, "  Average stability: {:.2} days", s.average_stability)?;
            writeln!(out, "  Average reviews per card: {:.1}", s.average_reps)?;
            writeln!(out, "  Total lapses: {}", s.total_lapses)?;
        }
        StoreStats::Ebisu(s) => {
            writeln!(out, "Ebisu statistics")?;
            writeln!(out, "  Total cards: {}", s.total_cards)?;
            writeln!(out, "  Total reviews: {}", s.total_reviews)?;
            writeln!(out, "  Average alpha: {:.3}", s.average_alpha)?;
            writeln!(out, "  Average beta: {:.3}", s.average_beta)?;
            writeln!(out, "  Average half-life: {:.1} hours", s.average_half_life)?;
        }
    }

    if !cards.is_empty() {
        writeln!(out)?;
    }
    for card in &cards {
        let due = card
            .due
            .map(|due| format!(", due {}", due.to_rfc3339_opts(SecondsFormat::Secs, true)))
            .unwrap_or_default();
        let status = card.status.map(|s| format!(" [{s}]")).unwrap_or_default();
        writeln!(
            out,
            "  {}{status}: {} reviews, strength {:.2}{due}",
            card.key, card.reviews, card.strength
        )?;
    }
    if let Some(next) = scheduler.next_due_date()? {
        writeln!(
            out,
            "\nNext review due: {}",
            next.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
    }
    Ok(())
}
