use crate::db::SqliteStore;
use anyhow::{bail, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use srs_core::{ReviewInput, ReviewSnapshot, Scheduler, SchedulingState};
use std::io::Write;
use tracing::info;

type Db = Scheduler<SqliteStore>;

fn fmt_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn answer(
    scheduler: &mut Db,
    out: &mut dyn Write,
    key: &str,
    correctness: f64,
    at: DateTime<Utc>,
) -> Result<()> {
    scheduler.answer(at, key, correctness)?;
    info!(key, correctness, "answer recorded");

    match scheduler.due_date(key)? {
        Some(due) => writeln!(out, "{key}: {correctness}% recorded, due {}", fmt_time(due))?,
        None => writeln!(out, "{key}: {correctness}% recorded")?,
    }
    Ok(())
}

pub fn next(scheduler: &Db, out: &mut dyn Write, at: DateTime<Utc>) -> Result<()> {
    let due = scheduler.next(at)?;
    if due.is_empty() {
        writeln!(out, "No cards due")?;
    }
    for key in due {
        writeln!(out, "{key}")?;
    }
    Ok(())
}

pub fn next_due(scheduler: &Db, out: &mut dyn Write) -> Result<()> {
    match scheduler.next_due_date()? {
        Some(due) => writeln!(out, "{}", fmt_time(due))?,
        None => writeln!(out, "No cards")?,
    }
    Ok(())
}

pub fn show(
    scheduler: &Db,
    out: &mut dyn Write,
    key: &str,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(card) = scheduler.card(key)? else {
        bail!("no card with key {key:?}");
    };
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&card)?)?;
        return Ok(());
    }

    writeln!(out, "Card: {}", card.key)?;
    writeln!(out, "  Last review: {}", fmt_time(card.last_review))?;
    match &card.state {
        SchedulingState::Fsrs(state) => {
            writeln!(out, "  State: {}", state.status)?;
            writeln!(out, "  Difficulty: {:.2}", state.difficulty)?;
            writeln!(out, "  Stability: {:.2} days", state.stability)?;
            writeln!(out, "  Reviews: {} ({} lapses)", state.reps, state.lapses)?;
            writeln!(out, "  Interval: {:.2} days", state.interval_days)?;
        }
        SchedulingState::Ebisu(state) => {
            writeln!(out, "  Alpha: {:.3}", state.alpha)?;
            writeln!(out, "  Beta: {:.3}", state.beta)?;
            writeln!(out, "  Half-life: {:.1} hours", state.half_life)?;
            writeln!(out, "  Reviews: {}", state.total_reviews)?;
        }
    }
    if let Some(due) = scheduler.due_date(key)? {
        writeln!(out, "  Due: {}", fmt_time(due))?;
    }
    if let Some(recall) = scheduler.predict_recall(key, now)? {
        writeln!(out, "  Recall now: {:.1}%", recall * 100.0)?;
    }
    Ok(())
}

pub fn history(scheduler: &Db, out: &mut dyn Write, key: &str, json: bool) -> Result<()> {
    let reviews = scheduler.reviews(key)?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&reviews)?)?;
        return Ok(());
    }
    if reviews.is_empty() {
        bail!("no reviews for {key:?}");
    }

    for review in &reviews {
        let input = match review.input {
            ReviewInput::Rating(rating) => format!("{rating:?}"),
            ReviewInput::Success(success) => format!("success {success:.2}"),
        };
        let outcome = match &review.snapshot {
            ReviewSnapshot::Fsrs {
                status,
                stability,
                due,
                ..
            } => format!("{status}, stability {stability:.2}d, due {}", fmt_time(*due)),
            ReviewSnapshot::Ebisu {
                recall_probability,
                half_life,
                ..
            } => format!(
                "recall was {:.1}%, half-life {half_life:.1}h",
                recall_probability * 100.0
            ),
        };
        writeln!(
            out,
            "{}  {:>5.1}%  {input}  {outcome}",
            fmt_time(review.timestamp),
            review.correctness
        )?;
    }
    Ok(())
}
