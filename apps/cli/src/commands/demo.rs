//! Scripted learning journeys for trying the scheduler out.

use crate::db::SqliteStore;
use anyhow::{Context, Result};
use chrono::{Duration, TimeZone, Utc};
use srs_core::{Algorithm, Scheduler};
use std::io::Write;
use tracing::info;

/// Which cards a session answers.
enum Pick {
    /// Whatever `next` returns at the session time.
    Due,
    /// A fixed list, due or not.
    Listed(&'static [&'static str]),
}

/// A review session `day` days after the first one.
struct Session {
    day: i64,
    label: &'static str,
    pick: Pick,
    correctness: fn(&str) -> f64,
}

struct Journey {
    /// Hour of 2024-01-01 (UTC) at which the cards are first learned.
    start_hour: u32,
    cards: &'static [(&'static str, &'static str, f64)],
    sessions: &'static [Session],
}

/// Spanish vocabulary, reviewed whenever cards come due.
const VOCABULARY: Journey = Journey {
    start_hour: 9,
    cards: &[
        ("spanish_hello", "hola", 95.0),
        ("spanish_goodbye", "adiós", 90.0),
        ("spanish_please", "por favor", 60.0),
        ("spanish_thankyou", "gracias", 85.0),
        ("spanish_yes", "sí", 100.0),
        ("spanish_no", "no", 100.0),
        ("spanish_water", "agua", 75.0),
        ("spanish_food", "comida", 55.0),
        ("spanish_house", "casa", 80.0),
        ("spanish_friend", "amigo", 90.0),
    ],
    sessions: &[
        Session {
            day: 1,
            label: "first review",
            pick: Pick::Due,
            correctness: |_| 80.0,
        },
        Session {
            day: 3,
            label: "second review",
            pick: Pick::Due,
            correctness: |key| if key.contains("please") { 65.0 } else { 90.0 },
        },
        Session {
            day: 6,
            label: "week review",
            pick: Pick::Due,
            correctness: |_| 95.0,
        },
        Session {
            day: 14,
            label: "two-week check",
            pick: Pick::Due,
            correctness: |_| 100.0,
        },
    ],
};

/// Programming concepts, with an early drill of the hard ones.
const CONCEPTS: Journey = Journey {
    start_hour: 10,
    cards: &[
        ("python_list", "list data structure", 90.0),
        ("python_dict", "dictionary/hash map", 85.0),
        ("python_function", "function definition", 95.0),
        ("python_class", "class and objects", 70.0),
        ("python_loop", "for/while loops", 100.0),
        ("python_conditional", "if/else statements", 100.0),
        ("python_exception", "try/except handling", 60.0),
        ("python_decorator", "decorator pattern", 45.0),
        ("python_generator", "generator functions", 55.0),
        ("python_comprehension", "list comprehensions", 75.0),
    ],
    sessions: &[
        Session {
            day: 1,
            label: "difficult concepts",
            pick: Pick::Listed(&[
                "python_decorator",
                "python_exception",
                "python_generator",
                "python_class",
            ]),
            correctness: |_| 75.0,
        },
        Session {
            day: 4,
            label: "regular review",
            pick: Pick::Due,
            correctness: |key| {
                if key.contains("decorator") || key.contains("generator") {
                    80.0
                } else {
                    95.0
                }
            },
        },
        Session {
            day: 9,
            label: "comprehensive review",
            pick: Pick::Due,
            correctness: |_| 90.0,
        },
        Session {
            day: 19,
            label: "long-term retention",
            pick: Pick::Due,
            correctness: |_| 95.0,
        },
    ],
};

/// Learn the journey's cards on day 0, then run every session within `days`.
///
/// FSRS stores get the vocabulary journey, Ebisu stores the concepts one.
pub fn run(scheduler: &mut Scheduler<SqliteStore>, out: &mut dyn Write, days: i64) -> Result<()> {
    let journey = match scheduler.algorithm() {
        Algorithm::Fsrs => &VOCABULARY,
        Algorithm::Ebisu => &CONCEPTS,
    };
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, journey.start_hour, 0, 0)
        .single()
        .context("demo start time is not a valid UTC instant")?;

    writeln!(out, "Day 0: initial learning")?;
    for (key, description, correctness) in journey.cards {
        scheduler.answer(start, key, *correctness)?;
        writeln!(out, "  learned {key:<22} ({description}) {correctness}%")?;
    }

    let mut last = start;
    for session in journey.sessions.iter().filter(|s| s.day <= days) {
        let at = start + Duration::days(session.day);
        let keys = match session.pick {
            Pick::Due => scheduler.next(at)?,
            Pick::Listed(keys) => keys.iter().map(|key| key.to_string()).collect(),
        };
        writeln!(out, "Day {}: {}, {} cards", session.day, session.label, keys.len())?;
        for key in &keys {
            let correctness = (session.correctness)(key);
            scheduler.answer(at, key, correctness)?;
            writeln!(out, "  reviewed {key:<22} {correctness}%")?;
        }
        last = at;
    }

    info!(cards = journey.cards.len(), "demo journey recorded");
    if let Some(next) = scheduler.next_due_date()? {
        let hours = (next - last).num_minutes() as f64 / 60.0;
        writeln!(out, "Next review due {hours:.1} hours after the last session")?;
    }
    Ok(())
}
