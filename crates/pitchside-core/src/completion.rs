//! Completion classifier.
//!
//! All stored match dates and times, and the `now` passed in, are naive UTC.
//! No timezone conversion is performed anywhere.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use uuid::Uuid;

use crate::fixtures::Fixture;
use crate::CoreError;

/// Kickoff assumed when a fixture has no stored `match_time`.
pub const DEFAULT_KICKOFF_TIME: NaiveTime = match NaiveTime::from_hms_opt(15, 0, 0) {
    Some(t) => t,
    None => panic!("15:00:00 is a valid time"),
};

/// Elapsed time since kickoff after which a match counts as finished.
pub const COMPLETION_THRESHOLD: TimeDelta = TimeDelta::hours(3);

/// Resolve a fixture's kickoff instant.
///
/// Accepts `HH:MM:SS` or `HH:MM` times; a missing time falls back to
/// [`DEFAULT_KICKOFF_TIME`].
///
/// # Errors
///
/// Returns [`CoreError::InvalidMatchDate`] or [`CoreError::InvalidMatchTime`]
/// when the stored strings do not parse.
pub fn kickoff(fixture: &Fixture) -> Result<NaiveDateTime, CoreError> {
    let date = NaiveDate::parse_from_str(fixture.match_date.trim(), "%Y-%m-%d").map_err(|e| {
        CoreError::InvalidMatchDate {
            fixture_id: fixture.id,
            value: fixture.match_date.clone(),
            reason: e.to_string(),
        }
    })?;

    let time = match fixture.match_time.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_KICKOFF_TIME,
        Some(raw) => parse_match_time(raw).map_err(|e| CoreError::InvalidMatchTime {
            fixture_id: fixture.id,
            value: raw.to_string(),
            reason: e.to_string(),
        })?,
    };

    Ok(date.and_time(time))
}

fn parse_match_time(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    if raw.split(':').count() == 2 {
        NaiveTime::parse_from_str(&format!("{raw}:00"), "%H:%M:%S")
    } else {
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
    }
}

/// `true` once at least [`COMPLETION_THRESHOLD`] has elapsed since kickoff.
/// The boundary is inclusive.
#[must_use]
pub fn is_completed(kickoff: NaiveDateTime, now: NaiveDateTime) -> bool {
    now - kickoff >= COMPLETION_THRESHOLD
}

/// Return the fixtures eligible for article generation.
///
/// A fixture is eligible when it is completed at `now` and its id is not in
/// `completed_ids` (fixtures whose processing status is `completed`).
/// Fixtures with unparseable dates or times are logged and skipped. Order
/// follows the input.
#[must_use]
pub fn select_eligible(
    fixtures: Vec<Fixture>,
    completed_ids: &HashSet<Uuid>,
    now: NaiveDateTime,
) -> Vec<Fixture> {
    fixtures
        .into_iter()
        .filter(|fixture| !completed_ids.contains(&fixture.id))
        .filter(|fixture| match kickoff(fixture) {
            Ok(start) => {
                let done = is_completed(start, now);
                if done {
                    let elapsed_minutes = (now - start).num_minutes();
                    tracing::debug!(
                        fixture_id = %fixture.id,
                        fixture = %fixture.label(),
                        kickoff = %start,
                        elapsed_minutes,
                        "completed fixture found"
                    );
                }
                done
            }
            Err(e) => {
                tracing::warn!(fixture_id = %fixture.id, error = %e, "skipping fixture with malformed kickoff");
                false
            }
        })
        .collect()
}
