//! Pure timing rules for when a reminder becomes due. Every rule takes the
//! current instant as an argument.

use chrono::{DateTime, Duration, Utc};

/// How far ahead of the appointment start the reminder fires.
const REMINDER_LEAD: Duration = Duration::minutes(80);

/// How far ahead of the appointment start an appointment becomes eligible
/// for scheduling. Inclusive at the boundary.
const ELIGIBILITY_WINDOW: Duration = Duration::minutes(120);

/// Delay applied when the nominal trigger has already passed but the
/// appointment itself has not.
const LATE_TRIGGER_DELAY: Duration = Duration::seconds(5);

/// Where an appointment start sits relative to the eligibility window at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Start has already passed; no reminder is owed.
    AlreadyPast,
    /// Start is further out than the window; evaluate again later.
    OutsideWindow { starts_in: Duration },
    /// Within the window; the reminder should fire at the given instant.
    ScheduleAt(DateTime<Utc>),
}

pub fn decide_trigger(start_at: DateTime<Utc>, now: DateTime<Utc>) -> TriggerDecision {
    if start_at <= now {
        return TriggerDecision::AlreadyPast;
    }

    let starts_in = start_at - now;
    if starts_in > ELIGIBILITY_WINDOW {
        return TriggerDecision::OutsideWindow { starts_in };
    }

    let trigger = start_at - REMINDER_LEAD;
    if trigger <= now {
        TriggerDecision::ScheduleAt(now + LATE_TRIGGER_DELAY)
    } else {
        TriggerDecision::ScheduleAt(trigger)
    }
}
