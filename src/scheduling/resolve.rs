//! Resolution of an appointment's ambiguous slot time into an absolute
//! instant.
//!
//! Slot starts carry no meridiem marker, so the hour is disambiguated with a
//! clinic-hours heuristic: 12 is noon, 1-5 are afternoon, 6-11 are morning,
//! 0 is midnight. Hours 13-23 are already unambiguous and taken verbatim.
//! The heuristic fits slots between roughly 6 AM and 5 PM; starts before
//! 6 AM or after 5 PM cannot be expressed in ambiguous form. That is a known
//! limitation of the slot format, not something to paper over here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use thiserror::Error;

use crate::appointment::Appointment;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("appointment date {0:?} is not a YYYY-MM-DD date")]
    InvalidDateFormat(String),
    #[error("time slot {0:?} does not start with an H:MM time")]
    InvalidTimeFormat(String),
    #[error("{0} does not exist in time zone {1}")]
    NonexistentLocalTime(NaiveDateTime, Tz),
}

/// Combines the appointment date with the resolved start of its time slot
/// in the given zone.
pub fn resolve_start_instant(
    appointment: &Appointment,
    timezone: Tz,
) -> Result<DateTime<Tz>, ResolveError> {
    let date = NaiveDate::parse_from_str(&appointment.date, "%Y-%m-%d")
        .map_err(|_| ResolveError::InvalidDateFormat(appointment.date.clone()))?;

    let ambiguous = NaiveTime::parse_from_str(appointment.time_slot.start(), "%H:%M")
        .map_err(|_| ResolveError::InvalidTimeFormat(appointment.time_slot.to_string()))?;

    let local = date.and_time(apply_clinic_meridiem(ambiguous));
    timezone
        .from_local_datetime(&local)
        .earliest()
        .ok_or(ResolveError::NonexistentLocalTime(local, timezone))
}

fn apply_clinic_meridiem(start: NaiveTime) -> NaiveTime {
    let resolved = match start.hour() {
        12 => 12,
        hour @ 1..=5 => hour + 12,
        hour => hour,
    };

    start
        .with_hour(resolved)
        .expect("resolved hour is always below 24")
}
