use std::fmt;

use serde::Deserialize;

pub type AppointmentId = String;

/// Raw `"<start>-<end>"` slot text as the booking flow hands it over,
/// e.g. `"6:00-7:00"`. Only the start component is ever consumed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TimeSlot(String);

impl TimeSlot {
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    /// The trimmed start component, everything before the first hyphen.
    pub fn start(&self) -> &str {
        self.0.split('-').next().unwrap_or("").trim()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A confirmed appointment as observed by the reminder scheduler.
/// Immutable once observed; a different `id` means a new appointment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub doctor_name: String,
    /// Calendar date in ISO `YYYY-MM-DD` form.
    pub date: String,
    pub time_slot: TimeSlot,
    /// Opaque directions link, passed through into the notification payload.
    pub driving_link: String,
}
