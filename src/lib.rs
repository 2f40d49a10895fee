//! Client-side appointment reminder scheduling for the Vizit booking app.
//!
//! A confirmed appointment is published into a single observable slot; the
//! scheduler task re-evaluates it on a fixed cadence and hands the reminder
//! to a notification sink once the appointment enters its reminder window.

pub mod appointment;
pub mod appsettings;
pub mod notification;
pub mod scheduling;

pub use appointment::{Appointment, AppointmentId, TimeSlot};
pub use notification::local_center::LocalNotificationCenter;
pub use notification::{NotificationEvent, NotificationSink, PermissionStatus, ReminderPayload};
pub use scheduling::{AppointmentFeed, AppointmentSource, ReminderScheduler, appointment_slot};
