use tokio::sync::watch;

use crate::appointment::Appointment;

/// Receiving side of the confirmed-appointment slot, consumed by the
/// scheduler task.
pub type AppointmentFeed = watch::Receiver<Option<Appointment>>;

/// Cloneable handle the booking flow uses to publish the confirmed
/// appointment. The slot holds at most one appointment; last write wins.
#[derive(Clone)]
pub struct AppointmentSource(watch::Sender<Option<Appointment>>);

pub fn appointment_slot() -> (AppointmentSource, AppointmentFeed) {
    let (sender, receiver) = watch::channel(None);
    (AppointmentSource(sender), receiver)
}

impl AppointmentSource {
    pub fn confirm(&self, appointment: Appointment) {
        self.0.send_replace(Some(appointment));
    }

    pub fn clear(&self) {
        self.0.send_replace(None);
    }
}
