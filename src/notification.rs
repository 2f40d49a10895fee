pub mod local_center;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::appointment::{Appointment, AppointmentId};

pub const REMINDER_TITLE: &str = "Upcoming Appointment Reminder!";

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Content handed to the platform when the reminder fires. Serialized
/// camelCase at the platform boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    pub appointment_id: AppointmentId,
    pub doctor_name: String,
    pub time_slot: String,
    pub driving_link: String,
    pub title: String,
    pub body: String,
}

impl ReminderPayload {
    pub fn for_appointment(appointment: &Appointment) -> Self {
        let body = format!(
            "Your appointment with {} is in less than 1 hour, at {}. \
             You can visit through this link: {}.",
            appointment.doctor_name, appointment.time_slot, appointment.driving_link
        );

        Self {
            appointment_id: appointment.id.clone(),
            doctor_name: appointment.doctor_name.clone(),
            time_slot: appointment.time_slot.to_string(),
            driving_link: appointment.driving_link.clone(),
            title: REMINDER_TITLE.to_string(),
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// The platform displayed the notification.
    Received(ReminderPayload),
    /// The user tapped the displayed notification.
    Tapped(ReminderPayload),
}

#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Asks the platform for permission to show notifications. Called once
    /// at scheduler startup; a denial is never retried.
    async fn request_permission(&self) -> PermissionStatus;

    /// Registers a notification to fire at `trigger_at`. Scheduling the same
    /// appointment id again replaces the pending notification.
    async fn schedule(
        &self,
        trigger_at: DateTime<Utc>,
        payload: ReminderPayload,
    ) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::appointment::TimeSlot;

    #[test]
    pub fn payload_serializes_camel_case_for_the_platform() {
        let appointment = Appointment {
            id: "apt-77".to_string(),
            doctor_name: "Dr. House".to_string(),
            date: "2024-06-10".to_string(),
            time_slot: TimeSlot::new("6:00-7:00"),
            driving_link: "http://maps.example/route".to_string(),
        };

        let payload = ReminderPayload::for_appointment(&appointment);

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "appointmentId": "apt-77",
                "doctorName": "Dr. House",
                "timeSlot": "6:00-7:00",
                "drivingLink": "http://maps.example/route",
                "title": "Upcoming Appointment Reminder!",
                "body": "Your appointment with Dr. House is in less than 1 hour, \
                         at 6:00-7:00. You can visit through this link: \
                         http://maps.example/route.",
            })
        );
    }
}
