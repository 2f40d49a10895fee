//! In-process stand-in for the platform notification service. Registered
//! notifications are held here and fired by detached tasks, independent of
//! the scheduler that registered them.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{
    sync::{RwLock, mpsc, watch},
    task::{self, JoinHandle},
};
use tokio_util::sync::CancellationToken;

use crate::appointment::AppointmentId;
use crate::notification::{NotificationEvent, NotificationSink, PermissionStatus, ReminderPayload};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

struct PendingNotification {
    task: JoinHandle<()>,
    cancellation: CancellationToken,
}

struct CleanupTask(watch::Sender<()>);

type PendingStore = RwLock<HashMap<AppointmentId, PendingNotification>>;

pub struct LocalNotificationCenter {
    permission: PermissionStatus,
    pending: Arc<PendingStore>,
    events: mpsc::Sender<NotificationEvent>,
    cleanup_task: CleanupTask,
}

impl LocalNotificationCenter {
    /// Starts the center and hands back the stream of platform events it
    /// emits. `permission` is what the platform would answer when asked.
    pub fn start(permission: PermissionStatus) -> (Arc<Self>, mpsc::Receiver<NotificationEvent>) {
        let (events, events_rx) = mpsc::channel(16);
        let pending = Arc::new(RwLock::new(HashMap::new()));
        let cleanup_task = Self::spawn_cleanup_task(Arc::clone(&pending));

        let center = Arc::new(Self {
            permission,
            pending,
            events,
            cleanup_task,
        });

        (center, events_rx)
    }

    fn spawn_cleanup_task(pending: Arc<PendingStore>) -> CleanupTask {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());
        task::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(CLEANUP_INTERVAL) => {
                        Self::clean_finished_tasks(&pending).await;
                    }
                    _ = shutdown_rx.changed() => {
                        log::info!("Notification cleanup task shutting down");
                        break;
                    }
                };
            }
        });

        CleanupTask(shutdown_tx)
    }

    async fn clean_finished_tasks(pending: &PendingStore) {
        let mut pending = pending.write().await;
        let before = pending.len();
        pending.retain(|_, handle| !handle.task.is_finished());
        let after = pending.len();

        if before != after {
            log::info!("Cleaned up {} fired notification tasks", before - after);
        }
    }
}

impl Drop for LocalNotificationCenter {
    fn drop(&mut self) {
        let _ = self.cleanup_task.0.send(());
    }
}

#[async_trait]
impl NotificationSink for LocalNotificationCenter {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn schedule(
        &self,
        trigger_at: DateTime<Utc>,
        payload: ReminderPayload,
    ) -> anyhow::Result<()> {
        if self.permission == PermissionStatus::Denied {
            anyhow::bail!("Notification permission denied");
        }

        let appointment_id = payload.appointment_id.clone();
        let delay = (trigger_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        let mut pending = self.pending.write().await;
        if let Some(previous) = pending.remove(&appointment_id) {
            log::info!("Replacing pending notification. [appointment_id = {appointment_id}]");
            previous.cancellation.cancel();
        }

        log::info!(
            "Registered local notification. [appointment_id = {}, fires_in = {:?}]",
            appointment_id,
            delay
        );

        let cancellation = CancellationToken::new();
        let firing_cancellation = cancellation.clone();
        let events = self.events.clone();
        let task = task::spawn(async move {
            tokio::select! {
                _ = firing_cancellation.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    log::info!(
                        "Showing notification. [appointment_id = {}, title = {:?}, body = {:?}]",
                        payload.appointment_id,
                        payload.title,
                        payload.body
                    );
                    let _ = events.send(NotificationEvent::Received(payload)).await;
                }
            }
        });

        pending.insert(appointment_id, PendingNotification { task, cancellation });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeDelta;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn fires_at_the_trigger_instant_and_emits_a_received_event() {
        let (center, mut events) = LocalNotificationCenter::start(PermissionStatus::Granted);
        let expected = payload("apt-1", "Dr. House");

        center
            .schedule(Utc::now() + TimeDelta::seconds(600), expected.clone())
            .await
            .unwrap();

        let early = timeout(Duration::from_secs(60), events.recv()).await;
        assert!(early.is_err(), "nothing may fire before the trigger instant");

        tokio::time::sleep(Duration::from_secs(600)).await;

        let event = timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap();
        assert_eq!(event, Some(NotificationEvent::Received(expected)));
    }

    #[tokio::test(start_paused = true)]
    async fn denied_permission_refuses_to_register_anything() {
        let (center, _events) = LocalNotificationCenter::start(PermissionStatus::Denied);

        let result = center
            .schedule(Utc::now() + TimeDelta::seconds(600), payload("apt-1", "Dr. House"))
            .await;

        assert!(result.is_err());
        assert!(center.pending.read().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_an_id_replaces_the_pending_notification() {
        let (center, mut events) = LocalNotificationCenter::start(PermissionStatus::Granted);
        let first = payload("apt-1", "Dr. House");
        let replacement = payload("apt-1", "Dr. Wilson");

        center
            .schedule(Utc::now() + TimeDelta::seconds(600), first)
            .await
            .unwrap();
        center
            .schedule(Utc::now() + TimeDelta::seconds(300), replacement.clone())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(900)).await;

        let event = timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap();
        assert_eq!(event, Some(NotificationEvent::Received(replacement)));

        let extra = timeout(Duration::from_secs(1), events.recv()).await;
        assert!(extra.is_err(), "the replaced notification must not fire");
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_appointments_fire_independently() {
        let (center, mut events) = LocalNotificationCenter::start(PermissionStatus::Granted);
        let first = payload("apt-1", "Dr. House");
        let second = payload("apt-2", "Dr. Wilson");

        center
            .schedule(Utc::now() + TimeDelta::seconds(300), first.clone())
            .await
            .unwrap();
        center
            .schedule(Utc::now() + TimeDelta::seconds(600), second.clone())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(900)).await;

        let received = [
            timeout(Duration::from_secs(1), events.recv()).await.unwrap(),
            timeout(Duration::from_secs(1), events.recv()).await.unwrap(),
        ];
        assert_eq!(
            received,
            [
                Some(NotificationEvent::Received(first)),
                Some(NotificationEvent::Received(second))
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fired_notifications_are_swept_from_the_pending_store() {
        let (center, mut events) = LocalNotificationCenter::start(PermissionStatus::Granted);

        center
            .schedule(Utc::now(), payload("apt-1", "Dr. House"))
            .await
            .unwrap();

        let event = timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap();
        assert!(event.is_some());

        tokio::time::sleep(CLEANUP_INTERVAL + Duration::from_secs(60)).await;

        assert!(center.pending.read().await.is_empty());
    }

    fn payload(id: &str, doctor: &str) -> ReminderPayload {
        ReminderPayload {
            appointment_id: id.to_string(),
            doctor_name: doctor.to_string(),
            time_slot: "6:00-7:00".to_string(),
            driving_link: "http://maps.example/route".to_string(),
            title: crate::notification::REMINDER_TITLE.to_string(),
            body: format!("Your appointment with {doctor} is in less than 1 hour."),
        }
    }
}
