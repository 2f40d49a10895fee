//! The reminder scheduler task. Owns the scheduling state, re-evaluates the
//! observed appointment on a fixed cadence and hands due reminders to the
//! notification sink.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use tokio::{sync::mpsc, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::appointment::{Appointment, AppointmentId};
use crate::notification::{NotificationEvent, NotificationSink, PermissionStatus, ReminderPayload};
use crate::scheduling::resolve::resolve_start_instant;
use crate::scheduling::source::AppointmentFeed;
use crate::scheduling::window::{TriggerDecision, decide_trigger};

/// Cadence at which the observed appointment is re-evaluated. The first
/// evaluation happens immediately on startup.
const EVALUATION_INTERVAL: Duration = Duration::from_secs(20 * 60);

/// Handle to the running scheduler task. Dropping it cancels the task;
/// [`ReminderScheduler::shutdown`] cancels and joins it.
pub struct ReminderScheduler {
    task_handle: Option<JoinHandle<()>>,
    cancellation_token: CancellationToken,
}

impl ReminderScheduler {
    pub fn start(
        feed: AppointmentFeed,
        sink: Arc<dyn NotificationSink>,
        events: mpsc::Receiver<NotificationEvent>,
        timezone: Tz,
    ) -> Self {
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();

        let task_handle = tokio::spawn(async move {
            run_scheduler(feed, sink, events, timezone, task_cancellation_token).await;
        });

        Self {
            task_handle: Some(task_handle),
            cancellation_token,
        }
    }

    pub async fn shutdown(mut self, timeout: Duration) {
        self.cancellation_token.cancel();
        if let Some(task_handle) = self.task_handle.take() {
            let _ = time::timeout(timeout, task_handle).await;
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum SchedulerPhase {
    Idle,
    Observing,
    Scheduled,
}

/// State owned by the scheduler task. `scheduled_for` holds the id of the
/// appointment whose reminder has been handed to the sink; it is cleared
/// only when the slot empties or a different appointment replaces it,
/// never by mere passage of time.
struct SchedulingState {
    observed: Option<Appointment>,
    scheduled_for: Option<AppointmentId>,
}

impl SchedulingState {
    fn new(observed: Option<Appointment>) -> Self {
        Self {
            observed,
            scheduled_for: None,
        }
    }

    fn phase(&self) -> SchedulerPhase {
        match (&self.observed, &self.scheduled_for) {
            (None, _) => SchedulerPhase::Idle,
            (Some(_), None) => SchedulerPhase::Observing,
            (Some(_), Some(_)) => SchedulerPhase::Scheduled,
        }
    }

    fn observe(&mut self, slot: Option<Appointment>) {
        match slot {
            Some(appointment) => {
                let replaced = self
                    .observed
                    .as_ref()
                    .is_some_and(|current| current.id != appointment.id);

                if replaced {
                    log::info!(
                        "Observed replacement appointment. [appointment_id = {}]",
                        appointment.id
                    );
                    self.scheduled_for = None;
                } else if self.observed.is_none() {
                    log::info!(
                        "Observed confirmed appointment. [appointment_id = {}]",
                        appointment.id
                    );
                }

                self.observed = Some(appointment);
            }
            None => {
                if self.observed.is_some() {
                    log::info!("Appointment slot cleared, resetting reminder state");
                }
                self.observed = None;
                self.scheduled_for = None;
            }
        }

        log::debug!("Scheduling state updated. [phase = {:?}]", self.phase());
    }
}

async fn run_scheduler(
    mut feed: AppointmentFeed,
    sink: Arc<dyn NotificationSink>,
    mut events: mpsc::Receiver<NotificationEvent>,
    timezone: Tz,
    cancellation_token: CancellationToken,
) {
    if sink.request_permission().await == PermissionStatus::Denied {
        log::warn!("Notification permission denied, reminders will not be displayed");
    }

    let mut state = SchedulingState::new(feed.borrow_and_update().clone());
    log::info!("Reminder scheduler started. [timezone = {timezone}]");

    let mut tick = time::interval(EVALUATION_INTERVAL);
    let mut feed_open = true;
    let mut events_open = true;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                evaluate(&mut state, sink.as_ref(), timezone).await;
            }
            changed = feed.changed(), if feed_open => {
                match changed {
                    Ok(()) => {
                        let slot = feed.borrow_and_update().clone();
                        state.observe(slot);
                    }
                    Err(_) => {
                        feed_open = false;
                        log::info!("Appointment source dropped, keeping last observed appointment");
                    }
                }
            }
            event = events.recv(), if events_open => {
                match event {
                    Some(event) => log_notification_event(&event),
                    None => events_open = false,
                }
            }
            _ = cancellation_token.cancelled() => {
                log::info!("Reminder scheduler shutting down");
                break;
            }
        };
    }
}

/// One evaluation pass. The decision is a pure function of the observed
/// state and the clock; the only side effect is the sink call. On a failed
/// call the state is left unadvanced so the next tick retries.
async fn evaluate(state: &mut SchedulingState, sink: &dyn NotificationSink, timezone: Tz) {
    let Some(appointment) = state.observed.clone() else {
        return;
    };

    if state.scheduled_for.as_ref() == Some(&appointment.id) {
        return;
    }

    let start_at = match resolve_start_instant(&appointment, timezone) {
        Ok(instant) => instant.with_timezone(&Utc),
        Err(error) => {
            log::warn!(
                "Could not resolve appointment start, skipping this pass. [appointment_id = {}, error = {}]",
                appointment.id,
                error
            );
            return;
        }
    };

    match decide_trigger(start_at, Utc::now()) {
        TriggerDecision::AlreadyPast => {
            log::info!(
                "Appointment start has passed, no reminder owed. [appointment_id = {}]",
                appointment.id
            );
        }
        TriggerDecision::OutsideWindow { starts_in } => {
            log::info!(
                "Appointment not yet eligible for a reminder. [appointment_id = {}, starts_in_minutes = {}]",
                appointment.id,
                starts_in.num_minutes()
            );
        }
        TriggerDecision::ScheduleAt(trigger_at) => {
            let payload = ReminderPayload::for_appointment(&appointment);
            match sink.schedule(trigger_at, payload).await {
                Ok(()) => {
                    log::info!(
                        "Reminder scheduled. [appointment_id = {}, trigger_at = {}]",
                        appointment.id,
                        trigger_at
                    );
                    state.scheduled_for = Some(appointment.id.clone());
                }
                Err(error) => {
                    log::warn!(
                        "Could not schedule reminder, will retry next pass. [appointment_id = {}, error = {}]",
                        appointment.id,
                        error
                    );
                }
            }
        }
    }
}

fn log_notification_event(event: &NotificationEvent) {
    match event {
        NotificationEvent::Received(payload) => log::info!(
            "Notification displayed. [appointment_id = {}]",
            payload.appointment_id
        ),
        NotificationEvent::Tapped(payload) => log::info!(
            "Notification tapped. [appointment_id = {}]",
            payload.appointment_id
        ),
    }
}
