use std::time::Duration;

use vizit::notification::PermissionStatus;
use vizit::{LocalNotificationCenter, ReminderScheduler, appointment_slot, appsettings};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = appsettings::get();
    let permission = if settings.scheduler.notifications_allowed {
        PermissionStatus::Granted
    } else {
        PermissionStatus::Denied
    };

    let (center, events) = LocalNotificationCenter::start(permission);
    let (source, feed) = appointment_slot();

    if let Some(appointment) = settings.appointment.clone() {
        log::info!(
            "Confirming appointment from settings. [appointment_id = {}]",
            appointment.id
        );
        source.confirm(appointment);
    }

    let scheduler = ReminderScheduler::start(feed, center, events, settings.scheduler.timezone);

    tokio::signal::ctrl_c().await?;
    log::info!("Received shutdown signal");
    scheduler.shutdown(SHUTDOWN_TIMEOUT).await;

    Ok(())
}
