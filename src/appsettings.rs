use std::sync::OnceLock;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::appointment::Appointment;

#[derive(Deserialize, Debug)]
pub struct SchedulerSettings {
    /// Zone the appointment date and slot time are interpreted in.
    pub timezone: chrono_tz::Tz,
    /// What the platform answers when asked for notification permission.
    pub notifications_allowed: bool,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub scheduler: SchedulerSettings,
    /// Appointment confirmed at startup, standing in for the booking flow.
    pub appointment: Option<Appointment>,
}

impl AppSettings {
    fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP"))
            .build()?;

        settings.try_deserialize()
    }
}

pub fn get() -> &'static AppSettings {
    static APPSETTINGS: OnceLock<AppSettings> = OnceLock::new();
    APPSETTINGS.get_or_init(|| AppSettings::new().unwrap())
}
