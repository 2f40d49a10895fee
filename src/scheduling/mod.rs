mod resolve;
mod scheduler;
mod source;
mod window;

pub use resolve::{ResolveError, resolve_start_instant};
pub use scheduler::ReminderScheduler;
pub use source::{AppointmentFeed, AppointmentSource, appointment_slot};
pub use window::{TriggerDecision, decide_trigger};
