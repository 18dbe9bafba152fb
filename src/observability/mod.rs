//! Observability for whiteflag runs
//!
//! Structured one-line JSON logs with typed events.
//!
//! ```ignore
//! use whiteflag::observability::{log_event, Event};
//!
//! log_event(Event::RecordRejected, &[("record_id", "rec1"), ("issues", "...")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a typed event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
