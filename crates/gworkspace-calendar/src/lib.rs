//! Google Calendar helpers: Meet-enabled events, attendees and Drive attachments.

pub mod client;
pub mod error;
pub mod types;

pub use client::CalendarClient;
pub use error::CalendarError;
pub use types::{Attachment, Attendee, Event, EventStatus, EventTime, ResponseStatus};
