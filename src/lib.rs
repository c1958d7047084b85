//! Turns an MMU class timetable into weekly recurring iCalendar events.
//!
//! The pipeline is [`mmu::MmuClient::fetch_timetable`] → [`event::build`] →
//! [`ics::write`](crate::ics::write), with [`recurrence::resolve`] placing each
//! class on its first day inside the trimester.

pub mod error;
pub mod event;
pub mod ics;
pub mod mmu;
pub mod recurrence;
pub mod timetable;

pub use error::{Error, Result};
pub use event::{build, RecurringEvent, Schedule, SkippedSession};
pub use recurrence::{resolve, NoOccurrenceInWindow, Occurrence, TrimesterWindow};
pub use timetable::{parse_timetable, ClassSession};
