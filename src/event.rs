use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};

use crate::recurrence::{self, NoOccurrenceInWindow, TrimesterWindow};
use crate::timetable::ClassSession;

/// A class session placed on the calendar: its first occurrence, repeated
/// weekly until `until` (inclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringEvent {
    pub uid: String,
    pub title: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub until: NaiveDate,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSession {
    pub session: ClassSession,
    pub reason: NoOccurrenceInWindow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    pub events: Vec<RecurringEvent>,
    pub skipped: Vec<SkippedSession>,
}

impl Schedule {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// One-line report of the skipped sessions, `None` when nothing was skipped.
    pub fn skip_summary(&self, window: &TrimesterWindow) -> Option<String> {
        match self.skipped_count() {
            0 => None,
            1 => Some(format!(
                "Skipped 1 class session that never takes place between {} and {}",
                window.start(),
                window.end()
            )),
            count => Some(format!(
                "Skipped {count} class sessions that never take place between {} and {}",
                window.start(),
                window.end()
            )),
        }
    }
}

impl RecurringEvent {
    fn new(session: &ClassSession, window: &TrimesterWindow) -> Result<Self, NoOccurrenceInWindow> {
        let occurrence = recurrence::resolve(session.weekday, window)?;

        if session.ends_before_start() {
            warn!("{session} ends before it starts, its calendar entry will be inverted");
        }

        let start = occurrence.first.and_time(session.start);
        let end = occurrence.first.and_time(session.end);

        let uid = format!(
            "{}_{}-{}-{}",
            start.format("%Y%m%dT%H%M%S"),
            session.course_code,
            session.class_type,
            session.section
        )
        .replace(' ', "-");

        Ok(Self {
            uid,
            title: session.title(),
            description: session.description(),
            start,
            end,
            until: occurrence.until,
            location: session.location.clone(),
        })
    }
}

/// Places every session on the calendar. Sessions whose weekday never falls
/// inside the window are left out and listed in [`Schedule::skipped`].
pub fn build(sessions: &[ClassSession], window: &TrimesterWindow) -> Schedule {
    let mut schedule = Schedule::default();

    for session in sessions {
        match RecurringEvent::new(session, window) {
            Ok(event) => {
                debug!("Scheduled {session} from {}", event.start.date());
                schedule.events.push(event);
            }
            Err(reason) => {
                warn!("Skipping {session}: {reason}");
                schedule.skipped.push(SkippedSession {
                    session: session.clone(),
                    reason,
                });
            }
        }
    }

    schedule
}
