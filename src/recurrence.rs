use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::{Error, Result};

/// Inclusive range of dates during which classes take place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimesterWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl TrimesterWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidWindow { start, end });
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub first: NaiveDate,
    /// Last date on which the weekly rule may still produce an instance.
    pub until: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no {weekday} between {start} and {end}")]
pub struct NoOccurrenceInWindow {
    pub weekday: Weekday,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Finds the first `weekday` on or after the start of `window`.
pub fn resolve(
    weekday: Weekday,
    window: &TrimesterWindow,
) -> Result<Occurrence, NoOccurrenceInWindow> {
    let none = NoOccurrenceInWindow {
        weekday,
        start: window.start,
        end: window.end,
    };

    let offset =
        (7 + weekday.num_days_from_monday() - window.start.weekday().num_days_from_monday()) % 7;

    let first = window
        .start
        .checked_add_days(Days::new(u64::from(offset)))
        .ok_or(none)?;

    if first > window.end {
        return Err(none);
    }

    Ok(Occurrence {
        first,
        until: window.end,
    })
}
