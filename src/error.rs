use std::io;

use chrono::NaiveDate;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limited by the MMU mobile API, try again later")]
    RateLimited,

    #[error("failed to fetch timetable: {0}")]
    Fetch(reqwest::Error),

    #[error("unexpected timetable response: {0}")]
    Response(String),

    #[error("invalid trimester window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("failed to write calendar: {0}")]
    Io(#[from] io::Error),
}

// Request URLs carry the session token, keep them out of error messages.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Fetch(err.without_url())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Response(err.to_string())
    }
}
