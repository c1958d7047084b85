use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use ics::{
    escape_text,
    parameters::TzIDParam,
    properties::{Description, DtEnd, DtStart, Location, RRule, Summary, TzName},
    ICalendar, Standard, TimeZone,
};
use log::debug;

use crate::event::RecurringEvent;

const PRODID: &str = concat!(
    "-//",
    env!("CARGO_PKG_NAME"),
    "//",
    env!("CARGO_PKG_VERSION"),
    "//EN"
);

/// The fixed local time all class times are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstitutionZone {
    pub tzid: &'static str,
    pub abbreviation: &'static str,
    pub utc_offset_secs: i32,
}

pub const MALAYSIA: InstitutionZone = InstitutionZone {
    tzid: "Asia/Kuala_Lumpur",
    abbreviation: "MYT",
    utc_offset_secs: 8 * 60 * 60,
};

impl InstitutionZone {
    pub fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        local - Duration::seconds(i64::from(self.utc_offset_secs))
    }

    /// Offset in the `+HHMM` form used by VTIMEZONE.
    fn offset(&self) -> String {
        let sign = if self.utc_offset_secs < 0 { '-' } else { '+' };
        let secs = self.utc_offset_secs.unsigned_abs();
        format!("{sign}{:02}{:02}", secs / 3600, secs % 3600 / 60)
    }

    fn to_ics(&self) -> TimeZone<'static> {
        let offset = self.offset();

        let mut standard = Standard::new(String::from("19700101T000000"), offset.clone(), offset);
        standard.push(TzName::new(self.abbreviation));

        TimeZone::standard(self.tzid, standard)
    }
}

fn local_timestamp(datetime: NaiveDateTime) -> String {
    datetime.format("%Y%m%dT%H%M%S").to_string()
}

fn utc_timestamp(datetime: NaiveDateTime) -> String {
    datetime.format("%Y%m%dT%H%M%SZ").to_string()
}

/// UNTIL must be given in UTC when DTSTART carries a TZID, so the last
/// second of `until` in local time is converted.
fn weekly_rule(until: NaiveDate, zone: &InstitutionZone) -> String {
    let last_second = until.and_time(NaiveTime::default()) + Duration::seconds(24 * 60 * 60 - 1);
    format!("FREQ=WEEKLY;UNTIL={}", utc_timestamp(zone.to_utc(last_second)))
}

impl RecurringEvent {
    pub fn to_ics(&self, zone: &InstitutionZone) -> ics::Event<'_> {
        // DTSTAMP follows the first start so repeated exports are identical.
        let mut ics_event =
            ics::Event::new(self.uid.clone(), utc_timestamp(zone.to_utc(self.start)));

        let mut start = DtStart::new(local_timestamp(self.start));
        start.add(TzIDParam::new(zone.tzid));
        ics_event.push(start);

        let mut end = DtEnd::new(local_timestamp(self.end));
        end.add(TzIDParam::new(zone.tzid));
        ics_event.push(end);

        ics_event.push(RRule::new(weekly_rule(self.until, zone)));
        ics_event.push(Summary::new(escape_text(self.title.as_str())));

        if !self.location.is_empty() {
            ics_event.push(Location::new(escape_text(self.location.as_str())));
        }

        ics_event.push(Description::new(escape_text(self.description.as_str())));

        ics_event
    }
}

pub fn to_ics<'a>(events: &'a [RecurringEvent], zone: &InstitutionZone) -> ICalendar<'a> {
    let mut icalendar = ICalendar::new("2.0", PRODID);
    icalendar.add_timezone(zone.to_ics());

    for event in events {
        icalendar.add_event(event.to_ics(zone));
    }

    icalendar
}

pub fn render(events: &[RecurringEvent], zone: &InstitutionZone) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    to_ics(events, zone).write(&mut buffer)?;
    Ok(buffer)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Writes the calendar to `path`. The file only appears once it has been
/// written completely.
pub fn write<P: AsRef<Path>>(
    path: P,
    events: &[RecurringEvent],
    zone: &InstitutionZone,
) -> io::Result<()> {
    let path = path.as_ref();
    let bytes = render(events, zone)?;
    let partial = partial_path(path);

    debug!("Writing {} bytes to {}", bytes.len(), partial.display());

    if let Err(err) = fs::write(&partial, &bytes).and_then(|()| fs::rename(&partial, path)) {
        let _ = fs::remove_file(&partial);
        return Err(err);
    }

    Ok(())
}
