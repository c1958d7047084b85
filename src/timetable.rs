use std::fmt;

use chrono::{NaiveTime, Weekday};
use serde::{de, Deserialize, Deserializer};

use crate::error::Result;

fn deserialize_weekday<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
    let day = String::deserialize(deserializer)?;
    day.trim()
        .parse::<Weekday>()
        .map_err(|_| de::Error::custom(format!("unknown weekday `{day}`")))
}

fn deserialize_naive_time<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<NaiveTime, D::Error> {
    let time = String::deserialize(deserializer)?;
    let trimmed = time.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|err| de::Error::custom(format!("invalid time of day `{time}`: {err}")))
}

/// A weekly class slot as reported by the MMU mobile API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassSession {
    #[serde(rename = "subject_code")]
    pub course_code: String,
    #[serde(rename = "subject_name")]
    pub course_name: String,
    #[serde(rename = "type", default)]
    pub class_type: String,
    #[serde(default)]
    pub section: String,
    #[serde(rename = "day", deserialize_with = "deserialize_weekday")]
    pub weekday: Weekday,
    #[serde(deserialize_with = "deserialize_naive_time")]
    pub start: NaiveTime,
    #[serde(deserialize_with = "deserialize_naive_time")]
    pub end: NaiveTime,
    #[serde(rename = "venue", default)]
    pub location: String,
    #[serde(rename = "strm", default)]
    pub term: Option<String>,
}

impl ClassSession {
    pub fn title(&self) -> String {
        format!("{} {}", self.course_code, self.course_name)
    }

    pub fn description(&self) -> String {
        format!("{} - {}", self.section, self.location)
    }

    /// True when the end time lies before the start time.
    pub fn ends_before_start(&self) -> bool {
        self.end < self.start
    }
}

impl fmt::Display for ClassSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {} {}-{}",
            self.course_code,
            self.class_type,
            self.weekday,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Parses a timetable response body, a list of per-day lists of sessions,
/// into a flat list keeping the order of the response.
pub fn parse_timetable<S: AsRef<str>>(body: S) -> Result<Vec<ClassSession>> {
    let days: Vec<Vec<ClassSession>> = serde_json::from_str(body.as_ref())?;
    Ok(days.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const RESPONSE: &str = r#"[
        [
            {
                "day": "Monday",
                "start": "14:00",
                "end": "17:00",
                "subject_name": "CIRCUIT THEORY",
                "subject_code": "EEE1234",
                "type": "LEC",
                "venue": "FOEVC0123",
                "section": "EC01",
                "strm": "2110"
            }
        ],
        [],
        [
            {
                "day": "Wednesday",
                "start": "08:00",
                "end": "10:00",
                "subject_name": "CIRCUIT THEORY",
                "subject_code": "EEE1234",
                "type": "TUT",
                "venue": "FOEVC0456",
                "section": "ET01",
                "strm": "2110"
            }
        ]
    ]"#;

    #[test]
    fn flattens_days_in_order() {
        let sessions = parse_timetable(RESPONSE).unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].weekday, Weekday::Mon);
        assert_eq!(sessions[0].start, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(sessions[0].end, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(sessions[0].location, "FOEVC0123");
        assert_eq!(sessions[0].term.as_deref(), Some("2110"));
        assert_eq!(sessions[1].weekday, Weekday::Wed);
        assert_eq!(sessions[1].class_type, "TUT");
    }

    #[test]
    fn title_and_description() {
        let sessions = parse_timetable(RESPONSE).unwrap();

        assert_eq!(sessions[0].title(), "EEE1234 CIRCUIT THEORY");
        assert_eq!(sessions[0].description(), "EC01 - FOEVC0123");
    }

    #[test]
    fn rejects_unknown_weekday() {
        let body = r#"[[{"day": "Someday", "start": "08:00", "end": "09:00",
            "subject_name": "X", "subject_code": "Y"}]]"#;

        let err = parse_timetable(body).unwrap_err();
        assert!(err.to_string().contains("unknown weekday `Someday`"));
    }

    #[test]
    fn rejects_malformed_time() {
        let body = r#"[[{"day": "Friday", "start": "8am", "end": "09:00",
            "subject_name": "X", "subject_code": "Y"}]]"#;

        assert!(parse_timetable(body).is_err());
    }

    #[rstest]
    #[case("09:00", "10:30", (9, 0, 0), (10, 30, 0))]
    #[case("09:00:00", "10:30:15", (9, 0, 0), (10, 30, 15))]
    #[case(" 14:00 ", "17:00:00", (14, 0, 0), (17, 0, 0))]
    fn accepts_times_with_and_without_seconds(
        #[case] start: &str,
        #[case] end: &str,
        #[case] expected_start: (u32, u32, u32),
        #[case] expected_end: (u32, u32, u32),
    ) {
        let body = format!(
            r#"[[{{"day": "Monday", "start": "{start}", "end": "{end}",
                "subject_name": "X", "subject_code": "Y"}}]]"#
        );

        let sessions = parse_timetable(body).unwrap();
        let (h, m, s) = expected_start;
        assert_eq!(sessions[0].start, NaiveTime::from_hms_opt(h, m, s).unwrap());
        let (h, m, s) = expected_end;
        assert_eq!(sessions[0].end, NaiveTime::from_hms_opt(h, m, s).unwrap());
    }

    #[test]
    fn detects_class_ending_before_start() {
        let body = r#"[[{"day": "Monday", "start": "10:00", "end": "09:00",
            "subject_name": "X", "subject_code": "Y"}]]"#;

        let sessions = parse_timetable(body).unwrap();
        assert!(sessions[0].ends_before_start());
        assert!(!parse_timetable(RESPONSE).unwrap()[0].ends_before_start());
    }

    #[test]
    fn optional_fields_default() {
        let body = r#"[[{"day": "friday", "start": "08:00", "end": "09:00",
            "subject_name": "X", "subject_code": "Y"}]]"#;

        let sessions = parse_timetable(body).unwrap();
        assert_eq!(sessions[0].weekday, Weekday::Fri);
        assert_eq!(sessions[0].location, "");
        assert_eq!(sessions[0].term, None);
    }
}
