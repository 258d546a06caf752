use chrono::{NaiveTime, Weekday};

use crate::processed::{DaySchedule, ParseError, TimeSegment, WeekSchedule};
use crate::raw::{HoursEntry, ProviderDocument};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Decodes the per-weekday hours arrays of a provider document. Weekdays
/// without a field are left out of the schedule entirely.
pub fn extract_week(document: &ProviderDocument) -> Result<WeekSchedule, ParseError> {
    let mut days = Vec::new();
    for day in WEEK {
        let Some(entries) = document.hours_for(day) else {
            continue;
        };
        days.push(DaySchedule {
            day,
            segments: decode_day(day, entries)?,
        });
    }

    Ok(WeekSchedule::new(days))
}

fn decode_day(day: Weekday, entries: &[HoursEntry]) -> Result<Vec<TimeSegment>, ParseError> {
    if entries.len() % 4 != 0 {
        return Err(ParseError::MisalignedHours {
            day,
            len: entries.len(),
        });
    }

    entries
        .chunks_exact(4)
        .map(|tuple| decode_segment(day, tuple))
        .collect()
}

fn decode_segment(day: Weekday, tuple: &[HoursEntry]) -> Result<TimeSegment, ParseError> {
    let is_open = match &tuple[3] {
        HoursEntry::Flag(flag) => *flag,
        HoursEntry::Time(_) => return Err(ParseError::HoursType { day, pos: 3 }),
    };
    if !is_open {
        return Ok(TimeSegment::Closed);
    }

    Ok(TimeSegment::Open {
        opens_at: parse_clock(time_at(day, tuple, 0)?)?,
        closes_at: parse_clock(time_at(day, tuple, 1)?)?,
        last_order_at: parse_clock(time_at(day, tuple, 2)?)?,
    })
}

fn time_at<'a>(day: Weekday, tuple: &'a [HoursEntry], pos: usize) -> Result<&'a str, ParseError> {
    match &tuple[pos] {
        HoursEntry::Time(raw) => Ok(raw),
        HoursEntry::Flag(_) => Err(ParseError::HoursType { day, pos }),
    }
}

/// `"H.MM"`, hour without a leading zero.
pub fn parse_clock(raw: &str) -> Result<NaiveTime, ParseError> {
    let invalid = || ParseError::InvalidTime(raw.to_string());

    let (hour, minute) = raw.split_once('.').ok_or_else(invalid)?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(hours_mon: serde_json::Value) -> ProviderDocument {
        serde_json::from_value(json!({
            "id": "p1",
            "name": "Mensa X",
            "location": "Würzburg",
            "category": "canteen",
            "type": "Cafeteria",
            "hours_mon": hours_mon,
        }))
        .unwrap()
    }

    fn clock(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn decodes_an_open_monday_segment() {
        let week = extract_week(&document(json!(["8.00", "14.00", "13.30", true]))).unwrap();

        assert_eq!(
            week.day(Weekday::Mon),
            Some(
                &[TimeSegment::Open {
                    opens_at: clock(8, 0),
                    closes_at: clock(14, 0),
                    last_order_at: clock(13, 30),
                }][..]
            )
        );
    }

    #[test]
    fn closed_segments_keep_their_slot() {
        let week = extract_week(&document(json!([
            "8.00", "11.30", "11.00", true,
            "12.00", "18.00", "17.30", false,
        ])))
        .unwrap();

        let monday = week.day(Weekday::Mon).unwrap();
        assert_eq!(monday.len(), 2);
        assert_eq!(monday[1], TimeSegment::Closed);
    }

    #[test]
    fn absent_weekdays_are_omitted() {
        let week = extract_week(&document(json!(["8.00", "14.00", "13.30", true]))).unwrap();

        assert!(week.day(Weekday::Tue).is_none());
        assert_eq!(week.days().count(), 1);
    }

    #[test]
    fn closed_segments_skip_time_validation() {
        let week = extract_week(&document(json!(["", "", "", false]))).unwrap();

        assert_eq!(week.day(Weekday::Mon), Some(&[TimeSegment::Closed][..]));
    }

    #[test]
    fn malformed_times_are_hard_errors() {
        let err = extract_week(&document(json!(["8:00", "14.00", "13.30", true]))).unwrap_err();
        assert!(matches!(err, ParseError::InvalidTime(raw) if raw == "8:00"));

        let err = extract_week(&document(json!(["8.x0", "14.00", "13.30", true]))).unwrap_err();
        assert!(matches!(err, ParseError::InvalidTime(_)));

        let err = extract_week(&document(json!(["25.00", "14.00", "13.30", true]))).unwrap_err();
        assert!(matches!(err, ParseError::InvalidTime(_)));
    }

    #[test]
    fn truncated_tuples_are_rejected() {
        let err = extract_week(&document(json!(["8.00", "14.00", "13.30"]))).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MisalignedHours {
                day: Weekday::Mon,
                len: 3
            }
        ));
    }

    #[test]
    fn flag_position_must_be_a_bool() {
        let err = extract_week(&document(json!(["8.00", "14.00", "13.30", "true"]))).unwrap_err();
        assert!(matches!(
            err,
            ParseError::HoursType {
                day: Weekday::Mon,
                pos: 3
            }
        ));
    }

    #[test]
    fn parse_clock_reads_hour_dot_minute() {
        assert_eq!(parse_clock("13.30").unwrap(), clock(13, 30));
        assert_eq!(parse_clock("8.05").unwrap(), clock(8, 5));
    }
}
