//! Time Axis Decoding Module
//! Turns CF-style numeric time coordinates into calendar months.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// First month of the substituted sequence when the time axis cannot be decoded.
const SYNTHETIC_START: (i32, u32) = (2010, 1);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    #[error("Time axis has no units attribute")]
    MissingUnits,
    #[error("Unrecognised time units: {0:?}")]
    BadUnits(String),
    #[error("Unsupported time step {0:?} (expected days, hours, minutes or seconds)")]
    UnsupportedStep(String),
    #[error("Unsupported calendar {0:?}")]
    UnsupportedCalendar(String),
    #[error("Time value {0} is not a finite offset")]
    BadOffset(f64),
}

fn step_millis(step: &str) -> Result<f64, CalendarError> {
    let ms = match step.to_ascii_lowercase().as_str() {
        "days" | "day" | "d" => 86_400_000.0,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3_600_000.0,
        "minutes" | "minute" | "mins" | "min" => 60_000.0,
        "seconds" | "second" | "secs" | "sec" | "s" => 1_000.0,
        other => return Err(CalendarError::UnsupportedStep(other.to_string())),
    };
    Ok(ms)
}

fn parse_reference(text: &str) -> Option<NaiveDateTime> {
    let text = text
        .trim()
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim();

    const FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Decode CF time values (`"<step> since <reference>"`) into months.
pub fn decode_months(
    values: &[f64],
    units: Option<&str>,
    calendar: Option<&str>,
) -> Result<Vec<u32>, CalendarError> {
    if let Some(cal) = calendar {
        let cal = cal.trim().to_ascii_lowercase();
        if !matches!(cal.as_str(), "standard" | "gregorian" | "proleptic_gregorian") {
            return Err(CalendarError::UnsupportedCalendar(cal));
        }
    }

    let units = units.ok_or(CalendarError::MissingUnits)?;
    let (step, reference) = units
        .split_once(" since ")
        .ok_or_else(|| CalendarError::BadUnits(units.to_string()))?;
    let ms_per_step = step_millis(step.trim())?;
    let origin =
        parse_reference(reference).ok_or_else(|| CalendarError::BadUnits(units.to_string()))?;

    values
        .iter()
        .map(|&v| {
            let millis = (v * ms_per_step).round();
            // ~31 700 years either side of the reference
            if !millis.is_finite() || millis.abs() > 1.0e15 {
                return Err(CalendarError::BadOffset(v));
            }
            let offset = Duration::milliseconds(millis as i64);
            origin
                .checked_add_signed(offset)
                .map(|t| t.month())
                .ok_or(CalendarError::BadOffset(v))
        })
        .collect()
}

/// Monthly sequence starting January 2010, `n` steps long.
pub fn synthetic_months(n: usize) -> Vec<u32> {
    let (year, month) = SYNTHETIC_START;
    let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default();
    (0..n)
        .map(|i| {
            start
                .checked_add_months(Months::new(i as u32))
                .map(|d| d.month())
                .unwrap_or((i % 12) as u32 + 1)
        })
        .collect()
}

/// Decode months, falling back to [`synthetic_months`] unless `strict`.
pub fn resolve_months(
    values: &[f64],
    units: Option<&str>,
    calendar: Option<&str>,
    strict: bool,
) -> Result<Vec<u32>, CalendarError> {
    match decode_months(values, units, calendar) {
        Ok(months) => Ok(months),
        Err(e) if strict => Err(e),
        Err(e) => {
            log::warn!(
                "Time axis could not be decoded ({}); assuming {} consecutive months from {}-{:02}",
                e,
                values.len(),
                SYNTHETIC_START.0,
                SYNTHETIC_START.1
            );
            Ok(synthetic_months(values.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_days_since() {
        // Mid-month offsets for Jan..Mar 2010
        let months =
            decode_months(&[15.0, 45.0, 74.0], Some("days since 2010-01-01"), None).unwrap();
        assert_eq!(months, vec![1, 2, 3]);
    }

    #[test]
    fn decodes_hours_with_time_of_day() {
        let months = decode_months(
            &[0.0, 24.0 * 31.0],
            Some("hours since 1999-12-01 00:00:00"),
            Some("gregorian"),
        )
        .unwrap();
        assert_eq!(months, vec![12, 1]);
    }

    #[test]
    fn unpadded_reference_date() {
        let months = decode_months(&[0.0], Some("days since 2000-6-1"), None).unwrap();
        assert_eq!(months, vec![6]);
    }

    #[test]
    fn months_since_is_unsupported() {
        let err = decode_months(&[0.0], Some("months since 2010-01-01"), None).unwrap_err();
        assert_eq!(err, CalendarError::UnsupportedStep("months".into()));
    }

    #[test]
    fn non_standard_calendar_is_rejected() {
        let err = decode_months(&[0.0], Some("days since 2010-01-01"), Some("noleap")).unwrap_err();
        assert!(matches!(err, CalendarError::UnsupportedCalendar(_)));
    }

    #[test]
    fn synthetic_sequence_wraps_years() {
        let months = synthetic_months(14);
        assert_eq!(months[0], 1);
        assert_eq!(months[11], 12);
        assert_eq!(months[12], 1);
        assert_eq!(months[13], 2);
    }

    #[test]
    fn fallback_only_when_lenient() {
        let values = [0.0, 1.0, 2.0];
        let lenient = resolve_months(&values, None, None, false).unwrap();
        assert_eq!(lenient, vec![1, 2, 3]);

        let strict = resolve_months(&values, None, None, true);
        assert_eq!(strict, Err(CalendarError::MissingUnits));
    }
}
