//! Time durations with millisecond resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

const MILLIS_PER_SECOND: i64 = 1000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// A signed duration in milliseconds.
///
/// Text form is `[<N>d ]HH:MM:SS[.mmm]`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TimeDuration {
    pub millis: i64,
}

impl TimeDuration {
    pub const fn from_millis(millis: i64) -> Self {
        TimeDuration { millis }
    }

    pub fn from_hms(hours: i64, minutes: i64, seconds: i64) -> Self {
        TimeDuration::from_millis(
            hours * MILLIS_PER_HOUR + minutes * MILLIS_PER_MINUTE + seconds * MILLIS_PER_SECOND,
        )
    }

    /// Parse `[<N>d]HH:MM[:SS[.mmm]]`.
    ///
    /// Minutes and seconds must be 0-59; the fractional part is one to three
    /// digits read as a decimal fraction of a second. A leading `-` negates.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (negative, s) = match s.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, s),
        };

        let (days, clock) = match s.find(['d', 'D']) {
            Some(pos) => (parse_digits(s[..pos].trim())?, s[pos + 1..].trim_start()),
            None => (0, s),
        };

        let mut parts = clock.split(':');
        let hours = parse_digits(parts.next()?)?;
        let minutes = parse_digits(parts.next()?)?;
        let (seconds, millis) = match parts.next() {
            Some(sec) => parse_seconds(sec)?,
            None => (0, 0),
        };
        if parts.next().is_some() || minutes > 59 || seconds > 59 {
            return None;
        }

        let total = days
            .checked_mul(MILLIS_PER_DAY)?
            .checked_add(hours.checked_mul(MILLIS_PER_HOUR)?)?
            .checked_add(minutes * MILLIS_PER_MINUTE)?
            .checked_add(seconds * MILLIS_PER_SECOND)?
            .checked_add(millis)?;

        Some(TimeDuration::from_millis(if negative { -total } else { total }))
    }
}

fn parse_digits(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_seconds(s: &str) -> Option<(i64, i64)> {
    match s.split_once('.') {
        Some((secs, frac)) => {
            if frac.is_empty() || frac.len() > 3 {
                return None;
            }
            let scale = 10i64.pow(3 - frac.len() as u32);
            Some((parse_digits(secs)?, parse_digits(frac)? * scale))
        }
        None => Some((parse_digits(s)?, 0)),
    }
}

impl fmt::Display for TimeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis < 0 {
            f.write_str("-")?;
        }
        let abs = self.millis.unsigned_abs();
        let ms = abs % 1000;
        let total_secs = abs / 1000;
        let secs = total_secs % 60;
        let mins = (total_secs / 60) % 60;
        let total_hours = total_secs / 3600;
        let (days, hours) = (total_hours / 24, total_hours % 24);

        if days > 0 {
            write!(f, "{}d ", days)?;
        }
        write!(f, "{:02}:{:02}:{:02}", hours, mins, secs)?;
        if ms > 0 {
            write!(f, ".{:03}", ms)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TimeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeDuration({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_forms() {
        assert_eq!(TimeDuration::parse("01:30"), Some(TimeDuration::from_hms(1, 30, 0)));
        assert_eq!(TimeDuration::parse("00:00:59"), Some(TimeDuration::from_hms(0, 0, 59)));
        assert_eq!(
            TimeDuration::parse("10:05:07.250"),
            Some(TimeDuration::from_millis(36_307_250))
        );
        assert_eq!(TimeDuration::parse("00:00:00.5"), Some(TimeDuration::from_millis(500)));
        assert_eq!(TimeDuration::parse("36:00"), Some(TimeDuration::from_hms(36, 0, 0)));
    }

    #[test]
    fn test_parse_days() {
        let expected = TimeDuration::from_millis(2 * MILLIS_PER_DAY + 3 * MILLIS_PER_HOUR);
        assert_eq!(TimeDuration::parse("2d 03:00"), Some(expected));
        assert_eq!(TimeDuration::parse("2d03:00:00"), Some(expected));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert_eq!(TimeDuration::parse("01:60"), None);
        assert_eq!(TimeDuration::parse("01:00:60"), None);
        assert_eq!(TimeDuration::parse("01:00:00.1000"), None);
        assert_eq!(TimeDuration::parse("1:2:3:4"), None);
        assert_eq!(TimeDuration::parse("noon"), None);
        assert_eq!(TimeDuration::parse("12"), None);
        assert_eq!(TimeDuration::parse("xd 01:00"), None);
        assert_eq!(TimeDuration::parse(""), None);
    }

    #[test]
    fn test_display_roundtrip() {
        for text in ["00:00:00", "01:02:03", "3d 04:05:06.007", "-00:10:00"] {
            let d = TimeDuration::parse(text).unwrap();
            assert_eq!(d.to_string(), text);
        }
    }
}
