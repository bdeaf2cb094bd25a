//! Field-level parsing shared by the notification patterns.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::ExtractionError;

/// Parses a thousands-separated decimal such as `12,345.67`.
///
/// Separators must form groups of three after the leading group; anything
/// else is rejected instead of being read as zero.
pub fn parse_amount(raw: &str) -> Result<f64, ExtractionError> {
    let malformed = || ExtractionError::MalformedAmount(raw.to_string());
    let trimmed = raw.trim();
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (trimmed, None),
    };

    let groups: Vec<&str> = whole.split(',').collect();
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    let well_grouped = match groups.split_first() {
        Some((first, [])) => all_digits(first),
        Some((first, rest)) => {
            all_digits(first) && first.len() <= 3 && rest.iter().all(|g| g.len() == 3 && all_digits(g))
        }
        None => false,
    };
    if !well_grouped {
        return Err(malformed());
    }
    if let Some(fraction) = fraction {
        if !all_digits(fraction) {
            return Err(malformed());
        }
    }

    let normalized = match fraction {
        Some(fraction) => format!("{}.{}", groups.concat(), fraction),
        None => groups.concat(),
    };
    let amount: f64 = normalized.parse().map_err(|_| malformed())?;
    if !amount.is_finite() {
        return Err(malformed());
    }
    Ok(amount)
}

/// Parses wall-clock text with `format` and resolves it in `tz`.
pub fn parse_local_timestamp(
    raw: &str,
    format: &str,
    tz: Tz,
) -> Result<DateTime<Utc>, ExtractionError> {
    let malformed = || ExtractionError::MalformedDate(raw.to_string());
    let naive = NaiveDateTime::parse_from_str(raw, format).map_err(|_| malformed())?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(malformed()),
    }
}

/// Upper-cases the first letter of each space-separated word and lower-cases the rest.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut word_start = true;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            word_start = true;
            out.push(ch);
        } else if word_start {
            out.extend(ch.to_uppercase());
            word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn amounts_with_separators() {
        assert_eq!(parse_amount("12,345.67"), Ok(12345.67));
        assert_eq!(parse_amount("1,234,567.00"), Ok(1234567.0));
        assert_eq!(parse_amount("950.10"), Ok(950.10));
        assert_eq!(parse_amount("12345.67"), Ok(12345.67));
    }

    #[test]
    fn misplaced_separators_are_rejected() {
        for raw in [",,1.00", "1,23,456.00", "12,34.00", ",100.00", "1,000,.00", ".50"] {
            assert_eq!(
                parse_amount(raw),
                Err(ExtractionError::MalformedAmount(raw.to_string())),
                "{raw}"
            );
        }
    }

    #[test]
    fn local_timestamps_resolve_in_zone() {
        let tz = chrono_tz::Asia::Colombo;
        let parsed = parse_local_timestamp("05-Mar-2025 14:22:10", "%d-%b-%Y %H:%M:%S", tz).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 5, 8, 52, 10).unwrap());
    }

    #[test]
    fn impossible_dates_are_rejected() {
        let tz = chrono_tz::Asia::Colombo;
        assert_eq!(
            parse_local_timestamp("31-Feb-2025 10:00:00", "%d-%b-%Y %H:%M:%S", tz),
            Err(ExtractionError::MalformedDate("31-Feb-2025 10:00:00".into()))
        );
        let gap = parse_local_timestamp(
            "09/03/25 02:30 AM",
            "%d/%m/%y %I:%M %p",
            chrono_tz::America::New_York,
        );
        assert!(matches!(gap, Err(ExtractionError::MalformedDate(_))));
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("KEELLS SUPER"), "Keells Super");
        assert_eq!(title_case("PIZZA  HUT 24"), "Pizza  Hut 24");
    }
}
