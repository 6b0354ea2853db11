//! Defensive date normalization.
//!
//! Spreadsheet decoders hand dates over either as serial numbers or as text
//! in whatever format the vendor's export tool chose. The normalizer tries,
//! in priority order: serial conversion, explicit day/month/year splitting,
//! profile hint formats, then a generic format sweep. Callers always get a
//! valid date or `None`, never an error.

use chrono::{Days, NaiveDate};

use crate::grid::Cell;

use super::patterns::DATE_TOKEN;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// Serial numbers outside this range are not treated as dates.
const MIN_SERIAL: f64 = 1.0;
const MAX_SERIAL: f64 = 50_000.0;

fn year_in_range(date: NaiveDate) -> Option<NaiveDate> {
    use chrono::Datelike;
    let year = date.year();
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Some(date)
    } else {
        None
    }
}

/// Convert a spreadsheet date serial to a calendar date.
///
/// Serial 1 is January 1st 1900. Serials count from day 1, so the offset is
/// `serial - 1`; past day 59 an extra day is subtracted (`serial - 2`) to
/// compensate for the fictitious 1900 leap day that spreadsheet formats
/// carry around.
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(MIN_SERIAL..=MAX_SERIAL).contains(&serial) {
        return None;
    }

    let serial = serial.trunc() as u64;
    let days_to_add = if serial > 59 { serial - 2 } else { serial - 1 };

    let base = NaiveDate::from_ymd_opt(1900, 1, 1)?;
    base.checked_add_days(Days::new(days_to_add))
        .and_then(year_in_range)
}

/// Expand a 2-digit year: `<50` lands in the 2000s, `>=50` in the 1900s.
fn expand_year(segment: &str) -> Option<i32> {
    let year: i32 = segment.parse().ok()?;
    if segment.len() == 4 {
        Some(year)
    } else if segment.len() == 2 {
        Some(if year < 50 { 2000 + year } else { 1900 + year })
    } else {
        None
    }
}

fn month_from_segment(segment: &str) -> Option<u32> {
    if let Ok(n) = segment.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }

    let lower = segment.to_lowercase();
    let prefix = lower.get(..3)?;
    let month = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parse `DD/MM/YYYY`-family strings by splitting on the separator and
/// disambiguating year-first vs day-first by segment length. The month
/// segment may be a name (`08/Aug/2025`).
fn parse_split_date(text: &str) -> Option<NaiveDate> {
    let sep = if text.contains('/') {
        '/'
    } else if text.contains('-') {
        '-'
    } else {
        return None;
    };

    let segments: Vec<&str> = text.split(sep).map(str::trim).collect();
    if segments.len() != 3 {
        return None;
    }

    let (day_seg, month_seg, year_seg) = if segments[0].len() == 4 {
        // Year-first: YYYY/MM/DD
        (segments[2], segments[1], segments[0])
    } else {
        (segments[0], segments[1], segments[2])
    };

    let year = expand_year(year_seg)?;
    let month = month_from_segment(month_seg)?;
    let day: u32 = day_seg.parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day).and_then(year_in_range)
}

/// Formats tried in the generic fallback pass, after profile hints.
const GENERIC_FORMATS: &[&str] = &[
    "%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%Y/%m/%d", "%d/%b/%Y", "%d-%b-%Y", "%d %b %Y",
    "%d %B %Y", "%B %d, %Y", "%m/%d/%Y",
];

fn parse_with_formats(text: &str, formats: &[String]) -> Option<NaiveDate> {
    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            if let Some(date) = year_in_range(date) {
                return Some(date);
            }
        }
    }
    for fmt in GENERIC_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            if let Some(date) = year_in_range(date) {
                return Some(date);
            }
        }
    }
    None
}

/// Parse a date out of free text.
///
/// Tries the whole string first; when that fails, scans for date-shaped
/// tokens and takes the last one. Ranges like `26/9/2025 - 21/10/2025`
/// therefore resolve to the range end, which is the delivery-relevant date.
pub fn parse_date_text(text: &str, hints: &[String]) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = parse_split_date(trimmed) {
        return Some(date);
    }
    if let Some(date) = parse_with_formats(trimmed, hints) {
        return Some(date);
    }

    DATE_TOKEN
        .find_iter(trimmed)
        .filter_map(|m| parse_split_date(m.as_str()))
        .last()
}

/// Normalize a cell to a date, trying serial conversion for numeric cells
/// and text parsing otherwise.
pub fn normalize_date(cell: &Cell, hints: &[String]) -> Option<NaiveDate> {
    match cell {
        Cell::Number(n) => date_from_serial(*n),
        Cell::Text(s) => {
            // Text that is actually a bare serial, e.g. CSV exports.
            if let Ok(n) = s.trim().parse::<f64>() {
                return date_from_serial(n);
            }
            parse_date_text(s, hints)
        }
        Cell::Empty => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_serial_one_is_epoch_day_one() {
        assert_eq!(date_from_serial(1.0), Some(ymd(1900, 1, 1)));
    }

    #[test]
    fn test_serial_below_sixty_gets_single_offset() {
        assert_eq!(date_from_serial(59.0), Some(ymd(1900, 2, 28)));
    }

    #[test]
    fn test_serial_past_fictitious_leap_day() {
        // 198 days past the epoch: the -2 correction applies.
        let expected = ymd(1900, 1, 1).checked_add_days(Days::new(198)).unwrap();
        assert_eq!(date_from_serial(200.0), Some(expected));
    }

    #[test]
    fn test_serial_out_of_range_is_no_date() {
        assert_eq!(date_from_serial(60_000.0), None);
        assert_eq!(date_from_serial(0.0), None);
        assert_eq!(date_from_serial(-5.0), None);
    }

    #[test]
    fn test_day_month_year_with_month_name() {
        assert_eq!(
            parse_date_text("08/Aug/2025", &[]),
            Some(ymd(2025, 8, 8))
        );
    }

    #[test]
    fn test_day_first_and_year_first() {
        assert_eq!(parse_date_text("26/9/2025", &[]), Some(ymd(2025, 9, 26)));
        assert_eq!(parse_date_text("2025-09-26", &[]), Some(ymd(2025, 9, 26)));
        assert_eq!(parse_date_text("15-01-2024", &[]), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn test_two_digit_year_expansion() {
        assert_eq!(parse_date_text("15/01/24", &[]), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date_text("15/01/99", &[]), Some(ymd(1999, 1, 15)));
    }

    #[test]
    fn test_range_resolves_to_end() {
        assert_eq!(
            parse_date_text("26/9/2025 - 21/10/2025", &[]),
            Some(ymd(2025, 10, 21))
        );
    }

    #[test]
    fn test_hint_formats_take_precedence() {
        let hints = vec!["%d.%m.%Y".to_string()];
        assert_eq!(parse_date_text("15.01.2024", &hints), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn test_garbage_is_no_date() {
        assert_eq!(parse_date_text("not a date", &[]), None);
        assert_eq!(parse_date_text("", &[]), None);
    }

    #[test]
    fn test_normalize_date_from_cells() {
        assert_eq!(normalize_date(&Cell::Number(1.0), &[]), Some(ymd(1900, 1, 1)));
        assert_eq!(
            normalize_date(&Cell::Text("08/Aug/2025".into()), &[]),
            Some(ymd(2025, 8, 8))
        );
        assert_eq!(normalize_date(&Cell::Empty, &[]), None);
    }
}
