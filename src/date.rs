//! PDF date strings (`D:YYYYMMDDHHmmSSOHH'mm'`).

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

/// Format `time` as a PDF date, e.g. `D:20240102030405+05'30'`.
///
/// ```
/// use chrono::{FixedOffset, TimeZone};
/// use pdf_annotator::date::format_pdf_date;
///
/// let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
/// let time = ist.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
/// assert_eq!(format_pdf_date(&time), "D:20240102030405+05'30'");
/// ```
pub fn format_pdf_date<Tz: TimeZone>(time: &DateTime<Tz>) -> String {
    let fixed = time.fixed_offset();
    let offset = fixed.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.abs();
    format!(
        "D:{}{}{:02}'{:02}'",
        fixed.format("%Y%m%d%H%M%S"),
        sign,
        offset / 3600,
        (offset % 3600) / 60
    )
}

/// Parse a PDF date.
///
/// Everything after the year is optional, as is the `D:` prefix. A missing
/// or `Z` offset means UTC. Returns `None` for anything malformed.
///
/// ```
/// use pdf_annotator::date::parse_pdf_date;
///
/// let time = parse_pdf_date("D:20240102030405-08'00'").unwrap();
/// assert_eq!(time.offset().local_minus_utc(), -8 * 3600);
/// assert!(parse_pdf_date("D:2024").is_some());
/// assert!(parse_pdf_date("yesterday").is_none());
/// ```
pub fn parse_pdf_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    let value = value.strip_prefix("D:").unwrap_or(value);

    let digits_end = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    let (digits, zone) = value.split_at(digits_end);
    if digits.len() < 4 || digits.len() > 14 || digits.len() % 2 != 0 {
        return None;
    }

    let field = |start: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + 2) {
            Some(s) => s.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits[..4].parse().ok()?;
    let month = field(4, 1)?;
    let day = field(6, 1)?;
    let hour = field(8, 0)?;
    let minute = field(10, 0)?;
    let second = field(12, 0)?;

    let offset = parse_offset(zone)?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    offset.from_local_datetime(&naive).single()
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let mut chars = zone.chars();
    let sign = match chars.next() {
        None | Some('Z') => return FixedOffset::east_opt(0),
        Some('+') => 1,
        Some('-') => -1,
        Some(_) => return None,
    };

    let rest: String = chars.filter(|c| *c != '\'').collect();
    if !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = rest.get(..2)?.parse().ok()?;
    let minutes: i32 = match rest.get(2..4) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike, Utc};

    #[test]
    fn test_format_negative_offset() {
        let pst = FixedOffset::west_opt(8 * 3600).unwrap();
        let time = pst.with_ymd_and_hms(2023, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(format_pdf_date(&time), "D:20231231235958-08'00'");
    }

    #[test]
    fn test_format_utc() {
        let time = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(format_pdf_date(&time), "D:20240601120000+00'00'");
    }

    #[test]
    fn test_round_trip() {
        let ist = FixedOffset::east_opt(19800).unwrap();
        let time = ist.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_pdf_date(&format_pdf_date(&time)), Some(time));
    }

    #[test]
    fn test_partial_dates() {
        let time = parse_pdf_date("D:199812").unwrap();
        assert_eq!((time.year(), time.month(), time.day()), (1998, 12, 1));
        assert_eq!(time.hour(), 0);

        let zulu = parse_pdf_date("20240102030405Z").unwrap();
        assert_eq!(zulu.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_malformed() {
        assert!(parse_pdf_date("").is_none());
        assert!(parse_pdf_date("D:202").is_none());
        assert!(parse_pdf_date("D:20241340").is_none());
        assert!(parse_pdf_date("D:20240102030405+5x").is_none());
        assert!(parse_pdf_date("D:20240102030405+25'00'").is_none());
    }
}
