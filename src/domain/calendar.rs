use chrono::{Datelike, Days, NaiveDate};

/// Number of days in the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };

    match next_month {
        Some(next) => (next - first).num_days() as u32,
        None => 31,
    }
}

/// Adds a number of days, saturating at the calendar's upper bound.
pub fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Renders a date as `MM/DD/YYYY`.
pub fn format_us(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(date(2023, 1, 31)), 31);
        assert_eq!(days_in_month(date(2023, 2, 10)), 28);
        assert_eq!(days_in_month(date(2024, 2, 1)), 29);
        assert_eq!(days_in_month(date(2023, 4, 30)), 30);
        assert_eq!(days_in_month(date(2023, 12, 31)), 31);
    }

    #[test]
    fn test_add_days_and_format() {
        let due = add_days(date(2023, 12, 20), 15);
        assert_eq!(due, date(2024, 1, 4));
        assert_eq!(format_us(due), "01/04/2024");
    }
}
