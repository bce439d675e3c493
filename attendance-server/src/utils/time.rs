//! Time helpers — business-timezone conversion
//!
//! Instants are stored as UTC unix millis and calendar days as ISO dates;
//! "today" and month boundaries are computed in the configured business
//! timezone at the handler layer only.

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// Parse a month string (YYYY-MM) into (year, month)
pub fn parse_month(month: &str) -> AppResult<(i32, u32)> {
    let parsed = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid month format: {month}")))?;
    Ok((parsed.year(), parsed.month()))
}

/// Today's date in the business timezone
pub fn today_in(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// Validate a date is not in the future (business timezone)
pub fn validate_not_future(date: NaiveDate, tz: Tz) -> AppResult<()> {
    let today = today_in(tz);
    if date > today {
        return Err(AppError::validation(format!(
            "Date {date} is in the future (today is {today})"
        )));
    }
    Ok(())
}

/// First day of a month
pub fn month_start(year: i32, month: u32) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid month: {year}-{month:02}")))
}

/// Number of calendar days in a month
pub fn days_in_month(year: i32, month: u32) -> AppResult<u32> {
    let start = month_start(year, month)?;
    let next = if month == 12 {
        month_start(year + 1, 1)?
    } else {
        month_start(year, month + 1)?
    };
    Ok(next.signed_duration_since(start).num_days() as u32)
}

/// Every calendar day of a month, in order
pub fn month_dates(year: i32, month: u32) -> AppResult<Vec<NaiveDate>> {
    let start = month_start(year, month)?;
    let days = days_in_month(year, month)?;
    Ok((0..days)
        .filter_map(|d| start.checked_add_days(chrono::Days::new(d as u64)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_parsing_and_lengths() {
        assert_eq!(parse_month("2025-02").unwrap(), (2025, 2));
        assert_eq!(days_in_month(2025, 2).unwrap(), 28);
        assert_eq!(days_in_month(2024, 2).unwrap(), 29);
        assert_eq!(days_in_month(2025, 12).unwrap(), 31);
        assert!(parse_month("2025-13").is_err());
        assert!(parse_month("not-a-month").is_err());
    }

    #[test]
    fn month_dates_cover_the_whole_month() {
        let dates = month_dates(2025, 6).unwrap();
        assert_eq!(dates.len(), 30);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(dates[29], NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
    }
}
