//! Gregorian calendar tables

/// Days per month in a common year
const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Gregorian leap year rule
pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`.
///
/// Months outside 1-12 are clamped into range.
pub fn days_in_month(year: u16, month: u8) -> u8 {
    let month = month.clamp(1, 12);
    let days = DAYS_IN_MONTH[usize::from(month - 1)];
    if month == 2 && is_leap_year(year) {
        days + 1
    } else {
        days
    }
}
