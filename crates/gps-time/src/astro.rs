//! Julian dates and sidereal time

/// Julian date of the J2000.0 epoch (2000-01-01 12:00 TT)
pub const J2000: f64 = 2_451_545.0;

/// Days per Julian century
const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Julian day number of a Gregorian calendar date (the day starting at noon)
pub fn julian_day_number(year: u16, month: u8, day: u8) -> i64 {
    let (year, month, day) = (i64::from(year), i64::from(month), i64::from(day));
    let a = (14 - month) / 12;
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    day + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045
}

/// Julian date from a day number and a UTC time of day
pub fn julian_date(day_number: i64, hour: u8, minute: u8, seconds: f64) -> f64 {
    day_number as f64
        + (f64::from(hour) - 12.0) / 24.0
        + f64::from(minute) / 1440.0
        + seconds / 86_400.0
}

/// Greenwich mean sidereal time in degrees, not normalized
pub fn greenwich_sidereal_degrees(julian_date: f64) -> f64 {
    let d = julian_date - J2000;
    let t = d / DAYS_PER_CENTURY;
    280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t - t * t * t / 38_710_000.0
}

/// Local sidereal time in degrees, normalized to `[0, 360)`
pub fn local_sidereal_degrees(julian_date: f64, longitude: f64) -> f64 {
    let degrees = (greenwich_sidereal_degrees(julian_date) + longitude).rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}
