//! Common utility functions.

use crate::mask::MaskValue;

/// Converts string into unsigned number with bounds validation.
pub(crate) fn parse_digital_value(input: &str, min: MaskValue, max: MaskValue) -> Option<MaskValue> {
    let value = input.parse::<u8>();
    if let Ok(value) = value {
        if value < min || value > max {
            None
        } else {
            Some(value)
        }
    } else {
        None
    }
}

/// Converts string with mnemonic value representation into unsigned number.
pub(crate) fn parse_string_value(input: &str, values: &[&str]) -> Option<MaskValue> {
    if input.is_empty() {
        None
    } else {
        values
            .iter()
            .position(|&x| x.to_uppercase() == input.to_uppercase())
            .map(|i| i as MaskValue)
    }
}

/// Returns `true` if provided year is leap.
#[inline]
pub(crate) fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Returns number of days in specified month.
pub(crate) fn days_in_month(year: i32, month: i32) -> i32 {
    if !(1..=12).contains(&month) {
        panic!("Invalid month: {month}");
    }

    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => unreachable!(),
    }
}

/// Calculates day of week for specified date, 0 is Sunday.
pub(crate) fn day_of_week(year: i32, month: i32, day: i32) -> MaskValue {
    if day < 1 || !(1..=12).contains(&month) || day > days_in_month(year, month) {
        panic!("Invalid date: {year:04}-{month:02}-{day:02}");
    }

    let month_offset: i32 = if is_leap_year(year) {
        [0, 3, 4, 0, 2, 5, 0, 3, 6, 1, 4, 6]
    } else {
        [0, 3, 3, 6, 1, 4, 6, 2, 5, 0, 3, 5]
    }[(month - 1) as usize];

    let year = year - 1;

    ((day + month_offset + 5 * (year % 4) + 4 * (year % 100) + 6 * (year % 400)) % 7) as MaskValue
}
