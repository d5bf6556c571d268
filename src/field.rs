//! Per-field grammar of a cron expression.
//!
//! Each field is a comma-separated list of terms; a term is a wildcard,
//! a bare value, a range, or any of those with a `/step` suffix. Terms are
//! unioned into the field's bitmask.

use crate::{
    mask::{Mask, MaskValue},
    utils, CronError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Seconds,
    Minutes,
    Hours,
    Doms,
    Months,
    Dows,
}

impl Field {
    const DAYS_OF_WEEK: [&'static str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];
    const MONTHS: [&'static str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];

    /// Inclusive domain of the field.
    pub(crate) fn bounds(self) -> (MaskValue, MaskValue) {
        match self {
            Field::Seconds | Field::Minutes => (0, 59),
            Field::Hours => (0, 23),
            Field::Doms => (1, 31),
            Field::Months => (1, 12),
            Field::Dows => (0, 6),
        }
    }

    /// Parses a whole field into its bitmask.
    pub(crate) fn parse(self, input: &str) -> Result<Mask> {
        if input.is_empty() {
            return Err(CronError::InvalidCronPattern(input.to_owned()));
        }

        let (lo, hi) = self.bounds();
        let mut mask = Mask::empty(lo, hi);
        for term in input.split(',') {
            self.parse_term(term, &mut mask)?;
        }

        Ok(mask)
    }

    fn parse_term(self, term: &str, mask: &mut Mask) -> Result<()> {
        if term.is_empty() {
            return Err(CronError::InvalidCronPattern(term.to_owned()));
        }

        let (lo, hi) = self.bounds();
        let (base, step) = match term.split_once('/') {
            Some((base, step)) => {
                let step = step
                    .parse::<u32>()
                    .ok()
                    .filter(|step| *step > 0)
                    .ok_or_else(|| CronError::InvalidRepeatingPattern(term.to_owned()))?;
                (base, Some(step))
            }
            None => (term, None),
        };

        let (start, end) = if base == "*" || base == "?" {
            (lo, hi)
        } else if let Some((start, end)) = base.split_once('-') {
            let start = self.value(start)?;
            let end = self.value(end)?;
            if start > end {
                return Err(CronError::InvalidRangeValue(term.to_owned()));
            }
            (start, end)
        } else {
            let value = self.value(base)?;
            // A bare value with a step runs to the end of the domain.
            if step.is_some() {
                (value, hi)
            } else {
                (value, value)
            }
        };

        // Endpoints are in-domain and the step is positive; a step larger
        // than the domain leaves just the start value.
        let step = step.unwrap_or(1);
        let end = u32::from(end);
        let mut value = u32::from(start);
        while value <= end {
            mask.set(value as MaskValue);
            value = match value.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }

        Ok(())
    }

    /// Parses a single value token, digital or mnemonic.
    fn value(self, input: &str) -> Result<MaskValue> {
        let (lo, hi) = self.bounds();
        if let Some(value) = utils::parse_digital_value(input, lo, hi) {
            return Ok(value);
        }

        match self {
            Field::Months => utils::parse_string_value(input, &Self::MONTHS).map(|month| month + 1),
            Field::Dows => utils::parse_string_value(input, &Self::DAYS_OF_WEEK),
            _ => None,
        }
        .ok_or_else(|| self.error(input))
    }

    fn error(self, input: &str) -> CronError {
        let input = input.to_owned();
        match self {
            Field::Seconds => CronError::InvalidSecondValue(input),
            Field::Minutes => CronError::InvalidMinuteValue(input),
            Field::Hours => CronError::InvalidHourValue(input),
            Field::Doms => CronError::InvalidDayOfMonthValue(input),
            Field::Months => CronError::InvalidMonthValue(input),
            Field::Dows => CronError::InvalidDayOfWeekValue(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn values(mask: &Mask) -> Vec<i32> {
        (0..64).filter(|v| mask.contains(*v)).collect()
    }

    #[rstest]
    #[case(Field::Seconds, "*", (0..=59).collect::<Vec<_>>())]
    #[case(Field::Minutes, "?", (0..=59).collect::<Vec<_>>())]
    #[case(Field::Hours, "*", (0..=23).collect::<Vec<_>>())]
    #[case(Field::Doms, "*", (1..=31).collect::<Vec<_>>())]
    #[case(Field::Months, "*", (1..=12).collect::<Vec<_>>())]
    #[case(Field::Dows, "?", (0..=6).collect::<Vec<_>>())]
    fn parse_wildcards(#[case] field: Field, #[case] input: &str, #[case] expected: Vec<i32>) {
        assert_eq!(values(&field.parse(input).unwrap()), expected);
    }

    #[rstest]
    #[case(Field::Seconds, "12", vec![12])]
    #[case(Field::Minutes, "0", vec![0])]
    #[case(Field::Hours, "23", vec![23])]
    #[case(Field::Doms, "31", vec![31])]
    #[case(Field::Months, "6", vec![6])]
    #[case(Field::Months, "DEC", vec![12])]
    #[case(Field::Months, "jan", vec![1])]
    #[case(Field::Dows, "0", vec![0])]
    #[case(Field::Dows, "FRI", vec![5])]
    #[case(Field::Dows, "sun", vec![0])]
    fn parse_single_values(#[case] field: Field, #[case] input: &str, #[case] expected: Vec<i32>) {
        assert_eq!(values(&field.parse(input).unwrap()), expected);
    }

    #[rstest]
    #[case(Field::Seconds, "10-20", (10..=20).collect::<Vec<_>>())]
    #[case(Field::Minutes, "0-0", vec![0])]
    #[case(Field::Hours, "9-20", (9..=20).collect::<Vec<_>>())]
    #[case(Field::Doms, "1-5", (1..=5).collect::<Vec<_>>())]
    #[case(Field::Months, "FEB-JUN", (2..=6).collect::<Vec<_>>())]
    #[case(Field::Months, "Apr-Oct", (4..=10).collect::<Vec<_>>())]
    #[case(Field::Dows, "MON-WED", (1..=3).collect::<Vec<_>>())]
    fn parse_ranges(#[case] field: Field, #[case] input: &str, #[case] expected: Vec<i32>) {
        assert_eq!(values(&field.parse(input).unwrap()), expected);
    }

    #[rstest]
    #[case(Field::Seconds, "*/5", (0..=59).step_by(5).collect::<Vec<_>>())]
    #[case(Field::Seconds, "15/35", vec![15, 50])]
    #[case(Field::Minutes, "20-35/15", vec![20, 35])]
    #[case(Field::Minutes, "0/15", vec![0, 15, 30, 45])]
    #[case(Field::Hours, "1/2", (1..=23).step_by(2).collect::<Vec<_>>())]
    #[case(Field::Hours, "*/1", (0..=23).collect::<Vec<_>>())]
    #[case(Field::Doms, "*/5", vec![1, 6, 11, 16, 21, 26, 31])]
    #[case(Field::Doms, "*/2", (1..=31).step_by(2).collect::<Vec<_>>())]
    #[case(Field::Months, "JAN-AUG/3", vec![1, 4, 7])]
    #[case(Field::Months, "Aug/3", vec![8, 11])]
    #[case(Field::Dows, "Mon/2", vec![1, 3, 5])]
    #[case(Field::Minutes, "0/100", vec![0])]
    fn parse_steps(#[case] field: Field, #[case] input: &str, #[case] expected: Vec<i32>) {
        assert_eq!(values(&field.parse(input).unwrap()), expected);
    }

    #[rstest]
    #[case(Field::Hours, "9,10,11", vec![9, 10, 11])]
    #[case(Field::Seconds, "5,10-20,40-59/4", std::iter::once(5).chain(10..=20).chain((40..=59).step_by(4)).collect::<Vec<_>>())]
    #[case(Field::Seconds, "*/30,5", vec![0, 5, 30])]
    #[case(Field::Months, "9,JAN,mar", vec![1, 3, 9])]
    #[case(Field::Dows, "mon,FrI,0", vec![0, 1, 5])]
    #[case(Field::Doms, "1,15", vec![1, 15])]
    fn parse_lists(#[case] field: Field, #[case] input: &str, #[case] expected: Vec<i32>) {
        assert_eq!(values(&field.parse(input).unwrap()), expected);
    }

    #[rstest]
    #[case(Field::Seconds, "-1")]
    #[case(Field::Seconds, "60")]
    #[case(Field::Seconds, " 50")]
    #[case(Field::Minutes, "60")]
    #[case(Field::Hours, "24")]
    #[case(Field::Doms, "0")]
    #[case(Field::Doms, "32")]
    #[case(Field::Months, "0")]
    #[case(Field::Months, "13")]
    #[case(Field::Months, "JANUARY")]
    #[case(Field::Months, " JAN")]
    #[case(Field::Dows, "7")]
    #[case(Field::Dows, "Sunday")]
    #[case(Field::Dows, "XYZ")]
    #[case(Field::Seconds, "")]
    #[case(Field::Seconds, "abc")]
    #[case(Field::Seconds, "1.5")]
    fn parse_invalid_values(#[case] field: Field, #[case] input: &str) {
        assert!(field.parse(input).is_err(), "input = {input:?}");
    }

    #[rstest]
    #[case(Field::Seconds, "10-20-30")]
    #[case(Field::Seconds, "10-")]
    #[case(Field::Seconds, "-20")]
    #[case(Field::Seconds, "abc-20")]
    #[case(Field::Months, "feb-jan")]
    #[case(Field::Months, "5-3")]
    #[case(Field::Dows, "6-1")]
    fn parse_invalid_ranges(#[case] field: Field, #[case] input: &str) {
        assert!(field.parse(input).is_err(), "input = {input:?}");
    }

    #[rstest]
    #[case(Field::Hours, "*/0")]
    #[case(Field::Hours, "0/0")]
    #[case(Field::Hours, "5/-2")]
    #[case(Field::Hours, "5/abc")]
    #[case(Field::Hours, "5/")]
    #[case(Field::Doms, "10-5/2")]
    #[case(Field::Doms, "1-12/0")]
    fn parse_invalid_steps(#[case] field: Field, #[case] input: &str) {
        assert!(field.parse(input).is_err(), "input = {input:?}");
    }

    #[rstest]
    #[case(Field::Seconds, ",")]
    #[case(Field::Seconds, ",5")]
    #[case(Field::Seconds, "5,")]
    #[case(Field::Seconds, "1,,2")]
    #[case(Field::Minutes, "30, 45")]
    fn parse_invalid_lists(#[case] field: Field, #[case] input: &str) {
        assert!(field.parse(input).is_err(), "input = {input:?}");
    }

    #[test]
    fn range_with_equal_endpoints_is_singleton() {
        assert_eq!(values(&Field::Hours.parse("5-5").unwrap()), vec![5]);
    }

    #[test]
    fn step_of_one_is_plain_range() {
        assert_eq!(
            values(&Field::Minutes.parse("10-20/1").unwrap()),
            (10..=20).collect::<Vec<_>>()
        );
    }

    #[test]
    fn error_variants_carry_source_text() {
        assert!(matches!(
            Field::Seconds.parse("60"),
            Err(CronError::InvalidSecondValue(e)) if e == "60"
        ));
        assert!(matches!(
            Field::Minutes.parse("60"),
            Err(CronError::InvalidMinuteValue(e)) if e == "60"
        ));
        assert!(matches!(
            Field::Hours.parse("24"),
            Err(CronError::InvalidHourValue(e)) if e == "24"
        ));
        assert!(matches!(
            Field::Doms.parse("32"),
            Err(CronError::InvalidDayOfMonthValue(e)) if e == "32"
        ));
        assert!(matches!(
            Field::Months.parse("13"),
            Err(CronError::InvalidMonthValue(e)) if e == "13"
        ));
        assert!(matches!(
            Field::Dows.parse("XYZ"),
            Err(CronError::InvalidDayOfWeekValue(e)) if e == "XYZ"
        ));
        assert!(matches!(
            Field::Months.parse("feb-jan"),
            Err(CronError::InvalidRangeValue(e)) if e == "feb-jan"
        ));
        assert!(matches!(
            Field::Hours.parse("*/0"),
            Err(CronError::InvalidRepeatingPattern(e)) if e == "*/0"
        ));
    }
}
