use crate::{field::Field, mask::Mask, utils, CronError, Result};
use chrono::{
    offset::LocalResult, DateTime, Datelike, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone, Timelike,
};
use std::fmt::Display;

/// Predefined macros and their six-field expansions.
const MACROS: &[(&str, &str)] = &[
    ("@yearly", "0 0 0 1 1 *"),
    ("@annually", "0 0 0 1 1 *"),
    ("@monthly", "0 0 0 1 * *"),
    ("@weekly", "0 0 0 * * 0"),
    ("@daily", "0 0 0 * * *"),
    ("@midnight", "0 0 0 * * *"),
    ("@hourly", "0 0 * * * *"),
];

/// How many years the matcher walks before declaring a schedule
/// unsatisfiable. Any satisfiable day-of-month/month combination repeats
/// within a leap cycle, so five years is a safe ceiling.
const YEARS_HORIZON: i32 = 5;

/// Represents a cron schedule with its methods.
///
/// | Field        | Required | Allowed values  | Allowed special characters |
/// | ------------ | -------- | --------------- | -------------------------- |
/// | Seconds      | No       | 0-59            | * , - / ?                  |
/// | Minutes      | Yes      | 0-59            | * , - / ?                  |
/// | Hours        | Yes      | 0-23            | * , - / ?                  |
/// | Day of Month | Yes      | 1-31            | * , - / ?                  |
/// | Month        | Yes      | 1-12 or JAN-DEC | * , - / ?                  |
/// | Day of Week  | Yes      | 0-6 or SUN-SAT  | * , - / ?                  |
///
/// With five fields the seconds field defaults to `0`. Each field is stored
/// as a bitmask over its domain, together with two flags recording whether
/// the day-of-month and day-of-week fields were written as wildcards: when
/// both are restricted a day matches if **either** field accepts it,
/// otherwise **both** must accept it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Schedule {
    pattern: String,
    second: Mask,
    minute: Mask,
    hour: Mask,
    dom: Mask,
    month: Mask,
    dow: Mask,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl Schedule {
    /// Schedule constructor.
    ///
    /// Accepts a five- or six-field cron expression, or one of the
    /// predefined macros: `@yearly` (`@annually`), `@monthly`, `@weekly`,
    /// `@daily` (`@midnight`), `@hourly`.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let source = pattern.trim();

        let expanded = if source.starts_with('@') {
            MACROS
                .iter()
                .find(|(name, _)| source.eq_ignore_ascii_case(name))
                .map(|(_, expansion)| *expansion)
                .ok_or_else(|| CronError::UnknownMacro(source.to_owned()))?
        } else {
            source
        };

        let mut parts: Vec<&str> = expanded.split_whitespace().collect();
        if parts.len() == 5 {
            parts.insert(0, "0");
        } else if parts.len() != 6 {
            return Err(CronError::InvalidCronPattern(pattern));
        }

        let second = Field::Seconds.parse(parts[0])?;
        let minute = Field::Minutes.parse(parts[1])?;
        let hour = Field::Hours.parse(parts[2])?;
        let dom = Field::Doms.parse(parts[3])?;
        let month = Field::Months.parse(parts[4])?;
        let dow = Field::Dows.parse(parts[5])?;
        let dom_restricted = day_field_restricted(parts[3]);
        let dow_restricted = day_field_restricted(parts[5]);

        Ok(Self {
            pattern,
            second,
            minute,
            hour,
            dom,
            month,
            dow,
            dom_restricted,
            dow_restricted,
        })
    }

    /// Returns the nearest event time strictly after the provided one,
    /// or `None` if no event happens within the next five years.
    ///
    /// All calendar arithmetic runs in the zone of `current`. A wall-clock
    /// candidate skipped by a spring-forward transition is treated as
    /// non-existent and the search continues; during a fall-back fold the
    /// engine enumerates by absolute time, so a repeated wall-clock time
    /// fires once per offset.
    pub fn upcoming<Tz: TimeZone>(&self, current: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = current.timezone();
        let wall = current.naive_local().with_nanosecond(0)?;
        let horizon = wall.year() + YEARS_HORIZON;

        if let LocalResult::Ambiguous(first, second) = tz.from_local_datetime(&wall) {
            if current.offset().fix() == first.offset().fix() {
                // Inside a fold, wall times at or before the current one
                // recur with the post-transition offset: scan the repeated
                // window too and take the nearest candidate in absolute time.
                let fold = second - first;
                let ahead = self.first_pass_candidate(&tz, &wall, current, horizon);
                let behind = self.scan_up(&tz, wall.checked_sub_signed(fold)?, current, horizon);
                return match (ahead, behind) {
                    (Some(ahead), Some(behind)) => Some(ahead.min(behind)),
                    (ahead, behind) => ahead.or(behind),
                };
            }
        }

        self.scan_up(&tz, wall, current, horizon)
    }

    /// Returns the nearest event time strictly before the provided one,
    /// or `None` if no event happened within the last five years.
    ///
    /// Mirror of [`Schedule::upcoming`], with identical treatment of
    /// daylight saving transitions.
    pub fn previous<Tz: TimeZone>(&self, current: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = current.timezone();
        let wall = current.naive_local().with_nanosecond(0)?;
        let horizon = wall.year() - YEARS_HORIZON;

        if let LocalResult::Ambiguous(first, second) = tz.from_local_datetime(&wall) {
            if current.offset().fix() == second.offset().fix() {
                // The current instant is the repetition of its wall time:
                // earlier wall times of the fold were already repeated, and
                // the pre-transition pass sits one fold-width ahead on the
                // wall clock.
                let fold = second - first;
                let behind = self.second_pass_candidate(&tz, &wall, current, horizon);
                let ahead = self.scan_down(&tz, wall.checked_add_signed(fold)?, current, horizon);
                return match (behind, ahead) {
                    (Some(behind), Some(ahead)) => Some(behind.max(ahead)),
                    (behind, ahead) => behind.or(ahead),
                };
            }
        }

        self.scan_down(&tz, wall, current, horizon)
    }

    /// Walks matching wall-clock tuples upwards and returns the first one
    /// that resolves to an instant strictly after the bound. Gap candidates
    /// resolve to nothing and are skipped; fold candidates yield both
    /// instants in absolute order.
    fn scan_up<Tz: TimeZone>(
        &self,
        tz: &Tz,
        start: NaiveDateTime,
        bound: &DateTime<Tz>,
        horizon: i32,
    ) -> Option<DateTime<Tz>> {
        let mut cursor = FieldCursor::from_naive(&start);
        loop {
            if !self.next_fields(&mut cursor, horizon) {
                return None;
            }
            let wall = cursor.to_naive()?;
            match tz.from_local_datetime(&wall) {
                LocalResult::Single(candidate) => {
                    if candidate > *bound {
                        return Some(candidate);
                    }
                }
                LocalResult::Ambiguous(first, second) => {
                    if first > *bound {
                        return Some(first);
                    }
                    if second > *bound {
                        return Some(second);
                    }
                }
                // The candidate fell into a spring-forward gap.
                LocalResult::None => {}
            }
            cursor = FieldCursor::from_naive(&wall.checked_add_signed(TimeDelta::seconds(1))?);
        }
    }

    /// Downward mirror of [`Schedule::scan_up`].
    fn scan_down<Tz: TimeZone>(
        &self,
        tz: &Tz,
        start: NaiveDateTime,
        bound: &DateTime<Tz>,
        horizon: i32,
    ) -> Option<DateTime<Tz>> {
        let mut cursor = FieldCursor::from_naive(&start);
        loop {
            if !self.prev_fields(&mut cursor, horizon) {
                return None;
            }
            let wall = cursor.to_naive()?;
            match tz.from_local_datetime(&wall) {
                LocalResult::Single(candidate) => {
                    if candidate < *bound {
                        return Some(candidate);
                    }
                }
                LocalResult::Ambiguous(first, second) => {
                    if second < *bound {
                        return Some(second);
                    }
                    if first < *bound {
                        return Some(first);
                    }
                }
                LocalResult::None => {}
            }
            cursor = FieldCursor::from_naive(&wall.checked_sub_signed(TimeDelta::seconds(1))?);
        }
    }

    /// Nearest candidate still ahead of the current wall clock within the
    /// same fold pass; it precedes every repeated-window candidate in
    /// absolute time.
    fn first_pass_candidate<Tz: TimeZone>(
        &self,
        tz: &Tz,
        wall: &NaiveDateTime,
        bound: &DateTime<Tz>,
        horizon: i32,
    ) -> Option<DateTime<Tz>> {
        let mut cursor = FieldCursor::from_naive(&wall.checked_add_signed(TimeDelta::seconds(1))?);
        if !self.next_fields(&mut cursor, horizon) {
            return None;
        }
        match tz.from_local_datetime(&cursor.to_naive()?) {
            LocalResult::Ambiguous(first, _) if first > *bound => Some(first),
            _ => None,
        }
    }

    /// Downward mirror of [`Schedule::first_pass_candidate`].
    fn second_pass_candidate<Tz: TimeZone>(
        &self,
        tz: &Tz,
        wall: &NaiveDateTime,
        bound: &DateTime<Tz>,
        horizon: i32,
    ) -> Option<DateTime<Tz>> {
        let mut cursor = FieldCursor::from_naive(&wall.checked_sub_signed(TimeDelta::seconds(1))?);
        if !self.prev_fields(&mut cursor, horizon) {
            return None;
        }
        match tz.from_local_datetime(&cursor.to_naive()?) {
            LocalResult::Ambiguous(_, second) if second < *bound => Some(second),
            _ => None,
        }
    }

    /// Advances the cursor to the nearest component tuple at or after the
    /// current one with every component in its mask and the composite day
    /// rule satisfied. Finer fields reset to their mask minima whenever a
    /// coarser field moves. Returns `false` past the horizon year.
    fn next_fields(&self, cursor: &mut FieldCursor, horizon: i32) -> bool {
        loop {
            if cursor.year > horizon {
                return false;
            }

            if !self.month.contains(cursor.month) {
                match self.month.next(cursor.month) {
                    Some(month) => {
                        cursor.month = i32::from(month);
                        cursor.day = 1;
                        self.reset_forward(cursor);
                    }
                    None => {
                        cursor.year += 1;
                        cursor.month = i32::from(Mask::min(&self.month));
                        cursor.day = 1;
                        self.reset_forward(cursor);
                        continue;
                    }
                }
            }

            if cursor.day > utils::days_in_month(cursor.year, cursor.month) {
                cursor.month += 1;
                cursor.day = 1;
                self.reset_forward(cursor);
                continue;
            }

            if !self.day_matches(cursor.year, cursor.month, cursor.day) {
                let last = utils::days_in_month(cursor.year, cursor.month);
                let mut day = cursor.day + 1;
                while day <= last && !self.day_matches(cursor.year, cursor.month, day) {
                    day += 1;
                }
                if day > last {
                    cursor.month += 1;
                    cursor.day = 1;
                    self.reset_forward(cursor);
                    continue;
                }
                cursor.day = day;
                self.reset_forward(cursor);
            }

            if !self.hour.contains(cursor.hour) {
                match self.hour.next(cursor.hour) {
                    Some(hour) => {
                        cursor.hour = i32::from(hour);
                        cursor.minute = i32::from(Mask::min(&self.minute));
                        cursor.second = i32::from(Mask::min(&self.second));
                    }
                    None => {
                        cursor.day += 1;
                        self.reset_forward(cursor);
                        continue;
                    }
                }
            }

            if !self.minute.contains(cursor.minute) {
                match self.minute.next(cursor.minute) {
                    Some(minute) => {
                        cursor.minute = i32::from(minute);
                        cursor.second = i32::from(Mask::min(&self.second));
                    }
                    None => {
                        cursor.hour += 1;
                        cursor.minute = i32::from(Mask::min(&self.minute));
                        cursor.second = i32::from(Mask::min(&self.second));
                        continue;
                    }
                }
            }

            if !self.second.contains(cursor.second) {
                match self.second.next(cursor.second) {
                    Some(second) => cursor.second = i32::from(second),
                    None => {
                        cursor.minute += 1;
                        cursor.second = i32::from(Mask::min(&self.second));
                        continue;
                    }
                }
            }

            return true;
        }
    }

    /// Downward mirror of [`Schedule::next_fields`]: finer fields reset to
    /// their mask maxima whenever a coarser field retreats.
    fn prev_fields(&self, cursor: &mut FieldCursor, horizon: i32) -> bool {
        loop {
            if cursor.year < horizon {
                return false;
            }

            if !self.month.contains(cursor.month) {
                match self.month.prev(cursor.month) {
                    Some(month) => {
                        cursor.month = i32::from(month);
                        cursor.day = 31;
                        self.reset_backward(cursor);
                    }
                    None => {
                        cursor.year -= 1;
                        cursor.month = i32::from(Mask::max(&self.month));
                        cursor.day = 31;
                        self.reset_backward(cursor);
                        continue;
                    }
                }
            }

            if cursor.day < 1 {
                cursor.month -= 1;
                cursor.day = 31;
                self.reset_backward(cursor);
                continue;
            }

            let last = utils::days_in_month(cursor.year, cursor.month);
            if cursor.day > last {
                // a retreat marker, clamped to the real month length
                cursor.day = last;
            }

            if !self.day_matches(cursor.year, cursor.month, cursor.day) {
                let mut day = cursor.day - 1;
                while day >= 1 && !self.day_matches(cursor.year, cursor.month, day) {
                    day -= 1;
                }
                if day < 1 {
                    cursor.month -= 1;
                    cursor.day = 31;
                    self.reset_backward(cursor);
                    continue;
                }
                cursor.day = day;
                self.reset_backward(cursor);
            }

            if !self.hour.contains(cursor.hour) {
                match self.hour.prev(cursor.hour) {
                    Some(hour) => {
                        cursor.hour = i32::from(hour);
                        cursor.minute = i32::from(Mask::max(&self.minute));
                        cursor.second = i32::from(Mask::max(&self.second));
                    }
                    None => {
                        cursor.day -= 1;
                        self.reset_backward(cursor);
                        continue;
                    }
                }
            }

            if !self.minute.contains(cursor.minute) {
                match self.minute.prev(cursor.minute) {
                    Some(minute) => {
                        cursor.minute = i32::from(minute);
                        cursor.second = i32::from(Mask::max(&self.second));
                    }
                    None => {
                        cursor.hour -= 1;
                        cursor.minute = i32::from(Mask::max(&self.minute));
                        cursor.second = i32::from(Mask::max(&self.second));
                        continue;
                    }
                }
            }

            if !self.second.contains(cursor.second) {
                match self.second.prev(cursor.second) {
                    Some(second) => cursor.second = i32::from(second),
                    None => {
                        cursor.minute -= 1;
                        cursor.second = i32::from(Mask::max(&self.second));
                        continue;
                    }
                }
            }

            return true;
        }
    }

    fn reset_forward(&self, cursor: &mut FieldCursor) {
        cursor.hour = i32::from(Mask::min(&self.hour));
        cursor.minute = i32::from(Mask::min(&self.minute));
        cursor.second = i32::from(Mask::min(&self.second));
    }

    fn reset_backward(&self, cursor: &mut FieldCursor) {
        cursor.hour = i32::from(Mask::max(&self.hour));
        cursor.minute = i32::from(Mask::max(&self.minute));
        cursor.second = i32::from(Mask::max(&self.second));
    }

    /// Composite day rule: OR when both day fields are restricted,
    /// AND otherwise.
    fn day_matches(&self, year: i32, month: i32, day: i32) -> bool {
        let dom_matches = self.dom.contains(day);
        let dow_matches = self.dow.contains(i32::from(utils::day_of_week(year, month, day)));
        if self.dom_restricted && self.dow_restricted {
            dom_matches || dow_matches
        } else {
            dom_matches && dow_matches
        }
    }
}

/// A `*`-based term makes a day field behave as a wildcard for the
/// composite day rule, even when a step leaves its mask sparse.
fn day_field_restricted(input: &str) -> bool {
    !input
        .split(',')
        .any(|term| term == "*" || term == "?" || term.starts_with("*/"))
}

/// Wall-clock components the matcher walks over. Components are signed and
/// may temporarily leave their domains; mask probes and explicit guards
/// bring them back before a candidate is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldCursor {
    year: i32,
    month: i32,
    day: i32,
    hour: i32,
    minute: i32,
    second: i32,
}

impl FieldCursor {
    fn from_naive(naive: &NaiveDateTime) -> Self {
        Self {
            year: naive.year(),
            month: naive.month() as i32,
            day: naive.day() as i32,
            hour: naive.hour() as i32,
            minute: naive.minute() as i32,
            second: naive.second() as i32,
        }
    }

    fn to_naive(self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month as u32, self.day as u32)?.and_hms_opt(
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
        )
    }
}

impl TryFrom<String> for Schedule {
    type Error = CronError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&String> for Schedule {
    type Error = CronError;

    fn try_from(value: &String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Schedule {
    type Error = CronError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}
