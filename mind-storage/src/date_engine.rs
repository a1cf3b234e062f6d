use serde::{Deserialize, Serialize};
use std::fmt;
use time::macros::offset;
use time::{OffsetDateTime, UtcOffset};

/// Asia/Seoul. Korea has not observed DST since 1988, so a fixed offset is exact.
pub const CIVIL_OFFSET: UtcOffset = offset!(+9);

/// Nothing before 2020-01-01 is reachable.
pub const FIRST_YEAR: i32 = 2020;

/// Source of "now". Injected so tests can pin the date.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

#[cfg(test)]
impl Clock for FixedClock {
    fn now_utc(&self) -> OffsetDateTime {
        self.0
    }
}

/// A calendar day. Ordering is by year, then month, then day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CivilDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl CivilDate {
    pub const FIRST: CivilDate = CivilDate {
        year: FIRST_YEAR,
        month: 1,
        day: 1,
    };

    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month) && self.day >= 1 && self.day <= days_in_month(self.year, self.month)
    }

    pub fn key(&self) -> DateKey {
        DateKey::from_date(*self)
    }

    /// The following calendar day, crossing month and year boundaries.
    pub fn next_day(&self) -> Self {
        if self.day < days_in_month(self.year, self.month) {
            Self::new(self.year, self.month, self.day + 1)
        } else {
            let (year, month) = next_month(self.year, self.month);
            Self::new(year, month, 1)
        }
    }

    /// The preceding calendar day, crossing month and year boundaries.
    pub fn prev_day(&self) -> Self {
        if self.day > 1 {
            Self::new(self.year, self.month, self.day - 1)
        } else {
            let (year, month) = prev_month(self.year, self.month);
            Self::new(year, month, days_in_month(year, month))
        }
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Canonical `YYYY-MM-DD` identifier of one journal day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(String);

impl DateKey {
    pub fn from_date(date: CivilDate) -> Self {
        Self(date.to_string())
    }

    /// Accepts only the canonical zero-padded form of a real calendar day.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, '-');
        let year: i32 = parts.next()?.parse().ok()?;
        let month: u8 = parts.next()?.parse().ok()?;
        let day: u8 = parts.next()?.parse().ok()?;
        let date = CivilDate::new(year, month, day);
        if !date.is_valid() || date.to_string() != raw {
            return None;
        }
        Some(Self::from_date(date))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_in_year(&self, year: i32) -> bool {
        self.0.starts_with(&format!("{:04}-", year))
    }

    pub fn is_in_month(&self, year: i32, month: u8) -> bool {
        self.0.starts_with(&format!("{:04}-{:02}-", year, month))
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Today in the civil timezone, whatever the host timezone is.
pub fn today(clock: &dyn Clock) -> CivilDate {
    let local = clock.now_utc().to_offset(CIVIL_OFFSET);
    CivilDate::new(local.year(), local.month() as u8, local.day())
}

/// Gregorian month length. Months outside 1..=12 have no days.
pub fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if time::util::is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub fn is_future_date(clock: &dyn Clock, year: i32, month: u8, day: u8) -> bool {
    CivilDate::new(year, month, day) > today(clock)
}

pub fn next_month(year: i32, month: u8) -> (i32, u8) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub fn prev_month(year: i32, month: u8) -> (i32, u8) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Highest month of `year` that is not in the future.
pub fn last_selectable_month(year: i32, today: CivilDate) -> u8 {
    if year == today.year {
        today.month
    } else {
        12
    }
}

/// Highest day of `year`/`month` that is not in the future.
pub fn last_selectable_day(year: i32, month: u8, today: CivilDate) -> u8 {
    if year == today.year && month == today.month {
        today.day
    } else {
        days_in_month(year, month)
    }
}

#[cfg(test)]
pub(crate) fn clock_at(year: i32, month: u8, day: u8) -> FixedClock {
    use time::{Date, Month, Time};

    let month = Month::try_from(month).expect("valid month");
    let date = Date::from_calendar_date(year, month, day).expect("valid date");
    // Noon in Seoul.
    FixedClock(date.with_time(Time::from_hms(3, 0, 0).expect("valid time")).assume_utc())
}
