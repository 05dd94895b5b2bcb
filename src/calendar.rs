// 📅 Calendar - In-game dates and the source of "today"
//
// The game year has four 28-day seasons and 7-day weeks that always start on
// days 1, 8, 15 and 22 of a season. Spring 1, Year 1 is the first day.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DAYS_PER_SEASON: u8 = 28;
pub const DAYS_PER_WEEK: u8 = 7;
pub const SEASONS_PER_YEAR: u8 = 4;

const DAYS_PER_YEAR: i64 = DAYS_PER_SEASON as i64 * SEASONS_PER_YEAR as i64;

#[derive(Debug, Error, PartialEq)]
pub enum CalendarError {
    #[error("day {0} is outside 1..=28")]
    InvalidDay(u8),

    #[error("year must be at least 1")]
    InvalidYear,

    #[error("date falls before Spring 1, Year 1")]
    BeforeFirstDay,

    #[error("cannot parse date `{0}` (expected e.g. `spring 5 1`)")]
    Parse(String),
}

// ============================================================================
// SEASON
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn index(&self) -> u8 {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Fall => 2,
            Season::Winter => 3,
        }
    }

    pub fn from_index(index: u8) -> Season {
        Season::ALL[(index % SEASONS_PER_YEAR) as usize]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }

    pub fn first() -> Season {
        Season::Spring
    }

    pub fn last() -> Season {
        Season::Winter
    }
}

impl FromStr for Season {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            "winter" => Ok(Season::Winter),
            _ => Err(CalendarError::Parse(s.to_string())),
        }
    }
}

// ============================================================================
// CALENDAR DATE
// ============================================================================

/// A day on the in-game calendar.
///
/// Field order matters: the derived `Ord` compares year, then season, then
/// day, which is calendar order. Deserializing goes through
/// [`CalendarDate::new`], so saved dates are range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDate")]
pub struct CalendarDate {
    pub year: u32,
    pub season: Season,
    pub day: u8,
}

/// Unchecked wire form of a date.
#[derive(Deserialize)]
struct RawDate {
    year: u32,
    season: Season,
    day: u8,
}

impl TryFrom<RawDate> for CalendarDate {
    type Error = CalendarError;

    fn try_from(raw: RawDate) -> Result<Self, Self::Error> {
        CalendarDate::new(raw.day, raw.season, raw.year)
    }
}

impl CalendarDate {
    pub fn new(day: u8, season: Season, year: u32) -> Result<Self, CalendarError> {
        if day == 0 || day > DAYS_PER_SEASON {
            return Err(CalendarError::InvalidDay(day));
        }
        if year == 0 {
            return Err(CalendarError::InvalidYear);
        }
        Ok(CalendarDate { year, season, day })
    }

    /// Spring 1, Year 1
    pub fn first_day() -> Self {
        CalendarDate {
            year: 1,
            season: Season::Spring,
            day: 1,
        }
    }

    /// Number of days elapsed since Spring 1, Year 1 (which is day 0)
    pub fn days_since_start(&self) -> i64 {
        (self.year as i64 - 1) * DAYS_PER_YEAR
            + self.season.index() as i64 * DAYS_PER_SEASON as i64
            + (self.day as i64 - 1)
    }

    pub fn from_days_since_start(days: i64) -> Result<Self, CalendarError> {
        if days < 0 {
            return Err(CalendarError::BeforeFirstDay);
        }
        let year = days / DAYS_PER_YEAR + 1;
        let in_year = days % DAYS_PER_YEAR;
        let season = Season::from_index((in_year / DAYS_PER_SEASON as i64) as u8);
        let day = (in_year % DAYS_PER_SEASON as i64) as u8 + 1;
        let year = u32::try_from(year).map_err(|_| CalendarError::InvalidYear)?;
        Ok(CalendarDate { year, season, day })
    }

    /// Move forward (or backward, with a negative offset) by whole days.
    pub fn add_days(&self, offset: i64) -> Result<Self, CalendarError> {
        Self::from_days_since_start(self.days_since_start() + offset)
    }

    /// Inclusive range test
    pub fn is_between(&self, start: &CalendarDate, end: &CalendarDate) -> bool {
        start <= self && self <= end
    }

    pub fn first_weekday(&self) -> Self {
        let offset = (self.day - 1) % DAYS_PER_WEEK;
        CalendarDate {
            day: self.day - offset,
            ..*self
        }
    }

    pub fn last_weekday(&self) -> Self {
        let first = self.first_weekday();
        CalendarDate {
            day: first.day + DAYS_PER_WEEK - 1,
            ..first
        }
    }

    pub fn season_start(&self) -> Self {
        CalendarDate { day: 1, ..*self }
    }

    /// Day 28 of the current season.
    pub fn season_end(&self) -> Self {
        CalendarDate {
            day: DAYS_PER_SEASON,
            ..*self
        }
    }

    pub fn year_start(&self) -> Self {
        CalendarDate {
            year: self.year,
            season: Season::first(),
            day: 1,
        }
    }

    /// Day 28 of winter in the current year.
    pub fn year_end(&self) -> Self {
        CalendarDate {
            year: self.year,
            season: Season::last(),
            day: DAYS_PER_SEASON,
        }
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, Year {}", self.season.as_str(), self.day, self.year)
    }
}

impl FromStr for CalendarDate {
    type Err = CalendarError;

    /// Accepts `spring 5 1`, `Spring 5, Year 1`, `summer-12-y2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = || CalendarError::Parse(s.to_string());
        let normalized = s.replace([',', '-', '/'], " ");
        let parts: Vec<&str> = normalized
            .split_whitespace()
            .filter(|part| !part.eq_ignore_ascii_case("year"))
            .collect();

        let [season, day, year] = parts.as_slice() else {
            return Err(parse_err());
        };

        let season: Season = season.parse().map_err(|_| parse_err())?;
        let day: u8 = day.parse().map_err(|_| parse_err())?;
        let year = year.trim_start_matches(['y', 'Y']);
        let year: u32 = year.parse().map_err(|_| parse_err())?;

        CalendarDate::new(day, season, year)
    }
}

// ============================================================================
// DATE PROVIDER
// ============================================================================

/// Source of the current in-game date.
pub trait DateProvider {
    fn now(&self) -> CalendarDate;
}

/// Date provider whose date is set explicitly by the host.
///
/// Used by the CLI (the date lives in save data) and by tests.
#[derive(Debug)]
pub struct ManualCalendar {
    today: Cell<CalendarDate>,
}

impl ManualCalendar {
    pub fn new(today: CalendarDate) -> Self {
        ManualCalendar {
            today: Cell::new(today),
        }
    }

    pub fn set(&self, date: CalendarDate) {
        self.today.set(date);
    }

    /// Advance by one day (the end-of-day transition).
    pub fn next_day(&self) -> CalendarDate {
        let current = self.today.get();
        // Moving forward from a valid date cannot fail.
        let next = current.add_days(1).unwrap_or(current);
        self.today.set(next);
        next
    }
}

impl Default for ManualCalendar {
    fn default() -> Self {
        ManualCalendar::new(CalendarDate::first_day())
    }
}

impl DateProvider for ManualCalendar {
    fn now(&self) -> CalendarDate {
        self.today.get()
    }
}

// ============================================================================
// TESTS
// ============================================================================
