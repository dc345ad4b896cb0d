//! Reporting year ranges and per-year query windows

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeDelta, Utc};
use tracing::warn;

/// Earliest year a reporter will query
pub const FIRST_CONTRIBUTION_YEAR: i32 = 2000;

/// An inclusive, normalized range of reporting years
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub first: i32,
    pub last: i32,
}

impl YearRange {
    /// Clamp a requested range so that
    /// `FIRST_CONTRIBUTION_YEAR <= first <= last <= this_year`.
    ///
    /// A first year outside `[FIRST_CONTRIBUTION_YEAR, this_year]` falls back
    /// to the floor. A last year in the future, unset (0), or earlier than the
    /// first year falls back to `this_year`.
    pub fn normalize(first: i32, last: i32, this_year: i32) -> Self {
        let first = if first < FIRST_CONTRIBUTION_YEAR || first > this_year {
            FIRST_CONTRIBUTION_YEAR
        } else {
            first
        };

        let mut last = last;
        if last > this_year {
            warn!(
                requested = last,
                using = this_year,
                "The last reporting year can't be in the future"
            );
            last = this_year;
        }

        if last == 0 || last < first {
            warn!(
                requested = last,
                using = this_year,
                "The last reporting year can't be earlier than the first year"
            );
            last = this_year;
        }

        Self { first, last }
    }

    /// Years from `last` down to `first`
    pub fn descending(&self) -> impl Iterator<Item = i32> {
        (self.first..=self.last).rev()
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.first..=self.last).contains(&year)
    }
}

/// Closed UTC window covering one calendar year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ContributionWindow {
    /// `[year-01-01T00:00:00Z, (year+1)-01-01T00:00:00Z - 1s]`
    pub fn for_year(year: i32) -> Option<Self> {
        let from = NaiveDate::from_ymd_opt(year, 1, 1)?
            .and_hms_opt(0, 0, 0)?
            .and_utc();
        let next = NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
            .and_hms_opt(0, 0, 0)?
            .and_utc();

        Some(Self {
            from,
            to: next - TimeDelta::seconds(1),
        })
    }

    /// Start of the window as RFC 3339 with second precision
    pub fn from_rfc3339(&self) -> String {
        self.from.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn to_rfc3339(&self) -> String {
        self.to.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}
