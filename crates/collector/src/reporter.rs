//! Year-by-year contribution collection for one user

use crate::window::{ContributionWindow, YearRange};
use crate::{CollectorError, ContributionSource, Result};
use chrono::{Datelike, Utc};
use ghcontrib_store::{ResultStore, UserYear};
use tracing::{debug, info};

/// Outcome of one `Reporter::collect` run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Years queried against the remote source, latest first
    pub queried: Vec<i32>,
    /// Snapshots added to the store
    pub stored: usize,
}

/// Collects contribution snapshots for a single user across a year range
pub struct Reporter<S> {
    source: S,
    user: String,
    years: YearRange,
}

impl<S: ContributionSource> Reporter<S> {
    /// Create a reporter for `user`, normalizing the range against the current UTC year
    pub fn new(source: S, user: impl Into<String>, first_year: i32, last_year: i32) -> Result<Self> {
        Self::with_current_year(source, user, first_year, last_year, Utc::now().year())
    }

    pub fn with_current_year(
        source: S,
        user: impl Into<String>,
        first_year: i32,
        last_year: i32,
        this_year: i32,
    ) -> Result<Self> {
        let user = user.into();
        if user.is_empty() {
            return Err(CollectorError::InvalidUser);
        }

        Ok(Self {
            source,
            user,
            years: YearRange::normalize(first_year, last_year, this_year),
        })
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Query each year from latest to earliest, storing resolved snapshots.
    ///
    /// Stops after the first year whose snapshot reports no activity in the
    /// past. A query error aborts the run; snapshots stored before it remain.
    pub async fn collect(&self, store: &mut ResultStore) -> Result<CollectReport> {
        info!(
            user = %self.user,
            first_year = self.years.first,
            last_year = self.years.last,
            "Fetching contribution statistics"
        );

        let mut report = CollectReport::default();

        for year in self.years.descending() {
            let key = UserYear::new(self.user.clone(), year);

            let has_activity_in_the_past = match store.get(&key) {
                Some(existing) => {
                    debug!(key = %key, "Already collected, skipping query");
                    existing.has_activity_in_the_past
                }
                None => {
                    let window =
                        ContributionWindow::for_year(year).ok_or(CollectorError::InvalidYear(year))?;
                    let snapshot = self.source.fetch(&self.user, &window).await?;
                    report.queried.push(year);

                    let has_activity_in_the_past = snapshot.has_activity_in_the_past;
                    if snapshot.is_resolved() {
                        info!(key = %key, commits = snapshot.total_commit_contributions, "Collected");
                        store.insert(key, snapshot)?;
                        report.stored += 1;
                    } else {
                        debug!(key = %key, "No user resolved, snapshot discarded");
                    }
                    has_activity_in_the_past
                }
            };

            if !has_activity_in_the_past {
                debug!(user = %self.user, year = year, "No earlier activity, stopping");
                break;
            }
        }

        Ok(report)
    }
}
