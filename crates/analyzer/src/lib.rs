//! ghcontrib Contribution Analyzer
//!
//! Reduces collected snapshots into a single summary.

use chrono::Utc;
use ghcontrib_store::{ContributionSnapshot, ResultStore, Summary};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Contribution summary aggregator
pub struct Aggregator;

impl Aggregator {
    /// Aggregate every snapshot in the store
    pub fn aggregate(store: &ResultStore) -> Summary {
        Self::aggregate_snapshots(store.iter().map(|(key, snapshot)| {
            debug!(key = %key, "Aggregating");
            snapshot
        }))
    }

    /// Sum commit and other contributions, and count distinct repository names.
    ///
    /// Repositories are identified by name only: same-named repositories
    /// under different owners count once.
    pub fn aggregate_snapshots<'a, I>(snapshots: I) -> Summary
    where
        I: IntoIterator<Item = &'a ContributionSnapshot>,
    {
        let mut total_commit_contributions = 0u64;
        let mut total_other_contributions = 0u64;
        let mut unique_repositories: HashMap<&str, u64> = HashMap::new();

        for snapshot in snapshots {
            total_commit_contributions += snapshot.total_commit_contributions;
            total_other_contributions += snapshot.other_contributions();

            for repository in snapshot.all_repositories() {
                *unique_repositories.entry(repository.name.as_str()).or_insert(0) += 1;
            }
        }

        let summary = Summary {
            timestamp: Utc::now().timestamp(),
            total_commit_contributions,
            total_repositories: unique_repositories.len() as u64,
            total_other_contributions,
        };

        info!(
            commits = summary.total_commit_contributions,
            repositories = summary.total_repositories,
            other = summary.total_other_contributions,
            "Aggregated contributions"
        );
        summary
    }

    /// Aggregate the store and render the summary as indented JSON
    pub fn report(store: &ResultStore) -> Result<String> {
        let summary = Self::aggregate(store);
        render(&summary)
    }
}

/// Pretty-print a summary with two-space indentation
pub fn render(summary: &Summary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
