//! Data models for collected contributions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Contribution categories reported per repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContributionCategory {
    Commit,
    Issue,
    PullRequest,
    PullRequestReview,
}

impl ContributionCategory {
    pub const ALL: [ContributionCategory; 4] = [
        ContributionCategory::Commit,
        ContributionCategory::Issue,
        ContributionCategory::PullRequest,
        ContributionCategory::PullRequestReview,
    ];
}

/// Contributions made to a single repository within one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryContribution {
    pub name: String,
    pub url: String,
    pub contributions: u64,
}

impl RepositoryContribution {
    pub fn new(name: impl Into<String>, url: impl Into<String>, contributions: u64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            contributions,
        }
    }
}

/// One user's contributions for one calendar year
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionSnapshot {
    /// Resolved login; empty when the remote source found no such user
    pub login: String,
    pub has_any_contributions: bool,
    /// Whether any contributions exist before the queried window
    pub has_activity_in_the_past: bool,
    pub restricted_contributions_count: u64,
    pub total_commit_contributions: u64,
    pub total_issue_contributions: u64,
    pub total_pull_request_contributions: u64,
    pub total_pull_request_review_contributions: u64,
    pub total_repositories_with_contributed_commits: u64,
    pub total_repositories_with_contributed_issues: u64,
    pub total_repositories_with_contributed_pull_requests: u64,
    pub total_repositories_with_contributed_pull_request_reviews: u64,
    pub commit_repositories: Vec<RepositoryContribution>,
    pub issue_repositories: Vec<RepositoryContribution>,
    pub pull_request_repositories: Vec<RepositoryContribution>,
    pub pull_request_review_repositories: Vec<RepositoryContribution>,
}

impl ContributionSnapshot {
    /// Issue, pull request and review contributions combined
    pub fn other_contributions(&self) -> u64 {
        self.total_issue_contributions
            + self.total_pull_request_contributions
            + self.total_pull_request_review_contributions
    }

    pub fn repositories(&self, category: ContributionCategory) -> &[RepositoryContribution] {
        match category {
            ContributionCategory::Commit => &self.commit_repositories,
            ContributionCategory::Issue => &self.issue_repositories,
            ContributionCategory::PullRequest => &self.pull_request_repositories,
            ContributionCategory::PullRequestReview => &self.pull_request_review_repositories,
        }
    }

    /// Every repository entry across all four categories, in category order
    pub fn all_repositories(&self) -> impl Iterator<Item = &RepositoryContribution> + '_ {
        ContributionCategory::ALL
            .into_iter()
            .flat_map(move |category| self.repositories(category).iter())
    }

    pub fn is_resolved(&self) -> bool {
        !self.login.is_empty()
    }
}

/// Composite store key: a username and a calendar year
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserYear {
    pub user: String,
    pub year: i32,
}

impl UserYear {
    pub fn new(user: impl Into<String>, year: i32) -> Self {
        Self {
            user: user.into(),
            year,
        }
    }
}

impl fmt::Display for UserYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.user, self.year)
    }
}

/// Aggregated totals across every stored snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Seconds since the Unix epoch at aggregation time
    pub timestamp: i64,
    pub total_commit_contributions: u64,
    pub total_repositories: u64,
    pub total_other_contributions: u64,
}
