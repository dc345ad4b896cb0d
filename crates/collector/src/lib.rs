//! ghcontrib Contribution Collectors
//!
//! Fetches per-year contribution snapshots from the GitHub GraphQL API and
//! drives year-by-year collection for a single user.

pub mod github;
pub mod reporter;
pub mod window;

pub use reporter::{CollectReport, Reporter};
pub use window::{ContributionWindow, YearRange, FIRST_CONTRIBUTION_YEAR};

use async_trait::async_trait;
use ghcontrib_store::ContributionSnapshot;
use thiserror::Error;

pub const DEFAULT_GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("User cannot be blank when constructing a reporter")]
    InvalidUser,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No contribution window for year {0}")]
    InvalidYear(i32),

    #[error("Store error: {0}")]
    Store(#[from] ghcontrib_store::StoreError),
}

pub type Result<T> = std::result::Result<T, CollectorError>;

/// Configuration for collectors
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub endpoint: String,
    pub user_agent: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            endpoint: std::env::var("GITHUB_GRAPHQL_URL")
                .unwrap_or_else(|_| DEFAULT_GRAPHQL_ENDPOINT.to_string()),
            user_agent: format!("ghcontrib/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A remote source answering one contributions query per (user, window)
#[async_trait]
pub trait ContributionSource: Send + Sync {
    async fn fetch(&self, login: &str, window: &ContributionWindow)
        -> Result<ContributionSnapshot>;
}
