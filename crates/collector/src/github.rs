//! GitHub GraphQL collector

use crate::window::ContributionWindow;
use crate::{CollectorConfig, CollectorError, ContributionSource, Result};
use async_trait::async_trait;
use chrono::Utc;
use ghcontrib_store::{ContributionSnapshot, RepositoryContribution};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Contributions of one user within a `[from, to]` window
const CONTRIBUTIONS_QUERY: &str = r#"
query($login: String!, $from: DateTime!, $to: DateTime!) {
    user(login: $login) {
        login
        contributionsCollection(from: $from, to: $to) {
            hasAnyContributions
            hasActivityInThePast
            restrictedContributionsCount
            totalCommitContributions
            totalIssueContributions
            totalPullRequestContributions
            totalPullRequestReviewContributions
            totalRepositoriesWithContributedCommits
            totalRepositoriesWithContributedIssues
            totalRepositoriesWithContributedPullRequests
            totalRepositoriesWithContributedPullRequestReviews
            commitContributionsByRepository {
                repository { name url }
                contributions { totalCount }
            }
            issueContributionsByRepository {
                repository { name url }
                contributions { totalCount }
            }
            pullRequestContributionsByRepository {
                repository { name url }
                contributions { totalCount }
            }
            pullRequestReviewContributionsByRepository {
                repository { name url }
                contributions { totalCount }
            }
        }
    }
}
"#;

/// GitHub GraphQL client authenticated with one user's token
pub struct GithubClient {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode {
    login: String,
    contributions_collection: CollectionNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionNode {
    has_any_contributions: bool,
    has_activity_in_the_past: bool,
    restricted_contributions_count: u64,
    total_commit_contributions: u64,
    total_issue_contributions: u64,
    total_pull_request_contributions: u64,
    total_pull_request_review_contributions: u64,
    total_repositories_with_contributed_commits: u64,
    total_repositories_with_contributed_issues: u64,
    total_repositories_with_contributed_pull_requests: u64,
    total_repositories_with_contributed_pull_request_reviews: u64,
    #[serde(default)]
    commit_contributions_by_repository: Vec<ByRepositoryNode>,
    #[serde(default)]
    issue_contributions_by_repository: Vec<ByRepositoryNode>,
    #[serde(default)]
    pull_request_contributions_by_repository: Vec<ByRepositoryNode>,
    #[serde(default)]
    pull_request_review_contributions_by_repository: Vec<ByRepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct ByRepositoryNode {
    repository: RepositoryNode,
    contributions: CountNode,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountNode {
    total_count: u64,
}

impl From<ByRepositoryNode> for RepositoryContribution {
    fn from(node: ByRepositoryNode) -> Self {
        RepositoryContribution::new(
            node.repository.name,
            node.repository.url,
            node.contributions.total_count,
        )
    }
}

fn convert(nodes: Vec<ByRepositoryNode>) -> Vec<RepositoryContribution> {
    nodes.into_iter().map(RepositoryContribution::from).collect()
}

impl From<UserNode> for ContributionSnapshot {
    fn from(user: UserNode) -> Self {
        let c = user.contributions_collection;
        ContributionSnapshot {
            login: user.login,
            has_any_contributions: c.has_any_contributions,
            has_activity_in_the_past: c.has_activity_in_the_past,
            restricted_contributions_count: c.restricted_contributions_count,
            total_commit_contributions: c.total_commit_contributions,
            total_issue_contributions: c.total_issue_contributions,
            total_pull_request_contributions: c.total_pull_request_contributions,
            total_pull_request_review_contributions: c.total_pull_request_review_contributions,
            total_repositories_with_contributed_commits: c
                .total_repositories_with_contributed_commits,
            total_repositories_with_contributed_issues: c.total_repositories_with_contributed_issues,
            total_repositories_with_contributed_pull_requests: c
                .total_repositories_with_contributed_pull_requests,
            total_repositories_with_contributed_pull_request_reviews: c
                .total_repositories_with_contributed_pull_request_reviews,
            commit_repositories: convert(c.commit_contributions_by_repository),
            issue_repositories: convert(c.issue_contributions_by_repository),
            pull_request_repositories: convert(c.pull_request_contributions_by_repository),
            pull_request_review_repositories: convert(
                c.pull_request_review_contributions_by_repository,
            ),
        }
    }
}

/// Decode a GraphQL response body into a snapshot.
///
/// A `null` user decodes to an empty snapshot; reported `errors` fail the query.
fn decode(json: Value) -> Result<ContributionSnapshot> {
    let response: GraphqlResponse = serde_json::from_value(json)
        .map_err(|e| CollectorError::Parse(format!("contributions response: {}", e)))?;

    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(CollectorError::Api(format!(
            "GraphQL reported errors: {}",
            messages.join("; ")
        )));
    }

    Ok(response
        .data
        .and_then(|d| d.user)
        .map(ContributionSnapshot::from)
        .unwrap_or_default())
}

impl GithubClient {
    /// Create a client sending `token` as a bearer credential
    pub fn new(config: &CollectorConfig, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

/// GraphQL request body for one user and window
fn request_body(login: &str, window: &ContributionWindow) -> Value {
    serde_json::json!({
        "query": CONTRIBUTIONS_QUERY,
        "variables": {
            "login": login,
            "from": window.from_rfc3339(),
            "to": window.to_rfc3339(),
        },
    })
}

fn check_rate_limit(response: &reqwest::Response) -> Result<()> {
    let status = response.status();
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return Ok(());
    }

    let headers = response.headers();
    if let Some(wait) = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    {
        return Err(CollectorError::RateLimited(wait));
    }

    if let Some(remaining) = headers.get("x-ratelimit-remaining") {
        if remaining == "0" {
            let reset = headers
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);

            let now = Utc::now().timestamp() as u64;
            let wait = reset.saturating_sub(now);

            return Err(CollectorError::RateLimited(wait));
        }
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(CollectorError::RateLimited(60));
    }
    Ok(())
}

/// Map rate limits and non-2xx statuses to errors, then read the JSON body
async fn read_json(response: reqwest::Response) -> Result<Value> {
    check_rate_limit(&response)?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(CollectorError::Api(format!(
            "GitHub API returned HTTP {}: {}",
            status.as_u16(),
            text.trim()
        )));
    }

    response
        .json()
        .await
        .map_err(|e| CollectorError::Parse(format!("JSON from GitHub: {}", e)))
}

#[async_trait]
impl ContributionSource for GithubClient {
    async fn fetch(
        &self,
        login: &str,
        window: &ContributionWindow,
    ) -> Result<ContributionSnapshot> {
        debug!(
            login = login,
            from = %window.from_rfc3339(),
            to = %window.to_rfc3339(),
            "Querying contributions"
        );

        let body = request_body(login, window);
        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let json = read_json(response).await?;

        decode(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn by_repo(name: &str, count: u64) -> Value {
        json!({
            "repository": { "name": name, "url": format!("https://github.com/octocat/{}", name) },
            "contributions": { "totalCount": count }
        })
    }

    #[test]
    fn decodes_contributions_collection() {
        let body = json!({
            "data": {
                "user": {
                    "login": "octocat",
                    "contributionsCollection": {
                        "hasAnyContributions": true,
                        "hasActivityInThePast": true,
                        "restrictedContributionsCount": 4,
                        "totalCommitContributions": 12,
                        "totalIssueContributions": 2,
                        "totalPullRequestContributions": 3,
                        "totalPullRequestReviewContributions": 1,
                        "totalRepositoriesWithContributedCommits": 2,
                        "totalRepositoriesWithContributedIssues": 1,
                        "totalRepositoriesWithContributedPullRequests": 1,
                        "totalRepositoriesWithContributedPullRequestReviews": 1,
                        "commitContributionsByRepository": [by_repo("hello", 10), by_repo("spoon", 2)],
                        "issueContributionsByRepository": [by_repo("hello", 2)],
                        "pullRequestContributionsByRepository": [by_repo("spoon", 3)],
                        "pullRequestReviewContributionsByRepository": [by_repo("linguist", 1)]
                    }
                }
            }
        });

        let snapshot = decode(body).unwrap();

        assert_eq!(snapshot.login, "octocat");
        assert!(snapshot.has_any_contributions);
        assert!(snapshot.has_activity_in_the_past);
        assert_eq!(snapshot.restricted_contributions_count, 4);
        assert_eq!(snapshot.total_commit_contributions, 12);
        assert_eq!(snapshot.other_contributions(), 6);
        assert_eq!(
            snapshot.commit_repositories,
            vec![
                RepositoryContribution::new("hello", "https://github.com/octocat/hello", 10),
                RepositoryContribution::new("spoon", "https://github.com/octocat/spoon", 2),
            ]
        );
        assert_eq!(snapshot.pull_request_review_repositories[0].name, "linguist");
        assert_eq!(snapshot.all_repositories().count(), 5);
    }

    #[test]
    fn null_user_decodes_to_unresolved_snapshot() {
        let snapshot = decode(json!({ "data": { "user": null } })).unwrap();

        assert!(!snapshot.is_resolved());
        assert!(!snapshot.has_activity_in_the_past);
        assert_eq!(snapshot, ContributionSnapshot::default());
    }

    #[test]
    fn graphql_errors_fail_the_query() {
        let body = json!({
            "data": { "user": null },
            "errors": [
                { "type": "NOT_FOUND", "message": "Could not resolve to a User with the login of 'ghost'." }
            ]
        });

        match decode(body) {
            Err(CollectorError::Api(message)) => assert!(message.contains("Could not resolve")),
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        let body = json!({ "data": { "user": { "login": "octocat" } } });
        assert!(matches!(decode(body), Err(CollectorError::Parse(_))));
    }

    #[test]
    fn client_rejects_unencodable_token() {
        let config = CollectorConfig {
            endpoint: "http://localhost".to_string(),
            user_agent: "ghcontrib-test".to_string(),
        };
        assert!(matches!(
            GithubClient::new(&config, "bad\ntoken"),
            Err(CollectorError::InvalidHeader(_))
        ));
    }

    fn response(status: u16, headers: &[(&str, &str)], body: &'static str) -> reqwest::Response {
        let mut builder = http::Response::builder().status(status);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        reqwest::Response::from(builder.body(body).unwrap())
    }

    #[test]
    fn request_body_carries_login_and_rfc3339_window() {
        let window = ContributionWindow::for_year(2022).unwrap();
        let body = request_body("octocat", &window);

        assert_eq!(
            body["variables"],
            json!({
                "login": "octocat",
                "from": "2022-01-01T00:00:00Z",
                "to": "2022-12-31T23:59:59Z",
            })
        );
        assert!(body["query"].as_str().unwrap().contains("contributionsCollection(from: $from, to: $to)"));
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let resp = response(429, &[], "");
        assert!(matches!(check_rate_limit(&resp), Err(CollectorError::RateLimited(60))));
    }

    #[test]
    fn retry_after_sets_wait() {
        let resp = response(429, &[("retry-after", "17")], "");
        assert!(matches!(check_rate_limit(&resp), Err(CollectorError::RateLimited(17))));

        let resp = response(403, &[("retry-after", "5")], "");
        assert!(matches!(check_rate_limit(&resp), Err(CollectorError::RateLimited(5))));
    }

    #[test]
    fn forbidden_with_exhausted_limit_is_rate_limited() {
        let reset = (Utc::now().timestamp() + 120).to_string();
        let resp = response(
            403,
            &[("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", reset.as_str())],
            "",
        );

        match check_rate_limit(&resp) {
            Err(CollectorError::RateLimited(wait)) => assert!(wait > 0 && wait <= 120),
            other => panic!("expected rate limit, got {:?}", other),
        }
    }

    #[test]
    fn forbidden_with_remaining_quota_is_not_rate_limited() {
        let resp = response(403, &[("x-ratelimit-remaining", "42")], "");
        assert!(check_rate_limit(&resp).is_ok());
        assert!(check_rate_limit(&response(403, &[], "")).is_ok());
        assert!(check_rate_limit(&response(200, &[], "{}")).is_ok());
    }

    #[tokio::test]
    async fn other_error_statuses_are_api_errors() {
        for status in [401, 403, 500, 502] {
            match read_json(response(status, &[], "  Bad credentials\n")).await {
                Err(CollectorError::Api(message)) => {
                    assert!(message.contains(&format!("HTTP {}", status)), "{}", message);
                    assert!(message.ends_with("Bad credentials"), "{}", message);
                }
                other => panic!("expected API error for {}, got {:?}", status, other),
            }
        }
    }

    #[tokio::test]
    async fn rate_limit_wins_over_status_mapping() {
        let result = read_json(response(429, &[], "slow down")).await;
        assert!(matches!(result, Err(CollectorError::RateLimited(60))));
    }

    #[tokio::test]
    async fn success_body_is_read_as_json() {
        let json = read_json(response(200, &[], r#"{"data": {"user": null}}"#))
            .await
            .unwrap();
        assert_eq!(decode(json).unwrap(), ContributionSnapshot::default());
    }

    #[tokio::test]
    async fn non_json_success_body_is_a_parse_error() {
        let result = read_json(response(200, &[], "<html>")).await;
        assert!(matches!(result, Err(CollectorError::Parse(_))));
    }
}
