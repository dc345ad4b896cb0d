//! ghcontrib CLI
//!
//! Aggregates contributions across a list of GitHub accounts and a range of years.

mod credentials;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::Parser;
use credentials::Credential;
use ghcontrib_analyzer::Aggregator;
use ghcontrib_collector::github::GithubClient;
use ghcontrib_collector::{CollectReport, CollectorConfig, Reporter, FIRST_CONTRIBUTION_YEAR};
use ghcontrib_store::ResultStore;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

const USAGE: &str = concat!(
    "Totals commits, repositories contributed to, and other contributions\n",
    "(issues, pull requests and pull request reviews).\n\n",
    "1. Create a JSON file with a list of credentials:\n\n",
);

const USAGE_STEPS: &str = "\n\n\
2. Optionally encrypt the file using PGP/GPG, and pass --encrypted if it is encrypted.\n\
3. Optionally set --firstyear and --lastyear with four digit years.\n\
4. Pass the path to the file with --credentials.";

/// Long flags also accepted with a single dash, e.g. `-credentials gh-tokens.json`
const SINGLE_DASH_FLAGS: [&str; 4] = ["credentials", "encrypted", "firstyear", "lastyear"];

fn current_year() -> i32 {
    Utc::now().year()
}

#[derive(Parser)]
#[command(name = "ghcontrib")]
#[command(about = "GitHub summary contributions reporter")]
#[command(version)]
#[command(after_help = format!("{}{}{}", USAGE, credentials::SAMPLE, USAGE_STEPS))]
struct Cli {
    /// File containing GitHub usernames and API tokens
    #[arg(long, default_value = "gh-tokens.json")]
    credentials: PathBuf,

    /// Whether the credentials file is PGP encrypted
    #[arg(long)]
    encrypted: bool,

    /// The first year to summarize
    #[arg(
        long = "firstyear",
        default_value_t = FIRST_CONTRIBUTION_YEAR,
        allow_negative_numbers = true
    )]
    first_year: i32,

    /// The last year to summarize
    #[arg(long = "lastyear", default_value_t = current_year(), allow_negative_numbers = true)]
    last_year: i32,

    /// GitHub GraphQL endpoint
    #[arg(long, env = "GITHUB_GRAPHQL_URL")]
    endpoint: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Rewrite single-dash long flags (`-firstyear 2010`, `-lastyear=2020`) to their
/// double-dash form. Arguments after a `--` terminator are left alone.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut terminated = false;
    args.into_iter()
        .map(|arg| {
            if terminated {
                return arg;
            }
            let rewritten = match arg.to_str() {
                Some("--") => {
                    terminated = true;
                    None
                }
                Some(s) => s
                    .strip_prefix('-')
                    .filter(|rest| !rest.starts_with('-'))
                    .filter(|rest| {
                        let name = rest.split('=').next().unwrap_or_default();
                        SINGLE_DASH_FLAGS.contains(&name)
                    })
                    .map(|rest| OsString::from(format!("--{}", rest))),
                None => None,
            };
            rewritten.unwrap_or(arg)
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    // Logs go to stderr; stdout carries only the summary
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let credentials = credentials::load(&cli.credentials, cli.encrypted)?;

    let mut config = CollectorConfig::default();
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    let mut store = ResultStore::new();
    collect(&config, &credentials, cli.first_year, cli.last_year, &mut store).await;

    let json = Aggregator::report(&store).context("Couldn't serialize the aggregated results")?;
    println!("{}", json);

    Ok(())
}

/// Collect every credential in turn; one credential failing doesn't stop the rest
async fn collect(
    config: &CollectorConfig,
    credentials: &[Credential],
    first_year: i32,
    last_year: i32,
    store: &mut ResultStore,
) {
    info!(count = credentials.len(), "Collecting contributions");

    for credential in credentials {
        match collect_one(config, credential, first_year, last_year, store).await {
            Ok(report) => info!(
                user = %credential.username,
                queried = report.queried.len(),
                stored = report.stored,
                "Collection complete"
            ),
            Err(e) => error!(user = %credential.username, error = %e, "Collection failed"),
        }
    }
}

async fn collect_one(
    config: &CollectorConfig,
    credential: &Credential,
    first_year: i32,
    last_year: i32,
    store: &mut ResultStore,
) -> ghcontrib_collector::Result<CollectReport> {
    let client = GithubClient::new(config, &credential.token)?;
    let reporter = Reporter::new(client, credential.username.clone(), first_year, last_year)?;
    reporter.collect(store).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    fn parse(list: &[&str]) -> Cli {
        Cli::try_parse_from(normalize_args(args(list))).unwrap()
    }

    #[test]
    fn single_dash_long_flags_are_rewritten() {
        let normalized = normalize_args(args(&[
            "ghcontrib",
            "-credentials",
            "tokens.json",
            "-encrypted",
            "-firstyear=2010",
            "-lastyear",
            "2020",
            "-v",
        ]));

        assert_eq!(
            normalized,
            args(&[
                "ghcontrib",
                "--credentials",
                "tokens.json",
                "--encrypted",
                "--firstyear=2010",
                "--lastyear",
                "2020",
                "-v",
            ])
        );
    }

    #[test]
    fn values_and_terminated_arguments_are_untouched() {
        let list = ["ghcontrib", "--firstyear", "-5", "--", "-credentials"];
        assert_eq!(normalize_args(args(&list)), args(&list));
    }

    #[test]
    fn go_style_invocation_parses() {
        let cli = parse(&[
            "ghcontrib",
            "-credentials",
            "tokens.json",
            "-encrypted",
            "-firstyear",
            "2012",
            "-lastyear",
            "2018",
        ]);

        assert_eq!(cli.credentials, PathBuf::from("tokens.json"));
        assert!(cli.encrypted);
        assert_eq!((cli.first_year, cli.last_year), (2012, 2018));
    }

    #[test]
    fn defaults_match_documented_flags() {
        let cli = parse(&["ghcontrib"]);

        assert_eq!(cli.credentials, PathBuf::from("gh-tokens.json"));
        assert!(!cli.encrypted);
        assert_eq!(cli.first_year, FIRST_CONTRIBUTION_YEAR);
        assert_eq!(cli.last_year, current_year());
    }

    #[test]
    fn negative_years_reach_normalization() {
        let cli = parse(&["ghcontrib", "--firstyear", "-5", "-lastyear", "-1"]);
        assert_eq!((cli.first_year, cli.last_year), (-5, -1));
    }
}
