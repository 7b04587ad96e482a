//! Command-line interface definitions for Awful News Archive.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The API key can be provided via a flag or the `NYT_API_KEY` environment
//! variable.

use clap::Parser;

use crate::normalize::DEFAULT_REQUIRED_FIELDS;

/// Command-line arguments for the Awful News Archive application.
///
/// # Examples
///
/// ```sh
/// # Collect 1000 historical articles into a CSV
/// awful_news_archive -q immigration -b 18510101 -e 20250501 -r 1000 \
///     -o historical_immigration_articles.csv
///
/// # Abort the run as soon as any article is missing a required field
/// awful_news_archive -q elections --strict
///
/// # Enforce a custom required-field set
/// awful_news_archive -q climate --required-fields _id,headline,pub_date,web_url
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search query
    #[arg(short, long)]
    pub query: String,

    /// Beginning of the date range, format YYYYMMDD
    #[arg(short, long)]
    pub begin_date: Option<String>,

    /// End of the date range, format YYYYMMDD
    #[arg(short, long)]
    pub end_date: Option<String>,

    /// Number of articles to collect
    #[arg(short, long, default_value_t = 10)]
    pub results: usize,

    /// Page index to start fetching from
    #[arg(long, default_value_t = 0)]
    pub start_page: usize,

    /// Output CSV file
    #[arg(short, long, default_value = "nyt_articles.csv")]
    pub output: String,

    /// Abort the whole batch on the first article failing validation
    /// (default: skip it, count it, and continue)
    #[arg(long)]
    pub strict: bool,

    /// Fields that must be present for each article
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = DEFAULT_REQUIRED_FIELDS.iter().map(ToString::to_string)
    )]
    pub required_fields: Vec<String>,

    /// New York Times API key
    #[arg(long, env = "NYT_API_KEY")]
    pub api_key: String,

    /// Override the Article Search endpoint URL
    #[arg(long)]
    pub base_url: Option<String>,
}
