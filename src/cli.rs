//! Command-line interface parsing for the COVID tracker
//!
//! This module handles parsing of CLI arguments using clap. Every option can
//! also be supplied through an environment variable.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_DIR;
use crate::data::series::DEFAULT_API_URL;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A `--country` value can't be used as an API slug
    #[error("Invalid country slug: '{0}'. Slugs are lowercase names like 'south-africa'")]
    InvalidCountry(String),

    /// `--top` must show at least one row
    #[error("--top must be at least 1")]
    InvalidTop,
}

/// COVID tracker - daily confirmed, deaths and recovered counts per country
#[derive(Parser, Debug)]
#[command(name = "covid-tracker")]
#[command(about = "Download and cache daily COVID-19 counts per country")]
#[command(version)]
pub struct Cli {
    /// Directory holding the daily snapshots
    #[arg(long, value_name = "DIR", env = "COVID_CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Base URL of the COVID-19 API
    #[arg(long, value_name = "URL", env = "COVID_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Load only these countries instead of the API's full list
    ///
    /// Examples:
    ///   covid-tracker --country brazil --country peru
    #[arg(long = "country", value_name = "SLUG")]
    pub countries: Vec<String>,

    /// Number of countries shown in the summary table
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub top: usize,

    /// List the days with cached snapshots and exit without downloading
    #[arg(long)]
    pub status: bool,

    /// Don't draw the progress gauge or summary table
    #[arg(long)]
    pub no_progress: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub cache_dir: PathBuf,
    pub api_url: String,
    /// Explicit country slugs; empty means "ask the API"
    pub countries: Vec<String>,
    pub top: usize,
    pub status_only: bool,
    pub show_progress: bool,
}

/// Checks that a country argument looks like an API slug
///
/// # Returns
/// * `Ok(String)` with the slug trimmed and lowercased
/// * `Err(CliError::InvalidCountry)` if it is empty or contains characters
///   other than ASCII letters, digits and `-`
pub fn parse_country_arg(s: &str) -> Result<String, CliError> {
    let slug = s.trim().to_lowercase();
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(slug)
    } else {
        Err(CliError::InvalidCountry(s.to_string()))
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if a country slug or `--top` is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.top == 0 {
            return Err(CliError::InvalidTop);
        }

        let countries = cli
            .countries
            .iter()
            .map(|c| parse_country_arg(c))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StartupConfig {
            cache_dir: cli.cache_dir.clone(),
            api_url: cli.api_url.clone(),
            countries,
            top: cli.top,
            status_only: cli.status,
            show_progress: !cli.no_progress,
        })
    }
}
