//! Command-line arguments and their merge with the JSON configuration.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use common_config::TallyConfig;
use common_error::{TallyError, TallyResult};
use tally_core::time::parse_date;
use tally_engine::{CategoryFilter, Dashboard, FilterParams};

/// Order analytics over a cleaned e-commerce export.
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub options: Options,
}

/// Flags shared by every subcommand. They override the configuration file.
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct Options {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Input CSV file
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,

    /// Field delimiter of the input file
    #[arg(long, global = true)]
    pub delimiter: Option<char>,

    /// First day of the view (YYYY-MM-DD), default: first purchase
    #[arg(short, long, global = true)]
    pub start: Option<String>,

    /// Last day of the view (YYYY-MM-DD), inclusive, default: last purchase
    #[arg(short, long, global = true)]
    pub end: Option<String>,

    /// Category to restrict the view to; "All" for none
    #[arg(long, global = true)]
    pub category: Option<String>,

    /// Rows shown per ranking
    #[arg(short = 'n', long, global = true)]
    pub top: Option<usize>,

    /// Currency code for monetary values
    #[arg(long, global = true)]
    pub currency: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Every section of the dashboard
    Report,
    /// Monthly order count and revenue
    Monthly,
    /// Best and worst performing categories
    Products,
    /// Customers per state
    States,
    /// Best customers by recency, frequency and monetary value
    Rfm,
    /// Store size, purchase range and categories
    Info,
}

impl Options {
    /// Load the configuration file (or defaults) and apply the flags on top.
    pub fn resolve_config(&self) -> TallyResult<TallyConfig> {
        let mut config = match &self.config {
            Some(path) => TallyConfig::from_json_file(path)?,
            None => TallyConfig::default(),
        };

        if let Some(data) = &self.data {
            config.data.path.clone_from(data);
        }
        if let Some(delimiter) = self.delimiter {
            config.data.delimiter = delimiter;
        }
        if let Some(top) = self.top {
            config.report.top_n = top;
        }
        if let Some(currency) = &self.currency {
            config.report.currency.clone_from(currency);
        }
        config.validate()?;
        Ok(config)
    }

    /// Filter parameters for the view; missing bounds default to the store's
    /// purchase range.
    pub fn resolve_params(&self, dashboard: &Dashboard) -> TallyResult<FilterParams> {
        let bounds = dashboard.date_bounds()?;
        let start = match (&self.start, bounds) {
            (Some(s), _) => parse_date(s)?,
            (None, Some((first, _))) => first,
            (None, None) => return Err(missing_bound("start")),
        };
        let end = match (&self.end, bounds) {
            (Some(s), _) => parse_date(s)?,
            (None, Some((_, last))) => last,
            (None, None) => return Err(missing_bound("end")),
        };

        let category = match &self.category {
            Some(label) => label.parse()?,
            None => CategoryFilter::All,
        };
        Ok(FilterParams::new(start, end).with_category(category))
    }
}

fn missing_bound(which: &str) -> TallyError {
    TallyError::invalid_parameter(format!(
        "the store is empty; pass --{which} explicitly"
    ))
}
