//! The `tally` binary.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use common_error::TallyResult;
use tally_engine::{Dashboard, DashboardView};

use tally_cli::report::{
    info_section, monthly_section, products_section, rfm_section, states_section,
};
use tally_cli::{Cli, Command, Options, full_report};

/// Exit status when the order export cannot be loaded.
const EXIT_LOAD_FAILURE: u8 = 2;

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_load_failure() => {
            error!(%err, "failed to load the order export");
            eprintln!("error: could not load the order export: {err}");
            ExitCode::from(EXIT_LOAD_FAILURE)
        }
        Err(err) => {
            error!(%err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> TallyResult<()> {
    let config = cli.options.resolve_config()?;
    let dashboard = Dashboard::load(&config.data)?;
    let report = &config.report;

    let output = match cli.command {
        Command::Info => info_section(&dashboard)?,
        Command::Report => full_report(&refresh(&cli.options, &dashboard)?, report)?,
        Command::Monthly => monthly_section(&refresh(&cli.options, &dashboard)?)?,
        Command::Products => products_section(&refresh(&cli.options, &dashboard)?, report)?,
        Command::States => states_section(&refresh(&cli.options, &dashboard)?, report),
        Command::Rfm => rfm_section(&refresh(&cli.options, &dashboard)?, report)?,
    };
    print!("{output}");
    Ok(())
}

fn refresh(options: &Options, dashboard: &Dashboard) -> TallyResult<DashboardView> {
    let params = options.resolve_params(dashboard)?;
    let view = dashboard.refresh(&params)?;
    debug!("stage metrics:\n{}", view.operator_metrics.format_analyze());
    Ok(view)
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tally=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
