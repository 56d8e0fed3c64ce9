use anyhow::Result;
use clap::Parser;
use console::style;
use smcost::config::Config;
use smcost::exit_codes::{codes, exit_code_for_anyhow};
use smcost::resources::{self, RunOptions};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smcost")]
#[command(
    about = "Find what your SageMaker resources cost and shut them down",
    long_about = "smcost scans one AWS region for SageMaker endpoints, training jobs and notebook\ninstances, ML storage buckets and API Gateways, and estimates their cost.\n\nModes:\n  --scan     report only (default)\n  --cleanup  report, confirm, then delete endpoints and stop jobs and notebooks\n\nStorage buckets and API Gateways are reported but never modified."
)]
#[command(version)]
struct Cli {
    /// Report resources and costs without changing anything (default)
    #[arg(long, conflicts_with = "cleanup")]
    scan: bool,

    /// Delete in-service endpoints and stop running training jobs and notebooks
    #[arg(long)]
    cleanup: bool,

    /// AWS region to scan (default: AWS_DEFAULT_REGION, the AWS profile, then the config file)
    #[arg(long)]
    region: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Skip the cleanup confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Do not scan API Gateway
    #[arg(long)]
    skip_api_gateway: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    // Suppress INFO by default, only show warnings and errors
    let filter = EnvFilter::try_from_env("SMCOST_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_deref())?;

    let opts = RunOptions {
        region: cli.region,
        json: cli.json,
        cleanup: cli.cleanup,
        assume_yes: cli.yes,
        skip_api_gateway: cli.skip_api_gateway,
        progress: !cli.json && std::io::stderr().is_terminal(),
    };

    Ok(resources::handle_command(&opts, &config).await?)
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version come through here too
            let code = if e.use_stderr() {
                codes::USER_ERROR
            } else {
                codes::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("ERROR:").red().bold(), e);
            exit_code_for_anyhow(&e)
        }
    };
    std::process::exit(code);
}
