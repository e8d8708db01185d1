use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use domain_metrics::cli::setup::setup;
use domain_metrics::core::MetricCategory;
use domain_metrics::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for domain_metrics::AppCommand {
    fn from(cmd: Commands) -> domain_metrics::AppCommand {
        match cmd {
            Commands::Check {
                domain,
                metrics,
                json,
            } => domain_metrics::AppCommand::Check {
                domain,
                categories: metrics,
                json,
            },
            Commands::Shell => domain_metrics::AppCommand::Shell,
            Commands::Quota => domain_metrics::AppCommand::Quota,
            Commands::Categories => domain_metrics::AppCommand::Categories,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch metrics for a domain
    Check {
        /// Domain to inspect, e.g. example.com
        domain: String,

        /// Metric categories to fetch; all when omitted
        #[arg(short, long = "metric", value_name = "CATEGORY")]
        metrics: Vec<MetricCategory>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check domains interactively, one per line
    Shell,
    /// Display the remaining request quota
    Quota,
    /// List the available metric categories
    Categories,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => domain_metrics::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
