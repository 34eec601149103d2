mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "hydepark-deploy",
    about = "Provision, update and health-check a HydePark Sync installation",
    version,
    propagate_version = true
)]
struct Cli {
    /// Deployment config file (YAML). Built-in defaults when omitted
    #[arg(long, global = true, env = "HYDEPARK_CONFIG")]
    config: Option<PathBuf>,

    /// Override layout.install_dir
    #[arg(long, global = true)]
    install_dir: Option<PathBuf>,

    /// Override network.port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install (or reinstall) the application and start its service
    Deploy {
        /// Refresh application files and restart; skip provisioning
        #[arg(long, short = 'u')]
        update: bool,

        /// Application source tree (default: current directory)
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Check that the installed service is healthy
    Verify,

    /// Inspect, create and validate the deployment config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Deploy { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let overrides = cmd::Overrides {
        config: cli.config,
        install_dir: cli.install_dir,
        port: cli.port,
    };

    let result = match cli.command {
        Commands::Deploy { update, source } => {
            let source = root::resolve_source(source.as_deref());
            cmd::deploy::run(&overrides, &source, update, cli.json)
        }
        Commands::Verify => cmd::verify::run(&overrides, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&overrides, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
