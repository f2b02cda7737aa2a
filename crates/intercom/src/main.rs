mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use intercom_core::UpdateCoordinator;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::OutputOpts;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a device
        Command::Config(ref args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(ref args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "intercom", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = config::load_config_or_default();
            let mut device = config::resolve_device_config(&cli.global, &cfg)?;
            if let Command::Watch(ref args) = cmd {
                if let Some(secs) = args.interval {
                    device.poll_interval = Duration::from_secs(secs.max(1));
                }
            }

            let opts = OutputOpts {
                format: config::output_format(&cli.global, &cfg),
                color: output::should_color(cli.global.color),
                quiet: cli.global.quiet,
            };

            let coordinator = UpdateCoordinator::setup(&device).await?;
            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &coordinator, &opts).await;
            coordinator.shutdown().await;
            result
        }
    }
}
