mod cli;
mod config;
mod engine;
mod http;
mod serve;

use clap::Parser;
use cli::{Cli, Commands};
use config::ConciergeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            let mut config = ConciergeConfig::load_or_default(&cli.config);
            if let Some(listen) = args.listen {
                config.server.listen = listen;
            }
            serve::run(config, cli.strategy).await
        }
        Commands::Ask(args) => {
            let config = ConciergeConfig::load_or_default(&cli.config);
            cli::ask::run(args, config, cli.strategy).await
        }
        Commands::Members => {
            let config = ConciergeConfig::load_or_default(&cli.config);
            cli::members::run(config, cli.strategy).await
        }
        Commands::Config(cmd) => cli::config_cmd::run(cmd, &cli.config).await,
    }
}
