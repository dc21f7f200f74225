pub mod ask;
pub mod config_cmd;
pub mod members;

use clap::{Args, Parser, Subcommand};
use concierge_core::Strategy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "concierge")]
#[command(version, about = "Question answering over member service requests")]
pub struct Cli {
    /// Path to concierge.toml
    #[arg(
        long,
        global = true,
        env = "CONCIERGE_CONFIG",
        default_value = "concierge.toml"
    )]
    pub config: PathBuf,

    /// Answer strategy, overriding [engine] strategy (llm or local)
    #[arg(long, global = true, env = "CONCIERGE_STRATEGY")]
    pub strategy: Option<Strategy>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Ask one question and print the answer
    Ask(AskArgs),
    /// Print the per-member overview
    Members,
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address (overrides [server] listen)
    #[arg(long, env = "CONCIERGE_LISTEN")]
    pub listen: Option<String>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question, e.g. "When is Layla planning her trip to London?"
    pub question: String,
    /// Print confidence, model, usage and context size as JSON
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    Validate,
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_global_flags() {
        let cli = Cli::try_parse_from([
            "concierge",
            "ask",
            "What does Vikram prefer?",
            "--detailed",
            "--strategy",
            "local",
        ])
        .unwrap();

        assert_eq!(cli.strategy, Some(Strategy::Local));
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.question, "What does Vikram prefer?");
                assert!(args.detailed);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        assert!(Cli::try_parse_from(["concierge", "--strategy", "magic", "members"]).is_err());
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::try_parse_from(["concierge", "config", "validate"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Validate)));
    }
}
