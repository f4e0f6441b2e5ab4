//! Command-line interface for reptrack
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Exercise recognition and repetition counting from pose streams
#[derive(Parser, Debug)]
#[command(
    name = "reptrack",
    version,
    about = "Exercise recognition and repetition counting from pose streams"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: transitions, -vv: every frame)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded pose stream and count repetitions
    Replay {
        /// JSON-lines pose file, or - for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Classifier model bundle (overrides config)
        #[arg(long, value_name = "PATH")]
        models: Option<PathBuf>,

        /// Emit events and the summary as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the joint-angle feature vector of each pose
    Angles {
        /// JSON-lines pose file, or - for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Manage configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file, defaults and env overrides)
    Show,
    /// Print the default configuration file path
    Path,
}

impl Cli {
    /// Log filter directive for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "reptrack=info,warn",
            _ => "reptrack=debug,info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_replay_with_options() {
        let cli = Cli::try_parse_from([
            "reptrack",
            "replay",
            "poses.jsonl",
            "--models",
            "models.json",
            "--json",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Replay {
                input,
                models,
                json,
            } => {
                assert_eq!(input, PathBuf::from("poses.jsonl"));
                assert_eq!(models, Some(PathBuf::from("models.json")));
                assert!(json);
            }
            other => panic!("expected replay, got {:?}", other),
        }
    }

    #[test]
    fn parses_stdin_input() {
        let cli = Cli::try_parse_from(["reptrack", "angles", "-"]).unwrap();
        assert!(matches!(cli.command, Commands::Angles { input } if input == PathBuf::from("-")));
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["reptrack", "config", "show", "--config", "/tmp/r.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/r.toml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn replay_requires_input() {
        assert!(Cli::try_parse_from(["reptrack", "replay"]).is_err());
    }

    #[test]
    fn log_filter_follows_flags() {
        let quiet = Cli::try_parse_from(["reptrack", "-q", "-v", "config", "path"]).unwrap();
        assert_eq!(quiet.log_filter(), "error");

        let default = Cli::try_parse_from(["reptrack", "config", "path"]).unwrap();
        assert_eq!(default.log_filter(), "warn");

        let verbose = Cli::try_parse_from(["reptrack", "-v", "config", "path"]).unwrap();
        assert_eq!(verbose.log_filter(), "reptrack=info,warn");
    }
}
