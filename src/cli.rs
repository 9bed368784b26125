//! Command-line interface for parlo
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Conversational English pronunciation coaching for the terminal
#[derive(Parser, Debug)]
#[command(
    name = "parlo",
    version,
    about = "Conversational English pronunciation coaching for the terminal"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: session events, -vv: backend diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio output device (e.g., pipewire)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Synthesis voice override
    #[arg(long, value_name = "VOICE")]
    pub voice: Option<String>,

    /// Skip per-utterance pronunciation feedback
    #[arg(long)]
    pub no_feedback: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize one phrase and play it (Enter pauses/resumes)
    Say {
        /// Text to speak
        text: String,
    },

    /// List available audio output devices
    Devices,

    /// Check configuration and backend reachability
    Check,

    /// Manage configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_without_args() {
        let cli = Cli::parse_from(["parlo"]);
        assert!(cli.command.is_none());
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn cli_parses_say_command() {
        let cli = Cli::parse_from(["parlo", "say", "hello world"]);
        match cli.command {
            Some(Commands::Say { text }) => assert_eq!(text, "hello world"),
            other => panic!("expected Say, got {:?}", other),
        }
    }

    #[test]
    fn cli_parses_global_flags_with_subcommand() {
        let cli = Cli::parse_from(["parlo", "-q", "-vv", "check"]);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Check)));
    }

    #[test]
    fn cli_parses_device_and_voice_overrides() {
        let cli = Cli::parse_from(["parlo", "--device", "pulse", "--voice", "slate"]);
        assert_eq!(cli.device.as_deref(), Some("pulse"));
        assert_eq!(cli.voice.as_deref(), Some("slate"));
    }

    #[test]
    fn cli_parses_config_actions() {
        let cli = Cli::parse_from(["parlo", "config", "show"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Show
            })
        ));

        let cli = Cli::parse_from(["parlo", "config", "init"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Init
            })
        ));
    }

    #[test]
    fn cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["parlo", "transcribe"]).is_err());
    }

    #[test]
    fn cli_command_structure_is_valid() {
        Cli::command().debug_assert();
    }
}
