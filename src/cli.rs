//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "voxcall",
    about = "Voice-driven call controller for SIM800L cellular modems",
    long_about = "Reads recognized utterances from stdin (one lower-cased line per phrase) \
                  and drives a SIM800L modem: dial by spoken digits, answer incoming rings, \
                  save contacts letter by letter.",
    version
)]
pub struct Cli {
    /// Path to config file (default: ~/.config/voxcall/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Serial port of the modem (overrides config)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate (overrides config)
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Contacts file (overrides config)
    #[arg(long)]
    pub contacts: Option<PathBuf>,

    /// Country code prefixed to dialed numbers (overrides config)
    #[arg(long)]
    pub country_code: Option<String>,

    /// Suppress spoken prompts
    #[arg(short, long)]
    pub quiet: bool,

    /// Skip pactl loopback routing (telephony still works)
    #[arg(long)]
    pub no_audio_routing: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe the modem: liveness check plus SIM status
    Probe,

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses_without_args() {
        let cli = Cli::parse_from(["voxcall"]);
        assert!(cli.command.is_none());
        assert!(!cli.quiet);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "voxcall",
            "--port",
            "/dev/ttyUSB0",
            "--baud",
            "115200",
            "--country-code",
            "+44",
            "--quiet",
        ]);
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(cli.baud, Some(115200));
        assert_eq!(cli.country_code.as_deref(), Some("+44"));
        assert!(cli.quiet);
    }

    #[test]
    fn test_probe_subcommand() {
        let cli = Cli::parse_from(["voxcall", "probe"]);
        assert!(matches!(cli.command, Some(Commands::Probe)));
    }

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }
}
