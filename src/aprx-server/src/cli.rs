// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::path::PathBuf;

use clap::Parser;

/// APRX-IS gateway and packet digipeater daemon.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the configuration file. Falls back to the default search
    /// paths (current directory, XDG config dir, /etc/aprx) if unset.
    #[arg(long = "config", short = 'f', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration and exit without starting.
    #[arg(long = "print-config")]
    pub print_config: bool,

    /// Increase debug verbosity. May be repeated.
    #[arg(long = "debug", short = 'd', action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Run in the foreground instead of daemonizing.
    #[arg(long = "foreground", short = 'F')]
    pub foreground: bool,

    /// Override the log level (error, warn, info, debug, trace).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_invocation() {
        let cli = Cli::parse_from(["aprx-server"]);
        assert!(cli.config.is_none());
        assert_eq!(cli.debug, 0);
    }

    #[test]
    fn parses_config_flag_and_repeated_debug() {
        let cli = Cli::parse_from(["aprx-server", "-f", "aprx.toml", "-d", "-d"]);
        assert_eq!(cli.config, Some(PathBuf::from("aprx.toml")));
        assert_eq!(cli.debug, 2);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let result = Cli::try_parse_from(["aprx-server", "--bogus"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().exit_code(),
            2,
            "clap's own exit code stands in for bad invocation"
        );
    }
}
