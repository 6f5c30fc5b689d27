//! CLI command definitions for the `lawhelp` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a
//! noun-verb pattern (e.g., `lawhelp session list`, `lawhelp token issue`).

pub mod session;
pub mod token;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Real-time legal-advice chat server.
#[derive(Parser)]
#[command(name = "lawhelp", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (default: lawhelp.toml in the data directory).
    #[arg(long, global = true, env = "LAWHELP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Export spans to OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "LAWHELP_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP and WebSocket server.
    Serve {
        /// Port to listen on (overrides the config file).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides the config file).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage chat sessions.
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Development bearer tokens.
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Create a session for a subject.
    Create {
        /// Subject (user id) that will own the session.
        #[arg(long)]
        owner: String,

        /// Optional session title.
        #[arg(long)]
        title: Option<String>,
    },

    /// List a subject's sessions, most recent first.
    #[command(alias = "ls")]
    List {
        /// Subject whose sessions to list.
        #[arg(long)]
        owner: String,
    },

    /// Print the transcript of a session.
    Messages {
        /// Session id.
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TokenCommand {
    /// Sign a token for a subject with the configured JWT secret.
    Issue {
        /// Subject placed in the `userId` claim.
        #[arg(long)]
        subject: String,

        /// Lifetime in seconds.
        #[arg(long, default_value = "3600")]
        ttl_secs: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_overrides() {
        let cli = Cli::try_parse_from(["lawhelp", "serve", "--port", "8080", "--config", "/tmp/x.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
        match cli.command {
            Commands::Serve { port, host } => {
                assert_eq!(port, Some(8080));
                assert!(host.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_session_list() {
        let cli = Cli::try_parse_from(["lawhelp", "--json", "session", "list", "--owner", "u1"])
            .unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Session {
                action: SessionCommand::List { ref owner }
            } if owner == "u1"
        ));
    }
}
