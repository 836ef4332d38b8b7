//! md - read and post to Mastodon from the terminal

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use libmdon::commands::{self, DEFAULT_TIMELINE_LIMIT};
use libmdon::instance::mastodon::MastodonInstance;
use libmdon::logging::{LogFormat, LoggingConfig};
use libmdon::render::render_account;
use libmdon::{Config, MdError, Palette};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "md")]
#[command(version, about = "Read and post to Mastodon from the terminal")]
#[command(long_about = r#"Read and post to Mastodon from the terminal.

EXAMPLES:
    # Post a status (no quoting needed)
    md toot hello from the terminal

    # Show the local public timeline, oldest first
    md tl
    md tl --limit 40

    # Follow the local public timeline live (Ctrl-C to stop)
    md ltl

    # Change your display name
    md un Jane Doe

CONFIGURATION:
    TOML file looked up in this order: --config PATH, $MD_CONFIG,
    ./.mastodon.toml, ~/.mastodon.toml, ~/.config/md/config.toml

        server = "https://mastodon.social"
        access_token = "..."        # or token_file = "~/.config/md/token"

    MD_SERVER and MD_ACCESS_TOKEN override the file. With both set,
    no file is needed.

EXIT CODES:
    0 - Success
    1 - Error (config, network, instance)
    2 - Authentication failed
    3 - Invalid input
"#)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format: text, json or pretty
    #[arg(long, global = true, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Post a status
    Toot {
        /// Text to post; words are joined with spaces
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Show the local public timeline
    Tl {
        /// Number of statuses to fetch
        #[arg(short, long, default_value_t = DEFAULT_TIMELINE_LIMIT)]
        limit: u32,
    },

    /// Stream the local public timeline
    Ltl,

    /// Update the account display name
    Un {
        /// New display name; words are joined with spaces
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        name: Vec<String>,
    },

    /// Show the account the access token belongs to
    Whoami,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.log_format, cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<MdError>()
        .map(MdError::exit_code)
        .unwrap_or(1)
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let palette = Palette {
        enabled: config.color && !cli.no_color,
    };

    let mut instance = MastodonInstance::from_config(&config)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Toot { text } => {
            if let Err(e) = instance.fetch_instance_info().await {
                warn!(error = %e, "could not fetch instance limits, using configured limit");
            }
            let id = commands::toot(&instance, &text).await?;
            writeln!(out, "{}", id)?;
        }
        Command::Tl { limit } => {
            commands::timeline(&instance, limit, &palette, &mut out).await?;
        }
        Command::Ltl => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "cannot listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };
            commands::stream(Arc::new(instance), &palette, &mut out, shutdown).await?;
        }
        Command::Un { name } => {
            let account = commands::update_name(&instance, &name).await?;
            writeln!(out, "{}", render_account(&account, &palette))?;
        }
        Command::Whoami => {
            commands::whoami(&instance, &palette, &mut out).await?;
        }
    }

    Ok(())
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
    fn test_toot_collects_words() {
        let cli = Cli::try_parse_from(["md", "toot", "hello", "-", "world"]).unwrap();
        match cli.command {
            Command::Toot { text } => assert_eq!(text, vec!["hello", "-", "world"]),
            other => panic!("Expected toot, got {:?}", other),
        }
    }

    #[test]
    fn test_tl_default_limit() {
        let cli = Cli::try_parse_from(["md", "tl"]).unwrap();
        match cli.command {
            Command::Tl { limit } => assert_eq!(limit, DEFAULT_TIMELINE_LIMIT),
            other => panic!("Expected tl, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["md", "ltl", "--no-color", "--log-format", "json"]).unwrap();
        assert!(cli.no_color);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(matches!(cli.command, Command::Ltl));
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        assert!(Cli::try_parse_from(["md", "--log-format", "xml", "tl"]).is_err());
    }

    #[test]
    fn test_exit_code_through_context() {
        let err = anyhow::Error::new(MdError::InvalidInput("x".to_string())).context("while tooting");
        assert_eq!(exit_code(&err), 3);
        assert_eq!(exit_code(&anyhow::anyhow!("plain")), 1);
    }
}
