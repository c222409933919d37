//! keyturn CLI entry point.

use anyhow::Context;
use clap::{Parser, Subcommand};
use keyturn::config::Config;
use keyturn::okta::{IdentityProvider, OktaClientFactory};
use keyturn::prompt::TerminalPrompter;
use keyturn::session::{self, SessionCache};
use keyturn::saml;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "keyturn",
    version,
    about = "Okta SSO session broker: MFA login, cached sessions, SAML assertion retrieval"
)]
struct Cli {
    /// Debug-level logging (to stderr).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in interactively and cache the session.
    Login {
        /// Account to log in as; prompted for when omitted.
        #[arg(long)]
        username: Option<String>,
    },
    /// Print an application's SAML assertion to stdout.
    Assert {
        /// Application URL to fetch the assertion from.
        #[arg(long)]
        app_url: String,
        /// Account the session must belong to; any cached user when
        /// omitted.
        #[arg(long)]
        username: Option<String>,
    },
    /// Show which user the cached session belongs to.
    Whoami,
    /// Remove the cached session.
    Logout,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().context("loading configuration")?;
    let provider = OktaClientFactory::new(&config.base_url, &config.api_token);
    let cache = SessionCache::new(config.cache_path.clone());
    let prompter = TerminalPrompter;

    match cli.command {
        Command::Login { username } => {
            let fresh = session::login(&provider, &prompter, &cache, username.as_deref())?;
            println!("Logged in as {}", fresh.username);
        }
        Command::Assert { app_url, username } => {
            let (_session_id, cookies) =
                session::acquire(&provider, &prompter, &cache, username.as_deref())?;
            let assertion = saml::fetch_saml_assertion(&app_url, &cookies)
                .context("retrieving SAML assertion")?;
            println!("{assertion}");
        }
        Command::Whoami => match cache.lookup(&provider, None) {
            Some((_session_id, cookies)) => {
                let login = provider.current_user(&cookies)?;
                println!("{login}");
            }
            None => anyhow::bail!("no valid cached session; run `keyturn login` first"),
        },
        Command::Logout => {
            cache.clear().context("removing cached session")?;
            println!("Session cleared.");
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout carries nothing but command output.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "keyturn=debug" } else { "keyturn=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
