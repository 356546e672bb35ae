use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pulse_account::account::IntegrationService;
use pulse_account::config::Config;
use pulse_account::store::{AccountSnapshot, AccountStore};
use std::path::PathBuf;

/// Get the config directory path (~/.config/pulse-account/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("pulse-account"))
}

#[derive(Parser, Debug)]
#[command(name = "pulse-account", about = "Inspect and manage a Pulse account from the terminal")]
struct Args {
    /// Config file (defaults to ~/.config/pulse-account/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL, overrides config and environment
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Account id, overrides config and environment
    #[arg(long, value_name = "ID")]
    account: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hydrate the account and print it as JSON
    Show,
    /// Connect a streaming service (spotify, youtube)
    Connect { service: IntegrationService },
    /// Disconnect a streaming service (spotify, youtube)
    Disconnect { service: IntegrationService },
    /// Queue a recommendation refresh
    RefreshRecommendations,
}

fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let mut config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?
        .with_env_overrides();

    if let Some(url) = &args.base_url {
        config.api_base_url = url.clone();
    }
    if let Some(account) = &args.account {
        config.account_id = account.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn print_snapshot(snapshot: &AccountSnapshot) -> Result<()> {
    let out = serde_json::json!({
        "hydration": snapshot.hydration,
        "account": snapshot.account.as_ref(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let store = AccountStore::from_config(&config).context("Failed to create account store")?;

    match args.command {
        Command::Show => {
            store.hydrate().await.context("Failed to hydrate account")?;
            print_snapshot(&store.snapshot())?;
        }
        Command::Connect { service } => {
            let integration = store
                .connect_integration(service)
                .await
                .with_context(|| format!("Could not connect {}", service.label()))?;
            println!("{}", serde_json::to_string_pretty(&integration)?);
        }
        Command::Disconnect { service } => {
            let integration = store
                .disconnect_integration(service)
                .await
                .with_context(|| format!("Could not disconnect {}", service.label()))?;
            println!("{}", serde_json::to_string_pretty(&integration)?);
        }
        Command::RefreshRecommendations => {
            let ack = store
                .refresh_recommendations()
                .await
                .context("Could not refresh recommendations")?;
            println!("{}: {}", ack.status, ack.message);
            let account = store.account();
            println!("{}", serde_json::to_string_pretty(&account.recommendations)?);
        }
    }

    Ok(())
}
