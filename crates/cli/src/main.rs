//! BiteBox CLI - Build a cart, price it, and check it out from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add two margherita pizzas at 9.50 each
//! bitebox add pizza-margherita "Margherita" 9.50 -q 2
//!
//! # Change a quantity (0 removes the line)
//! bitebox set pizza-margherita 3
//!
//! # Show lines and totals
//! bitebox show
//!
//! # Price a YAML item list without touching the saved cart
//! bitebox quote order.yaml
//!
//! # Submit the cart to the dry-run order backend
//! bitebox checkout
//! ```
//!
//! # Commands
//!
//! - `add` / `remove` / `set` / `clear` - Edit the saved cart
//! - `show` - Print the cart and its totals
//! - `quote` - Price an item list from a file
//! - `checkout` - Submit the cart and clear it on success

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "bitebox")]
#[command(author, version, about = "BiteBox cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an item to the cart, merging with an existing line
    Add {
        /// Product identifier
        product_id: String,

        /// Display name
        name: String,

        /// Unit price, e.g. 9.50
        price: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line from the cart
    Remove {
        /// Product identifier
        product_id: String,
    },
    /// Set the quantity of a line (0 removes it)
    Set {
        /// Product identifier
        product_id: String,

        /// New quantity
        quantity: u32,
    },
    /// Empty the cart
    Clear,
    /// Show cart contents and totals
    Show,
    /// Price a YAML list of items without changing the saved cart
    Quote {
        /// Path to the YAML item list
        file: PathBuf,
    },
    /// Submit the cart as an order
    Checkout {
        /// Simulate a declined payment
        #[arg(long)]
        decline: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CliConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bitebox=info,bitebox_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if sentry_guard.is_some() {
        tracing::debug!("Sentry initialized");
    }

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        // process::exit skips destructors; flush Sentry first
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Add {
            product_id,
            name,
            price,
            quantity,
        } => commands::cart::add(config, product_id, name, &price, quantity).await?,
        Commands::Remove { product_id } => commands::cart::remove(config, &product_id).await?,
        Commands::Set {
            product_id,
            quantity,
        } => commands::cart::set(config, &product_id, quantity).await?,
        Commands::Clear => commands::cart::clear(config).await?,
        Commands::Show => commands::cart::show(config).await?,
        Commands::Quote { file } => commands::quote::run(config, &file).await?,
        Commands::Checkout { decline } => commands::checkout::run(config, decline).await?,
    }
    Ok(())
}
