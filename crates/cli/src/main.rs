//! Bazaar CLI - price lookups, delivery quotes and checkout dry runs.
//!
//! # Usage
//!
//! ```bash
//! # Price a product from a local catalog fixture
//! bz-cli price --catalog products.json --product p-1 --weight 250
//!
//! # Price a product fetched from the API
//! bz-cli price --remote --product p-1
//!
//! # Delivery charge from a rules fixture, or from the API when --rules is omitted
//! bz-cli delivery --amount 450 --rules delivery-rules.yaml
//!
//! # Full checkout against the API: cart lines are ID[:WEIGHT][xQTY]
//! bz-cli quote --catalog products.json --item p-1:250x2 --item p-2 --promo WELCOME10
//! ```
//!
//! Commands that talk to the API read `BAZAAR_API_BASE_URL` and friends from
//! the environment (or `.env`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

use commands::quote::ItemArg;

#[derive(Parser)]
#[command(name = "bz-cli")]
#[command(author, version, about = "Bazaar storefront pricing tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the price of a product or weight option
    Price {
        /// Catalog fixture (JSON or YAML list of products)
        #[arg(short, long, required_unless_present = "remote")]
        catalog: Option<PathBuf>,

        /// Fetch the product from the API instead of a fixture
        #[arg(long, conflicts_with = "catalog")]
        remote: bool,

        /// Product ID
        #[arg(short, long)]
        product: String,

        /// Weight option in grams
        #[arg(short, long)]
        weight: Option<u32>,
    },
    /// Calculate the delivery charge for an order amount
    Delivery {
        /// Order amount after discounts
        #[arg(short, long)]
        amount: Decimal,

        /// Rules fixture (JSON or YAML list); asks the API when omitted
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },
    /// Build a cart and run checkout against the API
    Quote {
        /// Catalog fixture; products are fetched from the API when omitted
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Cart line as ID[:WEIGHT][xQTY], repeatable
        #[arg(short, long = "item", required = true)]
        items: Vec<ItemArg>,

        /// Promo code to apply
        #[arg(long)]
        promo: Option<String>,

        /// Signed-in customer ID
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bz_cli=info,bazaar_storefront=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Price {
            catalog,
            remote: _,
            product,
            weight,
        } => match catalog {
            Some(path) => commands::price::from_fixture(&path, &product, weight).await?,
            None => commands::price::from_api(&product, weight).await?,
        },
        Commands::Delivery { amount, rules } => match rules {
            Some(path) => commands::delivery::from_fixture(&path, amount).await?,
            None => commands::delivery::from_api(amount).await?,
        },
        Commands::Quote {
            catalog,
            items,
            promo,
            user,
        } => {
            commands::quote::run(catalog.as_deref(), &items, promo.as_deref(), user).await?;
        }
    }
    Ok(())
}
