//! Shopaholic CLI - browse the catalog, manage the cart and check out.
//!
//! # Usage
//!
//! ```bash
//! # Browse drinks under ₹1000 from two brands
//! shop products --category "Cool Drinks" --brand Pepsi --brand Sprite --max-price 1000
//!
//! # Manage the cart
//! shop cart add 65f1c0ffee
//! shop cart show
//!
//! # Sign in and pay
//! shop login -e asha@example.com
//! shop checkout --method upi --upi-id asha@okbank --coupon SAVE10
//!
//! # Maintain admin options
//! shop admin categories add Snacks
//! shop admin brands add Snacks Lays
//! ```
//!
//! State (identity, carts, admin options) is kept under
//! `SHOPAHOLIC_STORAGE_DIR`, so it carries over between invocations.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod output;

use commands::Context;

#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about = "Shopaholic storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products, optionally filtered
    Products(commands::catalog::ProductsArgs),
    /// Show one product and similar products
    Product {
        /// Product id
        id: String,
    },
    /// List categories and their brands
    Categories,
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Log in
    Login(commands::account::LoginArgs),
    /// Log out
    Logout,
    /// Create an account
    Signup(commands::account::SignupArgs),
    /// Show the logged-in profile
    Profile,
    /// Pay for the cart
    Checkout(commands::checkout::CheckoutArgs),
    /// Admin catalog maintenance
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file if present so RUST_LOG applies to logging too
    dotenvy::dotenv().ok();

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopaholic_storefront=info,shopaholic_cli=info".into());

    // Logs go to stderr; stdout carries command output
    let json = std::env::var("SHOPAHOLIC_LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::from_env()?;

    match cli.command {
        Commands::Products(args) => commands::catalog::products(&mut ctx, &args).await?,
        Commands::Product { id } => commands::catalog::product(&ctx, &id).await?,
        Commands::Categories => commands::catalog::categories(&mut ctx).await?,
        Commands::Cart { action } => commands::cart::run(&mut ctx, action).await?,
        Commands::Login(args) => commands::account::login(&mut ctx, args).await?,
        Commands::Logout => commands::account::logout(&mut ctx)?,
        Commands::Signup(args) => commands::account::signup(&ctx, args).await?,
        Commands::Profile => commands::account::profile(&ctx),
        Commands::Checkout(args) => commands::checkout::run(&mut ctx, args).await?,
        Commands::Admin { action } => commands::admin::run(&ctx, action).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_card_checkout_requires_card_fields() {
        assert!(Cli::try_parse_from(["shop", "checkout", "--method", "card"]).is_err());
        assert!(Cli::try_parse_from(["shop", "checkout", "--method", "cod"]).is_ok());
        assert!(
            Cli::try_parse_from(["shop", "checkout", "-m", "upi", "--upi-id", "asha@okbank"])
                .is_ok()
        );
    }
}
