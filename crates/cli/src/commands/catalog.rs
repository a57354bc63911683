//! Catalog browsing commands.
//!
//! # Usage
//!
//! ```bash
//! # Default filter: every brand, up to ₹10000
//! shop products
//!
//! # One category, two brands, price cap
//! shop products --category Wine --brand Merlot --brand Chardonnay --max-price 3000
//!
//! # Use the n-th price tier (0 = ₹100 .. 5 = ₹10000)
//! shop products --tier 2
//!
//! # Home-page sections
//! shop products --new-arrivals
//! shop products --best-sellers
//! ```

use clap::Args;
use shopaholic_core::catalog::{best_sellers, new_arrivals, similar_products};
use shopaholic_core::{Price, ProductId};

use super::{CommandError, Context};
use crate::output;

#[derive(Args)]
pub struct ProductsArgs {
    /// Only products in this category
    #[arg(short, long)]
    category: Option<String>,

    /// Only these brands (repeatable); all brands when omitted
    #[arg(short, long = "brand")]
    brands: Vec<String>,

    /// Highest price shown
    #[arg(long, conflicts_with_all = ["tier", "any_price"])]
    max_price: Option<Price>,

    /// Cap prices at a tier of the price slider
    #[arg(long, conflicts_with = "any_price")]
    tier: Option<usize>,

    /// Show every price
    #[arg(long)]
    any_price: bool,

    /// Show new arrivals instead of the filtered list
    #[arg(long, conflicts_with = "best_sellers")]
    new_arrivals: bool,

    /// Show best sellers instead of the filtered list
    #[arg(long)]
    best_sellers: bool,
}

/// List products.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn products(ctx: &mut Context, args: &ProductsArgs) -> Result<(), CommandError> {
    ctx.load_catalog(args.category.as_deref()).await?;
    let session = &mut ctx.session;

    if args.new_arrivals {
        output::products(new_arrivals(session.products()));
        return Ok(());
    }
    if args.best_sellers {
        output::products(best_sellers(session.products()));
        return Ok(());
    }

    if args.any_price {
        session.set_filter(args.brands.iter().cloned(), None);
    } else if let Some(max_price) = args.max_price {
        session.set_filter(args.brands.iter().cloned(), Some(max_price));
    } else {
        session.clear_filter();
        for brand in &args.brands {
            session.toggle_brand(brand);
        }
        if let Some(tier) = args.tier {
            session.set_price_tier(tier);
        }
    }

    tracing::debug!(filter = ?session.filter(), "Applying filter");
    output::products(session.visible_products());
    Ok(())
}

/// Show one product followed by others in its category.
///
/// # Errors
///
/// Returns an error if the product does not exist or the backend cannot be
/// reached.
pub async fn product(ctx: &Context, id: &str) -> Result<(), CommandError> {
    let product = ctx.api.get_product(&ProductId::new(id)).await?;
    output::product(&product);

    match ctx.api.list_products(Some(&product.category)).await {
        Ok(related) => {
            let similar = similar_products(&related, &product);
            if !similar.is_empty() {
                output::message("\nSimilar products:");
                output::products(similar);
            }
        }
        Err(e) => tracing::warn!(error = %e, "Could not load similar products"),
    }
    Ok(())
}

/// List categories and brands present in the catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded.
pub async fn categories(ctx: &mut Context) -> Result<(), CommandError> {
    ctx.load_catalog(None).await?;
    output::categories(ctx.session.catalog_index());
    Ok(())
}
