//! Admin commands: category/brand options and product maintenance.
//!
//! # Usage
//!
//! ```bash
//! shop admin categories list
//! shop admin categories add Snacks
//! shop admin brands add Snacks Lays
//! shop admin product create --category Snacks --brand Lays --price 20 --image https://...
//! shop admin product update 65f1c0ffee --category Snacks --brand Lays --price 25
//! shop admin product delete 65f1c0ffee
//! ```

use clap::{Args, Subcommand};
use shopaholic_core::{Price, ProductDraft, ProductId};
use shopaholic_storefront::admin::AdminCatalogOptions;

use super::{CommandError, Context};
use crate::output;

#[derive(Subcommand)]
pub enum AdminAction {
    /// Manage the category list
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Manage brands per category
    Brands {
        #[command(subcommand)]
        action: BrandAction,
    },
    /// Create, update or delete products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories
    List,
    /// Add a category
    Add { name: String },
    /// Delete a category and its brands
    Delete { name: String },
}

#[derive(Subcommand)]
pub enum BrandAction {
    /// List brands of a category
    List { category: String },
    /// Add a brand to a category
    Add { category: String, brand: String },
    /// Remove a brand from a category
    Delete { category: String, brand: String },
}

#[derive(Subcommand)]
pub enum ProductAction {
    /// Create a product
    Create(ProductFields),
    /// Replace a product's fields
    Update {
        /// Product id
        id: String,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product
    Delete {
        /// Product id
        id: String,
    },
}

#[derive(Args)]
pub struct ProductFields {
    /// Category (must be one of the admin categories)
    #[arg(long)]
    category: String,

    /// Brand (must be listed for the category)
    #[arg(long)]
    brand: String,

    /// Unit price
    #[arg(long)]
    price: Price,

    /// Description
    #[arg(long)]
    description: Option<String>,

    /// Image URL (repeatable)
    #[arg(long = "image")]
    images: Vec<String>,

    /// Flag as a new arrival
    #[arg(long)]
    new_arrival: bool,

    /// Flag as a best seller
    #[arg(long)]
    best_seller: bool,
}

impl ProductFields {
    /// Check the category and brand against the admin options and build a
    /// draft.
    fn into_draft(self, options: &AdminCatalogOptions) -> Result<ProductDraft, CommandError> {
        if !options.categories().contains(&self.category) {
            return Err(CommandError::Invalid(format!(
                "Unknown category: {}",
                self.category
            )));
        }
        if !options.brands_for(&self.category).contains(&self.brand) {
            return Err(CommandError::Invalid(format!(
                "Brand {} is not listed under {}",
                self.brand, self.category
            )));
        }
        Ok(ProductDraft {
            category: self.category,
            brand: self.brand,
            price: self.price,
            description: self.description,
            images: self.images,
            new_arrival: self.new_arrival,
            best_seller: self.best_seller,
        })
    }
}

/// Run an admin action.
///
/// # Errors
///
/// Returns an error if options cannot be saved, arguments are rejected, or
/// the backend refuses a product change.
pub async fn run(ctx: &Context, action: AdminAction) -> Result<(), CommandError> {
    let mut options = AdminCatalogOptions::load(&ctx.storage);
    let tab = ctx.session.tab_id();

    match action {
        AdminAction::Categories { action } => {
            let changed = match action {
                CategoryAction::List => {
                    output::list("Categories", options.categories());
                    return Ok(());
                }
                CategoryAction::Add { name } => {
                    report_change(options.add_category(&name), "Category is blank or exists")
                }
                CategoryAction::Delete { name } => {
                    report_change(options.delete_category(&name), "No such category")
                }
            };
            if changed {
                options.save(&ctx.storage, tab)?;
                output::list("Categories", options.categories());
            }
        }
        AdminAction::Brands { action } => {
            let (category, changed) = match action {
                BrandAction::List { category } => {
                    output::list(&category, options.brands_for(&category));
                    return Ok(());
                }
                BrandAction::Add { category, brand } => {
                    let changed = report_change(
                        options.add_brand(&category, &brand),
                        "Unknown category, or brand is blank or exists",
                    );
                    (category, changed)
                }
                BrandAction::Delete { category, brand } => {
                    let changed =
                        report_change(options.delete_brand(&category, &brand), "No such brand");
                    (category, changed)
                }
            };
            if changed {
                options.save(&ctx.storage, tab)?;
                output::list(&category, options.brands_for(&category));
            }
        }
        AdminAction::Product { action } => match action {
            ProductAction::Create(fields) => {
                let product = ctx.api.create_product(fields.into_draft(&options)?).await?;
                output::message("Product created:");
                output::product(&product);
            }
            ProductAction::Update { id, fields } => {
                let product = ctx
                    .api
                    .update_product(&ProductId::new(id), fields.into_draft(&options)?)
                    .await?;
                output::message("Product updated:");
                output::product(&product);
            }
            ProductAction::Delete { id } => {
                let id = ProductId::new(id);
                ctx.api.delete_product(&id).await?;
                output::message(&format!("Deleted {id}"));
            }
        },
    }
    Ok(())
}

fn report_change(changed: bool, reason: &str) -> bool {
    if !changed {
        output::message(&format!("Nothing changed: {reason}"));
    }
    changed
}
