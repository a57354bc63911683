//! Cart commands.
//!
//! The cart belongs to whoever is logged in, or to the guest otherwise.

use clap::Subcommand;
use shopaholic_core::ProductId;

use super::{CommandError, Context};
use crate::output;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add one unit of a product
    Add {
        /// Product id
        id: String,
    },
    /// Add one unit to a line already in the cart
    Inc {
        /// Product id
        id: String,
    },
    /// Remove one unit; the line goes away at zero
    Dec {
        /// Product id
        id: String,
    },
    /// Remove a line entirely
    Remove {
        /// Product id
        id: String,
    },
}

/// Run a cart action, then show the cart.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched or the cart cannot be
/// saved.
pub async fn run(ctx: &mut Context, action: CartAction) -> Result<(), CommandError> {
    let session = &mut ctx.session;
    match action {
        CartAction::Show => {}
        CartAction::Add { id } => {
            let product = ctx.api.get_product(&ProductId::new(id)).await?;
            let quantity = session.add_or_increment(&product)?;
            output::message(&format!("{} x {quantity}", product.display_name()));
        }
        CartAction::Inc { id } => {
            let id = ProductId::new(id);
            if session.increment(&id)?.is_none() {
                output::message(&format!("{id} is not in the cart"));
            }
        }
        CartAction::Dec { id } => {
            let id = ProductId::new(id);
            match session.decrement(&id)? {
                None => output::message(&format!("{id} is not in the cart")),
                Some(0) => output::message(&format!("Removed {id}")),
                Some(_) => {}
            }
        }
        CartAction::Remove { id } => {
            let id = ProductId::new(id);
            if !session.remove(&id)? {
                output::message(&format!("{id} is not in the cart"));
            }
        }
    }

    output::cart(session.cart(), &session.totals());
    Ok(())
}
