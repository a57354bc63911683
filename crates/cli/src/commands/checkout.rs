//! Checkout command.
//!
//! # Usage
//!
//! ```bash
//! shop checkout --method cod
//! shop checkout --method upi --upi-id asha@okbank --coupon SAVE10
//! shop checkout --method card --card-number 4111111111111111 --expiry 12/30 \
//!     --cvv 123 --card-holder "Asha Rao"
//! ```

use clap::Args;
use secrecy::SecretString;
use shopaholic_core::{Coupon, PaymentMethod};
use shopaholic_storefront::api::AccountDetails;

use super::{CommandError, Context};
use crate::output;

#[derive(Args)]
pub struct CheckoutArgs {
    /// Payment method: card, upi or cod
    #[arg(short, long, default_value = "card")]
    method: PaymentMethod,

    /// Coupon code
    #[arg(long)]
    coupon: Option<String>,

    /// Card number
    #[arg(long, required_if_eq("method", "card"))]
    card_number: Option<String>,

    /// Card expiry (MM/YY)
    #[arg(long, required_if_eq("method", "card"))]
    expiry: Option<String>,

    /// Card security code
    #[arg(long, required_if_eq("method", "card"))]
    cvv: Option<String>,

    /// Name on the card
    #[arg(long, required_if_eq("method", "card"))]
    card_holder: Option<String>,

    /// UPI id
    #[arg(long, required_if_eq("method", "upi"))]
    upi_id: Option<String>,
}

impl CheckoutArgs {
    fn account_details(self) -> Option<AccountDetails> {
        match self.method {
            PaymentMethod::Card => Some(AccountDetails::Card {
                card_number: SecretString::from(self.card_number?),
                expiry: self.expiry?,
                cvv: SecretString::from(self.cvv?),
                card_holder: self.card_holder?,
            }),
            PaymentMethod::Upi => Some(AccountDetails::Upi {
                upi_id: self.upi_id?,
            }),
            PaymentMethod::Cod => None,
        }
    }
}

/// Pay for the cart.
///
/// # Errors
///
/// Returns an error if the cart is empty, the coupon is unknown, or the
/// payment is declined. The cart is kept on failure.
pub async fn run(ctx: &mut Context, args: CheckoutArgs) -> Result<(), CommandError> {
    let coupon = match args.coupon.as_deref() {
        Some(code) => Some(
            Coupon::apply(code)
                .ok_or_else(|| CommandError::Invalid(format!("Invalid coupon code: {code}")))?,
        ),
        None => None,
    };
    if let Some(coupon) = &coupon {
        output::message(&format!(
            "Coupon applied: {}% discount!",
            coupon.percent_off
        ));
    }

    let method = args.method;
    output::cart(ctx.session.cart(), &ctx.session.quote(coupon.as_ref()));

    let receipt = ctx
        .session
        .checkout(&ctx.api, method, args.account_details(), coupon)
        .await?;

    let upper = method.as_str().to_uppercase();
    match receipt.session_id {
        Some(id) => output::message(&format!(
            "Payment session {id} created using {upper}."
        )),
        None => output::message(&format!("Payment processed successfully using {upper}!")),
    }
    Ok(())
}
