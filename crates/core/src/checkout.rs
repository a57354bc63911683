//! Checkout arithmetic: totals, GST, coupons and payment methods.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::format_amount;

/// GST applied to the cart subtotal (18%).
pub const TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// Subtotal, tax and grand total for a cart.
///
/// Always derived from the cart and never stored. Values keep full
/// precision; use the `Display` impl or [`format_amount`] to round for
/// presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// Compute totals for `cart`.
    ///
    /// Amounts beyond the range of [`Decimal`] saturate at `Decimal::MAX`.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        let subtotal = cart
            .lines()
            .iter()
            .map(|line| line.product.price.times(line.quantity))
            .fold(Decimal::ZERO, Decimal::saturating_add);
        Self::from_subtotal(subtotal)
    }

    fn from_subtotal(subtotal: Decimal) -> Self {
        let tax = subtotal.saturating_mul(TAX_RATE);
        Self {
            subtotal,
            tax,
            total: subtotal.saturating_add(tax),
        }
    }

    /// Totals after taking `percent_off` off the subtotal; tax is charged
    /// on the discounted amount. Percentages above 100 are treated as 100.
    #[must_use]
    pub fn with_discount(&self, percent_off: u8) -> Self {
        let percent = Decimal::from(percent_off.min(100));
        let discount = self.subtotal.saturating_mul(percent / Decimal::ONE_HUNDRED);
        let discounted = self.subtotal.saturating_sub(discount);
        Self::from_subtotal(discounted)
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Subtotal: {}", format_amount(self.subtotal))?;
        writeln!(f, "GST (18%): {}", format_amount(self.tax))?;
        write!(f, "Total: {}", format_amount(self.total))
    }
}

/// A coupon that has been validated against the known codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Normalized (trimmed, upper-case) code.
    pub code: String,
    pub percent_off: u8,
}

const COUPONS: &[(&str, u8)] = &[("SAVE10", 10)];

impl Coupon {
    /// Look up a coupon code, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for unknown codes.
    #[must_use]
    pub fn apply(code: &str) -> Option<Self> {
        let normalized = code.trim().to_uppercase();
        COUPONS
            .iter()
            .find(|(known, _)| *known == normalized)
            .map(|&(_, percent_off)| Self {
                code: normalized,
                percent_off,
            })
    }
}

/// How the shopper intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Credit or debit card.
    #[default]
    Card,
    /// Unified Payments Interface.
    Upi,
    /// Cash on delivery.
    Cod,
}

impl PaymentMethod {
    /// Wire name, as sent to the payment endpoint.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Upi => "upi",
            Self::Cod => "cod",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "cod" => Ok(Self::Cod),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}
