//! Request and response bodies exchanged with the backend.

use core::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shopaholic_core::{Cart, Coupon, Email, PaymentMethod, Price, User};

/// Body of `POST /signup`.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub phone: String,
    pub email: Email,
    pub password: SecretString,
}

impl SignupForm {
    pub(crate) fn to_payload(&self) -> Value {
        json!({
            "name": self.name.trim(),
            "dateOfBirth": self.date_of_birth.format("%Y-%m-%d").to_string(),
            "phone": self.phone.trim(),
            "email": self.email.as_str(),
            "password": self.password.expose_secret(),
        })
    }
}

/// Payment account details entered at checkout.
///
/// Cash on delivery carries none.
#[derive(Clone)]
pub enum AccountDetails {
    Card {
        card_number: SecretString,
        expiry: String,
        cvv: SecretString,
        card_holder: String,
    },
    Upi {
        upi_id: String,
    },
}

impl AccountDetails {
    /// Payment method these details belong to.
    #[must_use]
    pub const fn method(&self) -> PaymentMethod {
        match self {
            Self::Card { .. } => PaymentMethod::Card,
            Self::Upi { .. } => PaymentMethod::Upi,
        }
    }

    fn to_payload(&self) -> Value {
        match self {
            Self::Card {
                card_number,
                expiry,
                cvv,
                card_holder,
            } => json!({
                "cardNumber": card_number.expose_secret(),
                "expiry": expiry,
                "cvv": cvv.expose_secret(),
                "cardHolder": card_holder,
            }),
            Self::Upi { upi_id } => json!({ "upiId": upi_id }),
        }
    }
}

impl fmt::Debug for AccountDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card {
                expiry,
                card_holder,
                ..
            } => f
                .debug_struct("Card")
                .field("card_number", &"[REDACTED]")
                .field("expiry", expiry)
                .field("cvv", &"[REDACTED]")
                .field("card_holder", card_holder)
                .finish(),
            Self::Upi { upi_id } => f.debug_struct("Upi").field("upi_id", upi_id).finish(),
        }
    }
}

/// One cart line as sent to the payment endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentItem {
    pub name: String,
    pub price: Price,
    pub quantity: u32,
}

/// Body of `POST /payment`.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    pub account_details: Option<AccountDetails>,
    pub coupon: Option<Coupon>,
    pub items: Vec<PaymentItem>,
}

impl PaymentRequest {
    /// Build a request paying for every line of `cart`.
    #[must_use]
    pub fn for_cart(
        cart: &Cart,
        method: PaymentMethod,
        account_details: Option<AccountDetails>,
        coupon: Option<Coupon>,
    ) -> Self {
        let items = cart
            .lines()
            .iter()
            .map(|line| PaymentItem {
                name: line.product.display_name().to_owned(),
                price: line.product.price,
                quantity: line.quantity,
            })
            .collect();
        Self {
            method,
            // Details only travel with the method they belong to.
            account_details: account_details.filter(|details| details.method() == method),
            coupon,
            items,
        }
    }

    /// Discount percentage carried by the coupon, zero without one.
    #[must_use]
    pub fn discount(&self) -> u8 {
        self.coupon.as_ref().map_or(0, |coupon| coupon.percent_off)
    }

    pub(crate) fn to_payload(&self) -> Value {
        let mut payload = json!({
            "method": self.method,
            "coupon": self.coupon.as_ref().map(|coupon| coupon.code.as_str()),
            "discount": self.discount(),
            "items": self.items,
        });
        if let (Some(details), Value::Object(map)) = (&self.account_details, &mut payload) {
            map.insert("accountDetails".to_owned(), details.to_payload());
        }
        payload
    }
}

/// Successful payment acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    #[serde(default)]
    pub success: bool,
    /// Hosted checkout session, when the backend delegates to a processor.
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PaymentReceipt {
    /// Whether the backend accepted the payment.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.success || self.session_id.is_some()
    }
}

/// Envelope of `POST /login`.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub user: User,
}

/// Envelope of the admin product endpoints.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error body returned on non-success responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message).filter(|m| !m.trim().is_empty())
    }
}

/// Total amount of a payment request before discount and tax.
#[must_use]
pub fn items_subtotal(items: &[PaymentItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.price.times(item.quantity))
        .fold(Decimal::ZERO, Decimal::saturating_add)
}
