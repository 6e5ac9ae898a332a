use serde::{Deserialize, Serialize};

use super::errors::OrderError;
use super::stage::Stage;
use super::value_objects::{GiftRecipient, Money, OrderId, ShippingAddress, ShippingSpeed};

// ============================================================================
// Order Commands - Represent caller intent
// ============================================================================

/// Checkout request as received from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub owner_email: String,
    /// Total the client computed from its view of the cart.
    pub total: Money,
    pub payment_method: String,
    pub shipping_speed: ShippingSpeed,
    pub is_gift: bool,
    pub gift_first_name: Option<String>,
    pub gift_last_name: Option<String>,
    pub street: String,
    pub city: String,
    pub civic_number: String,
    pub postal_code: String,
    /// Client-generated key; resubmissions with the same key return the
    /// original order.
    pub idempotency_key: Option<String>,
}

/// A `PlaceOrder` that passed field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkout {
    pub owner_email: String,
    pub expected_total: Money,
    pub payment_method: String,
    pub shipping_speed: ShippingSpeed,
    pub gift_recipient: Option<GiftRecipient>,
    pub shipping_address: ShippingAddress,
    pub idempotency_key: Option<String>,
}

impl PlaceOrder {
    pub fn validate(&self) -> Result<Checkout, OrderError> {
        let owner_email = required("email", &self.owner_email)?;
        if !owner_email.contains('@') {
            return Err(OrderError::Validation(format!("malformed email: {owner_email}")));
        }

        if self.total.cents() < 0 {
            return Err(OrderError::Validation(format!("negative total: {}", self.total)));
        }

        let gift_recipient = if self.is_gift {
            Some(GiftRecipient {
                first_name: required("gift first name", self.gift_first_name.as_deref().unwrap_or_default())?,
                last_name: required("gift last name", self.gift_last_name.as_deref().unwrap_or_default())?,
            })
        } else {
            None
        };

        let idempotency_key = self
            .idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        Ok(Checkout {
            owner_email,
            expected_total: self.total,
            payment_method: required("payment method", &self.payment_method)?,
            shipping_speed: self.shipping_speed,
            gift_recipient,
            shipping_address: ShippingAddress {
                street: required("street", &self.street)?,
                civic_number: required("civic number", &self.civic_number)?,
                postal_code: required("postal code", &self.postal_code)?,
                city: required("city", &self.city)?,
            },
            idempotency_key,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String, OrderError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OrderError::Validation(format!("missing field: {field}")));
    }
    Ok(value.to_string())
}

/// Operator request to complete the next shipment stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdvanceStatus {
    pub order_id: OrderId,
    pub stage: Stage,
}
