use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::units::SaleUnit;

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub role: String,
}

/// Canonical product shape. Rows with legacy scalar `images` values are
/// normalized into a list at the data-access boundary before they get here.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub stock: i32,
    pub images: Vec<String>,
    pub fabric_type: String,
    pub fabric_subtype: Option<String>,
    pub unit: SaleUnit,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Online,
    Onplace,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::Onplace => "onplace",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(PaymentMethod::Online),
            "onplace" => Ok(PaymentMethod::Onplace),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Forward-only order lifecycle, advanced one step at a time by an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Validated,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Validated => "validated",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// The only status this one may move to, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Validated),
            OrderStatus::Validated => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "validated" => Ok(OrderStatus::Validated),
            "delivered" => Ok(OrderStatus::Delivered),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub customer_name: String,
    pub delivery_address: String,
    pub phone_number: String,
    pub payment_method: PaymentMethod,
    #[schema(value_type = f64)]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalized order line: a snapshot of name, price and unit at submission
/// time, so later catalog edits never rewrite order history.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[schema(value_type = f64)]
    pub quantity: Decimal,
    pub unit: SaleUnit,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_moves_strictly_forward() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Validated));
        assert!(OrderStatus::Validated.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Validated.can_transition_to(OrderStatus::Pending));
        assert_eq!(OrderStatus::Delivered.next(), None);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Validated,
            OrderStatus::Delivered,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn payment_method_parses_both_variants() {
        assert_eq!("online".parse::<PaymentMethod>().unwrap(), PaymentMethod::Online);
        assert_eq!("onplace".parse::<PaymentMethod>().unwrap(), PaymentMethod::Onplace);
        assert!("card".parse::<PaymentMethod>().is_err());
    }
}
