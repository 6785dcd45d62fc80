use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;
use crate::units::SaleUnit;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
    pub fabric_type: String,
    pub fabric_subtype: Option<String>,
    /// Defaults to the fabric type's default unit when omitted.
    pub unit: Option<SaleUnit>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub images: Option<Vec<String>>,
    pub fabric_subtype: Option<String>,
    pub unit: Option<SaleUnit>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
