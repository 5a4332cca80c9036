//! Database models for catalog products.

use crate::types::ProductId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Database request for creating a new product
#[derive(Debug, Clone)]
pub struct ProductCreateDBRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_reference: String,
}

/// Database request for updating a product. All fields are replaced; the
/// edit form always submits the complete record.
#[derive(Debug, Clone)]
pub struct ProductUpdateDBRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_reference: String,
}

/// Database response for a product
#[derive(Debug, Clone)]
pub struct ProductDBResponse {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
