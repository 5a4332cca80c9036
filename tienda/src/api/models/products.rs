//! API-facing models for catalog products.

use crate::db::models::products::{ProductCreateDBRequest, ProductDBResponse, ProductUpdateDBRequest};
use crate::errors::Error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product create/edit form payload. Both forms submit the full record.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image_reference: String,
}

impl ProductForm {
    /// Required-field presence plus a parseable price.
    pub fn validate(&self) -> Result<Decimal, Error> {
        for (field, value) in [
            ("name", &self.name),
            ("description", &self.description),
            ("price", &self.price),
            ("image_reference", &self.image_reference),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation { field: field.to_string() });
            }
        }

        self.price.trim().parse::<Decimal>().map_err(|_| Error::Validation {
            field: "price".to_string(),
        })
    }

    pub fn into_create_request(self) -> Result<ProductCreateDBRequest, Error> {
        let price = self.validate()?;
        Ok(ProductCreateDBRequest {
            name: self.name,
            description: self.description,
            price,
            image_reference: self.image_reference,
        })
    }

    pub fn into_update_request(self) -> Result<ProductUpdateDBRequest, Error> {
        let price = self.validate()?;
        Ok(ProductUpdateDBRequest {
            name: self.name,
            description: self.description,
            price,
            image_reference: self.image_reference,
        })
    }
}

/// Row data handed to the product templates.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_reference: String,
}

impl From<ProductDBResponse> for ProductRow {
    fn from(db: ProductDBResponse) -> Self {
        Self {
            id: db.id.to_string(),
            name: db.name,
            description: db.description,
            price: db.price.to_string(),
            image_reference: db.image_reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, price: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            description: "desc".to_string(),
            price: price.to_string(),
            image_reference: "img.png".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        assert_eq!(form("Mouse", "19.99").validate().unwrap(), "19.99".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let err = form("", "19.99").validate().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field } if field == "name"));

        let err = form("Mouse", "  ").validate().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field } if field == "price"));
    }

    #[test]
    fn test_validate_rejects_unparseable_price() {
        let err = form("Mouse", "cheap").validate().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field } if field == "price"));
    }
}
