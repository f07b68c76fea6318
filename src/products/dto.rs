use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::repo::{NewProduct, Product};
use crate::error::FieldError;

pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
/// Fractional digits stored by the `NUMERIC(10,2)` price column.
pub const PRICE_SCALE: u32 = 2;
/// Largest value the price column holds: 99999999.99.
pub const PRICE_MAX: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Body of `POST /products` and `PUT /products/{id}`.
///
/// Missing `name`/`price` deserialize to empty/zero so they are reported by
/// [`ProductRequest::validate`] rather than by the JSON extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
}

impl ProductRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Product name is required"));
        } else if self.name.chars().count() > NAME_MAX_CHARS {
            errors.push(FieldError::new(
                "name",
                "Product name cannot exceed 100 characters",
            ));
        }

        if self.price <= Decimal::ZERO {
            errors.push(FieldError::new(
                "price",
                "Product price must be greater than 0",
            ));
        } else if self.price.normalize().scale() > PRICE_SCALE {
            errors.push(FieldError::new(
                "price",
                "Product price cannot have more than 2 decimal places",
            ));
        } else if self.price > PRICE_MAX {
            errors.push(FieldError::new(
                "price",
                "Product price cannot exceed 99999999.99",
            ));
        }

        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_CHARS {
                errors.push(FieldError::new(
                    "description",
                    "Product description cannot exceed 1000 characters",
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Trimmed values as they get persisted.
    pub fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name.trim().to_string(),
            price: self.price,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
        }
    }
}

pub fn validate_id(id: i32) -> Result<(), Vec<FieldError>> {
    if id < 1 {
        return Err(vec![FieldError::new(
            "id",
            "Product ID must be a positive integer",
        )]);
    }
    Ok(())
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            price: p.price,
            description: p.description,
        }
    }
}

impl From<ProductResponse> for ProductRequest {
    fn from(p: ProductResponse) -> Self {
        Self {
            name: p.name,
            price: p.price,
            description: Some(p.description),
        }
    }
}
