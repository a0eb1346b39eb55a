use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type ProductId = Uuid;

/// An item in the shop's inventory. Price is the current shelf price;
/// sales snapshot the price at the moment of sale, so editing a product
/// never rewrites history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub barcode: Option<String>,
    pub price_cents: Cents,
    pub stock: i64,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: String, price_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            barcode: None,
            price_cents,
            stock: 0,
            category: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_defaults() {
        let product = Product::new("Rice 1kg".into(), 3500);
        assert_eq!(product.price_cents, 3500);
        assert_eq!(product.stock, 0);
        assert!(product.barcode.is_none());
        assert!(product.category.is_none());
    }

    #[test]
    fn test_builder_fields() {
        let product = Product::new("Milk".into(), 1200)
            .with_barcode("7501001")
            .with_stock(24)
            .with_category("dairy");

        assert_eq!(product.barcode.as_deref(), Some("7501001"));
        assert_eq!(product.stock, 24);
        assert_eq!(product.category.as_deref(), Some("dairy"));
    }
}
