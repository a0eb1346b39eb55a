use super::{Cents, Product, ProductId, SaleItem};

/// One line of an in-progress checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price_cents: Cents,
    pub quantity: i64,
}

impl CartLine {
    pub fn subtotal_cents(&self) -> Cents {
        self.quantity * self.unit_price_cents
    }
}

/// A cart is a plain value assembled by the caller and handed to checkout.
/// There is no shared or session-scoped cart state anywhere in the process.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product to the cart. Adding the same product again merges into
    /// the existing line.
    pub fn add(&mut self, product: &Product, quantity: i64) {
        assert!(quantity > 0, "Cart quantity must be positive");
        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price_cents: product.price_cents,
                quantity,
            }),
        }
    }

    /// Set a line's quantity. Zero or negative removes the line.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
        } else if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        }
    }

    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn total_cents(&self) -> Cents {
        self.lines.iter().map(CartLine::subtotal_cents).sum()
    }

    /// Convert the cart into sale items, snapshotting names and prices.
    pub fn into_sale_items(self) -> Vec<SaleItem> {
        self.lines
            .into_iter()
            .map(|line| SaleItem {
                product_id: line.product_id,
                product_name: line.product_name,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, price: Cents) -> Product {
        Product::new(name.into(), price)
    }

    #[test]
    fn test_add_merges_same_product() {
        let rice = product("Rice", 3500);
        let mut cart = Cart::new();
        cart.add(&rice, 1);
        cart.add(&rice, 2);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.total_cents(), 3 * 3500);
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let rice = product("Rice", 3500);
        let milk = product("Milk", 1200);
        let mut cart = Cart::new();
        cart.add(&rice, 2);
        cart.add(&milk, 1);

        cart.set_quantity(rice.id, 5);
        assert_eq!(cart.total_cents(), 5 * 3500 + 1200);

        cart.set_quantity(milk.id, 0);
        assert_eq!(cart.lines().len(), 1);

        cart.remove(rice.id);
        assert!(cart.is_empty());
        assert_eq!(cart.total_cents(), 0);
    }

    #[test]
    fn test_into_sale_items_snapshots_price() {
        let mut rice = product("Rice", 3500);
        let mut cart = Cart::new();
        cart.add(&rice, 2);

        // A later price change must not affect the captured line.
        rice.price_cents = 9999;

        let items = cart.into_sale_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price_cents, 3500);
        assert_eq!(items[0].subtotal_cents(), 7000);
    }
}
