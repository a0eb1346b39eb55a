use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, ClientId, ProductId};

pub type SaleId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Paid at the counter; never enters the credit ledger.
    Cash,
    /// Payment deferred; contributes to the client's debt.
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Credit => "CREDIT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CASH" => Some(PaymentMethod::Cash),
            "CREDIT" => Some(PaymentMethod::Credit),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of a sale. Name and unit price are snapshots taken at checkout
/// so later product edits don't alter recorded invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: Cents,
}

impl SaleItem {
    pub fn subtotal_cents(&self) -> Cents {
        self.quantity * self.unit_price_cents
    }
}

/// A completed sale. Sales are immutable facts: corrections happen through
/// payments, not edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    /// Human-facing invoice number, assigned by the repository on insert.
    pub invoice_no: i64,
    pub client_id: ClientId,
    pub timestamp: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub method: PaymentMethod,
    pub total_cents: Cents,
    pub paid: bool,
    pub note: Option<String>,
    pub items: Vec<SaleItem>,
}

impl Sale {
    /// Build a sale from checkout lines. The total is computed from the
    /// lines, never accepted from the caller. Cash sales are paid on the
    /// spot; credit sales start unpaid.
    pub fn new(
        client_id: ClientId,
        method: PaymentMethod,
        items: Vec<SaleItem>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let total_cents = items.iter().map(SaleItem::subtotal_cents).sum();
        Self {
            id: Uuid::new_v4(),
            invoice_no: 0, // assigned by the repository
            client_id,
            timestamp,
            recorded_at: Utc::now(),
            method,
            total_cents,
            paid: method == PaymentMethod::Cash,
            note: None,
            items,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Display reference used on statements, e.g. "Invoice #42".
    pub fn reference(&self) -> String {
        format!("Invoice #{}", self.invoice_no)
    }

    pub fn is_credit(&self) -> bool {
        self.method == PaymentMethod::Credit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, qty: i64, price: Cents) -> SaleItem {
        SaleItem {
            product_id: Uuid::new_v4(),
            product_name: name.into(),
            quantity: qty,
            unit_price_cents: price,
        }
    }

    #[test]
    fn test_payment_method_roundtrip() {
        for method in [PaymentMethod::Cash, PaymentMethod::Credit] {
            assert_eq!(PaymentMethod::from_str(method.as_str()), Some(method));
        }
        assert_eq!(PaymentMethod::from_str("credit"), Some(PaymentMethod::Credit));
        assert_eq!(PaymentMethod::from_str("wire"), None);
    }

    #[test]
    fn test_total_computed_from_items() {
        let sale = Sale::new(
            Uuid::new_v4(),
            PaymentMethod::Credit,
            vec![line("Rice", 2, 3500), line("Milk", 3, 1200)],
            Utc::now(),
        );
        assert_eq!(sale.total_cents, 2 * 3500 + 3 * 1200);
    }

    #[test]
    fn test_cash_paid_credit_unpaid() {
        let items = vec![line("Bread", 1, 800)];
        let cash = Sale::new(Uuid::new_v4(), PaymentMethod::Cash, items.clone(), Utc::now());
        let credit = Sale::new(Uuid::new_v4(), PaymentMethod::Credit, items, Utc::now());

        assert!(cash.paid);
        assert!(!credit.paid);
        assert!(credit.is_credit());
    }
}
