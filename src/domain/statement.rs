use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, Payment, Sale, SaleItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    /// A credit sale: debits the client's account.
    Sale,
    /// A collected payment: credits the client's account.
    Payment,
}

/// One row of a client's account statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementEntry {
    pub kind: EntryKind,
    pub timestamp: DateTime<Utc>,
    pub amount_cents: Cents,
    pub reference: String,
    pub debit_cents: Cents,
    pub credit_cents: Cents,
    /// Account balance after this entry.
    pub balance_cents: Cents,
    /// Line items, present on sale entries only.
    pub items: Vec<SaleItem>,
}

/// A client's account statement: the chronological ledger timeline plus
/// aggregate totals.
///
/// The totals are supplied by independent aggregate queries, not derived
/// from the timeline walk, so they stay correct for clients with no ledger
/// events at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub entries: Vec<StatementEntry>,
    pub total_credit_cents: Cents,
    pub total_paid_cents: Cents,
    pub current_debt_cents: Cents,
}

/// Merge a client's credit sales and payments into a chronological
/// running-balance timeline.
///
/// Ordering: stable sort on timestamp. Sales are enqueued before payments,
/// so on an exact timestamp tie the sale (debit) comes first and repeated
/// runs over the same data produce identical output.
///
/// Cash sales never reach the ledger; any non-credit sale in the input is
/// skipped.
pub fn build_timeline(
    sales: &[Sale],
    payments: &[Payment],
    total_credit_cents: Cents,
    total_paid_cents: Cents,
) -> Statement {
    let mut entries: Vec<StatementEntry> = Vec::with_capacity(sales.len() + payments.len());

    for sale in sales.iter().filter(|s| s.is_credit()) {
        entries.push(StatementEntry {
            kind: EntryKind::Sale,
            timestamp: sale.timestamp,
            amount_cents: sale.total_cents,
            reference: sale.reference(),
            debit_cents: sale.total_cents,
            credit_cents: 0,
            balance_cents: 0,
            items: sale.items.clone(),
        });
    }

    for payment in payments {
        entries.push(StatementEntry {
            kind: EntryKind::Payment,
            timestamp: payment.timestamp,
            amount_cents: payment.amount_cents,
            reference: payment.reference(),
            debit_cents: 0,
            credit_cents: payment.amount_cents,
            balance_cents: 0,
            items: Vec::new(),
        });
    }

    entries.sort_by_key(|e| e.timestamp);

    let mut balance: Cents = 0;
    for entry in &mut entries {
        balance += entry.debit_cents - entry.credit_cents;
        entry.balance_cents = balance;
    }

    Statement {
        entries,
        total_credit_cents,
        total_paid_cents,
        current_debt_cents: total_credit_cents - total_paid_cents,
    }
}

/// Restrict a statement to the client's active billing cycle: the entries
/// since the most recent point at which their balance was exactly zero.
///
/// A fully settled client (debt <= 0) gets an empty timeline regardless of
/// history; "nothing owed" is shown as no transactions. A client whose
/// balance never touched zero keeps the full timeline.
pub fn restrict_to_active_cycle(mut statement: Statement) -> Statement {
    if statement.current_debt_cents <= 0 {
        statement.entries.clear();
        return statement;
    }

    // Last settlement point wins, so scan the whole timeline.
    let mut cutoff: Option<usize> = None;
    for (index, entry) in statement.entries.iter().enumerate() {
        if entry.balance_cents == 0 {
            cutoff = Some(index);
        }
    }

    if let Some(index) = cutoff {
        statement.entries.drain(..=index);
    }

    statement
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{PaymentMethod, SaleItem};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
    }

    fn credit_sale(invoice_no: i64, amount: Cents, timestamp: DateTime<Utc>) -> Sale {
        let mut sale = Sale::new(
            Uuid::new_v4(),
            PaymentMethod::Credit,
            vec![SaleItem {
                product_id: Uuid::new_v4(),
                product_name: "Item".into(),
                quantity: 1,
                unit_price_cents: amount,
            }],
            timestamp,
        );
        sale.invoice_no = invoice_no;
        sale
    }

    fn payment(amount: Cents, timestamp: DateTime<Utc>) -> Payment {
        Payment::new(Uuid::new_v4(), amount, timestamp)
    }

    #[test]
    fn test_empty_inputs() {
        let statement = build_timeline(&[], &[], 0, 0);
        assert!(statement.entries.is_empty());
        assert_eq!(statement.current_debt_cents, 0);
    }

    #[test]
    fn test_running_balance_walk() {
        let sales = vec![credit_sale(1, 10000, at(9)), credit_sale(2, 5000, at(12))];
        let payments = vec![payment(4000, at(10))];

        let statement = build_timeline(&sales, &payments, 15000, 4000);

        let balances: Vec<Cents> = statement.entries.iter().map(|e| e.balance_cents).collect();
        assert_eq!(balances, vec![10000, 6000, 11000]);
        assert_eq!(statement.current_debt_cents, 11000);
    }

    #[test]
    fn test_cash_sales_are_skipped() {
        let cash = Sale::new(
            Uuid::new_v4(),
            PaymentMethod::Cash,
            vec![SaleItem {
                product_id: Uuid::new_v4(),
                product_name: "Bread".into(),
                quantity: 1,
                unit_price_cents: 800,
            }],
            at(9),
        );

        let statement = build_timeline(&[cash], &[], 0, 0);
        assert!(statement.entries.is_empty());
    }

    #[test]
    fn test_tie_break_sale_before_payment() {
        let sales = vec![credit_sale(7, 10000, at(9))];
        let payments = vec![payment(10000, at(9))];

        let statement = build_timeline(&sales, &payments, 10000, 10000);

        assert_eq!(statement.entries[0].kind, EntryKind::Sale);
        assert_eq!(statement.entries[1].kind, EntryKind::Payment);
        assert_eq!(statement.entries[1].balance_cents, 0);
    }

    #[test]
    fn test_active_cycle_after_last_settlement() {
        let sales = vec![credit_sale(1, 10000, at(9)), credit_sale(2, 5000, at(14))];
        let payments = vec![payment(10000, at(11))];

        let full = build_timeline(&sales, &payments, 15000, 10000);
        let active = restrict_to_active_cycle(full);

        assert_eq!(active.entries.len(), 1);
        assert_eq!(active.entries[0].reference, "Invoice #2");
        assert_eq!(active.entries[0].balance_cents, 5000);
        assert_eq!(active.current_debt_cents, 5000);
    }

    #[test]
    fn test_active_cycle_settled_is_empty() {
        let sales = vec![credit_sale(1, 10000, at(9))];
        let payments = vec![payment(10000, at(11))];

        let full = build_timeline(&sales, &payments, 10000, 10000);
        assert_eq!(full.entries.len(), 2);

        let active = restrict_to_active_cycle(full);
        assert!(active.entries.is_empty());
        assert_eq!(active.current_debt_cents, 0);
    }

    #[test]
    fn test_active_cycle_without_zero_keeps_everything() {
        let sales = vec![credit_sale(1, 10000, at(9)), credit_sale(2, 5000, at(14))];

        let full = build_timeline(&sales, &[], 15000, 0);
        let active = restrict_to_active_cycle(full);

        assert_eq!(active.entries.len(), 2);
    }

    #[test]
    fn test_active_cycle_uses_last_zero_of_many() {
        // Balance hits zero twice; only the newest settlement starts the cycle.
        let sales = vec![
            credit_sale(1, 10000, at(8)),
            credit_sale(2, 6000, at(12)),
            credit_sale(3, 2500, at(16)),
        ];
        let payments = vec![payment(10000, at(10)), payment(6000, at(14))];

        let full = build_timeline(&sales, &payments, 18500, 16000);
        let balances: Vec<Cents> = full.entries.iter().map(|e| e.balance_cents).collect();
        assert_eq!(balances, vec![10000, 0, 6000, 0, 2500]);

        let active = restrict_to_active_cycle(full);
        assert_eq!(active.entries.len(), 1);
        assert_eq!(active.entries[0].reference, "Invoice #3");
    }
}
