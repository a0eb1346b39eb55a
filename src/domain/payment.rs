use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, ClientId, SaleId};

pub type PaymentId = Uuid;

/// A payment collected from a client. Payments reduce the client's debt as
/// a whole; the optional sale reference is bookkeeping context only and is
/// never used to settle individual invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub client_id: ClientId,
    pub sale_id: Option<SaleId>,
    pub amount_cents: Cents,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

impl Payment {
    pub fn new(client_id: ClientId, amount_cents: Cents, timestamp: DateTime<Utc>) -> Self {
        assert!(amount_cents > 0, "Payment amount must be positive");
        Self {
            id: Uuid::new_v4(),
            client_id,
            sale_id: None,
            amount_cents,
            timestamp,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_sale(mut self, sale_id: SaleId) -> Self {
        self.sale_id = Some(sale_id);
        self
    }

    /// Display reference used on statements: the note if present,
    /// otherwise a generic label.
    pub fn reference(&self) -> String {
        match &self.note {
            Some(note) if !note.is_empty() => note.clone(),
            _ => "Payment".to_string(),
        }
    }
}
