use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{ClientStatement, PosService};
use crate::domain::{format_money, Client, EntryKind, Payment, Product, Sale};

/// Database snapshot for full export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub products: Vec<Product>,
    pub clients: Vec<Client>,
    pub sales: Vec<Sale>,
    pub payments: Vec<Payment>,
}

/// Exporter for converting shop data to portable formats.
pub struct Exporter<'a> {
    service: &'a PosService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a PosService) -> Self {
        Self { service }
    }

    /// Write a client statement as CSV. This is the hand-out format for the
    /// account statement (full history or active cycle, depending on the
    /// statement passed in).
    pub fn export_statement_csv<W: Write>(
        &self,
        writer: W,
        statement: &ClientStatement,
    ) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "date",
            "type",
            "reference",
            "debit",
            "credit",
            "balance",
        ])?;

        let mut count = 0;
        for entry in &statement.statement.entries {
            let kind = match entry.kind {
                EntryKind::Sale => "SALE",
                EntryKind::Payment => "PAYMENT",
            };
            csv_writer.write_record([
                entry.timestamp.to_rfc3339(),
                kind.to_string(),
                entry.reference.clone(),
                format_money(entry.debit_cents),
                format_money(entry.credit_cents),
                format_money(entry.balance_cents),
            ])?;
            count += 1;
        }

        csv_writer.write_record([
            "".to_string(),
            "TOTALS".to_string(),
            statement.client.name.clone(),
            format_money(statement.statement.total_credit_cents),
            format_money(statement.statement.total_paid_cents),
            format_money(statement.statement.current_debt_cents),
        ])?;

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the product catalog to CSV.
    pub async fn export_products_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let products = self.service.list_products(None).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["name", "barcode", "price", "stock", "category"])?;

        let mut count = 0;
        for product in &products {
            csv_writer.write_record([
                product.name.clone(),
                product.barcode.clone().unwrap_or_default(),
                format_money(product.price_cents),
                product.stock.to_string(),
                product.category.clone().unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export clients with their current debts to CSV.
    pub async fn export_clients_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let balances = self.service.list_client_balances(None).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["name", "phone", "email", "debt"])?;

        let mut count = 0;
        for entry in &balances {
            csv_writer.write_record([
                entry.client.name.clone(),
                entry.client.phone.clone().unwrap_or_default(),
                entry.client.email.clone().unwrap_or_default(),
                format_money(entry.debt_cents),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the full database as a JSON snapshot.
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<DatabaseSnapshot> {
        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            products: self.service.list_products(None).await?,
            clients: self.service.list_clients(None).await?,
            sales: self.service.list_all_sales().await?,
            payments: self.service.list_all_payments().await?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
