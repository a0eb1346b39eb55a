use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    Cents, Client, ClientId, Payment, PaymentMethod, Product, ProductId, Sale, SaleId, SaleItem,
};

use super::MIGRATION_001_INITIAL;

/// Sales volume for one calendar day, used by the analytics report.
#[derive(Debug, Clone)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub total_cents: Cents,
}

/// Quantity sold for one product over a period.
#[derive(Debug, Clone)]
pub struct ProductQuantity {
    pub product_name: String,
    pub quantity: i64,
}

/// Repository for persisting and querying the shop's records.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Product operations
    // ========================

    pub async fn save_product(&self, product: &Product) -> Result<()> {
        debug!(name = %product.name, "inserting product");
        sqlx::query(
            r#"
            INSERT INTO products (id, name, barcode, price_cents, stock, category, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.category)
        .bind(product.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save product")?;
        Ok(())
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, barcode, price_cents, stock, category, created_at FROM products WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product")?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    pub async fn get_product_by_name(&self, name: &str) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, barcode, price_cents, stock, category, created_at FROM products WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product by name")?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    pub async fn get_product_by_barcode(&self, barcode: &str) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, barcode, price_cents, stock, category, created_at FROM products WHERE barcode = ?",
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch product by barcode")?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    /// List products, optionally filtered by a case-insensitive name substring.
    pub async fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>> {
        let rows = match search {
            Some(term) => {
                sqlx::query(
                    r#"
                    SELECT id, name, barcode, price_cents, stock, category, created_at
                    FROM products
                    WHERE name LIKE '%' || ? || '%'
                    ORDER BY name
                    "#,
                )
                .bind(term)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, name, barcode, price_cents, stock, category, created_at FROM products ORDER BY name",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list products")?;

        rows.iter().map(Self::row_to_product).collect()
    }

    pub async fn update_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET name = ?, barcode = ?, price_cents = ?, stock = ?, category = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.name)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.category)
        .bind(product.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update product")?;
        Ok(())
    }

    /// Adjust a product's stock by a signed delta and return the new level.
    pub async fn adjust_stock(&self, id: ProductId, delta: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?
            WHERE id = ?
            RETURNING stock
            "#,
        )
        .bind(delta)
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to adjust stock")?;

        Ok(row.get("stock"))
    }

    fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Product {
            id: Uuid::parse_str(&id_str).context("Invalid product ID")?,
            name: row.get("name"),
            barcode: row.get("barcode"),
            price_cents: row.get("price_cents"),
            stock: row.get("stock"),
            category: row.get("category"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Client operations
    // ========================

    pub async fn save_client(&self, client: &Client) -> Result<()> {
        debug!(name = %client.name, "inserting client");
        sqlx::query(
            r#"
            INSERT INTO clients (id, name, phone, email, address, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(client.id.to_string())
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.address)
        .bind(client.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save client")?;
        Ok(())
    }

    pub async fn get_client(&self, id: ClientId) -> Result<Option<Client>> {
        let row = sqlx::query(
            "SELECT id, name, phone, email, address, created_at FROM clients WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch client")?;

        row.as_ref().map(Self::row_to_client).transpose()
    }

    pub async fn get_client_by_name(&self, name: &str) -> Result<Option<Client>> {
        let row = sqlx::query(
            "SELECT id, name, phone, email, address, created_at FROM clients WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch client by name")?;

        row.as_ref().map(Self::row_to_client).transpose()
    }

    pub async fn get_client_by_phone(&self, phone: &str) -> Result<Option<Client>> {
        let row = sqlx::query(
            "SELECT id, name, phone, email, address, created_at FROM clients WHERE phone = ?",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch client by phone")?;

        row.as_ref().map(Self::row_to_client).transpose()
    }

    /// List clients, optionally filtered by name or phone substring.
    pub async fn list_clients(&self, search: Option<&str>) -> Result<Vec<Client>> {
        let rows = match search {
            Some(term) => {
                sqlx::query(
                    r#"
                    SELECT id, name, phone, email, address, created_at
                    FROM clients
                    WHERE name LIKE '%' || ? || '%'
                       OR phone LIKE '%' || ? || '%'
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(term)
                .bind(term)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, name, phone, email, address, created_at FROM clients ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list clients")?;

        rows.iter().map(Self::row_to_client).collect()
    }

    pub async fn update_client(&self, client: &Client) -> Result<()> {
        sqlx::query(
            "UPDATE clients SET name = ?, phone = ?, email = ?, address = ? WHERE id = ?",
        )
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.address)
        .bind(client.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update client")?;
        Ok(())
    }

    fn row_to_client(row: &sqlx::sqlite::SqliteRow) -> Result<Client> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Client {
            id: Uuid::parse_str(&id_str).context("Invalid client ID")?,
            name: row.get("name"),
            phone: row.get("phone"),
            email: row.get("email"),
            address: row.get("address"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Sale operations
    // ========================

    /// Save a sale and its items in one transaction.
    /// Assigns the next invoice number before inserting.
    pub async fn save_sale(&self, sale: &mut Sale) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let row = sqlx::query(
            r#"
            UPDATE invoice_counter
            SET value = value + 1
            WHERE name = 'invoice_no'
            RETURNING value
            "#,
        )
        .fetch_one(&mut *tx)
        .await
        .context("Failed to assign invoice number")?;
        sale.invoice_no = row.get("value");

        sqlx::query(
            r#"
            INSERT INTO sales (id, invoice_no, client_id, timestamp, recorded_at, method, total_cents, paid, note)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sale.id.to_string())
        .bind(sale.invoice_no)
        .bind(sale.client_id.to_string())
        .bind(sale.timestamp.to_rfc3339())
        .bind(sale.recorded_at.to_rfc3339())
        .bind(sale.method.as_str())
        .bind(sale.total_cents)
        .bind(sale.paid)
        .bind(&sale.note)
        .execute(&mut *tx)
        .await
        .context("Failed to save sale")?;

        for (position, item) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (sale_id, position, product_id, product_name, quantity, unit_price_cents)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(sale.id.to_string())
            .bind(position as i64)
            .bind(item.product_id.to_string())
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .execute(&mut *tx)
            .await
            .context("Failed to save sale item")?;
        }

        tx.commit().await.context("Failed to commit sale")?;
        debug!(invoice_no = sale.invoice_no, method = %sale.method, "sale recorded");
        Ok(())
    }

    pub async fn get_sale_by_invoice(&self, invoice_no: i64) -> Result<Option<Sale>> {
        let row = sqlx::query(
            r#"
            SELECT id, invoice_no, client_id, timestamp, recorded_at, method, total_cents, paid, note
            FROM sales
            WHERE invoice_no = ?
            "#,
        )
        .bind(invoice_no)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch sale")?;

        match row {
            Some(row) => {
                let mut sale = Self::row_to_sale(&row)?;
                sale.items = self.load_sale_items(sale.id).await?;
                Ok(Some(sale))
            }
            None => Ok(None),
        }
    }

    /// List a client's CREDIT sales with their items, for the ledger.
    /// Order is irrelevant; the statement builder re-sorts.
    pub async fn list_credit_sales(&self, client_id: ClientId) -> Result<Vec<Sale>> {
        let rows = sqlx::query(
            r#"
            SELECT id, invoice_no, client_id, timestamp, recorded_at, method, total_cents, paid, note
            FROM sales
            WHERE client_id = ? AND method = 'CREDIT'
            ORDER BY timestamp
            "#,
        )
        .bind(client_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list credit sales")?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut sale = Self::row_to_sale(row)?;
            sale.items = self.load_sale_items(sale.id).await?;
            sales.push(sale);
        }
        Ok(sales)
    }

    /// List all sales in a timestamp range (inclusive bounds), newest first.
    pub async fn list_sales_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Sale>> {
        let rows = sqlx::query(
            r#"
            SELECT id, invoice_no, client_id, timestamp, recorded_at, method, total_cents, paid, note
            FROM sales
            WHERE timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp DESC
            "#,
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list sales in range")?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut sale = Self::row_to_sale(row)?;
            sale.items = self.load_sale_items(sale.id).await?;
            sales.push(sale);
        }
        Ok(sales)
    }

    /// List every sale with items, oldest first. Used by the snapshot export.
    pub async fn list_all_sales(&self) -> Result<Vec<Sale>> {
        let rows = sqlx::query(
            r#"
            SELECT id, invoice_no, client_id, timestamp, recorded_at, method, total_cents, paid, note
            FROM sales
            ORDER BY invoice_no
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list sales")?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut sale = Self::row_to_sale(row)?;
            sale.items = self.load_sale_items(sale.id).await?;
            sales.push(sale);
        }
        Ok(sales)
    }

    async fn load_sale_items(&self, sale_id: SaleId) -> Result<Vec<SaleItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, quantity, unit_price_cents
            FROM sale_items
            WHERE sale_id = ?
            ORDER BY position
            "#,
        )
        .bind(sale_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to load sale items")?;

        rows.iter()
            .map(|row| {
                let product_id_str: String = row.get("product_id");
                Ok(SaleItem {
                    product_id: Uuid::parse_str(&product_id_str).context("Invalid product ID")?,
                    product_name: row.get("product_name"),
                    quantity: row.get("quantity"),
                    unit_price_cents: row.get("unit_price_cents"),
                })
            })
            .collect()
    }

    fn row_to_sale(row: &sqlx::sqlite::SqliteRow) -> Result<Sale> {
        let id_str: String = row.get("id");
        let client_id_str: String = row.get("client_id");
        let timestamp_str: String = row.get("timestamp");
        let recorded_at_str: String = row.get("recorded_at");
        let method_str: String = row.get("method");

        Ok(Sale {
            id: Uuid::parse_str(&id_str).context("Invalid sale ID")?,
            invoice_no: row.get("invoice_no"),
            client_id: Uuid::parse_str(&client_id_str).context("Invalid client ID")?,
            timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                .context("Invalid timestamp")?
                .with_timezone(&Utc),
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at")?
                .with_timezone(&Utc),
            method: PaymentMethod::from_str(&method_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid payment method: {}", method_str))?,
            total_cents: row.get("total_cents"),
            paid: row.get::<i32, _>("paid") != 0,
            note: row.get("note"),
            items: Vec::new(),
        })
    }

    // ========================
    // Payment operations
    // ========================

    pub async fn save_payment(&self, payment: &Payment) -> Result<()> {
        debug!(amount_cents = payment.amount_cents, "payment recorded");
        sqlx::query(
            r#"
            INSERT INTO payments (id, client_id, sale_id, amount_cents, timestamp, note)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.id.to_string())
        .bind(payment.client_id.to_string())
        .bind(payment.sale_id.map(|id| id.to_string()))
        .bind(payment.amount_cents)
        .bind(payment.timestamp.to_rfc3339())
        .bind(&payment.note)
        .execute(&self.pool)
        .await
        .context("Failed to save payment")?;
        Ok(())
    }

    /// List a client's payments. Order is irrelevant; the statement builder
    /// re-sorts.
    pub async fn list_payments(&self, client_id: ClientId) -> Result<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_id, sale_id, amount_cents, timestamp, note
            FROM payments
            WHERE client_id = ?
            ORDER BY timestamp
            "#,
        )
        .bind(client_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list payments")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    /// List every payment, oldest first. Used by the snapshot export.
    pub async fn list_all_payments(&self) -> Result<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, client_id, sale_id, amount_cents, timestamp, note
            FROM payments
            ORDER BY timestamp
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list payments")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    fn row_to_payment(row: &sqlx::sqlite::SqliteRow) -> Result<Payment> {
        let id_str: String = row.get("id");
        let client_id_str: String = row.get("client_id");
        let sale_id_str: Option<String> = row.get("sale_id");
        let timestamp_str: String = row.get("timestamp");

        Ok(Payment {
            id: Uuid::parse_str(&id_str).context("Invalid payment ID")?,
            client_id: Uuid::parse_str(&client_id_str).context("Invalid client ID")?,
            sale_id: sale_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid sale ID")?,
            amount_cents: row.get("amount_cents"),
            timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                .context("Invalid timestamp")?
                .with_timezone(&Utc),
            note: row.get("note"),
        })
    }

    // ========================
    // Ledger aggregates
    // ========================

    /// Sum of a client's CREDIT sale totals. Independent of the timeline
    /// walk so it stays correct for clients with no events.
    pub async fn sum_credit_sales(&self, client_id: ClientId) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(total_cents), 0) as total
            FROM sales
            WHERE client_id = ? AND method = 'CREDIT'
            "#,
        )
        .bind(client_id.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum credit sales")?;

        Ok(row.get("total"))
    }

    /// Sum of a client's payment amounts.
    pub async fn sum_payments(&self, client_id: ClientId) -> Result<Cents> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount_cents), 0) as total FROM payments WHERE client_id = ?",
        )
        .bind(client_id.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum payments")?;

        Ok(row.get("total"))
    }

    /// Outstanding portfolio debt across all clients:
    /// all CREDIT sales minus all payments.
    pub async fn total_outstanding_debt(&self) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COALESCE(SUM(total_cents), 0) FROM sales WHERE method = 'CREDIT') -
                (SELECT COALESCE(SUM(amount_cents), 0) FROM payments) as debt
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute outstanding debt")?;

        Ok(row.get("debt"))
    }

    // ========================
    // Dashboard & analytics aggregates
    // ========================

    /// Total and count of sales in a timestamp range, all payment methods.
    pub async fn sum_sales_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<(Cents, i64)> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(total_cents), 0) as total, COUNT(*) as count
            FROM sales
            WHERE timestamp >= ? AND timestamp <= ?
            "#,
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum sales in range")?;

        Ok((row.get("total"), row.get("count")))
    }

    /// Total of sales in a range for one payment method.
    pub async fn sum_sales_between_by_method(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        method: PaymentMethod,
    ) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(total_cents), 0) as total
            FROM sales
            WHERE timestamp >= ? AND timestamp <= ? AND method = ?
            "#,
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .bind(method.as_str())
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum sales by method")?;

        Ok(row.get("total"))
    }

    /// Per-day sales totals in a range, oldest day first.
    /// Days with no sales are absent.
    pub async fn daily_sales_totals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailyTotal>> {
        let rows = sqlx::query(
            r#"
            SELECT DATE(timestamp) as day, SUM(total_cents) as total
            FROM sales
            WHERE timestamp >= ? AND timestamp <= ?
            GROUP BY DATE(timestamp)
            ORDER BY day
            "#,
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute daily sales")?;

        rows.iter()
            .map(|row| {
                let day_str: String = row.get("day");
                Ok(DailyTotal {
                    day: NaiveDate::parse_from_str(&day_str, "%Y-%m-%d")
                        .context("Invalid day in aggregate")?,
                    total_cents: row.get("total"),
                })
            })
            .collect()
    }

    /// Best-selling products by quantity in a range.
    pub async fn top_products_by_quantity(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ProductQuantity>> {
        let rows = sqlx::query(
            r#"
            SELECT si.product_name as product_name, SUM(si.quantity) as quantity
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.timestamp >= ? AND s.timestamp <= ?
            GROUP BY si.product_name
            ORDER BY quantity DESC
            LIMIT ?
            "#,
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute top products")?;

        rows.iter()
            .map(|row| {
                Ok(ProductQuantity {
                    product_name: row.get("product_name"),
                    quantity: row.get("quantity"),
                })
            })
            .collect()
    }
}
