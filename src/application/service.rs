use chrono::{DateTime, Datelike, NaiveTime, Utc};
use tracing::{info, warn};

use crate::domain::{
    build_timeline, restrict_to_active_cycle, Cart, Cents, Client, Payment, PaymentMethod,
    Product, Sale, SaleItem, Statement,
};
use crate::storage::Repository;

use super::{AppError, DailySales, DashboardSummary, ProductSales, SalesReport};

/// Name and pseudo-barcode of the synthetic product used to carry a new
/// client's pre-existing debt into the ledger as a regular credit sale.
const OPENING_BALANCE_PRODUCT: &str = "Opening balance";
const OPENING_BALANCE_BARCODE: &str = "SYS-OPENING";

/// Application service providing high-level operations for the shop.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
pub struct PosService {
    repo: Repository,
}

/// Result of a checkout.
pub struct CheckoutResult {
    pub sale: Sale,
    pub client_name: String,
}

/// Result of recording a payment.
pub struct PaymentResult {
    pub payment: Payment,
    pub client_name: String,
    pub remaining_debt_cents: Cents,
}

/// A client's statement together with the client record.
pub struct ClientStatement {
    pub client: Client,
    pub statement: Statement,
}

/// A client with their current debt, for listings and exports.
pub struct ClientBalance {
    pub client: Client,
    pub debt_cents: Cents,
}

impl PosService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Product operations
    // ========================

    pub async fn create_product(
        &self,
        name: String,
        price_cents: Cents,
        stock: i64,
        barcode: Option<String>,
        category: Option<String>,
    ) -> Result<Product, AppError> {
        if price_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Price cannot be negative".to_string(),
            ));
        }
        if self.repo.get_product_by_name(&name).await?.is_some() {
            return Err(AppError::ProductAlreadyExists(name));
        }

        let mut product = Product::new(name, price_cents).with_stock(stock);
        if let Some(code) = barcode {
            product = product.with_barcode(code);
        }
        if let Some(cat) = category {
            product = product.with_category(cat);
        }

        self.repo.save_product(&product).await?;
        info!(name = %product.name, "product created");
        Ok(product)
    }

    /// Resolve a product by name, falling back to barcode.
    pub async fn get_product(&self, name_or_barcode: &str) -> Result<Product, AppError> {
        if let Some(product) = self.repo.get_product_by_name(name_or_barcode).await? {
            return Ok(product);
        }
        self.repo
            .get_product_by_barcode(name_or_barcode)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(name_or_barcode.to_string()))
    }

    pub async fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>, AppError> {
        Ok(self.repo.list_products(search).await?)
    }

    /// Update a product's shelf price, barcode or category. Recorded sales
    /// keep their price snapshots.
    pub async fn update_product(
        &self,
        name: &str,
        new_price_cents: Option<Cents>,
        new_barcode: Option<String>,
        new_category: Option<String>,
    ) -> Result<Product, AppError> {
        let mut product = self.get_product(name).await?;

        if let Some(price) = new_price_cents {
            if price < 0 {
                return Err(AppError::InvalidAmount(
                    "Price cannot be negative".to_string(),
                ));
            }
            product.price_cents = price;
        }
        if let Some(code) = new_barcode {
            product.barcode = Some(code);
        }
        if let Some(cat) = new_category {
            product.category = Some(cat);
        }

        self.repo.update_product(&product).await?;
        Ok(product)
    }

    /// Add received stock for a product.
    pub async fn restock(&self, name: &str, quantity: i64) -> Result<(Product, i64), AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(quantity));
        }
        let product = self.get_product(name).await?;
        let new_stock = self.repo.adjust_stock(product.id, quantity).await?;
        info!(name = %product.name, new_stock, "restocked");
        Ok((product, new_stock))
    }

    // ========================
    // Client operations
    // ========================

    /// Register a client. An optional opening debt is recorded as a CREDIT
    /// sale with a single synthetic line, so historical balances flow
    /// through the same ledger as everything else.
    pub async fn create_client(
        &self,
        name: String,
        phone: Option<String>,
        email: Option<String>,
        address: Option<String>,
        opening_debt_cents: Option<Cents>,
    ) -> Result<Client, AppError> {
        if self.repo.get_client_by_name(&name).await?.is_some() {
            return Err(AppError::ClientAlreadyExists(name));
        }

        let mut client = Client::new(name);
        if let Some(phone) = phone {
            client = client.with_phone(phone);
        }
        if let Some(email) = email {
            client = client.with_email(email);
        }
        if let Some(address) = address {
            client = client.with_address(address);
        }

        self.repo.save_client(&client).await?;
        info!(name = %client.name, "client registered");

        if let Some(debt) = opening_debt_cents {
            if debt > 0 {
                self.record_opening_debt(&client, debt).await?;
            }
        }

        Ok(client)
    }

    async fn record_opening_debt(&self, client: &Client, debt_cents: Cents) -> Result<(), AppError> {
        let product = match self.repo.get_product_by_name(OPENING_BALANCE_PRODUCT).await? {
            Some(product) => product,
            None => {
                let product = Product::new(OPENING_BALANCE_PRODUCT.to_string(), 0)
                    .with_barcode(OPENING_BALANCE_BARCODE);
                self.repo.save_product(&product).await?;
                product
            }
        };

        // The synthetic product is priced 0; the line carries the debt.
        let items = vec![SaleItem {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: 1,
            unit_price_cents: debt_cents,
        }];

        let mut sale = Sale::new(client.id, PaymentMethod::Credit, items, Utc::now())
            .with_note("Opening balance");
        self.repo.save_sale(&mut sale).await?;
        info!(client = %client.name, debt_cents, "opening debt recorded");
        Ok(())
    }

    pub async fn get_client(&self, name: &str) -> Result<Client, AppError> {
        self.repo
            .get_client_by_name(name)
            .await?
            .ok_or_else(|| AppError::ClientNotFound(name.to_string()))
    }

    /// Look up a client by phone number, for counter-side debt checks.
    pub async fn find_client_by_phone(&self, phone: &str) -> Result<Client, AppError> {
        self.repo
            .get_client_by_phone(phone)
            .await?
            .ok_or_else(|| AppError::ClientNotFound(phone.to_string()))
    }

    pub async fn list_clients(&self, search: Option<&str>) -> Result<Vec<Client>, AppError> {
        Ok(self.repo.list_clients(search).await?)
    }

    /// List clients with their current debts.
    pub async fn list_client_balances(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<ClientBalance>, AppError> {
        let clients = self.repo.list_clients(search).await?;
        let mut balances = Vec::with_capacity(clients.len());
        for client in clients {
            let debt_cents = self.client_debt(&client).await?;
            balances.push(ClientBalance { client, debt_cents });
        }
        Ok(balances)
    }

    pub async fn update_client(
        &self,
        name: &str,
        new_phone: Option<String>,
        new_email: Option<String>,
        new_address: Option<String>,
    ) -> Result<Client, AppError> {
        let mut client = self.get_client(name).await?;

        if let Some(phone) = new_phone {
            client.phone = Some(phone);
        }
        if let Some(email) = new_email {
            client.email = Some(email);
        }
        if let Some(address) = new_address {
            client.address = Some(address);
        }

        self.repo.update_client(&client).await?;
        Ok(client)
    }

    async fn client_debt(&self, client: &Client) -> Result<Cents, AppError> {
        let total_credit = self.repo.sum_credit_sales(client.id).await?;
        let total_paid = self.repo.sum_payments(client.id).await?;
        Ok(total_credit - total_paid)
    }

    // ========================
    // Checkout
    // ========================

    /// Check out a cart for a client. The sale total is recomputed from the
    /// cart lines; stock is decremented per line. CASH sales are paid
    /// immediately, CREDIT sales enter the client's ledger.
    pub async fn checkout(
        &self,
        client_name: &str,
        cart: Cart,
        method: PaymentMethod,
        timestamp: DateTime<Utc>,
        note: Option<String>,
    ) -> Result<CheckoutResult, AppError> {
        if cart.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let client = self.get_client(client_name).await?;
        let lines: Vec<(crate::domain::ProductId, String, i64)> = cart
            .lines()
            .iter()
            .map(|l| (l.product_id, l.product_name.clone(), l.quantity))
            .collect();

        let mut sale = Sale::new(client.id, method, cart.into_sale_items(), timestamp);
        if let Some(note) = note {
            sale = sale.with_note(note);
        }

        self.repo.save_sale(&mut sale).await?;

        for (product_id, product_name, quantity) in lines {
            let new_stock = self.repo.adjust_stock(product_id, -quantity).await?;
            if new_stock < 0 {
                warn!(product = %product_name, new_stock, "stock went negative");
            }
        }

        info!(
            invoice_no = sale.invoice_no,
            client = %client.name,
            total_cents = sale.total_cents,
            method = %sale.method,
            "checkout complete"
        );

        Ok(CheckoutResult {
            sale,
            client_name: client.name,
        })
    }

    /// Fetch a sale with its items by invoice number.
    pub async fn invoice(&self, invoice_no: i64) -> Result<(Sale, Client), AppError> {
        let sale = self
            .repo
            .get_sale_by_invoice(invoice_no)
            .await?
            .ok_or(AppError::SaleNotFound(invoice_no))?;
        let client = self
            .repo
            .get_client(sale.client_id)
            .await?
            .ok_or_else(|| AppError::ClientNotFound(sale.client_id.to_string()))?;
        Ok((sale, client))
    }

    /// Every sale on record, oldest first. Used by the snapshot export.
    pub async fn list_all_sales(&self) -> Result<Vec<Sale>, AppError> {
        Ok(self.repo.list_all_sales().await?)
    }

    // ========================
    // Payments
    // ========================

    /// Record a payment from a client. Payments reduce the client's debt as
    /// a whole; the optional invoice number is context only.
    pub async fn record_payment(
        &self,
        client_name: &str,
        amount_cents: Cents,
        timestamp: DateTime<Utc>,
        note: Option<String>,
        invoice_no: Option<i64>,
    ) -> Result<PaymentResult, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Payment amount must be positive".to_string(),
            ));
        }

        let client = self.get_client(client_name).await?;

        let mut payment = Payment::new(client.id, amount_cents, timestamp);
        if let Some(note) = note {
            payment = payment.with_note(note);
        }
        if let Some(invoice_no) = invoice_no {
            let sale = self
                .repo
                .get_sale_by_invoice(invoice_no)
                .await?
                .ok_or(AppError::SaleNotFound(invoice_no))?;
            payment = payment.with_sale(sale.id);
        }

        self.repo.save_payment(&payment).await?;
        let remaining_debt_cents = self.client_debt(&client).await?;

        info!(
            client = %client.name,
            amount_cents,
            remaining_debt_cents,
            "payment collected"
        );

        Ok(PaymentResult {
            payment,
            client_name: client.name,
            remaining_debt_cents,
        })
    }

    /// Every payment on record, oldest first. Used by the snapshot export.
    pub async fn list_all_payments(&self) -> Result<Vec<Payment>, AppError> {
        Ok(self.repo.list_all_payments().await?)
    }

    // ========================
    // Statements
    // ========================

    /// Build a client's full account statement: the chronological
    /// running-balance timeline plus aggregate totals.
    pub async fn client_statement(&self, client_name: &str) -> Result<ClientStatement, AppError> {
        let client = self.get_client(client_name).await?;
        let statement = self.build_statement(&client).await?;
        Ok(ClientStatement { client, statement })
    }

    /// Build a client's statement restricted to the active billing cycle:
    /// only the entries since they last had a zero balance. This is the
    /// view used by the statement export.
    pub async fn client_active_cycle(&self, client_name: &str) -> Result<ClientStatement, AppError> {
        let client = self.get_client(client_name).await?;
        let statement = restrict_to_active_cycle(self.build_statement(&client).await?);
        Ok(ClientStatement { client, statement })
    }

    async fn build_statement(&self, client: &Client) -> Result<Statement, AppError> {
        let sales = self.repo.list_credit_sales(client.id).await?;
        let payments = self.repo.list_payments(client.id).await?;
        let total_credit = self.repo.sum_credit_sales(client.id).await?;
        let total_paid = self.repo.sum_payments(client.id).await?;
        Ok(build_timeline(&sales, &payments, total_credit, total_paid))
    }

    // ========================
    // Dashboard & analytics
    // ========================

    /// Headline numbers: this month's sales, today's sales, outstanding
    /// portfolio debt.
    pub async fn dashboard(&self) -> Result<DashboardSummary, AppError> {
        let now = Utc::now();
        let today = now.date_naive();
        let midnight = NaiveTime::MIN;

        let day_start = today.and_time(midnight).and_utc();
        let month_start = today
            .with_day(1)
            .expect("day 1 is always valid")
            .and_time(midnight)
            .and_utc();

        let (month_sales_cents, _) = self.repo.sum_sales_between(month_start, now).await?;
        let (today_sales_cents, _) = self.repo.sum_sales_between(day_start, now).await?;
        let outstanding_debt_cents = self.repo.total_outstanding_debt().await?;

        Ok(DashboardSummary {
            month_sales_cents,
            today_sales_cents,
            outstanding_debt_cents,
        })
    }

    /// Date-range sales analytics: totals, average ticket, cash/credit
    /// split, daily series, best sellers.
    pub async fn sales_report(
        &self,
        from_date: DateTime<Utc>,
        to_date: DateTime<Utc>,
    ) -> Result<SalesReport, AppError> {
        let (total_cents, sale_count) = self.repo.sum_sales_between(from_date, to_date).await?;
        let average_ticket_cents = if sale_count > 0 {
            total_cents / sale_count
        } else {
            0
        };

        let cash_total_cents = self
            .repo
            .sum_sales_between_by_method(from_date, to_date, PaymentMethod::Cash)
            .await?;
        let credit_total_cents = self
            .repo
            .sum_sales_between_by_method(from_date, to_date, PaymentMethod::Credit)
            .await?;

        let daily = self
            .repo
            .daily_sales_totals(from_date, to_date)
            .await?
            .into_iter()
            .map(|d| DailySales {
                day: d.day,
                total_cents: d.total_cents,
            })
            .collect();

        let top_products = self
            .repo
            .top_products_by_quantity(from_date, to_date, 10)
            .await?
            .into_iter()
            .map(|p| ProductSales {
                product_name: p.product_name,
                quantity: p.quantity,
            })
            .collect();

        Ok(SalesReport {
            from_date,
            to_date,
            total_cents,
            sale_count,
            average_ticket_cents,
            cash_total_cents,
            credit_total_cents,
            daily,
            top_products,
        })
    }
}
