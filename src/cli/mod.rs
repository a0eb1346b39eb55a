use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};

use crate::application::{ClientStatement, PosService};
use crate::domain::{format_money, parse_money, Cart, EntryKind, PaymentMethod};
use crate::io::Exporter;

/// Fiado - Point of sale & client credit ledger
#[derive(Parser)]
#[command(name = "fiado")]
#[command(about = "A local-first point of sale and client credit ledger for small shops")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "fiado.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Inventory management commands
    #[command(subcommand)]
    Product(ProductCommands),

    /// Client management commands
    #[command(subcommand)]
    Client(ClientCommands),

    /// Check out a cart for a client
    Sell {
        /// Client name
        #[arg(long)]
        client: String,

        /// Cart line as "product:quantity" (product name or barcode;
        /// quantity defaults to 1). Repeat for multiple lines.
        #[arg(long = "item", required = true)]
        items: Vec<String>,

        /// Payment method: cash or credit
        #[arg(short, long, default_value = "cash")]
        method: String,

        /// Sale date (YYYY-MM-DD or YYYY-MM-DDTHH:MM, defaults to now)
        #[arg(long)]
        date: Option<String>,

        /// Note on the invoice
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Record a payment from a client
    Payment {
        /// Client name
        client: String,

        /// Amount collected (e.g., "50.00" or "50")
        amount: String,

        /// Note shown on the statement (e.g., "weekly installment")
        #[arg(short, long)]
        note: Option<String>,

        /// Invoice number this payment was collected against (context only;
        /// debt is always tracked per client)
        #[arg(long)]
        invoice: Option<i64>,

        /// Payment date (YYYY-MM-DD or YYYY-MM-DDTHH:MM, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show a client's account statement
    Statement {
        /// Client name
        client: String,

        /// Only show the active cycle: entries since the client last had a
        /// zero balance
        #[arg(long)]
        active_cycle: bool,

        /// Write the statement as CSV to this file instead of printing
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show an invoice with its line items
    Invoice {
        /// Invoice number
        invoice_no: i64,
    },

    /// Show headline numbers: monthly sales, today's sales, outstanding debt
    Dashboard,

    /// Sales analytics over a date range
    Report {
        /// Start date (YYYY-MM-DD, defaults to 30 days ago)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        to: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: products, clients, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// Add a product to the inventory
    Add {
        /// Product name (must be unique)
        name: String,

        /// Shelf price (e.g., "35.00" or "35")
        #[arg(short, long)]
        price: String,

        /// Initial stock
        #[arg(short, long, default_value = "0")]
        stock: i64,

        /// Barcode
        #[arg(short, long)]
        barcode: Option<String>,

        /// Category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List products
    List {
        /// Filter by name substring
        #[arg(long)]
        search: Option<String>,
    },

    /// Edit a product's price, barcode or category
    Edit {
        /// Product name or barcode
        name: String,

        /// New shelf price
        #[arg(short, long)]
        price: Option<String>,

        /// New barcode
        #[arg(short, long)]
        barcode: Option<String>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Add received stock
    Restock {
        /// Product name or barcode
        name: String,

        /// Units received
        quantity: i64,
    },
}

#[derive(Subcommand)]
pub enum ClientCommands {
    /// Register a client
    Add {
        /// Client name (must be unique)
        name: String,

        /// Phone number
        #[arg(short, long)]
        phone: Option<String>,

        /// Email address
        #[arg(short, long)]
        email: Option<String>,

        /// Address
        #[arg(short, long)]
        address: Option<String>,

        /// Pre-existing debt carried in as an opening credit sale
        #[arg(long)]
        opening_debt: Option<String>,
    },

    /// List clients with their current debts
    List {
        /// Filter by name or phone substring
        #[arg(long)]
        search: Option<String>,
    },

    /// Edit a client's contact details
    Edit {
        /// Client name
        name: String,

        /// New phone number
        #[arg(short, long)]
        phone: Option<String>,

        /// New email address
        #[arg(short, long)]
        email: Option<String>,

        /// New address
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Look up a client and their debt by phone number
    Find {
        /// Phone number
        phone: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                PosService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Product(product_cmd) => {
                let service = PosService::connect(&self.database).await?;
                run_product_command(&service, product_cmd).await?;
            }

            Commands::Client(client_cmd) => {
                let service = PosService::connect(&self.database).await?;
                run_client_command(&service, client_cmd).await?;
            }

            Commands::Sell {
                client,
                items,
                method,
                date,
                note,
            } => {
                let service = PosService::connect(&self.database).await?;
                run_sell_command(&service, &client, &items, &method, date, note).await?;
            }

            Commands::Payment {
                client,
                amount,
                note,
                invoice,
                date,
            } => {
                let service = PosService::connect(&self.database).await?;
                let amount_cents =
                    parse_money(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let timestamp = parse_timestamp_or_now(date.as_deref())?;

                let result = service
                    .record_payment(&client, amount_cents, timestamp, note, invoice)
                    .await?;

                println!(
                    "Recorded payment: {} from {}",
                    format_money(result.payment.amount_cents),
                    result.client_name
                );
                println!(
                    "Remaining debt: {}",
                    format_money(result.remaining_debt_cents)
                );
            }

            Commands::Statement {
                client,
                active_cycle,
                output,
            } => {
                let service = PosService::connect(&self.database).await?;
                let statement = if active_cycle {
                    service.client_active_cycle(&client).await?
                } else {
                    service.client_statement(&client).await?
                };

                match output {
                    Some(path) => {
                        let file = std::fs::File::create(&path)
                            .with_context(|| format!("Failed to create output file: {}", path))?;
                        let exporter = Exporter::new(&service);
                        let count = exporter.export_statement_csv(file, &statement)?;
                        eprintln!("Exported {} statement entries to {}", count, path);
                    }
                    None => print_statement(&statement),
                }
            }

            Commands::Invoice { invoice_no } => {
                let service = PosService::connect(&self.database).await?;
                run_invoice_command(&service, invoice_no).await?;
            }

            Commands::Dashboard => {
                let service = PosService::connect(&self.database).await?;
                let summary = service.dashboard().await?;

                println!("Sales this month: {}", format_money(summary.month_sales_cents));
                println!("Sales today:      {}", format_money(summary.today_sales_cents));
                println!(
                    "Outstanding debt: {}",
                    format_money(summary.outstanding_debt_cents)
                );
            }

            Commands::Report { from, to, format } => {
                let service = PosService::connect(&self.database).await?;
                run_report_command(&service, from, to, &format).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = PosService::connect(&self.database).await?;
                run_export_command(&service, &export_type, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn run_product_command(service: &PosService, cmd: ProductCommands) -> Result<()> {
    match cmd {
        ProductCommands::Add {
            name,
            price,
            stock,
            barcode,
            category,
        } => {
            let price_cents =
                parse_money(&price).context("Invalid price format. Use '35.00' or '35'")?;
            let product = service
                .create_product(name, price_cents, stock, barcode, category)
                .await?;
            println!(
                "Added product: {} at {} ({} in stock)",
                product.name,
                format_money(product.price_cents),
                product.stock
            );
        }

        ProductCommands::List { search } => {
            let products = service.list_products(search.as_deref()).await?;
            if products.is_empty() {
                println!("No products found.");
            } else {
                println!(
                    "{:<30} {:<14} {:>10} {:>7}  {}",
                    "NAME", "BARCODE", "PRICE", "STOCK", "CATEGORY"
                );
                println!("{}", "-".repeat(76));
                for product in products {
                    println!(
                        "{:<30} {:<14} {:>10} {:>7}  {}",
                        product.name,
                        product.barcode.as_deref().unwrap_or("-"),
                        format_money(product.price_cents),
                        product.stock,
                        product.category.as_deref().unwrap_or("-")
                    );
                }
            }
        }

        ProductCommands::Edit {
            name,
            price,
            barcode,
            category,
        } => {
            let price_cents = price
                .map(|p| parse_money(&p))
                .transpose()
                .context("Invalid price format")?;
            let product = service
                .update_product(&name, price_cents, barcode, category)
                .await?;
            println!(
                "Updated product: {} at {}",
                product.name,
                format_money(product.price_cents)
            );
        }

        ProductCommands::Restock { name, quantity } => {
            let (product, new_stock) = service.restock(&name, quantity).await?;
            println!(
                "Restocked {}: +{} units ({} in stock)",
                product.name, quantity, new_stock
            );
        }
    }
    Ok(())
}

async fn run_client_command(service: &PosService, cmd: ClientCommands) -> Result<()> {
    match cmd {
        ClientCommands::Add {
            name,
            phone,
            email,
            address,
            opening_debt,
        } => {
            let opening_debt_cents = opening_debt
                .map(|d| parse_money(&d))
                .transpose()
                .context("Invalid opening debt format")?;
            let client = service
                .create_client(name, phone, email, address, opening_debt_cents)
                .await?;
            println!("Registered client: {}", client.name);
            if let Some(debt) = opening_debt_cents {
                if debt > 0 {
                    println!("Opening debt recorded: {}", format_money(debt));
                }
            }
        }

        ClientCommands::List { search } => {
            let balances = service.list_client_balances(search.as_deref()).await?;
            if balances.is_empty() {
                println!("No clients found.");
            } else {
                println!("{:<25} {:<16} {:>12}", "NAME", "PHONE", "DEBT");
                println!("{}", "-".repeat(55));
                for entry in balances {
                    println!(
                        "{:<25} {:<16} {:>12}",
                        entry.client.name,
                        entry.client.phone.as_deref().unwrap_or("-"),
                        format_money(entry.debt_cents)
                    );
                }
            }
        }

        ClientCommands::Edit {
            name,
            phone,
            email,
            address,
        } => {
            let client = service.update_client(&name, phone, email, address).await?;
            println!("Updated client: {}", client.name);
        }

        ClientCommands::Find { phone } => {
            let client = service.find_client_by_phone(&phone).await?;
            let statement = service.client_statement(&client.name).await?;
            println!("Client: {}", client.name);
            if let Some(phone) = &client.phone {
                println!("  Phone: {}", phone);
            }
            println!(
                "  Debt:  {}",
                format_money(statement.statement.current_debt_cents)
            );
        }
    }
    Ok(())
}

async fn run_sell_command(
    service: &PosService,
    client: &str,
    items: &[String],
    method: &str,
    date: Option<String>,
    note: Option<String>,
) -> Result<()> {
    let method = PaymentMethod::from_str(method)
        .ok_or_else(|| anyhow::anyhow!("Invalid payment method '{}'. Use cash or credit", method))?;

    let mut cart = Cart::new();
    for spec in items {
        let (name, quantity) = parse_item_spec(spec)?;
        let product = service.get_product(name).await?;
        cart.add(&product, quantity);
    }

    let timestamp = parse_timestamp_or_now(date.as_deref())?;
    let result = service.checkout(client, cart, method, timestamp, note).await?;

    println!(
        "Invoice #{}: {} for {} ({})",
        result.sale.invoice_no,
        format_money(result.sale.total_cents),
        result.client_name,
        result.sale.method
    );
    for item in &result.sale.items {
        println!(
            "  {:>3} x {:<30} {:>10}",
            item.quantity,
            item.product_name,
            format_money(item.subtotal_cents())
        );
    }
    Ok(())
}

async fn run_invoice_command(service: &PosService, invoice_no: i64) -> Result<()> {
    let (sale, client) = service.invoice(invoice_no).await?;

    println!("Invoice #{}", sale.invoice_no);
    println!("  Client: {}", client.name);
    println!("  Date:   {}", sale.timestamp.format("%Y-%m-%d %H:%M"));
    println!("  Method: {}", sale.method);
    println!("  Paid:   {}", if sale.paid { "yes" } else { "no" });
    if let Some(note) = &sale.note {
        println!("  Note:   {}", note);
    }
    println!();
    println!("{:>5} {:<30} {:>10} {:>10}", "QTY", "PRODUCT", "UNIT", "SUBTOTAL");
    println!("{}", "-".repeat(59));
    for item in &sale.items {
        println!(
            "{:>5} {:<30} {:>10} {:>10}",
            item.quantity,
            item.product_name,
            format_money(item.unit_price_cents),
            format_money(item.subtotal_cents())
        );
    }
    println!("{}", "-".repeat(59));
    println!("{:>57}", format_money(sale.total_cents));
    Ok(())
}

async fn run_report_command(
    service: &PosService,
    from: Option<String>,
    to: Option<String>,
    format: &str,
) -> Result<()> {
    let now = Utc::now();
    let from_date = match from {
        Some(s) => parse_date(&s)?,
        None => now - chrono::Duration::days(30),
    };
    let to_date = match to {
        Some(s) => end_of_day(&s)?,
        None => now,
    };

    let report = service.sales_report(from_date, to_date).await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            println!(
                "Sales {} to {}",
                report.from_date.format("%Y-%m-%d"),
                report.to_date.format("%Y-%m-%d")
            );
            println!("  Total:          {}", format_money(report.total_cents));
            println!("  Sales:          {}", report.sale_count);
            println!(
                "  Average ticket: {}",
                format_money(report.average_ticket_cents)
            );
            println!("  Cash:           {}", format_money(report.cash_total_cents));
            println!(
                "  Credit:         {}",
                format_money(report.credit_total_cents)
            );

            if !report.daily.is_empty() {
                println!();
                println!("{:<12} {:>12}", "DAY", "TOTAL");
                println!("{}", "-".repeat(25));
                for day in &report.daily {
                    println!("{:<12} {:>12}", day.day, format_money(day.total_cents));
                }
            }

            if !report.top_products.is_empty() {
                println!();
                println!("{:<30} {:>8}", "TOP PRODUCTS", "QTY");
                println!("{}", "-".repeat(39));
                for product in &report.top_products {
                    println!("{:<30} {:>8}", product.product_name, product.quantity);
                }
            }
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &PosService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "products" => {
            let count = exporter.export_products_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} products", count);
            }
        }
        "clients" => {
            let count = exporter.export_clients_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} clients", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported {} products, {} clients, {} sales, {} payments",
                    snapshot.products.len(),
                    snapshot.clients.len(),
                    snapshot.sales.len(),
                    snapshot.payments.len()
                );
            }
        }
        other => {
            anyhow::bail!(
                "Unknown export type '{}'. Valid types: products, clients, full",
                other
            );
        }
    }
    Ok(())
}

fn print_statement(statement: &ClientStatement) {
    println!("Account statement: {}", statement.client.name);
    println!();

    if statement.statement.entries.is_empty() {
        println!("No transactions.");
    } else {
        println!(
            "{:<17} {:<8} {:<25} {:>10} {:>10} {:>10}",
            "DATE", "TYPE", "REFERENCE", "DEBIT", "CREDIT", "BALANCE"
        );
        println!("{}", "-".repeat(85));
        for entry in &statement.statement.entries {
            let kind = match entry.kind {
                EntryKind::Sale => "SALE",
                EntryKind::Payment => "PAYMENT",
            };
            println!(
                "{:<17} {:<8} {:<25} {:>10} {:>10} {:>10}",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                kind,
                entry.reference,
                format_money(entry.debit_cents),
                format_money(entry.credit_cents),
                format_money(entry.balance_cents)
            );
        }
    }

    println!();
    println!(
        "Total credit: {}",
        format_money(statement.statement.total_credit_cents)
    );
    println!(
        "Total paid:   {}",
        format_money(statement.statement.total_paid_cents)
    );
    println!(
        "Current debt: {}",
        format_money(statement.statement.current_debt_cents)
    );
}

/// Parse a cart line spec: "product" or "product:quantity". The product
/// part may be a name or barcode; names may themselves contain colons, so
/// only the last segment is tried as a quantity.
fn parse_item_spec(spec: &str) -> Result<(&str, i64)> {
    if let Some((name, qty_str)) = spec.rsplit_once(':') {
        if let Ok(quantity) = qty_str.parse::<i64>() {
            if quantity <= 0 {
                anyhow::bail!("Quantity must be positive in '{}'", spec);
            }
            return Ok((name, quantity));
        }
    }
    Ok((spec, 1))
}

/// Parse YYYY-MM-DD into midnight UTC.
fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", input))?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc())
}

/// Parse YYYY-MM-DD into the last second of that day, for inclusive range
/// ends.
fn end_of_day(input: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", input))?;
    Ok(date.and_hms_opt(23, 59, 59).unwrap().and_utc())
}

/// Parse an optional timestamp: YYYY-MM-DDTHH:MM or YYYY-MM-DD, falling
/// back to now.
fn parse_timestamp_or_now(input: Option<&str>) -> Result<DateTime<Utc>> {
    match input {
        None => Ok(Utc::now()),
        Some(s) => {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
                return Ok(dt.and_utc());
            }
            parse_date(s)
        }
    }
}
