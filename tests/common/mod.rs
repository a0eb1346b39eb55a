// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use fiado::application::PosService;
use fiado::domain::{Cart, Cents, PaymentMethod, Sale};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(PosService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = PosService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Helper to parse a datetime string (YYYY-MM-DD HH:MM) into DateTime<Utc>
pub fn parse_datetime(datetime_str: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M")
        .unwrap()
        .and_utc()
}

/// Test fixture: a small shop with a few products and clients
pub struct StandardShop;

impl StandardShop {
    /// Create basic inventory: Rice, Milk, Bread
    pub async fn create_inventory(service: &PosService) -> Result<()> {
        service
            .create_product("Rice".into(), 3500, 50, None, Some("pantry".into()))
            .await?;
        service
            .create_product("Milk".into(), 1200, 30, Some("7501001".into()), None)
            .await?;
        service
            .create_product("Bread".into(), 800, 20, None, None)
            .await?;
        Ok(())
    }

    /// Create clients Maria and Pedro with no opening debt
    pub async fn create_clients(service: &PosService) -> Result<()> {
        service
            .create_client(
                "Maria".into(),
                Some("555-0101".into()),
                None,
                None,
                None,
            )
            .await?;
        service
            .create_client("Pedro".into(), Some("555-0202".into()), None, None, None)
            .await?;
        Ok(())
    }

    /// Full setup: inventory + clients
    pub async fn create(service: &PosService) -> Result<()> {
        Self::create_inventory(service).await?;
        Self::create_clients(service).await?;
        Ok(())
    }
}

/// Record a single-line sale for a client at a given time.
/// Returns the recorded sale.
pub async fn sell_one(
    service: &PosService,
    client: &str,
    product: &str,
    quantity: i64,
    method: PaymentMethod,
    at: DateTime<Utc>,
) -> Result<Sale> {
    let resolved = service.get_product(product).await?;
    let mut cart = Cart::new();
    cart.add(&resolved, quantity);
    let result = service.checkout(client, cart, method, at, None).await?;
    Ok(result.sale)
}

/// Record a credit sale of an arbitrary amount by selling a dedicated
/// one-off product at that price.
pub async fn sell_credit_amount(
    service: &PosService,
    client: &str,
    label: &str,
    amount_cents: Cents,
    at: DateTime<Utc>,
) -> Result<Sale> {
    let product = service
        .create_product(label.into(), amount_cents, 100, None, None)
        .await?;
    let mut cart = Cart::new();
    cart.add(&product, 1);
    let result = service
        .checkout(client, cart, PaymentMethod::Credit, at, None)
        .await?;
    Ok(result.sale)
}
