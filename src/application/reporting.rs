use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Cents;

/// Headline numbers for the shop: this month's sales, today's sales, and
/// the outstanding credit portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub month_sales_cents: Cents,
    pub today_sales_cents: Cents,
    pub outstanding_debt_cents: Cents,
}

/// Date-range sales analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub total_cents: Cents,
    pub sale_count: i64,
    pub average_ticket_cents: Cents,
    pub cash_total_cents: Cents,
    pub credit_total_cents: Cents,
    pub daily: Vec<DailySales>,
    pub top_products: Vec<ProductSales>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySales {
    pub day: NaiveDate,
    pub total_cents: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_name: String,
    pub quantity: i64,
}
