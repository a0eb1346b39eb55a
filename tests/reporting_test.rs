mod common;

use anyhow::Result;
use chrono::Utc;
use common::{parse_date, parse_datetime, sell_credit_amount, test_service, StandardShop};
use fiado::domain::PaymentMethod;

#[tokio::test]
async fn test_sales_report_totals_and_split() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create(&service).await?;

    // Two cash sales and one credit sale inside the window.
    common::sell_one(
        &service,
        "Maria",
        "Rice",
        2,
        PaymentMethod::Cash,
        parse_datetime("2025-01-05 09:00"),
    )
    .await?;
    common::sell_one(
        &service,
        "Pedro",
        "Milk",
        5,
        PaymentMethod::Cash,
        parse_datetime("2025-01-06 10:00"),
    )
    .await?;
    common::sell_one(
        &service,
        "Maria",
        "Bread",
        3,
        PaymentMethod::Credit,
        parse_datetime("2025-01-07 11:00"),
    )
    .await?;

    // One sale outside the window, which must not count.
    common::sell_one(
        &service,
        "Pedro",
        "Bread",
        1,
        PaymentMethod::Cash,
        parse_datetime("2025-03-01 09:00"),
    )
    .await?;

    let report = service
        .sales_report(parse_date("2025-01-01"), parse_date("2025-02-01"))
        .await?;

    let cash = 2 * 3500 + 5 * 1200;
    let credit = 3 * 800;
    assert_eq!(report.total_cents, cash + credit);
    assert_eq!(report.sale_count, 3);
    assert_eq!(report.average_ticket_cents, (cash + credit) / 3);
    assert_eq!(report.cash_total_cents, cash);
    assert_eq!(report.credit_total_cents, credit);
    Ok(())
}

#[tokio::test]
async fn test_sales_report_daily_series() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create(&service).await?;

    common::sell_one(
        &service,
        "Maria",
        "Rice",
        1,
        PaymentMethod::Cash,
        parse_datetime("2025-01-05 09:00"),
    )
    .await?;
    common::sell_one(
        &service,
        "Maria",
        "Rice",
        2,
        PaymentMethod::Cash,
        parse_datetime("2025-01-05 18:00"),
    )
    .await?;
    common::sell_one(
        &service,
        "Pedro",
        "Milk",
        1,
        PaymentMethod::Cash,
        parse_datetime("2025-01-09 10:00"),
    )
    .await?;

    let report = service
        .sales_report(parse_date("2025-01-01"), parse_date("2025-02-01"))
        .await?;

    assert_eq!(report.daily.len(), 2);
    assert_eq!(report.daily[0].day.to_string(), "2025-01-05");
    assert_eq!(report.daily[0].total_cents, 3 * 3500);
    assert_eq!(report.daily[1].day.to_string(), "2025-01-09");
    assert_eq!(report.daily[1].total_cents, 1200);
    Ok(())
}

#[tokio::test]
async fn test_sales_report_top_products() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create(&service).await?;

    common::sell_one(
        &service,
        "Maria",
        "Milk",
        7,
        PaymentMethod::Cash,
        parse_datetime("2025-01-05 09:00"),
    )
    .await?;
    common::sell_one(
        &service,
        "Pedro",
        "Rice",
        2,
        PaymentMethod::Cash,
        parse_datetime("2025-01-06 10:00"),
    )
    .await?;
    common::sell_one(
        &service,
        "Maria",
        "Milk",
        4,
        PaymentMethod::Credit,
        parse_datetime("2025-01-07 11:00"),
    )
    .await?;

    let report = service
        .sales_report(parse_date("2025-01-01"), parse_date("2025-02-01"))
        .await?;

    assert_eq!(report.top_products[0].product_name, "Milk");
    assert_eq!(report.top_products[0].quantity, 11);
    assert_eq!(report.top_products[1].product_name, "Rice");
    assert_eq!(report.top_products[1].quantity, 2);
    Ok(())
}

#[tokio::test]
async fn test_empty_report() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create(&service).await?;

    let report = service
        .sales_report(parse_date("2024-01-01"), parse_date("2024-02-01"))
        .await?;

    assert_eq!(report.total_cents, 0);
    assert_eq!(report.sale_count, 0);
    assert_eq!(report.average_ticket_cents, 0);
    assert!(report.daily.is_empty());
    assert!(report.top_products.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_dashboard_counts_todays_sales_and_debt() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create(&service).await?;

    // A sale right now lands in both today's and this month's totals.
    common::sell_one(&service, "Maria", "Rice", 2, PaymentMethod::Cash, Utc::now()).await?;
    sell_credit_amount(&service, "Pedro", "Credit run", 9000, Utc::now()).await?;
    service
        .record_payment("Pedro", 4000, Utc::now(), None, None)
        .await?;

    let summary = service.dashboard().await?;

    assert_eq!(summary.today_sales_cents, 2 * 3500 + 9000);
    assert_eq!(summary.month_sales_cents, summary.today_sales_cents);
    assert_eq!(summary.outstanding_debt_cents, 5000);
    Ok(())
}

#[tokio::test]
async fn test_dashboard_debt_matches_client_balances() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create(&service).await?;

    sell_credit_amount(&service, "Maria", "Run A", 12000, parse_datetime("2025-01-05 09:00"))
        .await?;
    sell_credit_amount(&service, "Pedro", "Run B", 8000, parse_datetime("2025-01-06 09:00"))
        .await?;
    service
        .record_payment("Maria", 5000, parse_datetime("2025-01-10 12:00"), None, None)
        .await?;

    let summary = service.dashboard().await?;
    let balances = service.list_client_balances(None).await?;
    let total: i64 = balances.iter().map(|b| b.debt_cents).sum();

    assert_eq!(summary.outstanding_debt_cents, total);
    assert_eq!(summary.outstanding_debt_cents, 15000);
    Ok(())
}
