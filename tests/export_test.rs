mod common;

use anyhow::Result;
use common::{parse_datetime, sell_credit_amount, test_service, StandardShop};
use fiado::io::Exporter;

#[tokio::test]
async fn test_statement_csv_has_entries_and_totals() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create_clients(&service).await?;

    sell_credit_amount(&service, "Maria", "Run A", 10000, parse_datetime("2025-01-05 09:00"))
        .await?;
    service
        .record_payment("Maria", 4000, parse_datetime("2025-01-10 12:00"), None, None)
        .await?;

    let statement = service.client_statement("Maria").await?;
    let exporter = Exporter::new(&service);

    let mut buffer = Vec::new();
    let count = exporter.export_statement_csv(&mut buffer, &statement)?;
    assert_eq!(count, 2);

    let csv = String::from_utf8(buffer)?;
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "date,type,reference,debit,credit,balance");
    assert!(lines[1].contains("SALE"));
    assert!(lines[1].ends_with("100.00,0.00,100.00"));
    assert!(lines[2].contains("PAYMENT"));
    assert!(lines[2].ends_with("0.00,40.00,60.00"));
    // Totals row: total credit, total paid, current debt.
    assert!(lines[3].contains("TOTALS"));
    assert!(lines[3].ends_with("100.00,40.00,60.00"));
    Ok(())
}

#[tokio::test]
async fn test_active_cycle_export_of_settled_client_is_empty() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create_clients(&service).await?;

    sell_credit_amount(&service, "Maria", "Run A", 10000, parse_datetime("2025-01-05 09:00"))
        .await?;
    service
        .record_payment("Maria", 10000, parse_datetime("2025-01-10 12:00"), None, None)
        .await?;

    let statement = service.client_active_cycle("Maria").await?;
    let exporter = Exporter::new(&service);

    let mut buffer = Vec::new();
    let count = exporter.export_statement_csv(&mut buffer, &statement)?;
    assert_eq!(count, 0);

    let csv = String::from_utf8(buffer)?;
    // Header plus the totals row only.
    assert_eq!(csv.lines().count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_clients_csv_carries_debts() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create_clients(&service).await?;

    sell_credit_amount(&service, "Maria", "Run A", 7500, parse_datetime("2025-01-05 09:00"))
        .await?;

    let exporter = Exporter::new(&service);
    let mut buffer = Vec::new();
    let count = exporter.export_clients_csv(&mut buffer).await?;
    assert_eq!(count, 2);

    let csv = String::from_utf8(buffer)?;
    assert!(csv.lines().any(|l| l.starts_with("Maria") && l.ends_with("75.00")));
    assert!(csv.lines().any(|l| l.starts_with("Pedro") && l.ends_with("0.00")));
    Ok(())
}

#[tokio::test]
async fn test_full_json_snapshot() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create(&service).await?;

    sell_credit_amount(&service, "Maria", "Run A", 5000, parse_datetime("2025-01-05 09:00"))
        .await?;
    service
        .record_payment("Maria", 2000, parse_datetime("2025-01-10 12:00"), None, None)
        .await?;

    let exporter = Exporter::new(&service);
    let mut buffer = Vec::new();
    let snapshot = exporter.export_full_json(&mut buffer).await?;

    assert_eq!(snapshot.clients.len(), 2);
    assert_eq!(snapshot.sales.len(), 1);
    assert_eq!(snapshot.payments.len(), 1);
    // Inventory plus the one-off product created for the credit sale.
    assert_eq!(snapshot.products.len(), 4);

    let parsed: serde_json::Value = serde_json::from_slice(&buffer)?;
    assert_eq!(parsed["sales"][0]["total_cents"], 5000);
    assert_eq!(parsed["payments"][0]["amount_cents"], 2000);
    Ok(())
}
