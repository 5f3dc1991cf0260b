//! Dashboard aggregation scenarios over the pure computation core.

use std::collections::HashMap;

use rust_decimal::Decimal;
use treasury_indexer::domain::models::BudgetAllocation;
use treasury_indexer::domain::services::aggregator;
use treasury_indexer::infrastructure::persistence::entities::transactions;

// 2024-03-10 08:00:00 UTC
const MARCH_TS: i64 = 1_710_057_600;

fn outgoing(id: i64, category: &str, usd: f64, timestamp: i64) -> transactions::Model {
    transactions::Model {
        id,
        wallet_id: "treasury".to_string(),
        tx_hash: format!("0xhash{}", id),
        block_number: 100 + id,
        timestamp,
        from_address: "0xwallet".to_string(),
        to_address: "0xrecipient".to_string(),
        value: "0".to_string(),
        value_decimal: Decimal::from(usd as i64),
        token_symbol: "USDC".to_string(),
        token_name: "USD Coin".to_string(),
        token_decimals: 6,
        contract_address: Some("0xc0ffee".to_string()),
        kind: "token".to_string(),
        direction: "out".to_string(),
        category: category.to_string(),
        notes: String::new(),
        signers: None,
        fiat_value: Some(usd),
        native_value: None,
        is_error: false,
    }
}

fn ops_march_rows() -> Vec<transactions::Model> {
    vec![
        outgoing(1, "Ops", 100.0, MARCH_TS),
        outgoing(2, "Ops", 200.0, MARCH_TS + 3_600),
        outgoing(3, "Ops", 50.0, MARCH_TS + 7_200),
    ]
}

#[test]
fn monthly_burn_reports_one_march_entry_of_350() {
    let burn = aggregator::monthly_burn(&ops_march_rows(), &HashMap::new(), "ETH");
    assert_eq!(burn.len(), 1);
    assert_eq!(burn[0].month, "2024-03");
    assert_eq!(burn[0].token_symbol, "USDC");
    assert!((burn[0].total_usd - 350.0).abs() < 1e-9);
}

#[test]
fn category_breakdown_reports_ops_total_of_350() {
    let breakdown = aggregator::category_breakdown(&ops_march_rows(), &HashMap::new());
    assert_eq!(breakdown.len(), 1);
    assert_eq!(breakdown[0].category, "Ops");
    assert!((breakdown[0].total_usd - 350.0).abs() < 1e-9);
    assert_eq!(breakdown[0].tx_count, 3);
}

#[test]
fn breakdown_total_equals_outgoing_fiat_total() {
    let mut rows = ops_march_rows();
    // Incoming and failed rows must not count toward spend
    let mut incoming = outgoing(4, "Grants", 1_000.0, MARCH_TS);
    incoming.direction = "in".to_string();
    rows.push(incoming);
    let mut failed = outgoing(5, "Grants", 2_000.0, MARCH_TS);
    failed.is_error = true;
    rows.push(failed);

    let outgoing_fiat: f64 = rows
        .iter()
        .filter(|r| r.direction == "out" && !r.is_error)
        .filter_map(|r| r.fiat_value)
        .sum();

    let breakdown = aggregator::category_breakdown(&rows, &HashMap::new());
    let breakdown_total: f64 = breakdown.iter().map(|e| e.total_usd).sum();

    assert!((breakdown_total - outgoing_fiat).abs() < 1e-9);
}

#[test]
fn zero_ceiling_budget_reports_zero_percentage() {
    let budgets = vec![BudgetAllocation {
        category: "Ops".to_string(),
        group: "Operations".to_string(),
        quarterly: 0.0,
        semester: 0.0,
        shared_id: None,
    }];
    let categories = vec!["Uncategorised".to_string(), "Ops".to_string()];

    let comparison = aggregator::budget_comparison(
        &ops_march_rows(),
        &categories,
        &budgets,
        &HashMap::new(),
        "ETH",
        1.5,
    );

    assert_eq!(comparison.lines.len(), 1);
    assert_eq!(comparison.lines[0].ratio_used, 0.0);
    assert_eq!(comparison.lines[0].display_ratio, 0.0);
    assert!((comparison.lines[0].spent_usd - 350.0).abs() < 1e-9);
}

#[test]
fn aggregations_over_empty_history_are_empty() {
    let rows: Vec<transactions::Model> = Vec::new();
    assert_eq!(aggregator::counts(&rows).total, 0);
    assert!(aggregator::category_breakdown(&rows, &HashMap::new()).is_empty());
    assert!(aggregator::monthly_burn(&rows, &HashMap::new(), "ETH").is_empty());
}
