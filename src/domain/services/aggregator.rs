//! The aggregation engine: stateless, read-only computations over stored
//! transaction rows plus the static budget configuration.
//!
//! Fiat values recorded at ingestion time are authoritative; a current-price
//! fallback is only applied to rows that were never priced. Stored values
//! are never rewritten here.

use std::collections::HashMap;

use chrono::DateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::models::{
    BudgetAllocation, BudgetComparison, BudgetLine, CategorySpend, Direction, MonthlyBurn,
    SharedPoolUsage, TxCounts, UNCATEGORISED,
};
use crate::infrastructure::persistence::entities::transactions;

/// Group name used for categories without a configured allocation
const OTHER_GROUP: &str = "Other";

/// Transaction counts for a wallet's stored rows
pub fn counts(rows: &[transactions::Model]) -> TxCounts {
    let mut result = TxCounts::default();
    for row in rows {
        result.total += 1;
        match Direction::parse(&row.direction) {
            Some(Direction::In) => result.incoming += 1,
            Some(Direction::Out) => result.outgoing += 1,
            None => {}
        }
        if row.category == UNCATEGORISED {
            result.uncategorised += 1;
        }
    }
    result
}

/// Outgoing spend grouped by (category, token).
///
/// Ordered with `Uncategorised` first, then by USD total descending.
pub fn category_breakdown(
    rows: &[transactions::Model],
    current_prices: &HashMap<String, f64>,
) -> Vec<CategorySpend> {
    let mut grouped: Vec<CategorySpend> = Vec::new();

    for row in spend_rows(rows) {
        let usd = fiat_value(row, current_prices);
        match grouped
            .iter_mut()
            .find(|e| e.category == row.category && e.token_symbol == row.token_symbol)
        {
            Some(entry) => {
                entry.total_amount += row.value_decimal;
                entry.total_usd += usd;
                entry.tx_count += 1;
            }
            None => grouped.push(CategorySpend {
                category: row.category.clone(),
                token_symbol: row.token_symbol.clone(),
                total_amount: row.value_decimal,
                total_usd: usd,
                tx_count: 1,
            }),
        }
    }

    grouped.sort_by(|a, b| {
        let a_key = (a.category != UNCATEGORISED) as u8;
        let b_key = (b.category != UNCATEGORISED) as u8;
        a_key
            .cmp(&b_key)
            .then(b.total_usd.total_cmp(&a.total_usd))
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.token_symbol.cmp(&b.token_symbol))
    });
    grouped
}

/// Outgoing spend grouped by UTC calendar month and token, ascending by
/// month. Months with no outgoing activity are absent, not zero-filled.
pub fn monthly_burn(
    rows: &[transactions::Model],
    current_prices: &HashMap<String, f64>,
    native_symbol: &str,
) -> Vec<MonthlyBurn> {
    let mut grouped: Vec<MonthlyBurn> = Vec::new();

    for row in spend_rows(rows) {
        let Some(month) = month_of(row.timestamp) else {
            continue;
        };
        let usd = fiat_value(row, current_prices);
        let native = native_value(row, current_prices, native_symbol);
        match grouped
            .iter_mut()
            .find(|e| e.month == month && e.token_symbol == row.token_symbol)
        {
            Some(entry) => {
                entry.total_amount += row.value_decimal;
                entry.total_usd += usd;
                entry.total_native += native;
            }
            None => grouped.push(MonthlyBurn {
                month,
                token_symbol: row.token_symbol.clone(),
                total_amount: row.value_decimal,
                total_usd: usd,
                total_native: native,
            }),
        }
    }

    grouped.sort_by(|a, b| a.month.cmp(&b.month).then_with(|| a.token_symbol.cmp(&b.token_symbol)));
    grouped
}

/// Budget-vs-actual for each of the wallet's configured categories.
///
/// Lines are ordered by group in allocation-declaration order, categories
/// within a group in the group's declared order, and categories with no
/// allocation grouped under `Other`, appended last. Shared pools aggregate
/// member spend against the shared ceiling. A zero semester ceiling yields
/// a zero ratio, never a division error.
pub fn budget_comparison(
    rows: &[transactions::Model],
    wallet_categories: &[String],
    budgets: &[BudgetAllocation],
    current_prices: &HashMap<String, f64>,
    native_symbol: &str,
    display_cap: f64,
) -> BudgetComparison {
    // Spent totals per category, from outgoing rows only
    let mut spent_usd: HashMap<&str, f64> = HashMap::new();
    let mut spent_native: HashMap<&str, f64> = HashMap::new();
    for row in spend_rows(rows) {
        *spent_usd.entry(row.category.as_str()).or_default() +=
            fiat_value(row, current_prices);
        *spent_native.entry(row.category.as_str()).or_default() +=
            native_value(row, current_prices, native_symbol);
    }

    let make_line = |category: &str| -> BudgetLine {
        let allocation = budgets.iter().find(|b| b.category == category);
        let semester = allocation.map(|b| b.semester).unwrap_or(0.0);
        let spent = spent_usd.get(category).copied().unwrap_or(0.0);
        let ratio = ratio_used(spent, semester);
        BudgetLine {
            category: category.to_string(),
            group: allocation
                .map(|b| b.group.clone())
                .unwrap_or_else(|| OTHER_GROUP.to_string()),
            spent_usd: spent,
            spent_native: spent_native.get(category).copied().unwrap_or(0.0),
            quarterly_ceiling: allocation.map(|b| b.quarterly).unwrap_or(0.0),
            semester_ceiling: semester,
            shared_id: allocation.and_then(|b| b.shared_id.clone()),
            ratio_used: ratio,
            display_ratio: ratio.min(display_cap),
        }
    };

    let tracked: Vec<&String> = wallet_categories
        .iter()
        .filter(|c| c.as_str() != UNCATEGORISED)
        .collect();

    // Categories with an allocation, in group-then-declaration order
    let mut lines: Vec<BudgetLine> = Vec::new();
    let mut groups: Vec<String> = Vec::new();
    for allocation in budgets {
        if !groups.contains(&allocation.group) {
            groups.push(allocation.group.clone());
        }
    }
    for group in &groups {
        for allocation in budgets.iter().filter(|b| &b.group == group) {
            if tracked.iter().any(|c| c.as_str() == allocation.category) {
                lines.push(make_line(&allocation.category));
            }
        }
    }

    // Unallocated categories fall into a trailing Other group
    let mut has_other = false;
    for category in &tracked {
        if !budgets.iter().any(|b| &b.category == *category) {
            lines.push(make_line(category));
            has_other = true;
        }
    }

    let mut groups: Vec<String> = groups
        .into_iter()
        .filter(|g| lines.iter().any(|l| &l.group == g))
        .collect();
    if has_other {
        groups.push(OTHER_GROUP.to_string());
    }

    let shared_pools = shared_pool_usage(&lines, display_cap);
    let total_spent_usd = lines.iter().map(|l| l.spent_usd).sum();

    BudgetComparison {
        lines,
        shared_pools,
        groups,
        total_spent_usd,
    }
}

fn shared_pool_usage(lines: &[BudgetLine], display_cap: f64) -> Vec<SharedPoolUsage> {
    let mut pools: Vec<SharedPoolUsage> = Vec::new();
    for line in lines {
        let Some(shared_id) = &line.shared_id else {
            continue;
        };
        match pools.iter_mut().find(|p| &p.shared_id == shared_id) {
            Some(pool) => {
                pool.categories.push(line.category.clone());
                pool.spent_usd += line.spent_usd;
            }
            None => pools.push(SharedPoolUsage {
                shared_id: shared_id.clone(),
                categories: vec![line.category.clone()],
                // Each member declares the pool's full ceiling
                ceiling: line.semester_ceiling,
                spent_usd: line.spent_usd,
                ratio_used: 0.0,
                display_ratio: 0.0,
            }),
        }
    }
    for pool in &mut pools {
        pool.ratio_used = ratio_used(pool.spent_usd, pool.ceiling);
        pool.display_ratio = pool.ratio_used.min(display_cap);
    }
    pools
}

fn ratio_used(spent: f64, ceiling: f64) -> f64 {
    if ceiling > 0.0 {
        spent / ceiling
    } else {
        0.0
    }
}

/// Outgoing, non-failed rows: the spend population for every view
fn spend_rows(rows: &[transactions::Model]) -> impl Iterator<Item = &transactions::Model> {
    rows.iter()
        .filter(|r| Direction::parse(&r.direction) == Some(Direction::Out) && !r.is_error)
}

/// USD value of a row: the value recorded at ingestion time, falling back
/// to a current quote for rows that were never priced
fn fiat_value(row: &transactions::Model, current_prices: &HashMap<String, f64>) -> f64 {
    row.fiat_value.unwrap_or_else(|| {
        let price = current_prices
            .get(&row.token_symbol)
            .copied()
            .unwrap_or(0.0);
        decimal_f64(row.value_decimal) * price
    })
}

/// Native-token-equivalent value of a row, with the same fallback policy
fn native_value(
    row: &transactions::Model,
    current_prices: &HashMap<String, f64>,
    native_symbol: &str,
) -> f64 {
    row.native_value.unwrap_or_else(|| {
        if row.token_symbol == native_symbol {
            return decimal_f64(row.value_decimal);
        }
        let native_price = current_prices.get(native_symbol).copied().unwrap_or(0.0);
        if native_price > 0.0 {
            fiat_value(row, current_prices) / native_price
        } else {
            0.0
        }
    })
}

fn month_of(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%Y-%m").to_string())
}

fn decimal_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        category: &str,
        symbol: &str,
        direction: &str,
        amount: i64,
        fiat: Option<f64>,
        timestamp: i64,
    ) -> transactions::Model {
        transactions::Model {
            id: 0,
            wallet_id: "treasury".to_string(),
            tx_hash: format!("0x{:x}", timestamp ^ amount),
            block_number: 1,
            timestamp,
            from_address: String::new(),
            to_address: String::new(),
            value: amount.to_string(),
            value_decimal: Decimal::from(amount),
            token_symbol: symbol.to_string(),
            token_name: symbol.to_string(),
            token_decimals: 18,
            contract_address: None,
            kind: "transfer".to_string(),
            direction: direction.to_string(),
            category: category.to_string(),
            notes: String::new(),
            signers: None,
            fiat_value: fiat,
            native_value: None,
            is_error: false,
        }
    }

    // 2024-03-15 12:00:00 UTC
    const MARCH: i64 = 1_710_504_000;
    // 2024-04-02 09:00:00 UTC
    const APRIL: i64 = 1_712_048_400;

    #[test]
    fn counts_split_by_direction_and_category() {
        let rows = vec![
            row("Uncategorised", "ETH", "in", 5, None, MARCH),
            row("Ops", "ETH", "out", 2, Some(100.0), MARCH),
            row("Ops", "ETH", "out", 1, Some(50.0), APRIL),
        ];
        let c = counts(&rows);
        assert_eq!(c.total, 3);
        assert_eq!(c.incoming, 1);
        assert_eq!(c.outgoing, 2);
        assert_eq!(c.uncategorised, 1);
    }

    #[test]
    fn counts_of_empty_store_are_zero() {
        assert_eq!(counts(&[]), TxCounts::default());
    }

    #[test]
    fn breakdown_sums_stored_fiat() {
        let rows = vec![
            row("Ops", "USDC", "out", 100, Some(100.0), MARCH),
            row("Ops", "USDC", "out", 200, Some(200.0), MARCH),
            row("Ops", "USDC", "out", 50, Some(50.0), MARCH),
            row("Grants", "ETH", "in", 10, None, MARCH),
        ];
        let breakdown = category_breakdown(&rows, &HashMap::new());
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].category, "Ops");
        assert_eq!(breakdown[0].total_usd, 350.0);
        assert_eq!(breakdown[0].total_amount, Decimal::from(350));
        assert_eq!(breakdown[0].tx_count, 3);
    }

    #[test]
    fn breakdown_falls_back_to_current_price_for_unpriced_rows() {
        let rows = vec![
            row("Ops", "ETH", "out", 2, Some(7000.0), MARCH),
            row("Ops", "ETH", "out", 1, None, MARCH),
        ];
        let prices = HashMap::from([("ETH".to_string(), 3000.0)]);
        let breakdown = category_breakdown(&rows, &prices);
        // 7000 recorded + 1 * 3000 fallback; the stored value is untouched
        assert_eq!(breakdown[0].total_usd, 10_000.0);
    }

    #[test]
    fn breakdown_orders_uncategorised_first_then_usd_desc() {
        let rows = vec![
            row("Ops", "ETH", "out", 1, Some(500.0), MARCH),
            row("Grants", "ETH", "out", 1, Some(900.0), MARCH),
            row("Uncategorised", "ETH", "out", 1, Some(1.0), MARCH),
        ];
        let breakdown = category_breakdown(&rows, &HashMap::new());
        let order: Vec<&str> = breakdown.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(order, vec!["Uncategorised", "Grants", "Ops"]);
    }

    #[test]
    fn breakdown_total_matches_outgoing_fiat_sum() {
        let rows = vec![
            row("Ops", "ETH", "out", 1, Some(500.0), MARCH),
            row("Grants", "USDC", "out", 900, Some(900.0), APRIL),
            row("Ops", "ETH", "in", 4, Some(9_999.0), MARCH),
        ];
        let breakdown = category_breakdown(&rows, &HashMap::new());
        let total: f64 = breakdown.iter().map(|e| e.total_usd).sum();
        assert_eq!(total, 1400.0);
    }

    #[test]
    fn burn_groups_by_utc_month() {
        let rows = vec![
            row("Ops", "USDC", "out", 100, Some(100.0), MARCH),
            row("Ops", "USDC", "out", 200, Some(200.0), MARCH),
            row("Ops", "USDC", "out", 50, Some(50.0), MARCH),
            row("Ops", "USDC", "out", 10, Some(10.0), APRIL),
        ];
        let burn = monthly_burn(&rows, &HashMap::new(), "ETH");
        assert_eq!(burn.len(), 2);
        assert_eq!(burn[0].month, "2024-03");
        assert_eq!(burn[0].total_usd, 350.0);
        assert_eq!(burn[1].month, "2024-04");
        assert_eq!(burn[1].total_usd, 10.0);
    }

    #[test]
    fn burn_skips_months_without_outgoing_rows() {
        let rows = vec![
            row("Ops", "ETH", "out", 1, Some(100.0), MARCH),
            row("Ops", "ETH", "in", 1, Some(100.0), APRIL),
        ];
        let burn = monthly_burn(&rows, &HashMap::new(), "ETH");
        assert_eq!(burn.len(), 1);
        assert_eq!(burn[0].month, "2024-03");
    }

    #[test]
    fn burn_native_equivalent_for_native_rows() {
        let rows = vec![row("Ops", "ETH", "out", 2, Some(6000.0), MARCH)];
        let burn = monthly_burn(&rows, &HashMap::new(), "ETH");
        assert_eq!(burn[0].total_native, 2.0);
    }

    fn sample_budgets() -> Vec<BudgetAllocation> {
        vec![
            BudgetAllocation {
                category: "Ops".to_string(),
                group: "Operations".to_string(),
                quarterly: 75_000.0,
                semester: 150_000.0,
                shared_id: None,
            },
            BudgetAllocation {
                category: "Delegates".to_string(),
                group: "Operations".to_string(),
                quarterly: 0.0,
                semester: 0.0,
                shared_id: None,
            },
            BudgetAllocation {
                category: "Creator Fund".to_string(),
                group: "Programmes".to_string(),
                quarterly: 0.0,
                semester: 200_000.0,
                shared_id: Some("eco_pool".to_string()),
            },
            BudgetAllocation {
                category: "Founder Fund".to_string(),
                group: "Programmes".to_string(),
                quarterly: 0.0,
                semester: 200_000.0,
                shared_id: Some("eco_pool".to_string()),
            },
        ]
    }

    fn all_categories() -> Vec<String> {
        [
            "Uncategorised",
            "Ops",
            "Delegates",
            "Creator Fund",
            "Founder Fund",
            "Sundries",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn budget_ratio_and_display_cap() {
        let rows = vec![row("Ops", "USDC", "out", 1, Some(300_000.0), MARCH)];
        let cmp = budget_comparison(
            &rows,
            &all_categories(),
            &sample_budgets(),
            &HashMap::new(),
            "ETH",
            1.5,
        );
        let ops = cmp.lines.iter().find(|l| l.category == "Ops").unwrap();
        assert_eq!(ops.ratio_used, 2.0);
        assert_eq!(ops.display_ratio, 1.5);
        assert_eq!(ops.spent_usd, 300_000.0);
    }

    #[test]
    fn budget_zero_ceiling_never_divides() {
        let rows = vec![row("Delegates", "USDC", "out", 1, Some(10_000.0), MARCH)];
        let cmp = budget_comparison(
            &rows,
            &all_categories(),
            &sample_budgets(),
            &HashMap::new(),
            "ETH",
            1.5,
        );
        let line = cmp.lines.iter().find(|l| l.category == "Delegates").unwrap();
        assert_eq!(line.ratio_used, 0.0);
        assert_eq!(line.spent_usd, 10_000.0);
    }

    #[test]
    fn budget_shared_pool_sums_members() {
        let rows = vec![
            row("Creator Fund", "USDC", "out", 1, Some(120_000.0), MARCH),
            row("Founder Fund", "USDC", "out", 1, Some(30_000.0), MARCH),
        ];
        let cmp = budget_comparison(
            &rows,
            &all_categories(),
            &sample_budgets(),
            &HashMap::new(),
            "ETH",
            1.5,
        );
        assert_eq!(cmp.shared_pools.len(), 1);
        let pool = &cmp.shared_pools[0];
        assert_eq!(pool.shared_id, "eco_pool");
        assert_eq!(pool.spent_usd, 150_000.0);
        assert_eq!(pool.ceiling, 200_000.0);
        assert_eq!(pool.ratio_used, 0.75);
        assert_eq!(pool.categories.len(), 2);
    }

    #[test]
    fn budget_groups_ordered_with_other_last() {
        let cmp = budget_comparison(
            &[],
            &all_categories(),
            &sample_budgets(),
            &HashMap::new(),
            "ETH",
            1.5,
        );
        assert_eq!(cmp.groups, vec!["Operations", "Programmes", "Other"]);
        // Sentinel excluded, every other configured category reported
        assert_eq!(cmp.lines.len(), 5);
        let last = cmp.lines.last().unwrap();
        assert_eq!(last.category, "Sundries");
        assert_eq!(last.group, "Other");
        assert_eq!(last.ratio_used, 0.0);
    }

    #[test]
    fn budget_total_is_sum_of_lines() {
        let rows = vec![
            row("Ops", "USDC", "out", 1, Some(1_000.0), MARCH),
            row("Sundries", "USDC", "out", 1, Some(500.0), MARCH),
        ];
        let cmp = budget_comparison(
            &rows,
            &all_categories(),
            &sample_budgets(),
            &HashMap::new(),
            "ETH",
            1.5,
        );
        assert_eq!(cmp.total_spent_usd, 1_500.0);
    }
}
