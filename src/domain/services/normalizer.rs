//! Raw explorer transactions to normalized rows, and holdings folding.
//!
//! Everything here is pure. No persistence happens in this module; the
//! ingestion pipeline decides what to save.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::domain::models::{Direction, NewTransaction, TxKind};
use crate::infrastructure::explorer::RawTx;
use crate::infrastructure::persistence::entities::transactions;

/// Fallback symbol for token transfers the explorer reports without one
const UNKNOWN_SYMBOL: &str = "UNKNOWN";
const UNKNOWN_NAME: &str = "Unknown Token";

/// Normalize one raw explorer transaction for the given wallet.
///
/// Direction derives from a case-insensitive comparison of the sender
/// against the wallet's address. Fiat fields start out unset; the pipeline
/// prices rows after insertion planning.
pub fn normalize(
    raw: &RawTx,
    wallet_id: &str,
    wallet_address: &str,
    native_symbol: &str,
) -> NewTransaction {
    let direction = if raw.from.eq_ignore_ascii_case(wallet_address) {
        Direction::Out
    } else {
        Direction::In
    };

    let contract = raw
        .contract_address
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string());

    let (kind, token_symbol, token_name, token_decimals) = match &contract {
        Some(_) => (
            TxKind::Token,
            raw.token_symbol
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
            raw.token_name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            raw.token_decimals.unwrap_or(18),
        ),
        None => {
            let kind = if raw.internal {
                TxKind::Internal
            } else if raw.has_call_data() {
                TxKind::ContractCall
            } else {
                TxKind::Transfer
            };
            (
                kind,
                native_symbol.to_string(),
                native_symbol.to_string(),
                18,
            )
        }
    };

    NewTransaction {
        wallet_id: wallet_id.to_string(),
        tx_hash: raw.hash.clone(),
        block_number: raw.block_number as i64,
        timestamp: raw.timestamp,
        from_address: raw.from.clone(),
        to_address: raw.to.clone(),
        value_raw: raw.value.clone(),
        value_decimal: scale_amount(&raw.value, token_decimals),
        token_symbol,
        token_name,
        token_decimals: token_decimals as i32,
        contract_address: contract,
        kind,
        direction,
        is_error: raw.is_error,
        fiat_value: None,
        native_value: None,
    }
}

/// Scale a raw integer amount by the token's decimals.
///
/// Unparsable or out-of-range amounts collapse to zero rather than failing
/// the page; the raw string is still stored verbatim.
pub fn scale_amount(raw: &str, decimals: u32) -> Decimal {
    let Ok(mut value) = Decimal::from_str(raw) else {
        return Decimal::ZERO;
    };
    if value.set_scale(decimals).is_err() {
        return Decimal::ZERO;
    }
    value.normalize()
}

/// Express a decimal amount back in the token's smallest unit, truncating
/// any fractional remainder. Amounts the raw representation cannot hold
/// collapse to "0".
pub fn unscale_amount(amount: Decimal, decimals: u32) -> String {
    if decimals > 28 {
        return "0".to_string();
    }
    let factor = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);
    match amount.checked_mul(factor) {
        Some(scaled) => scaled.trunc().normalize().to_string(),
        None => "0".to_string(),
    }
}

/// Current holdings of one token, folded from stored transactions
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub token_symbol: String,
    pub token_name: String,
    pub contract_address: Option<String>,
    pub token_decimals: i32,
    pub amount: Decimal,
}

/// Fold stored rows into signed per-token holdings.
///
/// Incoming amounts add, outgoing subtract; failed transactions are skipped.
/// Tokens are returned in order of first appearance.
pub fn fold_holdings(rows: &[transactions::Model]) -> Vec<Holding> {
    let mut holdings: Vec<Holding> = Vec::new();

    for row in rows {
        if row.is_error {
            continue;
        }
        let signed = match Direction::parse(&row.direction) {
            Some(Direction::In) => row.value_decimal,
            Some(Direction::Out) => -row.value_decimal,
            None => continue,
        };

        match holdings
            .iter_mut()
            .find(|h| h.token_symbol == row.token_symbol)
        {
            Some(holding) => holding.amount += signed,
            None => holdings.push(Holding {
                token_symbol: row.token_symbol.clone(),
                token_name: row.token_name.clone(),
                contract_address: row.contract_address.clone(),
                token_decimals: row.token_decimals,
                amount: signed,
            }),
        }
    }

    holdings
}
