//! Error handling for lotgains
//!
//! Defines custom error types and establishes a unified Result type
//! using anyhow for context chaining and error propagation.

use rust_decimal::Decimal;
use thiserror::Error;

/// Fatal inconsistencies in the position ledger.
///
/// These abort the run: a reduction against missing inventory means the
/// cost-basis numbers downstream would be silently wrong.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(
        "insufficient inventory in {account}: reducing {requested} {instrument} \
         but only {available} available"
    )]
    InsufficientInventory {
        account: String,
        instrument: String,
        requested: Decimal,
        available: Decimal,
    },
}

/// A single diagnostic from loading a ledger file.
///
/// Load errors are advisory: the run continues with whatever entries parsed.
#[derive(Error, Debug)]
#[error("line {line}: {message}")]
pub struct LoadError {
    pub line: usize,
    pub message: String,
}

/// Result type alias for report operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ledger_error_formatting_is_readable() {
        let err = LedgerError::InsufficientInventory {
            account: "Assets:US:Broker:UMMY".to_string(),
            instrument: "UMMY".to_string(),
            requested: dec!(150),
            available: dec!(100),
        };
        let msg = err.to_string();
        assert!(msg.contains("Assets:US:Broker:UMMY"));
        assert!(msg.contains("150"));
        assert!(msg.contains("only 100 available"));
    }

    #[test]
    fn test_load_error_carries_line_number() {
        let err = LoadError {
            line: 42,
            message: "unparseable posting".to_string(),
        };
        assert_eq!(err.to_string(), "line 42: unparseable posting");
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> =
            Err(anyhow::anyhow!("original error")).context("failed to process transaction");
        match result {
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.contains("failed to process transaction"));
                let debug_msg = format!("{:?}", e);
                assert!(debug_msg.contains("original error") || msg.contains("original error"));
            }
            Ok(_) => panic!("expected error"),
        }
    }
}
