// 3.0 lifecycle.rs: the stock status state machine.
// legal edges: Unlisted -> Listed (one way), Listed <-> Halted. delete only from Unlisted.
// validate_* run locally before any remote call; apply_* mutate a confirmed copy.

use crate::stock::{ListedQuote, Stock, StockFields, StockStatus};
use crate::types::{Price, StockCode, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The admin operations that drive status transitions. Also used by the
/// action log to label entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminAction {
    Create,
    Edit,
    Delete,
    List,
    Halt,
    Resume,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("{action:?} is not legal for {code} while {status:?}")]
    InvalidTransition {
        code: StockCode,
        status: StockStatus,
        action: AdminAction,
    },

    #[error("reference price {0} must be positive")]
    InvalidReferencePrice(Decimal),

    #[error("share count must be positive")]
    InvalidShareCount,
}

/// Check that `stock` may be listed at `reference_price`.
///
/// Validation order matters: a bad status is reported before a bad price,
/// so a halted stock with price 0 fails with `InvalidTransition`.
pub fn validate_list(stock: &Stock, reference_price: Decimal) -> Result<Price, LifecycleError> {
    if !stock.is_unlisted() {
        return Err(LifecycleError::InvalidTransition {
            code: stock.code.clone(),
            status: stock.status,
            action: AdminAction::List,
        });
    }
    Price::new(reference_price).ok_or(LifecycleError::InvalidReferencePrice(reference_price))
}

/// Admit the stock to trading with the engine-confirmed price band.
/// Unlisted -> Listed is the one-way edge: there is no unlist.
pub fn apply_list(stock: &mut Stock, quote: ListedQuote, timestamp: Timestamp) {
    debug_assert!(stock.is_unlisted());
    stock.status = StockStatus::Listed;
    stock.quote = Some(quote);
    stock.updated_at = timestamp;
}

pub fn validate_halt(stock: &Stock) -> Result<(), LifecycleError> {
    if stock.is_listed() {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition {
            code: stock.code.clone(),
            status: stock.status,
            action: AdminAction::Halt,
        })
    }
}

pub fn apply_halt(stock: &mut Stock, timestamp: Timestamp) {
    debug_assert!(stock.is_listed());
    stock.status = StockStatus::Halted;
    stock.updated_at = timestamp;
}

pub fn validate_resume(stock: &Stock) -> Result<(), LifecycleError> {
    if stock.is_halted() {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition {
            code: stock.code.clone(),
            status: stock.status,
            action: AdminAction::Resume,
        })
    }
}

pub fn apply_resume(stock: &mut Stock, timestamp: Timestamp) {
    debug_assert!(stock.is_halted());
    stock.status = StockStatus::Listed;
    stock.updated_at = timestamp;
}

/// Deletion is an exit transition legal only from Unlisted. The UI hides the
/// delete control for listed stocks, but that is not a trust boundary, so the
/// check is repeated here and again engine-side.
pub fn validate_delete(stock: &Stock) -> Result<(), LifecycleError> {
    if stock.is_unlisted() {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition {
            code: stock.code.clone(),
            status: stock.status,
            action: AdminAction::Delete,
        })
    }
}

/// Company attributes are editable in every status; the code never is
/// (structurally: `StockFields` has no code).
pub fn apply_edit(stock: &mut Stock, fields: StockFields, timestamp: Timestamp) {
    stock.company_name = fields.company_name;
    stock.address = fields.address;
    stock.share_count = fields.share_count;
    stock.updated_at = timestamp;
}

/// True iff `from -> to` is one of the three legal status edges.
pub fn is_legal_edge(from: StockStatus, to: StockStatus) -> bool {
    matches!(
        (from, to),
        (StockStatus::Unlisted, StockStatus::Listed)
            | (StockStatus::Listed, StockStatus::Halted)
            | (StockStatus::Halted, StockStatus::Listed)
    )
}
