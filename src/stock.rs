//! Stock records and trading-eligibility status.
//!
//! A stock starts Unlisted, gets listed exactly once, and afterwards can only
//! oscillate between Listed and Halted. Price fields live inside
//! [`ListedQuote`], which exists iff the stock has been listed, so "prices are
//! meaningful only when listed" holds by construction.

use crate::types::{Price, ShareCount, StockCode, Timestamp};
use serde::{Deserialize, Serialize};

/// Trading-eligibility status. Wire codes follow the back end:
/// 0 = unlisted, 1 = listed, 2 = halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    /// Registered but not yet admitted to trading
    Unlisted,
    /// Admitted and tradable
    Listed,
    /// Admitted but trading suspended
    Halted,
}

impl StockStatus {
    pub fn code(&self) -> u8 {
        match self {
            StockStatus::Unlisted => 0,
            StockStatus::Listed => 1,
            StockStatus::Halted => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(StockStatus::Unlisted),
            1 => Some(StockStatus::Listed),
            2 => Some(StockStatus::Halted),
            _ => None,
        }
    }
}

impl Default for StockStatus {
    fn default() -> Self {
        Self::Unlisted
    }
}

/// Price band attached to a listed stock. The ceiling and floor are derived
/// from the reference price by the engine's band policy; this subsystem only
/// stores what the engine confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedQuote {
    pub reference: Price,
    pub ceiling: Price,
    pub floor: Price,
    /// Last traded price, None until the first match of the day
    pub last_traded: Option<Price>,
}

/// A stock instrument as cached by the admin session.
///
/// The external engine owns the record; this is a confirmed-write copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub code: StockCode,
    pub company_name: String,
    pub address: String,
    pub share_count: ShareCount,
    pub status: StockStatus,
    /// Some iff status != Unlisted
    pub quote: Option<ListedQuote>,
    pub updated_at: Timestamp,
}

impl Stock {
    /// A freshly registered, unlisted stock with no price band.
    pub fn unlisted(
        code: StockCode,
        company_name: String,
        address: String,
        share_count: ShareCount,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            code,
            company_name,
            address,
            share_count,
            status: StockStatus::Unlisted,
            quote: None,
            updated_at: timestamp,
        }
    }

    pub fn is_listed(&self) -> bool {
        self.status == StockStatus::Listed
    }

    pub fn is_halted(&self) -> bool {
        self.status == StockStatus::Halted
    }

    pub fn is_unlisted(&self) -> bool {
        self.status == StockStatus::Unlisted
    }
}

/// Editable attributes. The code is deliberately absent: it is fixed at
/// creation and no edit path can change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockFields {
    pub company_name: String,
    pub address: String,
    pub share_count: ShareCount,
}

impl StockFields {
    pub fn from_stock(stock: &Stock) -> Self {
        Self {
            company_name: stock.company_name.clone(),
            address: stock.address.clone(),
            share_count: stock.share_count,
        }
    }
}
