// 6.0 remote.rs: the external trading/persistence engine boundary.
// MOCKED. in-memory, would be REST/RPC calls in prod. the engine owns the
// authoritative stock records, the server-side undo log, and the daily band
// policy; this subsystem only talks to it through the trait below.

use crate::action_log::{ActionLogEntry, EntryId};
use crate::lifecycle::{self, AdminAction};
use crate::session::MatchingPhase;
use crate::stock::{ListedQuote, Stock, StockFields, StockStatus};
use crate::types::{Price, StockCode, Timestamp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("stock {0} not found")]
    StockNotFound(StockCode),

    #[error("stock {0} already exists")]
    DuplicateCode(StockCode),

    #[error("engine rejected the operation: {0}")]
    Rejected(String),

    #[error("engine rejected the undo: {0}")]
    UndoRejected(String),

    #[error("engine failure: {0}")]
    Failure(String),
}

/// Summary of a matching round, as reported by the engine. Fill computation
/// lives entirely engine-side; only the outcome crosses this boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub phase: MatchingPhase,
    pub orders_matched: u32,
    pub shares_traded: u64,
    pub total_value: Decimal,
}

/// Operations consumed from the external engine. Every call is a network
/// round-trip in production; callers must treat each result as the only
/// source of truth for what actually happened.
pub trait TradingEngine {
    fn create_stock(&mut self, stock: &Stock) -> Result<Stock, RemoteError>;
    fn list_stock(&mut self, code: &StockCode, reference_price: Price) -> Result<Stock, RemoteError>;
    fn halt_stock(&mut self, code: &StockCode) -> Result<Stock, RemoteError>;
    fn resume_stock(&mut self, code: &StockCode) -> Result<Stock, RemoteError>;
    fn delete_stock(&mut self, code: &StockCode) -> Result<(), RemoteError>;
    fn edit_stock(&mut self, code: &StockCode, fields: &StockFields) -> Result<Stock, RemoteError>;
    fn run_matching_phase(&mut self, phase: MatchingPhase) -> Result<MatchResult, RemoteError>;
    fn prepare_next_trading_day(&mut self) -> Result<(), RemoteError>;
    fn prepare_today(&mut self) -> Result<(), RemoteError>;
    fn undo_last_action(&mut self) -> Result<(), RemoteError>;
    fn list_all_undo_log_entries(&self) -> Result<Vec<ActionLogEntry>, RemoteError>;
    fn get_all_stocks(&self, status_filter: Option<StockStatus>) -> Result<Vec<Stock>, RemoteError>;
}

/// In-memory stand-in for the real engine.
///
/// Implements the band policy (HOSE daily band, ±7% of reference), keeps an
/// authoritative undo log, and offers failure injection plus a dispatch
/// trace so tests can assert which calls actually reached the wire.
#[derive(Debug)]
pub struct MockTradingEngine {
    stocks: BTreeMap<StockCode, Stock>,
    undo_log: Vec<ActionLogEntry>,
    next_entry_id: u64,
    now: Timestamp,
    fail_next: Option<String>,
    reject_next_undo: Option<String>,
    calls: Vec<&'static str>,
}

const DAILY_BAND: Decimal = dec!(0.07);

impl Default for MockTradingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTradingEngine {
    pub fn new() -> Self {
        Self {
            stocks: BTreeMap::new(),
            undo_log: Vec::new(),
            next_entry_id: 1,
            now: Timestamp::from_millis(0),
            fail_next: None,
            reject_next_undo: None,
            calls: Vec::new(),
        }
    }

    pub fn set_time(&mut self, now: Timestamp) {
        self.now = now;
    }

    /// Make the next dispatched call fail with `reason`.
    pub fn fail_next(&mut self, reason: &str) {
        self.fail_next = Some(reason.to_string());
    }

    /// Make the next undo request come back rejected, as if server-side
    /// history had diverged from this client.
    pub fn reject_next_undo(&mut self, reason: &str) {
        self.reject_next_undo = Some(reason.to_string());
    }

    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    pub fn dispatch_count(&self, op: &str) -> usize {
        self.calls.iter().filter(|c| **c == op).count()
    }

    /// Seed a server-log entry directly, bypassing the normal operations.
    /// Test hook for building divergence scenarios.
    pub fn push_server_entry(
        &mut self,
        action: AdminAction,
        code: StockCode,
        before: Option<Stock>,
        after: Option<Stock>,
    ) -> EntryId {
        if let Some(stock) = &after {
            self.stocks.insert(code.clone(), stock.clone());
        }
        self.push_entry(action, code, before, after)
    }

    fn push_entry(
        &mut self,
        action: AdminAction,
        code: StockCode,
        before: Option<Stock>,
        after: Option<Stock>,
    ) -> EntryId {
        let id = EntryId(self.next_entry_id);
        self.next_entry_id += 1;
        self.undo_log.push(ActionLogEntry {
            id,
            timestamp: self.now,
            action,
            code,
            before,
            after,
        });
        id
    }

    fn dispatch(&mut self, op: &'static str) -> Result<(), RemoteError> {
        self.calls.push(op);
        match self.fail_next.take() {
            Some(reason) => Err(RemoteError::Failure(reason)),
            None => Ok(()),
        }
    }

    fn quote_for(reference: Price) -> ListedQuote {
        let r = reference.value();
        // reference is strictly positive, so both band edges are too
        ListedQuote {
            reference,
            ceiling: Price::new_unchecked(r * (Decimal::ONE + DAILY_BAND)),
            floor: Price::new_unchecked(r * (Decimal::ONE - DAILY_BAND)),
            last_traded: None,
        }
    }

    fn get(&self, code: &StockCode) -> Result<Stock, RemoteError> {
        self.stocks
            .get(code)
            .cloned()
            .ok_or_else(|| RemoteError::StockNotFound(code.clone()))
    }
}

impl TradingEngine for MockTradingEngine {
    fn create_stock(&mut self, stock: &Stock) -> Result<Stock, RemoteError> {
        self.dispatch("create_stock")?;
        if self.stocks.contains_key(&stock.code) {
            return Err(RemoteError::DuplicateCode(stock.code.clone()));
        }
        let mut created = stock.clone();
        created.status = StockStatus::Unlisted;
        created.quote = None;
        created.updated_at = self.now;
        self.stocks.insert(created.code.clone(), created.clone());
        self.push_entry(AdminAction::Create, created.code.clone(), None, Some(created.clone()));
        Ok(created)
    }

    fn list_stock(&mut self, code: &StockCode, reference_price: Price) -> Result<Stock, RemoteError> {
        self.dispatch("list_stock")?;
        let before = self.get(code)?;
        // the client check is not a trust boundary; the engine runs the same
        // state machine on its side
        lifecycle::validate_list(&before, reference_price.value())
            .map_err(|e| RemoteError::Rejected(e.to_string()))?;
        let mut after = before.clone();
        lifecycle::apply_list(&mut after, Self::quote_for(reference_price), self.now);
        self.stocks.insert(code.clone(), after.clone());
        self.push_entry(AdminAction::List, code.clone(), Some(before), Some(after.clone()));
        Ok(after)
    }

    fn halt_stock(&mut self, code: &StockCode) -> Result<Stock, RemoteError> {
        self.dispatch("halt_stock")?;
        let before = self.get(code)?;
        lifecycle::validate_halt(&before).map_err(|e| RemoteError::Rejected(e.to_string()))?;
        let mut after = before.clone();
        lifecycle::apply_halt(&mut after, self.now);
        self.stocks.insert(code.clone(), after.clone());
        self.push_entry(AdminAction::Halt, code.clone(), Some(before), Some(after.clone()));
        Ok(after)
    }

    fn resume_stock(&mut self, code: &StockCode) -> Result<Stock, RemoteError> {
        self.dispatch("resume_stock")?;
        let before = self.get(code)?;
        lifecycle::validate_resume(&before).map_err(|e| RemoteError::Rejected(e.to_string()))?;
        let mut after = before.clone();
        lifecycle::apply_resume(&mut after, self.now);
        self.stocks.insert(code.clone(), after.clone());
        self.push_entry(AdminAction::Resume, code.clone(), Some(before), Some(after.clone()));
        Ok(after)
    }

    fn delete_stock(&mut self, code: &StockCode) -> Result<(), RemoteError> {
        self.dispatch("delete_stock")?;
        let before = self.get(code)?;
        lifecycle::validate_delete(&before).map_err(|e| RemoteError::Rejected(e.to_string()))?;
        self.stocks.remove(code);
        self.push_entry(AdminAction::Delete, code.clone(), Some(before), None);
        Ok(())
    }

    fn edit_stock(&mut self, code: &StockCode, fields: &StockFields) -> Result<Stock, RemoteError> {
        self.dispatch("edit_stock")?;
        let before = self.get(code)?;
        let mut after = before.clone();
        lifecycle::apply_edit(&mut after, fields.clone(), self.now);
        self.stocks.insert(code.clone(), after.clone());
        self.push_entry(AdminAction::Edit, code.clone(), Some(before), Some(after.clone()));
        Ok(after)
    }

    fn run_matching_phase(&mut self, phase: MatchingPhase) -> Result<MatchResult, RemoteError> {
        self.dispatch("run_matching_phase")?;

        // simplistic round: every listed stock trades one lot at reference
        let mut orders_matched = 0;
        let mut shares_traded = 0;
        let mut total_value = Decimal::ZERO;
        for stock in self.stocks.values_mut() {
            if stock.status != StockStatus::Listed {
                continue;
            }
            if let Some(quote) = &mut stock.quote {
                quote.last_traded = Some(quote.reference);
                orders_matched += 1;
                shares_traded += 100;
                total_value += quote.reference.value() * dec!(100);
            }
        }

        Ok(MatchResult {
            phase,
            orders_matched,
            shares_traded,
            total_value,
        })
    }

    fn prepare_next_trading_day(&mut self) -> Result<(), RemoteError> {
        self.dispatch("prepare_next_trading_day")?;
        // yesterday's close becomes today's reference; bands re-derived
        for stock in self.stocks.values_mut() {
            if let Some(quote) = &mut stock.quote {
                let reference = quote.last_traded.unwrap_or(quote.reference);
                *quote = Self::quote_for(reference);
            }
        }
        Ok(())
    }

    fn prepare_today(&mut self) -> Result<(), RemoteError> {
        self.dispatch("prepare_today")
    }

    fn undo_last_action(&mut self) -> Result<(), RemoteError> {
        self.dispatch("undo_last_action")?;
        if let Some(reason) = self.reject_next_undo.take() {
            return Err(RemoteError::UndoRejected(reason));
        }
        let entry = self
            .undo_log
            .pop()
            .ok_or_else(|| RemoteError::UndoRejected("server undo log is empty".to_string()))?;

        // apply the inverse: restore the prior snapshot, or remove on create
        match entry.before {
            Some(before) => {
                self.stocks.insert(entry.code.clone(), before);
            }
            None => {
                self.stocks.remove(&entry.code);
            }
        }
        Ok(())
    }

    fn list_all_undo_log_entries(&self) -> Result<Vec<ActionLogEntry>, RemoteError> {
        Ok(self.undo_log.clone())
    }

    fn get_all_stocks(&self, status_filter: Option<StockStatus>) -> Result<Vec<Stock>, RemoteError> {
        Ok(self
            .stocks
            .values()
            .filter(|s| status_filter.map_or(true, |f| s.status == f))
            .cloned()
            .collect())
    }
}
