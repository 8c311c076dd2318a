// 2.0 workflow.rs: the admin workflow. composes lifecycle, session, and the
// action log against the external engine, and owns the cached stock
// collection the UI reads.
//
// caching is confirmed-write: local validation runs first (no wasted round
// trip), the remote call decides the outcome, and the cache mutates only
// after the engine acknowledges. a failed call leaves the cache at the last
// known-good remote state.

use crate::action_log::{ActionLog, ActionLogError};
use crate::config::AdminConfig;
use crate::lifecycle::{self, AdminAction, LifecycleError};
use crate::remote::{MatchResult, RemoteError, TradingEngine};
use crate::session::{
    MatchingPhase, PhaseOutcome, SessionController, SessionError, SessionMode, SessionPhase,
};
use crate::stock::{Stock, StockFields, StockStatus};
use crate::types::{StockCode, Timestamp};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Undo(#[from] ActionLogError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("stock {0} is not in the cached collection")]
    StockNotFound(StockCode),

    #[error("stock {0} already exists")]
    DuplicateCode(StockCode),

    #[error("a request for {0} is already in flight")]
    StockBusy(StockCode),
}

/// Orchestrates UI-triggered admin actions.
///
/// Owns the session's in-memory state exclusively: the confirmed-write stock
/// cache, the local action log, and the session controller. Nothing else
/// mutates them.
#[derive(Debug)]
pub struct AdminWorkflow<E: TradingEngine> {
    engine: E,
    config: AdminConfig,
    session: SessionController,
    log: ActionLog,
    stocks: BTreeMap<StockCode, Stock>,
    /// Stocks with a request awaiting its round-trip. The embedding UI marks
    /// a stock here while its call is unresolved (mirroring disabled
    /// controls); a second operation on a marked stock fails with StockBusy
    /// before any dispatch.
    pending: HashSet<StockCode>,
    last_error: Option<String>,
    current_time: Timestamp,
}

impl<E: TradingEngine> AdminWorkflow<E> {
    pub fn new(engine: E, config: AdminConfig) -> Self {
        let session = SessionController::new(config.clone());
        let log = ActionLog::new(config.max_log_entries);
        Self {
            engine,
            config,
            session,
            log,
            stocks: BTreeMap::new(),
            pending: HashSet::new(),
            last_error: None,
            current_time: Timestamp::from_millis(0),
        }
    }

    // ---- clock --------------------------------------------------------

    pub fn set_time(&mut self, now: Timestamp) {
        self.current_time = now;
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    /// Drive the auto-mode scheduler off the current clock.
    pub fn tick(&mut self) -> Option<SessionPhase> {
        self.session.advance_auto(self.current_time)
    }

    // ---- view accessors -----------------------------------------------

    /// Cached stocks, optionally filtered by status, ordered by code.
    pub fn stocks(&self, status_filter: Option<StockStatus>) -> Vec<&Stock> {
        self.stocks
            .values()
            .filter(|s| status_filter.map_or(true, |f| s.status == f))
            .collect()
    }

    pub fn get_stock(&self, code: &StockCode) -> Option<&Stock> {
        self.stocks.get(code)
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn mode(&self) -> SessionMode {
        self.session.mode()
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    // ---- per-stock request marking ------------------------------------

    /// Mark a stock as having an unresolved request. In this synchronous
    /// core every operation completes before returning; hosts that interleave
    /// awaited requests use these marks to serialize per-stock operations.
    pub fn mark_pending(&mut self, code: &StockCode) {
        self.pending.insert(code.clone());
    }

    pub fn clear_pending(&mut self, code: &StockCode) {
        self.pending.remove(code);
    }

    pub fn is_pending(&self, code: &StockCode) -> bool {
        self.pending.contains(code)
    }

    // ---- stock CRUD and lifecycle -------------------------------------

    /// Register a new, unlisted stock.
    pub fn add_stock(&mut self, code: StockCode, fields: StockFields) -> Result<Stock, AdminError> {
        let result = self.add_stock_inner(code, fields);
        self.track(result)
    }

    fn add_stock_inner(&mut self, code: StockCode, fields: StockFields) -> Result<Stock, AdminError> {
        self.ensure_free(&code)?;
        if self.stocks.contains_key(&code) {
            return Err(AdminError::DuplicateCode(code));
        }
        let candidate = Stock::unlisted(
            code,
            fields.company_name,
            fields.address,
            fields.share_count,
            self.current_time,
        );
        let created = self.engine.create_stock(&candidate)?;
        self.stocks.insert(created.code.clone(), created.clone());
        self.log.record(
            AdminAction::Create,
            created.code.clone(),
            None,
            Some(created.clone()),
            self.current_time,
        );
        Ok(created)
    }

    /// Edit company attributes. Legal in any status; the code is immutable.
    pub fn edit_stock(&mut self, code: &StockCode, fields: StockFields) -> Result<Stock, AdminError> {
        let result = self.edit_stock_inner(code, fields);
        self.track(result)
    }

    fn edit_stock_inner(&mut self, code: &StockCode, fields: StockFields) -> Result<Stock, AdminError> {
        self.ensure_free(code)?;
        let before = self.cached(code)?;
        let after = self.engine.edit_stock(code, &fields)?;
        self.stocks.insert(code.clone(), after.clone());
        self.log.record(
            AdminAction::Edit,
            code.clone(),
            Some(before),
            Some(after.clone()),
            self.current_time,
        );
        Ok(after)
    }

    /// Delete an unlisted stock. Listed or halted stocks cannot be deleted.
    pub fn delete_stock(&mut self, code: &StockCode) -> Result<(), AdminError> {
        let result = self.delete_stock_inner(code);
        self.track(result)
    }

    fn delete_stock_inner(&mut self, code: &StockCode) -> Result<(), AdminError> {
        self.ensure_free(code)?;
        let before = self.cached(code)?;
        lifecycle::validate_delete(&before)?;
        self.engine.delete_stock(code)?;
        self.stocks.remove(code);
        self.log.record(
            AdminAction::Delete,
            code.clone(),
            Some(before),
            None,
            self.current_time,
        );
        Ok(())
    }

    /// Admit an unlisted stock to trading at `reference_price`. The price
    /// band is derived engine-side; the confirmed record lands in the cache.
    pub fn list_stock(&mut self, code: &StockCode, reference_price: Decimal) -> Result<Stock, AdminError> {
        let result = self.list_stock_inner(code, reference_price);
        self.track(result)
    }

    fn list_stock_inner(&mut self, code: &StockCode, reference_price: Decimal) -> Result<Stock, AdminError> {
        self.ensure_free(code)?;
        let before = self.cached(code)?;
        let price = lifecycle::validate_list(&before, reference_price)?;
        let after = self.engine.list_stock(code, price)?;
        self.stocks.insert(code.clone(), after.clone());
        self.log.record(
            AdminAction::List,
            code.clone(),
            Some(before),
            Some(after.clone()),
            self.current_time,
        );
        Ok(after)
    }

    /// Suspend trading in a listed stock.
    pub fn halt_stock(&mut self, code: &StockCode) -> Result<Stock, AdminError> {
        let result = self.halt_stock_inner(code);
        self.track(result)
    }

    fn halt_stock_inner(&mut self, code: &StockCode) -> Result<Stock, AdminError> {
        self.ensure_free(code)?;
        let before = self.cached(code)?;
        lifecycle::validate_halt(&before)?;
        let after = self.engine.halt_stock(code)?;
        self.stocks.insert(code.clone(), after.clone());
        self.log.record(
            AdminAction::Halt,
            code.clone(),
            Some(before),
            Some(after.clone()),
            self.current_time,
        );
        Ok(after)
    }

    /// Resume trading in a halted stock.
    pub fn resume_stock(&mut self, code: &StockCode) -> Result<Stock, AdminError> {
        let result = self.resume_stock_inner(code);
        self.track(result)
    }

    fn resume_stock_inner(&mut self, code: &StockCode) -> Result<Stock, AdminError> {
        self.ensure_free(code)?;
        let before = self.cached(code)?;
        lifecycle::validate_resume(&before)?;
        let after = self.engine.resume_stock(code)?;
        self.stocks.insert(code.clone(), after.clone());
        self.log.record(
            AdminAction::Resume,
            code.clone(),
            Some(before),
            Some(after.clone()),
            self.current_time,
        );
        Ok(after)
    }

    // ---- undo ---------------------------------------------------------

    /// Undo the most recent admin mutation.
    ///
    /// On engine rejection the local history is re-seeded from the server
    /// log before the error is surfaced, so a retry starts from server truth
    /// rather than a diverged cache.
    pub fn undo(&mut self) -> Result<(), AdminError> {
        let result = self.undo_inner();
        self.track(result)
    }

    fn undo_inner(&mut self) -> Result<(), AdminError> {
        match self.log.undo(&mut self.engine) {
            Ok(entry) => {
                match entry.undo_restores() {
                    Some(before) => {
                        self.stocks.insert(entry.code.clone(), before.clone());
                    }
                    None => {
                        self.stocks.remove(&entry.code);
                    }
                }
                Ok(())
            }
            Err(ActionLogError::NothingToUndo) => Err(ActionLogError::NothingToUndo.into()),
            Err(err) => {
                // rejected or failed remotely: local history may be stale;
                // resync everything before the user retries
                self.reload_inner()?;
                Err(err.into())
            }
        }
    }

    /// Discard local history and cache, re-seeding both from the engine.
    pub fn reload(&mut self) -> Result<(), AdminError> {
        let result = self.reload_inner();
        self.track(result)
    }

    fn reload_inner(&mut self) -> Result<(), AdminError> {
        self.log.reload(&self.engine)?;
        self.refresh_stocks_inner()?;
        Ok(())
    }

    /// Re-fetch the stock collection without touching the action log.
    pub fn refresh_stocks(&mut self) -> Result<(), AdminError> {
        let result = self.refresh_stocks_inner();
        self.track(result)
    }

    fn refresh_stocks_inner(&mut self) -> Result<(), AdminError> {
        let stocks = self.engine.get_all_stocks(None)?;
        self.stocks = stocks.into_iter().map(|s| (s.code.clone(), s)).collect();
        Ok(())
    }

    // ---- session control ----------------------------------------------

    /// Switch between auto-run and manual phase stepping.
    pub fn set_auto_mode(&mut self, enabled: bool) {
        let mode = if enabled { SessionMode::Auto } else { SessionMode::Manual };
        self.session.set_mode(mode);
    }

    /// Dispatch a matching round for `phase`. Globally serialized: a second
    /// call while one is unresolved fails with `Busy` and never reaches the
    /// engine.
    pub fn run_phase(&mut self, phase: MatchingPhase) -> Result<MatchResult, AdminError> {
        let result = self.run_phase_inner(phase);
        self.track(result)
    }

    fn run_phase_inner(&mut self, phase: MatchingPhase) -> Result<MatchResult, AdminError> {
        let ticket = self.session.begin_phase(phase)?;
        match self.engine.run_matching_phase(phase) {
            Ok(result) => {
                self.session.finish_phase(ticket, PhaseOutcome::Completed);
                // pick up last-traded prices the round produced
                self.refresh_stocks_inner()?;
                Ok(result)
            }
            Err(err) => {
                self.session.finish_phase(ticket, PhaseOutcome::Failed);
                Err(err.into())
            }
        }
    }

    /// Seam access to the session controller, for hosts that hold a phase
    /// ticket across an await point.
    pub fn session_mut(&mut self) -> &mut SessionController {
        &mut self.session
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Roll the session over to the next trading day. Refused during the
    /// configured trading window.
    pub fn prepare_next_day(&mut self) -> Result<(), AdminError> {
        let result = self.prepare_next_day_inner();
        self.track(result)
    }

    fn prepare_next_day_inner(&mut self) -> Result<(), AdminError> {
        self.session.check_rollover_window(self.current_time)?;
        self.engine.prepare_next_trading_day()?;
        // cannot fail after the window check above
        self.session.prepare_next_day(self.current_time)?;
        self.refresh_stocks_inner()?;
        Ok(())
    }

    /// Seed today's opening prices. Once per trading date.
    pub fn prepare_today(&mut self) -> Result<(), AdminError> {
        let result = self.prepare_today_inner();
        self.track(result)
    }

    fn prepare_today_inner(&mut self) -> Result<(), AdminError> {
        self.session.check_prepare_today(self.current_time)?;
        self.engine.prepare_today()?;
        self.session.prepare_today(self.current_time)?;
        Ok(())
    }

    // ---- internals ----------------------------------------------------

    fn ensure_free(&self, code: &StockCode) -> Result<(), AdminError> {
        if self.pending.contains(code) {
            Err(AdminError::StockBusy(code.clone()))
        } else {
            Ok(())
        }
    }

    fn cached(&self, code: &StockCode) -> Result<Stock, AdminError> {
        self.stocks
            .get(code)
            .cloned()
            .ok_or_else(|| AdminError::StockNotFound(code.clone()))
    }

    fn track<T>(&mut self, result: Result<T, AdminError>) -> Result<T, AdminError> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(err) => {
                self.last_error = Some(err.to_string());
                if self.config.verbose {
                    println!("[admin] {err}");
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MockTradingEngine;
    use crate::types::ShareCount;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> StockCode {
        StockCode::new_unchecked(s)
    }

    fn fields(name: &str) -> StockFields {
        StockFields {
            company_name: name.to_string(),
            address: "HCMC".to_string(),
            share_count: ShareCount::new_unchecked(1_000_000),
        }
    }

    fn workflow() -> AdminWorkflow<MockTradingEngine> {
        AdminWorkflow::new(MockTradingEngine::new(), AdminConfig::default())
    }

    #[test]
    fn add_then_list_updates_cache_on_confirmation() {
        let mut wf = workflow();
        wf.add_stock(code("FPT"), fields("FPT Corp")).unwrap();
        assert!(wf.get_stock(&code("FPT")).unwrap().is_unlisted());

        wf.list_stock(&code("FPT"), dec!(85000)).unwrap();
        let stock = wf.get_stock(&code("FPT")).unwrap();
        assert!(stock.is_listed());
        assert_eq!(stock.quote.unwrap().reference.value(), dec!(85000));
    }

    #[test]
    fn duplicate_add_fails_before_dispatch() {
        let mut wf = workflow();
        wf.add_stock(code("FPT"), fields("FPT Corp")).unwrap();

        let err = wf.add_stock(code("FPT"), fields("Other Corp")).unwrap_err();
        assert_eq!(err, AdminError::DuplicateCode(code("FPT")));
        assert_eq!(wf.last_error(), Some("stock FPT already exists"));
    }

    #[test]
    fn remote_failure_leaves_cache_untouched() {
        let mut wf = workflow();
        wf.add_stock(code("VNM"), fields("Vinamilk")).unwrap();
        wf.list_stock(&code("VNM"), dec!(70000)).unwrap();

        wf.engine.fail_next("gateway timeout");
        let err = wf.halt_stock(&code("VNM")).unwrap_err();
        assert!(matches!(err, AdminError::Remote(RemoteError::Failure(_))));

        // still listed locally, matching the last known-good remote state
        assert!(wf.get_stock(&code("VNM")).unwrap().is_listed());
        assert!(wf.last_error().unwrap().contains("gateway timeout"));
    }

    #[test]
    fn pending_stock_rejects_second_operation() {
        let mut wf = workflow();
        wf.add_stock(code("SSI"), fields("SSI Securities")).unwrap();
        let halts_before = wf.engine.dispatch_count("halt_stock");

        wf.mark_pending(&code("SSI"));
        let err = wf.halt_stock(&code("SSI")).unwrap_err();
        assert_eq!(err, AdminError::StockBusy(code("SSI")));
        assert_eq!(wf.engine.dispatch_count("halt_stock"), halts_before);

        wf.clear_pending(&code("SSI"));
        assert!(!wf.is_pending(&code("SSI")));
    }

    #[test]
    fn undo_reconciles_cache_from_prior_snapshot() {
        let mut wf = workflow();
        wf.add_stock(code("HPG"), fields("Hoa Phat")).unwrap();
        wf.list_stock(&code("HPG"), dec!(25000)).unwrap();

        wf.undo().unwrap(); // un-list
        assert!(wf.get_stock(&code("HPG")).unwrap().is_unlisted());

        wf.undo().unwrap(); // un-create
        assert!(wf.get_stock(&code("HPG")).is_none());
        assert!(!wf.can_undo());
    }

    #[test]
    fn rejected_undo_resyncs_from_server() {
        let mut wf = workflow();
        wf.add_stock(code("ACB"), fields("ACB Bank")).unwrap();
        wf.engine.reject_next_undo("history diverged");

        let err = wf.undo().unwrap_err();
        assert!(matches!(err, AdminError::Undo(ActionLogError::UndoRejected(_))));

        // log was re-seeded from the server, which still has the create
        assert_eq!(wf.log().entries().len(), 1);
        assert!(wf.can_undo());
        assert!(wf.get_stock(&code("ACB")).is_some());
    }

    #[test]
    fn run_phase_requires_manual_mode() {
        let mut wf = workflow();
        let err = wf.run_phase(MatchingPhase::Ato).unwrap_err();
        assert_eq!(err, AdminError::Session(SessionError::ManualOnly));

        wf.set_auto_mode(false);
        wf.add_stock(code("FPT"), fields("FPT Corp")).unwrap();
        wf.list_stock(&code("FPT"), dec!(85000)).unwrap();

        let result = wf.run_phase(MatchingPhase::Ato).unwrap();
        assert_eq!(result.orders_matched, 1);
        assert_eq!(wf.phase(), SessionPhase::Ato);
    }

    #[test]
    fn failed_phase_does_not_advance_session() {
        let mut wf = workflow();
        wf.set_auto_mode(false);

        wf.engine.fail_next("engine down");
        let err = wf.run_phase(MatchingPhase::Ato).unwrap_err();
        assert!(matches!(err, AdminError::Remote(RemoteError::Failure(_))));
        assert_eq!(wf.phase(), SessionPhase::PreOpen);

        // guard was released, a retry may dispatch again
        assert!(wf.run_phase(MatchingPhase::Ato).is_ok());
    }
}
