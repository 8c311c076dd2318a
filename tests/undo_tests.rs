//! Linear undo history: LIFO stepping, truncation on new writes, and
//! resynchronization when the server rejects an undo.

use exchange_admin_core::*;
use rust_decimal_macros::dec;

fn code(s: &str) -> StockCode {
    StockCode::new_unchecked(s)
}

fn fields(name: &str, shares: u64) -> StockFields {
    StockFields {
        company_name: name.to_string(),
        address: "HCMC".to_string(),
        share_count: ShareCount::new_unchecked(shares),
    }
}

fn snapshot(wf: &AdminWorkflow<MockTradingEngine>) -> Vec<Stock> {
    wf.stocks(None).into_iter().cloned().collect()
}

#[test]
fn undoing_everything_restores_the_original_collection() {
    let mut wf = AdminWorkflow::new(MockTradingEngine::new(), AdminConfig::default());
    let original = snapshot(&wf);

    // N actions of mixed kinds
    wf.add_stock(code("FPT"), fields("FPT Corp", 1_000)).unwrap();
    wf.edit_stock(&code("FPT"), fields("FPT Corporation", 2_000)).unwrap();
    wf.list_stock(&code("FPT"), dec!(85000)).unwrap();
    wf.halt_stock(&code("FPT")).unwrap();
    let n = 4;

    for _ in 0..n {
        wf.undo().unwrap();
    }

    assert_eq!(snapshot(&wf), original);
    assert_eq!(
        wf.undo().unwrap_err(),
        AdminError::Undo(ActionLogError::NothingToUndo)
    );
}

#[test]
fn new_write_after_undo_discards_the_undone_tail() {
    let mut wf = AdminWorkflow::new(MockTradingEngine::new(), AdminConfig::default());
    wf.add_stock(code("SSI"), fields("SSI", 100)).unwrap();

    // record A, record B
    wf.edit_stock(&code("SSI"), fields("Edit A", 100)).unwrap();
    wf.edit_stock(&code("SSI"), fields("Edit B", 100)).unwrap();

    // undo (cursor back to A)
    wf.undo().unwrap();
    assert_eq!(wf.get_stock(&code("SSI")).unwrap().company_name, "Edit A");

    // record C, then undo must invert C, not B
    wf.edit_stock(&code("SSI"), fields("Edit C", 100)).unwrap();
    wf.undo().unwrap();

    assert_eq!(wf.get_stock(&code("SSI")).unwrap().company_name, "Edit A");
    assert!(wf
        .log()
        .entries()
        .iter()
        .all(|e| e.after.as_ref().map(|s| s.company_name.as_str()) != Some("Edit B")));
}

#[test]
fn undo_availability_flag_follows_the_cursor() {
    let mut wf = AdminWorkflow::new(MockTradingEngine::new(), AdminConfig::default());
    assert!(!wf.can_undo());

    wf.add_stock(code("ACB"), fields("ACB", 100)).unwrap();
    assert!(wf.can_undo());

    wf.undo().unwrap();
    assert!(!wf.can_undo());
}

#[test]
fn rejected_undo_reseeds_history_from_the_server() {
    let mut wf = AdminWorkflow::new(MockTradingEngine::new(), AdminConfig::default());
    wf.add_stock(code("VNM"), fields("Vinamilk", 100)).unwrap();
    wf.list_stock(&code("VNM"), dec!(70000)).unwrap();

    wf.engine_mut().reject_next_undo("server-side state has diverged");
    let err = wf.undo().unwrap_err();
    assert!(matches!(err, AdminError::Undo(ActionLogError::UndoRejected(_))));

    // the local log is now the server log verbatim, cursor at its end
    let server = wf.engine().list_all_undo_log_entries().unwrap();
    assert_eq!(wf.log().entries(), server.as_slice());
    assert_eq!(wf.log().cursor(), server.len());

    // a retry against the resynced history goes through
    wf.undo().unwrap();
    assert!(wf.get_stock(&code("VNM")).unwrap().is_unlisted());
}

#[test]
fn remote_failure_during_undo_also_forces_resync() {
    let mut wf = AdminWorkflow::new(MockTradingEngine::new(), AdminConfig::default());
    wf.add_stock(code("MBB"), fields("MB Bank", 100)).unwrap();

    wf.engine_mut().fail_next("gateway timeout");
    let err = wf.undo().unwrap_err();
    assert!(matches!(err, AdminError::Undo(ActionLogError::Remote(_))));

    // cache still matches the server: the stock was never un-created
    assert!(wf.get_stock(&code("MBB")).is_some());
    assert!(wf.can_undo());
}

#[test]
fn reload_discards_local_only_history() {
    let mut wf = AdminWorkflow::new(MockTradingEngine::new(), AdminConfig::default());
    wf.add_stock(code("HPG"), fields("Hoa Phat", 100)).unwrap();

    // another admin session created a stock directly on the server
    let other = Stock::unlisted(
        code("VCB"),
        "Vietcombank".to_string(),
        "Ha Noi".to_string(),
        ShareCount::new_unchecked(500),
        Timestamp::from_millis(0),
    );
    wf.engine_mut()
        .push_server_entry(AdminAction::Create, code("VCB"), None, Some(other));

    wf.reload().unwrap();

    assert_eq!(wf.log().entries().len(), 2);
    assert!(wf.get_stock(&code("VCB")).is_some());
    assert!(wf.get_stock(&code("HPG")).is_some());
}
