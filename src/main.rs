//! Exchange admin subsystem simulation.
//!
//! Walks the stock lifecycle, the manual and auto trading sessions, the
//! linear undo history, and day rollover against the in-memory engine.

use chrono::{NaiveDate, NaiveTime};
use exchange_admin_core::*;
use rust_decimal_macros::dec;

fn main() {
    println!("Exchange Admin Core Simulation");
    println!("Lifecycle, Session Control, Linear Undo\n");

    scenario_1_listing_day();
    scenario_2_halt_and_resume();
    scenario_3_undo_history();
    scenario_4_manual_session();
    scenario_5_auto_session();
    scenario_6_day_rollover();

    println!("\nAll simulations completed successfully.");
}

fn at(h: u32, m: u32) -> Timestamp {
    Timestamp::from_date_time(
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        NaiveTime::from_hms_opt(h, m, 0).unwrap(),
    )
}

fn fields(name: &str, address: &str, shares: u64) -> StockFields {
    StockFields {
        company_name: name.to_string(),
        address: address.to_string(),
        share_count: ShareCount::new_unchecked(shares),
    }
}

fn new_workflow() -> AdminWorkflow<MockTradingEngine> {
    let mut wf = AdminWorkflow::new(MockTradingEngine::new(), AdminConfig::default());
    wf.set_time(at(7, 30));
    wf
}

/// Registering and listing stocks.
fn scenario_1_listing_day() {
    println!("Scenario 1: Listing Day\n");

    let mut wf = new_workflow();

    wf.add_stock(StockCode::new_unchecked("FPT"), fields("FPT Corporation", "10 Pham Van Bach, Ha Noi", 1_270_000_000)).unwrap();
    wf.add_stock(StockCode::new_unchecked("VNM"), fields("Vinamilk", "10 Tan Trao, HCMC", 2_090_000_000)).unwrap();

    println!("  Registered {} unlisted stocks", wf.stocks(Some(StockStatus::Unlisted)).len());

    let listed = wf.list_stock(&StockCode::new_unchecked("FPT"), dec!(85000)).unwrap();
    let quote = listed.quote.unwrap();
    println!("  FPT listed @ {} (band {} - {})", quote.reference, quote.floor, quote.ceiling);

    match wf.list_stock(&StockCode::new_unchecked("VNM"), dec!(0)) {
        Err(err) => println!("  VNM @ 0 rejected: {err}"),
        Ok(_) => unreachable!(),
    }

    wf.list_stock(&StockCode::new_unchecked("VNM"), dec!(70000)).unwrap();
    println!("  Listed stocks: {}\n", wf.stocks(Some(StockStatus::Listed)).len());
}

/// Halting and resuming trading in a listed stock.
fn scenario_2_halt_and_resume() {
    println!("Scenario 2: Halt and Resume\n");

    let mut wf = new_workflow();
    let hpg = StockCode::new_unchecked("HPG");

    wf.add_stock(hpg.clone(), fields("Hoa Phat Group", "66 Nguyen Du, Ha Noi", 5_800_000_000)).unwrap();

    match wf.halt_stock(&hpg) {
        Err(err) => println!("  Halt before listing rejected: {err}"),
        Ok(_) => unreachable!(),
    }

    wf.list_stock(&hpg, dec!(25000)).unwrap();
    wf.halt_stock(&hpg).unwrap();
    println!("  HPG halted (status {})", wf.get_stock(&hpg).unwrap().status.code());

    wf.resume_stock(&hpg).unwrap();
    println!("  HPG resumed (status {})", wf.get_stock(&hpg).unwrap().status.code());

    match wf.delete_stock(&hpg) {
        Err(err) => println!("  Delete after listing rejected: {err}\n"),
        Ok(_) => unreachable!(),
    }
}

/// Linear undo with truncation on new writes.
fn scenario_3_undo_history() {
    println!("Scenario 3: Undo History\n");

    let mut wf = new_workflow();
    let ssi = StockCode::new_unchecked("SSI");

    wf.add_stock(ssi.clone(), fields("SSI Securities", "72 Nguyen Hue, HCMC", 1_500_000_000)).unwrap();
    wf.edit_stock(&ssi, fields("SSI Securities JSC", "72 Nguyen Hue, HCMC", 1_500_000_000)).unwrap();
    println!("  Recorded {} actions, can undo: {}", wf.log().entries().len(), wf.can_undo());

    wf.undo().unwrap();
    println!("  After undo: name = {}", wf.get_stock(&ssi).unwrap().company_name);

    wf.edit_stock(&ssi, fields("SSI Group", "72 Nguyen Hue, HCMC", 1_500_000_000)).unwrap();
    println!("  New edit truncated history to {} entries", wf.log().entries().len());

    wf.undo().unwrap();
    wf.undo().unwrap();
    println!("  Undone back to empty: stock present = {}, can undo = {}\n", wf.get_stock(&ssi).is_some(), wf.can_undo());
}

/// Manual phase stepping with the busy guard.
fn scenario_4_manual_session() {
    println!("Scenario 4: Manual Session\n");

    let mut wf = new_workflow();
    wf.set_auto_mode(false);

    wf.add_stock(StockCode::new_unchecked("MBB"), fields("MB Bank", "21 Cat Linh, Ha Noi", 5_200_000_000)).unwrap();
    wf.list_stock(&StockCode::new_unchecked("MBB"), dec!(22000)).unwrap();

    for phase in [MatchingPhase::Ato, MatchingPhase::ContinuousLo, MatchingPhase::Atc] {
        let result = wf.run_phase(phase).unwrap();
        println!("  {:?}: {} orders, {} shares, value {}", phase, result.orders_matched, result.shares_traded, result.total_value);
    }
    println!("  Session phase: {:?}", wf.phase());

    // a round held open blocks any further dispatch
    let ticket = wf.session_mut().begin_phase(MatchingPhase::Atc).unwrap();
    match wf.run_phase(MatchingPhase::Atc) {
        Err(err) => println!("  Concurrent round rejected: {err}"),
        Ok(_) => unreachable!(),
    }
    wf.session_mut().finish_phase(ticket, PhaseOutcome::Failed);
    println!();
}

/// Auto mode advancing phases off the clock.
fn scenario_5_auto_session() {
    println!("Scenario 5: Auto Session\n");

    let mut wf = new_workflow();

    for (h, m) in [(8, 30), (9, 5), (9, 30), (14, 35), (15, 5)] {
        wf.set_time(at(h, m));
        match wf.tick() {
            Some(phase) => println!("  {h:02}:{m:02} -> {phase:?}"),
            None => println!("  {h:02}:{m:02} -> (no change, {:?})", wf.phase()),
        }
    }
    println!();
}

/// Day rollover: refused mid-session, accepted after hours.
fn scenario_6_day_rollover() {
    println!("Scenario 6: Day Rollover\n");

    let mut wf = new_workflow();
    let vcb = StockCode::new_unchecked("VCB");

    wf.prepare_today().unwrap();
    println!("  Opening prices seeded for today");
    match wf.prepare_today() {
        Err(err) => println!("  Second seed rejected: {err}"),
        Ok(_) => unreachable!(),
    }

    wf.add_stock(vcb.clone(), fields("Vietcombank", "198 Tran Quang Khai, Ha Noi", 5_590_000_000)).unwrap();
    wf.list_stock(&vcb, dec!(90000)).unwrap();
    wf.set_auto_mode(false);
    wf.run_phase(MatchingPhase::Ato).unwrap();

    wf.set_time(at(10, 0));
    match wf.prepare_next_day() {
        Err(err) => println!("  Rollover at 10:00 rejected: {err}"),
        Ok(_) => unreachable!(),
    }

    wf.set_time(at(16, 0));
    wf.prepare_next_day().unwrap();
    println!("  Rollover at 16:00 accepted, phase: {:?}", wf.phase());

    let quote = wf.get_stock(&vcb).unwrap().quote.unwrap();
    println!("  VCB next-day reference: {} (band {} - {})", quote.reference, quote.floor, quote.ceiling);
}
