// exchange-admin-core: stock-exchange admin subsystem.
// state-first architecture: the lifecycle and session state machines are the
// product; forms and rendering live elsewhere. all computation is
// deterministic with no external I/O (the engine boundary is a trait).
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: StockCode, Price, ShareCount, Timestamp
//   2.x  workflow.rs: AdminWorkflow orchestration + confirmed-write cache
//   3.x  lifecycle.rs: stock status machine: Unlisted -> Listed <-> Halted
//   4.x  session.rs: session phases (ATO/LO/ATC), auto vs manual, busy guard
//   5.x  action_log.rs: linear truncating undo history
//   6.x  remote.rs: TradingEngine boundary + in-memory mock
//   7.x  config.rs: trading window, auto schedule, retention

// core state machines
pub mod action_log;
pub mod lifecycle;
pub mod session;
pub mod stock;
pub mod types;

// orchestration and integration
pub mod config;
pub mod remote;
pub mod workflow;

// re exports for convenience
pub use action_log::{ActionLog, ActionLogEntry, ActionLogError, EntryId};
pub use config::{AdminConfig, SessionSchedule};
pub use lifecycle::{AdminAction, LifecycleError};
pub use remote::{MatchResult, MockTradingEngine, RemoteError, TradingEngine};
pub use session::{
    MatchingPhase, PhaseOutcome, PhaseTicket, SessionController, SessionError, SessionMode,
    SessionPhase,
};
pub use stock::{ListedQuote, Stock, StockFields, StockStatus};
pub use types::{Price, ShareCount, StockCode, Timestamp};
pub use workflow::{AdminError, AdminWorkflow};
