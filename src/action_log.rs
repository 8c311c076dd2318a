// 5.0 action_log.rs: linear, truncating undo history of admin mutations.
// the server-side undo log is the authority; this is a disposable cache the
// workflow keeps in sync. every entry carries before/after snapshots so the
// inverse operation can always be derived.

use crate::lifecycle::AdminAction;
use crate::remote::{RemoteError, TradingEngine};
use crate::stock::Stock;
use crate::types::{StockCode, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

/// One recorded admin mutation. `before: None` encodes creation,
/// `after: None` encodes deletion; anything else is an in-place change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: EntryId,
    pub timestamp: Timestamp,
    pub action: AdminAction,
    pub code: StockCode,
    pub before: Option<Stock>,
    pub after: Option<Stock>,
}

impl ActionLogEntry {
    /// The cache state undoing this entry restores: the prior snapshot,
    /// or removal when the entry created the stock.
    pub fn undo_restores(&self) -> Option<&Stock> {
        self.before.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionLogError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("undo rejected by the engine: {0}")]
    UndoRejected(String),

    #[error("engine failure during undo: {0}")]
    Remote(#[from] RemoteError),
}

/// Linear undo history with a cursor.
///
/// Entries left of the cursor are undoable; entries right of it were undone
/// and survive only until the next `record`, which truncates them (no redo
/// across a new write). There is no redo operation at all: the portal offers
/// single-step "undo last action" only.
#[derive(Debug)]
pub struct ActionLog {
    entries: Vec<ActionLogEntry>,
    cursor: usize,
    next_id: u64,
    max_entries: usize,
}

impl ActionLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            next_id: 1,
            max_entries,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn entries(&self) -> &[ActionLogEntry] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Append a mutation at the cursor. Anything after the cursor (undone
    /// entries) is discarded first, standard linear-history truncation.
    pub fn record(
        &mut self,
        action: AdminAction,
        code: StockCode,
        before: Option<Stock>,
        after: Option<Stock>,
        timestamp: Timestamp,
    ) -> EntryId {
        self.entries.truncate(self.cursor);

        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(ActionLogEntry {
            id,
            timestamp,
            action,
            code,
            before,
            after,
        });

        if self.entries.len() > self.max_entries {
            let drain = self.entries.len() - self.max_entries;
            self.entries.drain(0..drain);
        }
        self.cursor = self.entries.len();
        id
    }

    /// Undo the most recent un-undone entry through the engine.
    ///
    /// The cursor retreats only after the engine confirms; on any rejection
    /// or failure the cursor is untouched and the caller must `reload` before
    /// retrying, since local history may have diverged from server truth.
    pub fn undo<E: TradingEngine>(
        &mut self,
        engine: &mut E,
    ) -> Result<ActionLogEntry, ActionLogError> {
        if self.cursor == 0 {
            return Err(ActionLogError::NothingToUndo);
        }

        match engine.undo_last_action() {
            Ok(()) => {
                self.cursor -= 1;
                Ok(self.entries[self.cursor].clone())
            }
            Err(RemoteError::UndoRejected(reason)) => Err(ActionLogError::UndoRejected(reason)),
            Err(other) => Err(ActionLogError::Remote(other)),
        }
    }

    /// Discard local history and re-seed from the authoritative server log.
    pub fn reload<E: TradingEngine>(&mut self, engine: &E) -> Result<(), RemoteError> {
        let entries = engine.list_all_undo_log_entries()?;
        self.next_id = entries.iter().map(|e| e.id.0 + 1).max().unwrap_or(1);
        self.cursor = entries.len();
        self.entries = entries;
        Ok(())
    }
}
