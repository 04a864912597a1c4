//! crates/pdf_reader_core/src/dialog.rs
//!
//! The per-user prompt state machine: waiting for a file upload or for a page number.

use crate::domain::{Cursor, UserId};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// What the bot is waiting for from a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingFile,
    /// Waiting for a page number for the document at `cursor`; the cursor is where to return on cancel.
    AwaitingPageNumber { cursor: Cursor },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogTrigger {
    RequestFile,
    FileReceived,
    RequestPage(Cursor),
    PageAccepted,
    PageRejected,
    Cancel,
}

impl DialogState {
    /// The state after `trigger`. A new request replaces whatever was pending.
    pub fn on(self, trigger: DialogTrigger) -> DialogState {
        match trigger {
            DialogTrigger::RequestFile => DialogState::AwaitingFile,
            DialogTrigger::RequestPage(cursor) => DialogState::AwaitingPageNumber { cursor },
            DialogTrigger::FileReceived | DialogTrigger::PageAccepted | DialogTrigger::Cancel => DialogState::Idle,
            DialogTrigger::PageRejected => self,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, DialogState::Idle)
    }
}

/// Dialog states of all users. Kept in memory only; a restart returns everyone to `Idle`.
#[derive(Debug, Default)]
pub struct DialogRegistry {
    states: Mutex<HashMap<UserId, DialogState>>,
}

impl DialogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user: UserId) -> DialogState {
        self.states.lock().await.get(&user).cloned().unwrap_or_default()
    }

    /// Applies `trigger` to the user's state and returns the new state.
    pub async fn fire(&self, user: UserId, trigger: DialogTrigger) -> DialogState {
        let mut states = self.states.lock().await;
        let next = states.remove(&user).unwrap_or_default().on(trigger);
        if !next.is_idle() {
            states.insert(user, next.clone());
        }
        next
    }

    pub async fn reset(&self, user: UserId) {
        self.states.lock().await.remove(&user);
    }
}
