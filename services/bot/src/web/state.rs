//! services/bot/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::dispatch::Dispatcher;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
}
