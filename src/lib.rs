#![doc(test(attr(deny(warnings))))]

//! BillMind tracks recurring bills, turns bank notification texts into
//! transactions, and forecasts spending. This crate hosts the command-line
//! frontend and re-exports the workspace libraries.

pub mod cli;
pub mod errors;
pub mod utils;

pub use billmind_config;
pub use billmind_core;
pub use billmind_domain;
pub use billmind_storage_json;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("BillMind tracing initialized.");
    });
}
