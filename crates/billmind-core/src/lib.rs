//! billmind-core
//!
//! Business logic and services for BillMind: recurrence, text import and
//! reconciliation, manual entry, forecasting, summaries and reminders.
//! Depends on billmind-domain. No CLI, no terminal I/O, no direct storage interactions.

pub mod analytics_service;
pub mod bill_service;
pub mod error;
pub mod export;
pub mod extraction;
pub mod import_service;
pub mod prediction_service;
pub mod recurrence_service;
pub mod reminder_service;
pub mod storage;
pub mod summary_service;
pub mod time;
pub mod transaction_service;

pub use analytics_service::*;
pub use bill_service::*;
pub use error::{CoreError, ExtractionError, RiskModelError};
pub use export::*;
pub use extraction::TextExtractor;
pub use import_service::*;
pub use prediction_service::*;
pub use recurrence_service::*;
pub use reminder_service::*;
pub use storage::*;
pub use summary_service::*;
pub use time::{Clock, FixedClock, SystemClock};
pub use transaction_service::*;
