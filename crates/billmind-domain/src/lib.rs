//! billmind-domain
//!
//! Pure domain models (Bill, Transaction, BillBook, PredictionResult).
//! No I/O, no CLI, no storage. Only data types, core enums and calendar helpers.

pub mod bill;
pub mod book;
pub mod common;
pub mod prediction;
pub mod transaction;

pub use bill::*;
pub use book::*;
pub use common::*;
pub use prediction::*;
pub use transaction::*;
