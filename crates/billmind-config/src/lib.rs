//! billmind-config
//!
//! Persistent user preferences: locale, currency, time zone and data locations.
//! Owns the Config data structure plus disk persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::{check_backup_name, ConfigBackup, ConfigManager};
pub use model::Config;
