use std::path::PathBuf;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// User preferences shared by every frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_locale")]
    pub locale: String,
    #[serde(default = "Config::default_currency")]
    pub currency: String,
    /// IANA zone used for due dates and notification timestamps.
    #[serde(default = "Config::default_time_zone")]
    pub time_zone: String,
    /// Days before the due date for the advance reminder on new bills.
    #[serde(default = "Config::default_reminder_days")]
    pub reminder_days: u32,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened_book: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for bill books. Defaults to `~/Documents/BillMind`.
    pub data_root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for backups. Defaults to `<data root>/backups`.
    pub backup_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Self::default_locale(),
            currency: Self::default_currency(),
            time_zone: Self::default_time_zone(),
            reminder_days: Self::default_reminder_days(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            last_opened_book: None,
            data_root: None,
            backup_root: None,
        }
    }
}

impl Config {
    pub fn default_locale() -> String {
        "en-LK".into()
    }

    pub fn default_currency() -> String {
        "LKR".into()
    }

    pub fn default_time_zone() -> String {
        "Asia/Colombo".into()
    }

    /// Upper bound for [`Config::reminder_days`].
    pub const MAX_REMINDER_DAYS: u32 = 365;

    pub fn default_reminder_days() -> u32 {
        1
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    /// Parses [`Config::time_zone`].
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.time_zone
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimeZone(self.time_zone.clone()))
    }

    /// Checks fields that serde cannot validate on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency must not be empty".into()));
        }
        if self.reminder_days > Self::MAX_REMINDER_DAYS {
            return Err(ConfigError::Invalid(format!(
                "reminder_days must be at most {}, got {}",
                Self::MAX_REMINDER_DAYS,
                self.reminder_days
            )));
        }
        Ok(())
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("BillMind")
    }

    pub fn resolve_backup_root(&self) -> PathBuf {
        match &self.backup_root {
            Some(path) => path.clone(),
            None => self.resolve_data_root().join("backups"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_sri_lanka() {
        let cfg = Config::default();
        assert_eq!(cfg.currency, "LKR");
        assert_eq!(cfg.tz().unwrap(), chrono_tz::Asia::Colombo);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_zone_is_rejected() {
        let cfg = Config {
            time_zone: "Mars/Olympus".into(),
            ..Config::default()
        };
        assert!(matches!(cfg.tz(), Err(ConfigError::InvalidTimeZone(zone)) if zone == "Mars/Olympus"));
    }

    #[test]
    fn validation_failures_are_reported_as_invalid() {
        let blank = Config {
            currency: "  ".into(),
            ..Config::default()
        };
        assert!(matches!(blank.validate(), Err(ConfigError::Invalid(_))));

        let far = Config {
            reminder_days: Config::MAX_REMINDER_DAYS + 1,
            ..Config::default()
        };
        assert!(matches!(far.validate(), Err(ConfigError::Invalid(_))));

        let year = Config {
            reminder_days: Config::MAX_REMINDER_DAYS,
            ..Config::default()
        };
        assert!(year.validate().is_ok());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"currency":"USD"}"#).unwrap();
        assert_eq!(cfg.currency, "USD");
        assert_eq!(cfg.time_zone, "Asia/Colombo");
        assert_eq!(cfg.reminder_days, 1);
        assert!(cfg.ui_color_enabled);
    }

    #[test]
    fn backup_root_follows_data_root() {
        let cfg = Config {
            data_root: Some(PathBuf::from("/srv/bills")),
            ..Config::default()
        };
        assert_eq!(cfg.resolve_backup_root(), PathBuf::from("/srv/bills/backups"));
    }
}
