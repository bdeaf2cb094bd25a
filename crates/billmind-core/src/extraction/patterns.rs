//! Known bank notification shapes.

use std::sync::OnceLock;

use chrono_tz::Tz;
use regex::{Captures, Regex};

use billmind_domain::Transaction;

use super::fields::{parse_amount, parse_local_timestamp, title_case};
use crate::ExtractionError;

/// A single notification shape: a matcher plus the field extraction for it.
pub trait TransactionPattern: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn regex(&self) -> &'static Regex;

    /// Builds a transaction from a successful match. Timestamps are read as
    /// wall-clock time in `tz`.
    fn extract(&self, caps: &Captures<'_>, tz: Tz) -> Result<Transaction, ExtractionError>;
}

fn capture<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map(|m| m.as_str()).unwrap_or_default()
}

/// `**1234 :PAYEE (ref) LKR 12,345.67 (05-Mar-2025 14:22:10 PM)`
#[derive(Debug, Default, Clone, Copy)]
pub struct VoiceChannelPattern;

fn voice_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?s)\*{2}(?P<card>\d{4}) :(?P<payee>.+?)\s*\(.*?\)\s+LKR\s+(?P<amount>[\d,]+\.\d{2})\s+\((?P<day>\d{2}-[A-Za-z]{3}-\d{4}) (?P<time>\d{2}:\d{2}:\d{2}) [AP]M\)",
        )
        .expect("invalid voice channel regex")
    })
}

impl TransactionPattern for VoiceChannelPattern {
    fn name(&self) -> &'static str {
        "voice_channel"
    }

    fn regex(&self) -> &'static Regex {
        voice_re()
    }

    fn extract(&self, caps: &Captures<'_>, tz: Tz) -> Result<Transaction, ExtractionError> {
        let amount = parse_amount(capture(caps, "amount"))?;
        // The clock is 24-hour; the trailing marker carries no information.
        let stamp = format!("{} {}", capture(caps, "day"), capture(caps, "time"));
        let occurred_at = parse_local_timestamp(&stamp, "%d-%b-%Y %H:%M:%S", tz)?;
        Ok(Transaction::new(occurred_at, capture(caps, "payee").trim(), amount)
            .with_card_reference(capture(caps, "card"))
            .with_channel("VoiceChannel"))
    }
}

/// `... card ending #1234 ... Purchase at MERCHANT ... for LKR 1,234.00 on 05/03/25 02:15 PM`
#[derive(Debug, Default, Clone, Copy)]
pub struct CardPurchasePattern;

fn card_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?s)card ending #(?P<card>\d{4}).*?Purchase at (?P<merchant>[A-Z0-9 ]+).*?for LKR (?P<amount>[\d,]+\.\d{2}) on (?P<date>\d{2}/\d{2}/\d{2}) (?P<time>\d{2}:\d{2}) (?P<meridiem>[AP]M)",
        )
        .expect("invalid card purchase regex")
    })
}

impl TransactionPattern for CardPurchasePattern {
    fn name(&self) -> &'static str {
        "card_purchase"
    }

    fn regex(&self) -> &'static Regex {
        card_re()
    }

    fn extract(&self, caps: &Captures<'_>, tz: Tz) -> Result<Transaction, ExtractionError> {
        let amount = parse_amount(capture(caps, "amount"))?;
        let stamp = format!(
            "{} {} {}",
            capture(caps, "date"),
            capture(caps, "time"),
            capture(caps, "meridiem")
        );
        let occurred_at = parse_local_timestamp(&stamp, "%d/%m/%y %I:%M %p", tz)?;
        let merchant = title_case(capture(caps, "merchant").trim());
        Ok(Transaction::new(occurred_at, merchant, amount)
            .with_card_reference(capture(caps, "card"))
            .with_channel("Card"))
    }
}

/// Patterns in the order they are tried.
pub fn default_patterns() -> Vec<Box<dyn TransactionPattern>> {
    vec![Box::new(VoiceChannelPattern), Box::new(CardPurchasePattern)]
}
