//! Turns free-form bank notification text into [`Transaction`] records.

mod fields;
mod patterns;

pub use fields::{parse_amount, parse_local_timestamp, title_case};
pub use patterns::{default_patterns, CardPurchasePattern, TransactionPattern, VoiceChannelPattern};

use chrono_tz::Tz;
use tracing::debug;

use billmind_domain::Transaction;

use crate::ExtractionError;

/// Tries each pattern in priority order; the first one whose shape matches
/// decides the outcome, including any field-level failure.
pub struct TextExtractor {
    tz: Tz,
    patterns: Vec<Box<dyn TransactionPattern>>,
}

impl TextExtractor {
    pub fn new(tz: Tz) -> Self {
        Self::with_patterns(tz, default_patterns())
    }

    pub fn with_patterns(tz: Tz, patterns: Vec<Box<dyn TransactionPattern>>) -> Self {
        Self { tz, patterns }
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    pub fn extract(&self, text: &str) -> Result<Transaction, ExtractionError> {
        for pattern in &self.patterns {
            let Some(caps) = pattern.regex().captures(text) else {
                continue;
            };
            debug!(pattern = pattern.name(), "notification text matched");
            return pattern.extract(&caps, self.tz);
        }
        debug!(len = text.len(), "no notification pattern matched");
        Err(ExtractionError::NoPatternMatched)
    }
}

impl std::fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.patterns.iter().map(|p| p.name()).collect();
        f.debug_struct("TextExtractor")
            .field("tz", &self.tz)
            .field("patterns", &names)
            .finish()
    }
}
