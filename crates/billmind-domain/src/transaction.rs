//! Domain models for observed payment events.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub payee: String,
    pub amount: f64,
    #[serde(default)]
    pub category: TransactionCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_reference: Option<String>,
    /// Source of the record, e.g. `Card` or `VoiceChannel`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl Transaction {
    pub fn new(occurred_at: DateTime<Utc>, payee: impl Into<String>, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at,
            payee: payee.into(),
            amount,
            category: TransactionCategory::default(),
            card_reference: None,
            channel: None,
        }
    }

    pub fn with_category(mut self, category: TransactionCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_card_reference(mut self, card_reference: impl Into<String>) -> Self {
        self.card_reference = Some(card_reference.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

impl Amounted for Transaction {
    fn amount(&self) -> f64 {
        self.amount
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
/// Spending buckets for recorded transactions.
pub enum TransactionCategory {
    Food,
    Transport,
    Shopping,
    Utilities,
    #[default]
    Other,
}

impl TransactionCategory {
    pub const ALL: [TransactionCategory; 5] = [
        TransactionCategory::Food,
        TransactionCategory::Transport,
        TransactionCategory::Shopping,
        TransactionCategory::Utilities,
        TransactionCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TransactionCategory::Food => "Food",
            TransactionCategory::Transport => "Transport",
            TransactionCategory::Shopping => "Shopping",
            TransactionCategory::Utilities => "Utilities",
            TransactionCategory::Other => "Other",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TransactionCategory::Food => "fork.knife",
            TransactionCategory::Transport => "car.fill",
            TransactionCategory::Shopping => "bag.fill",
            TransactionCategory::Utilities => "bolt.fill",
            TransactionCategory::Other => "circle.dashed",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn from_label(value: &str) -> Option<Self> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
