//! Domain models for bills, their lifecycle state and recurrence rules.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// A scheduled, possibly recurring, financial obligation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bill {
    pub id: Uuid,
    pub name: String,
    pub due_at: DateTime<Utc>,
    pub amount: f64,
    #[serde(default)]
    pub category: BillCategory,
    #[serde(default)]
    pub payment_mode: PaymentMode,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: BillStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_reference: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "Bill::default_reminder_days")]
    pub reminder_days: u32,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    pub fn new(name: impl Into<String>, due_at: DateTime<Utc>, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            due_at,
            amount,
            category: BillCategory::default(),
            payment_mode: PaymentMode::default(),
            recurrence: Recurrence::default(),
            paid: false,
            paid_at: None,
            status: BillStatus::Pending,
            card_reference: None,
            tags: BTreeSet::new(),
            notes: None,
            reminder_days: Self::default_reminder_days(),
            created_at: Utc::now(),
        }
    }

    /// Upper bound for `reminder_days`.
    pub const MAX_REMINDER_DAYS: u32 = 365;

    pub fn default_reminder_days() -> u32 {
        1
    }

    pub fn with_category(mut self, category: BillCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_payment_mode(mut self, payment_mode: PaymentMode) -> Self {
        self.payment_mode = payment_mode;
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn with_card_reference(mut self, card_reference: impl Into<String>) -> Self {
        self.card_reference = Some(card_reference.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// `true` when the bill is unpaid, still pending and its due time has passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.paid && self.due_at < now && self.status == BillStatus::Pending
    }

    /// Stored status with `Overdue` substituted for late pending bills.
    pub fn effective_status(&self, now: DateTime<Utc>) -> BillStatus {
        if self.is_overdue(now) {
            BillStatus::Overdue
        } else {
            self.status
        }
    }

    /// Still awaiting payment: neither paid nor cancelled.
    pub fn is_open(&self) -> bool {
        !self.paid && self.status != BillStatus::Cancelled
    }

    /// Signed calendar-day distance from `now` to the due date, in `now`'s zone.
    pub fn days_until_due<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> i64 {
        let due = self.due_at.with_timezone(&now.timezone()).date_naive();
        (due - now.date_naive()).num_days()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn mark_paid(&mut self, at: DateTime<Utc>) {
        self.paid = true;
        self.paid_at = Some(at);
        self.status = BillStatus::Paid;
    }

    pub fn mark_unpaid(&mut self) {
        self.paid = false;
        self.paid_at = None;
        self.status = BillStatus::Pending;
    }

    /// Moves a bill into a closed state, dropping any recorded payment.
    pub fn close_as(&mut self, status: BillStatus) {
        self.paid = false;
        self.paid_at = None;
        self.status = status;
    }

    /// Adds an observed charge onto the running balance.
    pub fn accrue(&mut self, amount: f64) {
        self.amount += amount;
    }

    /// Builds the pending bill that follows this one in its recurrence series.
    pub fn successor(&self, due_at: DateTime<Utc>) -> Bill {
        let mut next = Bill::new(self.name.clone(), due_at, self.amount)
            .with_category(self.category)
            .with_payment_mode(self.payment_mode)
            .with_recurrence(self.recurrence);
        next.tags = self.tags.clone();
        next.notes = self.notes.clone();
        next.reminder_days = self.reminder_days;
        next
    }
}

impl Amounted for Bill {
    fn amount(&self) -> f64 {
        self.amount
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum BillCategory {
    #[default]
    General,
    Utilities,
    Rent,
    Entertainment,
    Groceries,
    Healthcare,
    Transportation,
    Insurance,
    Education,
    Dining,
}

impl BillCategory {
    pub const ALL: [BillCategory; 10] = [
        BillCategory::General,
        BillCategory::Utilities,
        BillCategory::Rent,
        BillCategory::Entertainment,
        BillCategory::Groceries,
        BillCategory::Healthcare,
        BillCategory::Transportation,
        BillCategory::Insurance,
        BillCategory::Education,
        BillCategory::Dining,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BillCategory::General => "General",
            BillCategory::Utilities => "Utilities",
            BillCategory::Rent => "Rent",
            BillCategory::Entertainment => "Entertainment",
            BillCategory::Groceries => "Groceries",
            BillCategory::Healthcare => "Healthcare",
            BillCategory::Transportation => "Transportation",
            BillCategory::Insurance => "Insurance",
            BillCategory::Education => "Education",
            BillCategory::Dining => "Dining",
        }
    }

    /// Icon name used by frontends.
    pub fn symbol(self) -> &'static str {
        match self {
            BillCategory::General => "doc.text",
            BillCategory::Utilities => "bolt.fill",
            BillCategory::Rent => "house.fill",
            BillCategory::Entertainment => "gamecontroller.fill",
            BillCategory::Groceries => "cart.fill",
            BillCategory::Healthcare => "cross.fill",
            BillCategory::Transportation => "car.fill",
            BillCategory::Insurance => "shield.fill",
            BillCategory::Education => "book.fill",
            BillCategory::Dining => "fork.knife",
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

impl fmt::Display for BillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    #[default]
    Cash,
    Card,
    BankTransfer,
    Digital,
    Check,
    Other,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 6] = [
        PaymentMode::Cash,
        PaymentMode::Card,
        PaymentMode::BankTransfer,
        PaymentMode::Digital,
        PaymentMode::Check,
        PaymentMode::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Card => "Card",
            PaymentMode::BankTransfer => "Bank Transfer",
            PaymentMode::Digital => "Digital",
            PaymentMode::Check => "Check",
            PaymentMode::Other => "Other",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.label().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
/// Enumerates the lifecycle state of a bill.
pub enum BillStatus {
    #[default]
    Pending,
    Paid,
    /// Derived for display; never stored on a bill.
    Overdue,
    Cancelled,
    Disputed,
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BillStatus::Pending => "Pending",
            BillStatus::Paid => "Paid",
            BillStatus::Overdue => "Overdue",
            BillStatus::Cancelled => "Cancelled",
            BillStatus::Disputed => "Disputed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
/// Repeat policy attached to a bill.
pub enum Recurrence {
    #[default]
    #[serde(rename = "none")]
    OneOff,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Every N days; an absent or non-positive count never repeats.
    Custom(Option<i64>),
}

impl Recurrence {
    pub fn is_recurring(self) -> bool {
        match self {
            Recurrence::OneOff => false,
            Recurrence::Custom(days) => matches!(days, Some(days) if days > 0),
            _ => true,
        }
    }

    /// Calculates the next wall-clock occurrence after `from`, keeping the time of day.
    pub fn advance(self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        let date = self.advance_date(from.date())?;
        Some(date.and_time(from.time()))
    }

    fn advance_date(self, from: NaiveDate) -> Option<NaiveDate> {
        match self {
            Recurrence::OneOff => None,
            Recurrence::Daily => from.checked_add_days(Days::new(1)),
            Recurrence::Weekly => from.checked_add_days(Days::new(7)),
            Recurrence::Monthly => shift_month(from, 1),
            Recurrence::Yearly => shift_year(from, 1),
            Recurrence::Custom(Some(days)) if days > 0 => {
                from.checked_add_days(Days::new(days as u64))
            }
            Recurrence::Custom(_) => None,
        }
    }

    pub fn label(self) -> String {
        match self {
            Recurrence::OneOff => "One-off".into(),
            Recurrence::Daily => "Daily".into(),
            Recurrence::Weekly => "Weekly".into(),
            Recurrence::Monthly => "Monthly".into(),
            Recurrence::Yearly => "Yearly".into(),
            Recurrence::Custom(Some(days)) => format!("Every {days} days"),
            Recurrence::Custom(None) => "Custom".into(),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
