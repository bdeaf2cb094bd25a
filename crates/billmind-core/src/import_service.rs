//! Records extracted transactions and folds them into card bills.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::info;
use uuid::Uuid;

use billmind_domain::{end_of_month, Bill, BillCategory, PaymentMode, Recurrence, Transaction};

use crate::{
    extraction::TextExtractor,
    storage::{BillStore, TransactionStore},
    CoreError,
};

/// What reconciliation did with an imported transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconciliation {
    /// Added onto an existing open bill for the same card.
    Accrued { bill_id: Uuid, new_amount: f64 },
    /// Started a new monthly card bill.
    Created { bill_id: Uuid },
    /// The transaction carried no card reference.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub transaction: Transaction,
    pub reconciliation: Reconciliation,
}

pub struct ImportService;

impl ImportService {
    /// Extracts a transaction from `text`, records it, and reconciles it
    /// against the store. Extraction failures leave the store untouched.
    pub fn import_text<S>(
        store: &mut S,
        extractor: &TextExtractor,
        text: &str,
    ) -> Result<ImportOutcome, CoreError>
    where
        S: BillStore + TransactionStore,
    {
        let transaction = extractor.extract(text)?;
        Self::import_transaction(store, transaction, extractor.time_zone())
    }

    /// Reconciles an already-built transaction, then records it. The bill is
    /// written first so a failed bill write never leaves the transaction behind.
    pub fn import_transaction<S>(
        store: &mut S,
        transaction: Transaction,
        tz: Tz,
    ) -> Result<ImportOutcome, CoreError>
    where
        S: BillStore + TransactionStore,
    {
        if store.has_transaction(transaction.id) {
            return Err(CoreError::InvalidOperation(format!(
                "transaction {} already recorded",
                transaction.id
            )));
        }
        let (bill, reconciliation) = Self::reconcile(store, &transaction, tz)?;
        if let Some(bill) = bill {
            store.upsert_bill(bill)?;
        }
        store.record_transaction(transaction.clone())?;
        info!(
            transaction = %transaction.id,
            amount = transaction.amount,
            outcome = ?reconciliation,
            "imported transaction"
        );
        Ok(ImportOutcome {
            transaction,
            reconciliation,
        })
    }

    /// Works out the bill write for `transaction` without touching the store.
    fn reconcile<S: BillStore>(
        store: &S,
        transaction: &Transaction,
        tz: Tz,
    ) -> Result<(Option<Bill>, Reconciliation), CoreError> {
        let Some(card_ref) = transaction.card_reference.as_deref() else {
            return Ok((None, Reconciliation::Skipped));
        };

        if let Some(mut bill) = store.find_unpaid_by_card_ref(card_ref) {
            bill.accrue(transaction.amount);
            let outcome = Reconciliation::Accrued {
                bill_id: bill.id,
                new_amount: bill.amount,
            };
            return Ok((Some(bill), outcome));
        }

        let bill = Self::card_bill(card_ref, transaction, tz)?;
        let bill_id = bill.id;
        Ok((Some(bill), Reconciliation::Created { bill_id }))
    }

    /// A monthly card bill due at 23:59 local time on the last day of the
    /// transaction's month.
    pub fn card_bill(card_ref: &str, transaction: &Transaction, tz: Tz) -> Result<Bill, CoreError> {
        let due_at = statement_due(transaction.occurred_at, tz)?;
        Ok(Bill::new(format!("Credit Card {card_ref}"), due_at, transaction.amount)
            .with_category(BillCategory::Utilities)
            .with_payment_mode(PaymentMode::Card)
            .with_recurrence(Recurrence::Monthly)
            .with_card_reference(card_ref))
    }
}

fn statement_due(occurred_at: DateTime<Utc>, tz: Tz) -> Result<DateTime<Utc>, CoreError> {
    let local_day = occurred_at.with_timezone(&tz).date_naive();
    let cutoff = NaiveTime::from_hms_opt(23, 59, 0)
        .ok_or_else(|| CoreError::InvalidOperation("invalid statement cutoff".into()))?;
    let naive = end_of_month(local_day).and_time(cutoff);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|due| due.with_timezone(&Utc))
        .ok_or_else(|| {
            CoreError::InvalidOperation(format!("{naive} does not exist in {}", tz.name()))
        })
}
