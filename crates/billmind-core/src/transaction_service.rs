//! Manual transaction entry.

use chrono_tz::Tz;
use tracing::info;

use billmind_domain::Transaction;

use crate::{
    import_service::{ImportOutcome, ImportService},
    storage::{BillStore, TransactionStore},
    CoreError,
};

pub struct TransactionService;

impl TransactionService {
    /// Validates a hand-entered transaction and records it. Entries carrying a
    /// card reference reconcile into card bills exactly like imported ones.
    ///
    /// `currency` is what the user entered; amounts are kept unconverted, so it
    /// must name the book's `ledger_currency`.
    pub fn add<S>(
        store: &mut S,
        mut transaction: Transaction,
        currency: &str,
        ledger_currency: &str,
        tz: Tz,
    ) -> Result<ImportOutcome, CoreError>
    where
        S: BillStore + TransactionStore,
    {
        transaction.payee = transaction.payee.trim().to_string();
        if transaction.payee.is_empty() {
            return Err(CoreError::Validation("payee must not be empty".into()));
        }
        if !transaction.amount.is_finite() || transaction.amount <= 0.0 {
            return Err(CoreError::Validation(format!(
                "transaction amount must be above zero, got {}",
                transaction.amount
            )));
        }
        let currency = currency.trim();
        if !is_currency_code(currency) {
            return Err(CoreError::Validation(format!(
                "`{currency}` is not a three-letter currency code"
            )));
        }
        if !currency.eq_ignore_ascii_case(ledger_currency.trim()) {
            return Err(CoreError::Validation(format!(
                "amounts are kept in {ledger_currency}, not {currency}"
            )));
        }
        if let Some(card) = transaction.card_reference.as_deref() {
            if card.is_empty() || !card.chars().all(|c| c.is_ascii_digit()) {
                return Err(CoreError::Validation(format!(
                    "card reference `{card}` must be digits"
                )));
            }
        }

        info!(payee = %transaction.payee, amount = transaction.amount, "manual transaction");
        ImportService::import_transaction(store, transaction, tz)
    }
}

/// Three ASCII letters, e.g. `LKR` or `usd`.
pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
