use std::{collections::HashSet, path::PathBuf};

use billmind_domain::{Bill, BillBook, BillStatus, Transaction};
use uuid::Uuid;

use crate::CoreError;

/// Bill lookups and writes needed by reconciliation.
pub trait BillStore {
    /// Earliest-due open bill carrying `card_ref`, if any.
    fn find_unpaid_by_card_ref(&self, card_ref: &str) -> Option<Bill>;
    /// Inserts the bill or replaces the one with the same id.
    fn upsert_bill(&mut self, bill: Bill) -> Result<(), CoreError>;
}

/// Append-only transaction ledger.
pub trait TransactionStore {
    fn has_transaction(&self, id: Uuid) -> bool;
    fn record_transaction(&mut self, transaction: Transaction) -> Result<(), CoreError>;
}

impl BillStore for BillBook {
    fn find_unpaid_by_card_ref(&self, card_ref: &str) -> Option<Bill> {
        self.bills
            .iter()
            .filter(|bill| bill.is_open() && bill.card_reference.as_deref() == Some(card_ref))
            .min_by_key(|bill| bill.due_at)
            .cloned()
    }

    fn upsert_bill(&mut self, bill: Bill) -> Result<(), CoreError> {
        self.put_bill(bill);
        Ok(())
    }
}

impl TransactionStore for BillBook {
    fn has_transaction(&self, id: Uuid) -> bool {
        self.transaction(id).is_some()
    }

    fn record_transaction(&mut self, transaction: Transaction) -> Result<(), CoreError> {
        if self.has_transaction(transaction.id) {
            return Err(CoreError::InvalidOperation(format!(
                "transaction {} already recorded",
                transaction.id
            )));
        }
        self.push_transaction(transaction);
        Ok(())
    }
}

/// Describes a persisted backup artifact for a book.
#[derive(Debug, Clone)]
pub struct BookBackupInfo {
    pub book: String,
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over persistence backends capable of storing books and backups.
pub trait BillBookStorage: Send + Sync {
    fn save_book(&self, name: &str, book: &BillBook) -> Result<(), CoreError>;
    fn load_book(&self, name: &str) -> Result<BillBook, CoreError>;
    fn list_books(&self) -> Result<Vec<String>, CoreError>;
    fn delete_book(&self, name: &str) -> Result<(), CoreError>;
    fn backup_book(
        &self,
        name: &str,
        book: &BillBook,
        note: Option<&str>,
    ) -> Result<BookBackupInfo, CoreError>;
    fn list_backups(&self, name: &str) -> Result<Vec<BookBackupInfo>, CoreError>;
    fn restore_backup(&self, backup: &BookBackupInfo) -> Result<BillBook, CoreError>;
}

/// Detects inconsistent records within a book snapshot.
pub fn book_warnings(book: &BillBook) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut warnings = Vec::new();

    for bill in &book.bills {
        if !seen.insert(bill.id) {
            warnings.push(format!("bill {} appears more than once", bill.id));
        }
        if !bill.amount.is_finite() || bill.amount < 0.0 {
            warnings.push(format!("bill {} has invalid amount {}", bill.id, bill.amount));
        }
        if bill.status == BillStatus::Overdue {
            warnings.push(format!("bill {} stores derived status overdue", bill.id));
        }
        if bill.paid != (bill.status == BillStatus::Paid) {
            warnings.push(format!(
                "bill {} paid flag disagrees with status {}",
                bill.id, bill.status
            ));
        }
        if bill.paid && bill.paid_at.is_none() {
            warnings.push(format!("bill {} is paid without a payment time", bill.id));
        }
    }

    let mut txn_ids = HashSet::new();
    for txn in &book.transactions {
        if !txn_ids.insert(txn.id) {
            warnings.push(format!("transaction {} appears more than once", txn.id));
        }
        if !txn.amount.is_finite() {
            warnings.push(format!("transaction {} has invalid amount", txn.id));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn finds_earliest_open_bill_for_card() {
        let mut book = BillBook::new("Cards");
        let base = Utc.with_ymd_and_hms(2025, 4, 30, 18, 29, 0).unwrap();
        let later = Bill::new("Later", base + Duration::days(30), 10.0).with_card_reference("1234");
        let earlier = Bill::new("Earlier", base, 20.0).with_card_reference("1234");
        let mut paid = Bill::new("Paid", base - Duration::days(30), 5.0).with_card_reference("1234");
        paid.mark_paid(base);
        let other = Bill::new("Other", base, 5.0).with_card_reference("9999");
        let earlier_id = earlier.id;
        for bill in [later, earlier, paid, other] {
            book.upsert_bill(bill).unwrap();
        }

        let found = book.find_unpaid_by_card_ref("1234").unwrap();
        assert_eq!(found.id, earlier_id);
        assert!(book.find_unpaid_by_card_ref("0000").is_none());
    }

    #[test]
    fn cancelled_bills_do_not_receive_accruals() {
        let mut book = BillBook::new("Cards");
        let mut bill = Bill::new("Card", Utc::now(), 10.0).with_card_reference("1234");
        bill.close_as(BillStatus::Cancelled);
        book.upsert_bill(bill).unwrap();
        assert!(book.find_unpaid_by_card_ref("1234").is_none());
    }

    #[test]
    fn duplicate_transactions_are_refused() {
        let mut book = BillBook::new("Txns");
        let txn = Transaction::new(Utc::now(), "Shop", 12.0);
        book.record_transaction(txn.clone()).unwrap();
        assert!(matches!(
            book.record_transaction(txn),
            Err(CoreError::InvalidOperation(_))
        ));
        assert_eq!(book.transactions.len(), 1);
    }

    #[test]
    fn warnings_flag_inconsistent_bills() {
        let mut book = BillBook::new("Warn");
        let mut bill = Bill::new("Broken", Utc::now(), -4.0);
        bill.paid = true;
        book.bills.push(bill);

        let warnings = book_warnings(&book);
        assert!(warnings.iter().any(|w| w.contains("invalid amount")));
        assert!(warnings.iter().any(|w| w.contains("paid flag")));
        assert!(warnings.iter().any(|w| w.contains("payment time")));
        assert!(book_warnings(&BillBook::new("Clean")).is_empty());
    }
}
