//! The aggregate of bills and transactions owned by the host application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{bill::Bill, transaction::Transaction};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillBook {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub bills: Vec<Bill>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "BillBook::schema_version_default")]
    pub schema_version: u8,
}

impl BillBook {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            bills: Vec::new(),
            transactions: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: Self::schema_version_default(),
        }
    }

    fn schema_version_default() -> u8 {
        1
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn bill(&self, id: Uuid) -> Option<&Bill> {
        self.bills.iter().find(|bill| bill.id == id)
    }

    pub fn bill_mut(&mut self, id: Uuid) -> Option<&mut Bill> {
        self.bills.iter_mut().find(|bill| bill.id == id)
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    /// Inserts the bill, replacing any stored bill with the same id.
    pub fn put_bill(&mut self, bill: Bill) {
        match self.bill_mut(bill.id) {
            Some(existing) => *existing = bill,
            None => self.bills.push(bill),
        }
        self.touch();
    }

    pub fn push_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
        self.touch();
    }

    /// Bills sorted by due date, earliest first.
    pub fn bills_by_due_date(&self) -> Vec<&Bill> {
        let mut bills: Vec<&Bill> = self.bills.iter().collect();
        bills.sort_by_key(|bill| bill.due_at);
        bills
    }
}
