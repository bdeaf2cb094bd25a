//! CSV export of bills and transactions.

use std::io::Write;

use csv::WriterBuilder;
use serde::Serialize;

use billmind_domain::{Bill, Transaction};

use crate::CoreError;

#[derive(Serialize)]
struct BillRow<'a> {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Category")]
    category: &'static str,
    #[serde(rename = "PaymentMode")]
    payment_mode: &'static str,
    #[serde(rename = "IsPaid")]
    is_paid: &'static str,
}

#[derive(Serialize)]
struct TransactionRow<'a> {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Payee")]
    payee: &'a str,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Category")]
    category: &'static str,
}

fn csv_error(err: csv::Error) -> CoreError {
    CoreError::Serde(format!("csv: {err}"))
}

/// Writes one row per bill under a header row.
pub fn write_bills_csv<'a, W, I>(writer: W, bills: I) -> Result<(), CoreError>
where
    W: Write,
    I: IntoIterator<Item = &'a Bill>,
{
    let mut wrt = WriterBuilder::new().from_writer(writer);
    for bill in bills {
        wrt.serialize(BillRow {
            id: bill.id.to_string(),
            name: &bill.name,
            date: bill.due_at.to_rfc3339(),
            amount: format!("{:.2}", bill.amount),
            category: bill.category.label(),
            payment_mode: bill.payment_mode.label(),
            is_paid: if bill.paid { "Yes" } else { "No" },
        })
        .map_err(csv_error)?;
    }
    wrt.flush()?;
    Ok(())
}

/// Writes one row per transaction under a header row.
pub fn write_transactions_csv<'a, W, I>(writer: W, transactions: I) -> Result<(), CoreError>
where
    W: Write,
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut wrt = WriterBuilder::new().from_writer(writer);
    for txn in transactions {
        wrt.serialize(TransactionRow {
            id: txn.id.to_string(),
            payee: &txn.payee,
            date: txn.occurred_at.to_rfc3339(),
            amount: format!("{:.2}", txn.amount),
            category: txn.category.label(),
        })
        .map_err(csv_error)?;
    }
    wrt.flush()?;
    Ok(())
}
