//! Bill lifecycle transitions that keep `paid`, `paid_at` and `status` consistent.

use tracing::info;
use uuid::Uuid;

use billmind_domain::{Bill, BillBook, BillStatus};

use crate::{recurrence_service::RecurrenceService, time::Clock, CoreError};

/// Provides safe helpers for creating and transitioning bills in a [`BillBook`].
pub struct BillService;

impl BillService {
    /// Validates and stores a new bill, returning its identifier.
    pub fn add(book: &mut BillBook, bill: Bill) -> Result<Uuid, CoreError> {
        if bill.name.trim().is_empty() {
            return Err(CoreError::Validation("bill name must not be empty".into()));
        }
        if !bill.amount.is_finite() || bill.amount < 0.0 {
            return Err(CoreError::Validation(format!(
                "bill amount must be a non-negative number, got {}",
                bill.amount
            )));
        }
        if bill.reminder_days > Bill::MAX_REMINDER_DAYS {
            return Err(CoreError::Validation(format!(
                "reminder days must be at most {}, got {}",
                Bill::MAX_REMINDER_DAYS,
                bill.reminder_days
            )));
        }
        if bill.status == BillStatus::Overdue {
            return Err(CoreError::Validation("overdue is derived and cannot be stored".into()));
        }
        if book.bill(bill.id).is_some() {
            return Err(CoreError::InvalidOperation(format!("bill {} already exists", bill.id)));
        }
        let id = bill.id;
        book.put_bill(bill);
        Ok(id)
    }

    /// Marks the bill paid. When it was unpaid and repeats, the successor bill
    /// is stored and its id returned. Paying an already-paid bill changes nothing.
    pub fn mark_paid(
        book: &mut BillBook,
        bill_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Option<Uuid>, CoreError> {
        let bill = book
            .bill_mut(bill_id)
            .ok_or(CoreError::BillNotFound(bill_id))?;
        if bill.paid {
            return Ok(None);
        }
        bill.mark_paid(clock.now());
        let successor = RecurrenceService::successor(bill, clock.time_zone());
        book.touch();

        let Some(next) = successor else {
            return Ok(None);
        };
        let next_id = next.id;
        info!(bill = %bill_id, next = %next_id, due_at = %next.due_at, "created next occurrence");
        book.put_bill(next);
        Ok(Some(next_id))
    }

    /// Reverts a payment; the bill returns to pending.
    pub fn mark_unpaid(book: &mut BillBook, bill_id: Uuid) -> Result<(), CoreError> {
        let bill = book
            .bill_mut(bill_id)
            .ok_or(CoreError::BillNotFound(bill_id))?;
        bill.mark_unpaid();
        book.touch();
        Ok(())
    }

    /// Applies a status change. Returns the successor id when the change paid a
    /// recurring bill.
    pub fn update_status(
        book: &mut BillBook,
        bill_id: Uuid,
        status: BillStatus,
        clock: &dyn Clock,
    ) -> Result<Option<Uuid>, CoreError> {
        match status {
            BillStatus::Paid => Self::mark_paid(book, bill_id, clock),
            BillStatus::Pending => Self::mark_unpaid(book, bill_id).map(|_| None),
            BillStatus::Overdue => Err(CoreError::InvalidOperation(
                "overdue is derived from the due date and cannot be set".into(),
            )),
            BillStatus::Cancelled | BillStatus::Disputed => {
                let bill = book
                    .bill_mut(bill_id)
                    .ok_or(CoreError::BillNotFound(bill_id))?;
                bill.close_as(status);
                book.touch();
                Ok(None)
            }
        }
    }

    /// Replaces the tag set on a bill.
    pub fn set_tags<I, S>(book: &mut BillBook, bill_id: Uuid, tags: I) -> Result<(), CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bill = book
            .bill_mut(bill_id)
            .ok_or(CoreError::BillNotFound(bill_id))?;
        bill.tags = tags
            .into_iter()
            .map(Into::into)
            .map(|tag: String| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        book.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use billmind_domain::Recurrence;
    use chrono::{Duration, TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock::utc(Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap())
    }

    #[test]
    fn add_rejects_negative_amounts_and_blank_names() {
        let mut book = BillBook::new("Checks");
        let now = Utc::now();
        assert!(matches!(
            BillService::add(&mut book, Bill::new("Bad", now, -1.0)),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            BillService::add(&mut book, Bill::new("  ", now, 1.0)),
            Err(CoreError::Validation(_))
        ));
        assert!(book.bills.is_empty());
    }

    #[test]
    fn add_bounds_reminder_days() {
        let mut book = BillBook::new("Checks");
        let mut far = Bill::new("Far", Utc::now(), 1.0);
        far.reminder_days = u32::MAX;
        assert!(matches!(
            BillService::add(&mut book, far),
            Err(CoreError::Validation(_))
        ));

        let mut yearly = Bill::new("Yearly", Utc::now(), 1.0);
        yearly.reminder_days = Bill::MAX_REMINDER_DAYS;
        assert!(BillService::add(&mut book, yearly).is_ok());
    }

    #[test]
    fn paying_recurring_bill_creates_pending_successor() {
        let clock = clock();
        let mut book = BillBook::new("Home");
        let due = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let id = BillService::add(
            &mut book,
            Bill::new("Electricity", due, 1500.0).with_recurrence(Recurrence::Monthly),
        )
        .unwrap();

        let next_id = BillService::mark_paid(&mut book, id, &clock).unwrap().unwrap();

        let paid = book.bill(id).unwrap();
        assert!(paid.paid);
        assert_eq!(paid.paid_at, Some(clock.now()));
        assert_eq!(paid.due_at, due);

        let next = book.bill(next_id).unwrap();
        assert_eq!(next.due_at, Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap());
        assert_eq!(next.status, BillStatus::Pending);
        assert_eq!(next.name, "Electricity");
        assert_eq!(book.bills.len(), 2);
    }

    #[test]
    fn paying_twice_does_not_duplicate_successor() {
        let clock = clock();
        let mut book = BillBook::new("Home");
        let id = BillService::add(
            &mut book,
            Bill::new("Water", clock.now() - Duration::days(2), 30.0)
                .with_recurrence(Recurrence::Weekly),
        )
        .unwrap();

        assert!(BillService::mark_paid(&mut book, id, &clock).unwrap().is_some());
        assert!(BillService::mark_paid(&mut book, id, &clock).unwrap().is_none());
        assert_eq!(book.bills.len(), 2);
    }

    #[test]
    fn one_off_payment_has_no_successor() {
        let clock = clock();
        let mut book = BillBook::new("Home");
        let id = BillService::add(&mut book, Bill::new("Repair", clock.now(), 80.0)).unwrap();
        assert_eq!(BillService::mark_paid(&mut book, id, &clock).unwrap(), None);
        assert_eq!(book.bills.len(), 1);
    }

    #[test]
    fn status_changes_keep_paid_flag_consistent() {
        let clock = clock();
        let mut book = BillBook::new("Home");
        let id = BillService::add(&mut book, Bill::new("Insurance", clock.now(), 300.0)).unwrap();

        BillService::update_status(&mut book, id, BillStatus::Paid, &clock).unwrap();
        assert!(book.bill(id).unwrap().paid);

        BillService::update_status(&mut book, id, BillStatus::Disputed, &clock).unwrap();
        let bill = book.bill(id).unwrap();
        assert!(!bill.paid);
        assert_eq!(bill.paid_at, None);
        assert_eq!(bill.status, BillStatus::Disputed);

        BillService::update_status(&mut book, id, BillStatus::Pending, &clock).unwrap();
        assert_eq!(book.bill(id).unwrap().status, BillStatus::Pending);

        assert!(matches!(
            BillService::update_status(&mut book, id, BillStatus::Overdue, &clock),
            Err(CoreError::InvalidOperation(_))
        ));
    }

    #[test]
    fn unknown_bill_is_reported() {
        let mut book = BillBook::new("Home");
        let missing = Uuid::new_v4();
        assert!(matches!(
            BillService::mark_unpaid(&mut book, missing),
            Err(CoreError::BillNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let mut book = BillBook::new("Home");
        let id = BillService::add(&mut book, Bill::new("Rent", Utc::now(), 900.0)).unwrap();
        BillService::set_tags(&mut book, id, ["home ", "home", "", "monthly"]).unwrap();
        let tags: Vec<&str> = book.bill(id).unwrap().tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["home", "monthly"]);
    }
}
