use std::collections::BTreeMap;

use billmind_domain::{
    end_of_month, start_of_month, BillBook, BillCategory, TransactionCategory,
};

use crate::time::Clock;

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub unpaid_total: f64,
    pub overdue_count: usize,
    pub paid_count: usize,
    pub due_this_month: usize,
    /// Open bill totals, ordered by category label.
    pub unpaid_by_category: Vec<(BillCategory, f64)>,
    pub spending_by_category: Vec<(TransactionCategory, f64)>,
}

pub struct SummaryService;

impl SummaryService {
    pub fn dashboard(book: &BillBook, clock: &dyn Clock) -> DashboardSummary {
        let now = clock.now();
        let tz = clock.time_zone();
        let today = clock.today();
        let (month_start, month_end) = (start_of_month(today), end_of_month(today));

        let mut unpaid_total = 0.0;
        let mut unpaid: BTreeMap<BillCategory, f64> = BTreeMap::new();
        let mut due_this_month = 0;
        for bill in &book.bills {
            if bill.is_open() {
                unpaid_total += bill.amount;
                *unpaid.entry(bill.category).or_default() += bill.amount;
            }
            let due = bill.due_at.with_timezone(&tz).date_naive();
            if due >= month_start && due <= month_end {
                due_this_month += 1;
            }
        }

        let mut unpaid_by_category: Vec<_> = unpaid.into_iter().collect();
        unpaid_by_category.sort_by(|a, b| a.0.label().cmp(b.0.label()));

        let mut spending: BTreeMap<TransactionCategory, f64> = BTreeMap::new();
        for txn in &book.transactions {
            *spending.entry(txn.category).or_default() += txn.amount;
        }

        DashboardSummary {
            unpaid_total,
            overdue_count: book.bills.iter().filter(|b| b.is_overdue(now)).count(),
            paid_count: book.bills.iter().filter(|b| b.paid).count(),
            due_this_month,
            unpaid_by_category,
            spending_by_category: spending.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use billmind_domain::{Bill, Transaction};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn dashboard_counts_and_groups() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let clock = FixedClock::utc(now);
        let mut book = BillBook::new("Dash");

        book.put_bill(
            Bill::new("Power", now - Duration::days(2), 100.0).with_category(BillCategory::Utilities),
        );
        book.put_bill(
            Bill::new("Rent", now + Duration::days(30), 900.0).with_category(BillCategory::Rent),
        );
        let mut paid = Bill::new("Gym", now - Duration::days(5), 40.0)
            .with_category(BillCategory::Entertainment);
        paid.mark_paid(now);
        book.put_bill(paid);
        book.push_transaction(
            Transaction::new(now, "Cafe", 12.5).with_category(TransactionCategory::Food),
        );
        book.push_transaction(
            Transaction::new(now, "Bakery", 7.5).with_category(TransactionCategory::Food),
        );

        let summary = SummaryService::dashboard(&book, &clock);

        assert_eq!(summary.unpaid_total, 1000.0);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.paid_count, 1);
        assert_eq!(summary.due_this_month, 2);
        assert_eq!(
            summary.unpaid_by_category,
            vec![(BillCategory::Rent, 900.0), (BillCategory::Utilities, 100.0)]
        );
        assert_eq!(summary.spending_by_category, vec![(TransactionCategory::Food, 20.0)]);
    }

    #[test]
    fn empty_book_is_all_zero() {
        let clock = FixedClock::utc(Utc::now());
        let summary = SummaryService::dashboard(&BillBook::new("Empty"), &clock);
        assert_eq!(summary.unpaid_total, 0.0);
        assert!(summary.unpaid_by_category.is_empty());
    }
}
