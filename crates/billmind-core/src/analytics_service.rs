//! Period-over-period spending analytics.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use billmind_domain::{
    shift_month, shift_year, start_of_month, Bill, BillBook, BillCategory, PaymentMode,
};

use crate::{time::Clock, CoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timeframe {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Week,
        Timeframe::Month,
        Timeframe::Quarter,
        Timeframe::Year,
    ];

    /// First local day of the window containing `today`. Weeks start on Monday.
    pub fn start_date(self, today: NaiveDate) -> NaiveDate {
        match self {
            Timeframe::Week => today
                .checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_monday())))
                .unwrap_or(today),
            Timeframe::Month => start_of_month(today),
            Timeframe::Quarter => {
                let first_month = (today.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(today.year(), first_month, 1).unwrap_or(today)
            }
            Timeframe::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        }
    }

    /// Start of the window immediately before the one beginning at `start`.
    pub fn previous_start(self, start: NaiveDate) -> NaiveDate {
        let previous = match self {
            Timeframe::Week => start.checked_sub_days(Days::new(7)),
            Timeframe::Month => shift_month(start, -1),
            Timeframe::Quarter => shift_month(start, -3),
            Timeframe::Year => shift_year(start, -1),
        };
        previous.unwrap_or(start)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Timeframe::Week => "Week",
            Timeframe::Month => "Month",
            Timeframe::Quarter => "Quarter",
            Timeframe::Year => "Year",
        };
        f.write_str(label)
    }
}

impl FromStr for Timeframe {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tf| tf.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::Validation(format!("unknown timeframe `{s}`")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsReport {
    pub timeframe: Timeframe,
    pub window_start: DateTime<Utc>,
    pub total_spent: f64,
    pub average_bill: f64,
    pub bill_count: usize,
    /// Percentage change against the previous window; `None` when that window is empty.
    pub spending_trend: Option<f64>,
    pub bill_count_trend: Option<f64>,
    /// Month start (local) and total, oldest first.
    pub monthly_series: Vec<(NaiveDate, f64)>,
    pub by_category: Vec<(BillCategory, f64)>,
    pub by_payment_mode: Vec<(PaymentMode, f64)>,
    pub transaction_total: f64,
    pub transaction_count: usize,
}

pub struct AnalyticsService;

impl AnalyticsService {
    /// Builds the report for the window containing the clock's current date,
    /// optionally narrowed to one bill category.
    pub fn report(
        book: &BillBook,
        timeframe: Timeframe,
        category: Option<BillCategory>,
        clock: &dyn Clock,
    ) -> AnalyticsReport {
        let tz = clock.time_zone();
        let start_day = timeframe.start_date(clock.today());
        let start = local_midnight(start_day, tz);
        let previous_start = local_midnight(timeframe.previous_start(start_day), tz);

        let in_category = |bill: &&Bill| category.map_or(true, |c| bill.category == c);
        let current: Vec<&Bill> = book
            .bills
            .iter()
            .filter(in_category)
            .filter(|bill| bill.due_at >= start)
            .collect();
        let previous: Vec<&Bill> = book
            .bills
            .iter()
            .filter(in_category)
            .filter(|bill| bill.due_at >= previous_start && bill.due_at < start)
            .collect();

        let total_spent: f64 = current.iter().map(|bill| bill.amount).sum();
        let previous_spent: f64 = previous.iter().map(|bill| bill.amount).sum();
        let average_bill = if current.is_empty() {
            0.0
        } else {
            total_spent / current.len() as f64
        };

        let mut monthly: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut by_category: BTreeMap<BillCategory, f64> = BTreeMap::new();
        let mut by_mode: BTreeMap<PaymentMode, f64> = BTreeMap::new();
        for bill in &current {
            let month = start_of_month(bill.due_at.with_timezone(&tz).date_naive());
            *monthly.entry(month).or_default() += bill.amount;
            *by_category.entry(bill.category).or_default() += bill.amount;
            *by_mode.entry(bill.payment_mode).or_default() += bill.amount;
        }

        let transactions: Vec<f64> = book
            .transactions
            .iter()
            .filter(|txn| txn.occurred_at >= start)
            .map(|txn| txn.amount)
            .collect();

        AnalyticsReport {
            timeframe,
            window_start: start,
            total_spent,
            average_bill,
            bill_count: current.len(),
            spending_trend: percent_change(total_spent, previous_spent),
            bill_count_trend: percent_change(current.len() as f64, previous.len() as f64),
            monthly_series: monthly.into_iter().collect(),
            by_category: descending(by_category),
            by_payment_mode: descending(by_mode),
            transaction_total: transactions.iter().sum(),
            transaction_count: transactions.len(),
        }
    }
}

fn local_midnight(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = day.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        // Midnight skipped by a DST change: the UTC reading is close enough for a window edge.
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous * 100.0)
    }
}

fn descending<K>(totals: BTreeMap<K, f64>) -> Vec<(K, f64)> {
    let mut out: Vec<_> = totals.into_iter().collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1));
    out
}
