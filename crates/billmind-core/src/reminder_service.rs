//! Notification intents for open bills. Delivery is left to the host.

use chrono::{DateTime, Days, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use billmind_domain::{Bill, BillStatus};

use crate::time::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    /// Fires `days` before the due time.
    Advance { days: u32 },
    DueNow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderIntent {
    pub bill_id: Uuid,
    pub kind: ReminderKind,
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    /// Same bill and kind always yield the same key, so rescheduling replaces.
    pub dedupe_key: String,
}

pub struct ReminderService;

impl ReminderService {
    /// Future reminders for every open bill, earliest first.
    pub fn plan<'a, I>(bills: I, currency: &str, clock: &dyn Clock) -> Vec<ReminderIntent>
    where
        I: IntoIterator<Item = &'a Bill>,
    {
        let now = clock.now();
        let tz = clock.time_zone();
        let mut intents: Vec<ReminderIntent> = bills
            .into_iter()
            .flat_map(|bill| Self::for_bill(bill, currency, tz))
            .filter(|intent| intent.fire_at > now)
            .collect();
        intents.sort_by_key(|intent| intent.fire_at);
        intents
    }

    /// All reminders for `bill`, regardless of whether they are still ahead.
    /// The advance reminder keeps the due time of day on the calendar of `tz`.
    pub fn for_bill(bill: &Bill, currency: &str, tz: Tz) -> Vec<ReminderIntent> {
        if bill.paid || matches!(bill.status, BillStatus::Cancelled) {
            return Vec::new();
        }
        let amount = format!("{currency} {:.2}", bill.amount);
        let mut intents = Vec::with_capacity(2);

        let days = bill.reminder_days;
        if let Some(fire_at) = advance_fire_at(bill.due_at, days, tz) {
            let unit = if days == 1 { "day" } else { "days" };
            intents.push(ReminderIntent {
                bill_id: bill.id,
                kind: ReminderKind::Advance { days },
                fire_at,
                title: "Upcoming bill".into(),
                body: format!("{} ({amount}) is due in {days} {unit}.", bill.name),
                dedupe_key: format!("{}:advance:{days}", bill.id),
            });
        }

        intents.push(ReminderIntent {
            bill_id: bill.id,
            kind: ReminderKind::DueNow,
            fire_at: bill.due_at,
            title: "Bill due today".into(),
            body: format!("{} ({amount}) is due now.", bill.name),
            dedupe_key: format!("{}:due", bill.id),
        });
        intents
    }
}

/// `days` calendar days before `due_at`, or `None` when there is no advance
/// reminder or the date falls outside the representable range.
fn advance_fire_at(due_at: DateTime<Utc>, days: u32, tz: Tz) -> Option<DateTime<Utc>> {
    if days == 0 {
        return None;
    }
    let local = due_at.with_timezone(&tz).naive_local();
    let earlier = local.checked_sub_days(Days::new(u64::from(days)))?;
    match tz.from_local_datetime(&earlier).earliest() {
        Some(fire_at) => Some(fire_at.with_timezone(&Utc)),
        // Wall-clock time skipped by DST: step back by whole days instead.
        None => due_at.checked_sub_signed(Duration::days(i64::from(days))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn open_bill_gets_advance_and_due_reminders() {
        let clock = FixedClock::utc(now());
        let bill = Bill::new("Water", now() + Duration::days(3), 1234.5);

        let intents = ReminderService::plan([&bill], "LKR", &clock);

        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0].kind, ReminderKind::Advance { days: 1 });
        assert_eq!(intents[0].fire_at, now() + Duration::days(2));
        assert_eq!(intents[0].body, "Water (LKR 1234.50) is due in 1 day.");
        assert_eq!(intents[1].title, "Bill due today");
        assert_eq!(intents[1].body, "Water (LKR 1234.50) is due now.");
        assert_eq!(intents[1].dedupe_key, format!("{}:due", bill.id));
    }

    #[test]
    fn past_reminders_and_closed_bills_are_dropped() {
        let clock = FixedClock::utc(now());
        let soon = Bill::new("Soon", now() + Duration::hours(5), 10.0);
        let mut paid = Bill::new("Paid", now() + Duration::days(5), 10.0);
        paid.mark_paid(now());
        let mut cancelled = Bill::new("Cancelled", now() + Duration::days(5), 10.0);
        cancelled.close_as(BillStatus::Cancelled);
        let mut silent = Bill::new("Silent", now() + Duration::days(5), 10.0);
        silent.reminder_days = 0;

        let intents = ReminderService::plan([&soon, &paid, &cancelled, &silent], "LKR", &clock);

        let kinds: Vec<_> = intents.iter().map(|i| (i.bill_id, i.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (soon.id, ReminderKind::DueNow),
                (silent.id, ReminderKind::DueNow)
            ]
        );
    }

    #[test]
    fn dedupe_keys_are_stable() {
        let bill = Bill::new("Rent", now(), 1.0);
        assert_eq!(
            ReminderService::for_bill(&bill, "LKR", Tz::UTC),
            ReminderService::for_bill(&bill, "LKR", Tz::UTC)
        );
    }

    #[test]
    fn huge_reminder_offsets_are_skipped() {
        let clock = FixedClock::utc(now());
        let mut bill = Bill::new("Far", now() + Duration::days(3), 10.0);
        bill.reminder_days = u32::MAX;

        let intents = ReminderService::plan([&bill], "LKR", &clock);

        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].kind, ReminderKind::DueNow);
    }

    #[test]
    fn advance_reminder_keeps_local_time_across_dst() {
        use chrono_tz::Europe::London;

        // Clocks went forward on 30 March 2025.
        let due = London.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap();
        let mut bill = Bill::new("Council tax", due.with_timezone(&Utc), 120.0);
        bill.reminder_days = 5;

        let intents = ReminderService::for_bill(&bill, "GBP", London);

        let fire_local = intents[0].fire_at.with_timezone(&London);
        assert_eq!(
            fire_local.format("%Y-%m-%d %H:%M").to_string(),
            "2025-03-27 09:00"
        );
        assert_ne!(intents[0].fire_at, bill.due_at - Duration::days(5));
    }
}
