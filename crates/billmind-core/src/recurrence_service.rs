//! Calendar-aware recurrence of bill due dates.

use chrono::{DateTime, LocalResult, TimeZone, Utc};
use chrono_tz::Tz;

use billmind_domain::{Bill, Recurrence};

/// Computes the occurrence that follows `due_at` under `rule`.
///
/// Arithmetic happens on the wall-clock time of `due_at`'s zone, so "monthly"
/// means the same day next month (clamped to the month's last day) rather than
/// a fixed offset. When the shifted wall-clock time does not exist in the zone
/// (a DST gap) the elapsed calendar interval is applied to the instant instead.
pub fn next_occurrence<Z: TimeZone>(due_at: &DateTime<Z>, rule: Recurrence) -> Option<DateTime<Z>> {
    let local = due_at.naive_local();
    let next_local = rule.advance(local)?;
    match due_at.timezone().from_local_datetime(&next_local) {
        LocalResult::Single(next) => Some(next),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => due_at.clone().checked_add_signed(next_local - local),
    }
}

/// Recurrence helpers that operate on stored bills.
pub struct RecurrenceService;

impl RecurrenceService {
    /// Next due instant for `bill`, computed on the calendar of `tz`.
    pub fn next_due(bill: &Bill, tz: Tz) -> Option<DateTime<Utc>> {
        next_occurrence(&bill.due_at.with_timezone(&tz), bill.recurrence)
            .map(|next| next.with_timezone(&Utc))
    }

    /// The pending bill that follows `bill`, if its rule repeats.
    pub fn successor(bill: &Bill, tz: Tz) -> Option<Bill> {
        Self::next_due(bill, tz).map(|due_at| bill.successor(due_at))
    }

    /// Up to `limit` upcoming due instants after the bill's own due date.
    pub fn upcoming(bill: &Bill, tz: Tz, limit: usize) -> Vec<DateTime<Utc>> {
        let mut out = Vec::new();
        let mut cursor = bill.due_at.with_timezone(&tz);
        while out.len() < limit {
            match next_occurrence(&cursor, bill.recurrence) {
                Some(next) => {
                    out.push(next.with_timezone(&Utc));
                    cursor = next;
                }
                None => break,
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, NaiveDate, Timelike};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn one_off_and_invalid_custom_rules_stop() {
        let due = utc(2025, 5, 1, 9, 0);
        assert_eq!(next_occurrence(&due, Recurrence::OneOff), None);
        assert_eq!(next_occurrence(&due, Recurrence::Custom(None)), None);
        assert_eq!(next_occurrence(&due, Recurrence::Custom(Some(0))), None);
        assert_eq!(next_occurrence(&due, Recurrence::Custom(Some(-7))), None);
    }

    #[test]
    fn fixed_rules_advance_by_calendar_units() {
        let due = utc(2025, 5, 1, 9, 0);
        assert_eq!(next_occurrence(&due, Recurrence::Daily), Some(utc(2025, 5, 2, 9, 0)));
        assert_eq!(next_occurrence(&due, Recurrence::Weekly), Some(utc(2025, 5, 8, 9, 0)));
        assert_eq!(next_occurrence(&due, Recurrence::Monthly), Some(utc(2025, 6, 1, 9, 0)));
        assert_eq!(next_occurrence(&due, Recurrence::Yearly), Some(utc(2026, 5, 1, 9, 0)));
        assert_eq!(
            next_occurrence(&due, Recurrence::Custom(Some(15))),
            Some(utc(2025, 5, 16, 9, 0))
        );
    }

    #[test]
    fn monthly_clamps_to_end_of_february() {
        let due = utc(2025, 1, 31, 12, 0);
        assert_eq!(next_occurrence(&due, Recurrence::Monthly), Some(utc(2025, 2, 28, 12, 0)));

        let leap = utc(2024, 1, 31, 12, 0);
        assert_eq!(next_occurrence(&leap, Recurrence::Monthly), Some(utc(2024, 2, 29, 12, 0)));
    }

    #[test]
    fn yearly_from_leap_day_lands_on_feb_28() {
        let due = utc(2024, 2, 29, 8, 0);
        assert_eq!(next_occurrence(&due, Recurrence::Yearly), Some(utc(2025, 2, 28, 8, 0)));
    }

    #[test]
    fn every_repeating_rule_moves_forward() {
        let rules = [
            Recurrence::Daily,
            Recurrence::Weekly,
            Recurrence::Monthly,
            Recurrence::Yearly,
            Recurrence::Custom(Some(1)),
            Recurrence::Custom(Some(45)),
        ];
        let starts = [
            utc(2024, 2, 29, 0, 0),
            utc(2025, 12, 31, 23, 59),
            utc(2025, 3, 30, 1, 30),
        ];
        for rule in rules {
            for start in starts {
                let next = next_occurrence(&start, rule).expect("repeating rule");
                assert!(next > start, "{rule} from {start} gave {next}");
            }
        }
    }

    #[test]
    fn monthly_keeps_local_wall_clock_time() {
        let tz = chrono_tz::Asia::Colombo;
        let due = tz.with_ymd_and_hms(2025, 1, 31, 23, 59, 0).unwrap();
        let next = next_occurrence(&due, Recurrence::Monthly).unwrap();

        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!((next.hour(), next.minute()), (23, 59));
    }

    #[test]
    fn dst_gap_falls_back_to_elapsed_interval() {
        let tz = chrono_tz::America::New_York;
        // 02:30 on 2025-03-09 does not exist in New York.
        let due = tz.with_ymd_and_hms(2025, 3, 8, 2, 30, 0).unwrap();
        let next = next_occurrence(&due, Recurrence::Daily).unwrap();

        assert_eq!(next, due + Duration::days(1));
        assert_eq!(next.day(), 9);
    }

    #[test]
    fn chained_successors_advance_consistently() {
        let bill = Bill::new("Internet", utc(2025, 1, 31, 6, 0), 49.0)
            .with_recurrence(Recurrence::Monthly);
        let first = RecurrenceService::successor(&bill, Tz::UTC).unwrap();
        let second = RecurrenceService::successor(&first, Tz::UTC).unwrap();

        assert_eq!(first.due_at, utc(2025, 2, 28, 6, 0));
        assert_eq!(second.due_at, utc(2025, 3, 28, 6, 0));
        assert_eq!(second.recurrence, Recurrence::Monthly);
        assert_eq!(second.amount, 49.0);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn upcoming_lists_future_due_dates() {
        let bill = Bill::new("Gym", utc(2025, 1, 1, 7, 0), 20.0)
            .with_recurrence(Recurrence::Weekly);
        let upcoming = RecurrenceService::upcoming(&bill, Tz::UTC, 3);
        assert_eq!(
            upcoming,
            vec![utc(2025, 1, 8, 7, 0), utc(2025, 1, 15, 7, 0), utc(2025, 1, 22, 7, 0)]
        );

        let once = Bill::new("Once", utc(2025, 1, 1, 7, 0), 1.0);
        assert!(RecurrenceService::upcoming(&once, Tz::UTC, 3).is_empty());
    }

    #[test]
    fn huge_limits_are_not_preallocated() {
        let once = Bill::new("Once", utc(2025, 1, 1, 7, 0), 1.0);
        assert!(RecurrenceService::upcoming(&once, Tz::UTC, usize::MAX).is_empty());

        let yearly = Bill::new("Licence", utc(2025, 1, 1, 7, 0), 1.0)
            .with_recurrence(Recurrence::Yearly);
        assert_eq!(RecurrenceService::upcoming(&yearly, Tz::UTC, 0), Vec::<DateTime<Utc>>::new());
    }
}
