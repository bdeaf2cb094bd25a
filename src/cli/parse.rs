//! Argument parsing shared by the subcommands.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use billmind_domain::{BillCategory, BillStatus, PaymentMode, Recurrence, TransactionCategory};

use crate::errors::{CliError, CliResult};

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Reads a local due date; a bare date means 23:59 that day.
pub fn parse_due(raw: &str, tz: Tz) -> CliResult<DateTime<Utc>> {
    let raw = raw.trim();
    let naive = DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
            Some(day.and_time(NaiveTime::from_hms_opt(23, 59, 0)?))
        })
        .ok_or_else(|| CliError::Input(format!("`{raw}` is not a date (use YYYY-MM-DD [HH:MM])")))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| CliError::Input(format!("{naive} does not exist in {}", tz.name())))
}

pub fn parse_recurrence(raw: &str, every: Option<i64>) -> CliResult<Recurrence> {
    let rule = match normalize(raw).as_str() {
        "none" | "once" | "one off" => Recurrence::OneOff,
        "daily" => Recurrence::Daily,
        "weekly" => Recurrence::Weekly,
        "monthly" => Recurrence::Monthly,
        "yearly" | "annual" => Recurrence::Yearly,
        "custom" => match every {
            Some(days) if days > 0 => Recurrence::Custom(Some(days)),
            _ => return Err(CliError::Input("custom recurrence needs --every <days> above 0".into())),
        },
        other => return Err(CliError::Input(format!("unknown recurrence `{other}`"))),
    };
    Ok(rule)
}

pub fn parse_category(raw: &str) -> CliResult<BillCategory> {
    BillCategory::from_label(&normalize(raw))
        .ok_or_else(|| CliError::Input(format!("unknown category `{raw}`")))
}

pub fn parse_transaction_category(raw: &str) -> CliResult<TransactionCategory> {
    TransactionCategory::from_label(&normalize(raw))
        .ok_or_else(|| CliError::Input(format!("unknown transaction category `{raw}`")))
}

pub fn parse_payment_mode(raw: &str) -> CliResult<PaymentMode> {
    PaymentMode::from_label(&normalize(raw))
        .ok_or_else(|| CliError::Input(format!("unknown payment mode `{raw}`")))
}

pub fn parse_status(raw: &str) -> CliResult<BillStatus> {
    let status = match normalize(raw).as_str() {
        "pending" => BillStatus::Pending,
        "paid" => BillStatus::Paid,
        "overdue" => BillStatus::Overdue,
        "cancelled" | "canceled" => BillStatus::Cancelled,
        "disputed" => BillStatus::Disputed,
        other => return Err(CliError::Input(format!("unknown status `{other}`"))),
    };
    Ok(status)
}

pub fn parse_amount(raw: &str) -> CliResult<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| CliError::Input(format!("`{raw}` is not an amount")))
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .replace(['_', '-'], " ")
}
