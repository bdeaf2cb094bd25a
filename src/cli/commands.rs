//! Handlers behind each subcommand.

use std::{
    fs::File,
    io::{self, IsTerminal, Read, Write},
    path::PathBuf,
};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::info;

use billmind_core::{
    write_bills_csv, write_transactions_csv, AnalyticsService, BillBookStorage, BillService, Clock,
    ImportOutcome, ImportService, Reconciliation, RecurrenceService, ReminderService,
    SpendingPredictor, SummaryService, TextExtractor, Timeframe, TransactionService,
};
use billmind_domain::{total_amount, Bill, BillBook, Transaction};

use super::{
    context::{resolve_bill_id, AppContext},
    output::{self, money, percent, status_label},
    parse,
    table::{Table, TableColumn},
    ConfigCommand, ExportKind,
};
use crate::{
    errors::{CliError, CliResult},
    utils::build_info,
};

const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Raw `add` arguments, parsed once the context is known.
#[derive(Debug, Clone)]
pub struct NewBill {
    pub name: String,
    pub amount: String,
    pub due: String,
    pub category: String,
    pub mode: String,
    pub recurrence: String,
    pub every: Option<i64>,
    pub card: Option<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

/// Raw `add-transaction` arguments.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub payee: String,
    pub amount: String,
    pub date: Option<String>,
    pub category: String,
    pub card: Option<String>,
    pub currency: Option<String>,
}

pub fn version() {
    for line in build_info::current().describe() {
        println!("{line}");
    }
}

pub fn import(ctx: &AppContext, text: Option<String>) -> CliResult<()> {
    let text = match text {
        Some(text) => text,
        None => read_stdin()?,
    };
    let mut book = ctx.load_book()?;
    let extractor = TextExtractor::new(ctx.tz());
    let outcome = ImportService::import_text(&mut book, &extractor, &text)?;
    persist(ctx, &book)?;
    report_import(ctx, &book, &outcome);
    Ok(())
}

fn report_import(ctx: &AppContext, book: &BillBook, outcome: &ImportOutcome) {
    let currency = &ctx.config.currency;
    let txn = &outcome.transaction;
    output::success(format!(
        "Recorded {} {} on {}",
        txn.payee,
        money(currency, txn.amount),
        local(txn.occurred_at, ctx.tz())
    ));
    match outcome.reconciliation {
        Reconciliation::Accrued {
            bill_id,
            new_amount,
        } => {
            let name = bill_name(book, bill_id);
            output::info(format!("Added to {name} (now {})", money(currency, new_amount)));
        }
        Reconciliation::Created { bill_id } => {
            if let Some(bill) = book.bill(bill_id) {
                output::info(format!(
                    "Created {} due {}",
                    bill.name,
                    local(bill.due_at, ctx.tz())
                ));
            }
        }
        Reconciliation::Skipped => {
            output::warning("No card reference; transaction recorded without a bill");
        }
    }
}

pub fn add_transaction(ctx: &AppContext, args: NewTransaction) -> CliResult<()> {
    let tz = ctx.tz();
    let occurred_at = match args.date {
        Some(raw) => parse::parse_due(&raw, tz)?,
        None => ctx.clock.now(),
    };
    let mut txn = Transaction::new(occurred_at, args.payee, parse::parse_amount(&args.amount)?)
        .with_category(parse::parse_transaction_category(&args.category)?)
        .with_channel("Manual");
    if let Some(card) = args.card {
        txn = txn.with_card_reference(card.trim());
    }
    let ledger_currency = ctx.config.currency.as_str();
    let currency = args.currency.as_deref().unwrap_or(ledger_currency);

    let mut book = ctx.load_book()?;
    let outcome = TransactionService::add(&mut book, txn, currency, ledger_currency, tz)?;
    persist(ctx, &book)?;
    report_import(ctx, &book, &outcome);
    Ok(())
}

pub fn add(ctx: &AppContext, args: NewBill) -> CliResult<()> {
    let tz = ctx.tz();
    let mut bill = Bill::new(
        args.name,
        parse::parse_due(&args.due, tz)?,
        parse::parse_amount(&args.amount)?,
    )
    .with_category(parse::parse_category(&args.category)?)
    .with_payment_mode(parse::parse_payment_mode(&args.mode)?)
    .with_recurrence(parse::parse_recurrence(&args.recurrence, args.every)?)
    .with_tags(args.tags);
    if let Some(card) = args.card {
        bill = bill.with_card_reference(card.trim());
    }
    if let Some(notes) = args.notes {
        bill = bill.with_notes(notes);
    }
    bill.reminder_days = ctx.config.reminder_days;

    let mut book = ctx.load_book()?;
    let id = BillService::add(&mut book, bill)?;
    persist(ctx, &book)?;
    output::success(format!("Added bill {}", short_id(&id.to_string())));
    Ok(())
}

pub fn list(ctx: &AppContext, all: bool, tag: Option<&str>) -> CliResult<()> {
    let book = ctx.load_book()?;
    let now = ctx.clock.now();
    let tz = ctx.tz();
    let bills: Vec<&Bill> = book
        .bills_by_due_date()
        .into_iter()
        .filter(|bill| all || bill.is_open())
        .filter(|bill| tag.map_or(true, |tag| bill.has_tag(tag)))
        .collect();
    if bills.is_empty() {
        output::info("No bills.");
        return Ok(());
    }

    let mut table = Table::new(vec![
        TableColumn::left("ID"),
        TableColumn::left("Name").max(28),
        TableColumn::left("Due"),
        TableColumn::right("Amount"),
        TableColumn::left("Category"),
        TableColumn::left("Mode"),
        TableColumn::left("Repeats"),
        TableColumn::left("Status"),
    ]);
    for bill in bills {
        table.push(vec![
            short_id(&bill.id.to_string()),
            bill.name.clone(),
            local(bill.due_at, tz),
            format!("{:.2}", bill.amount),
            bill.category.to_string(),
            bill.payment_mode.to_string(),
            bill.recurrence.to_string(),
            status_label(bill.effective_status(now)),
        ]);
    }
    println!("{}", table.render());
    Ok(())
}

pub fn show(ctx: &AppContext, id: &str) -> CliResult<()> {
    let book = ctx.load_book()?;
    let bill_id = resolve_bill_id(&book, id)?;
    let Some(bill) = book.bill(bill_id) else {
        return Err(CliError::UnknownBill(id.to_string()));
    };
    let tz = ctx.tz();
    let now = ctx.clock.now();

    output::section(&bill.name);
    println!("id          : {}", bill.id);
    println!("amount      : {}", money(&ctx.config.currency, bill.amount));
    println!("due         : {}", local(bill.due_at, tz));
    println!("status      : {}", status_label(bill.effective_status(now)));
    println!("category    : {}", bill.category);
    println!("payment     : {}", bill.payment_mode);
    println!("repeats     : {}", bill.recurrence);
    if let Some(paid_at) = bill.paid_at {
        println!("paid at     : {}", local(paid_at, tz));
    }
    if let Some(card) = &bill.card_reference {
        println!("card        : **{card}");
    }
    if !bill.tags.is_empty() {
        let tags: Vec<&str> = bill.tags.iter().map(String::as_str).collect();
        println!("tags        : {}", tags.join(", "));
    }
    if let Some(notes) = &bill.notes {
        println!("notes       : {notes}");
    }
    println!("reminder    : {} day(s) before", bill.reminder_days);
    Ok(())
}

pub fn pay(ctx: &AppContext, id: &str) -> CliResult<()> {
    let mut book = ctx.load_book()?;
    let bill_id = resolve_bill_id(&book, id)?;
    let was_paid = book.bill(bill_id).is_some_and(|bill| bill.paid);
    let successor = BillService::mark_paid(&mut book, bill_id, &ctx.clock)?;
    persist(ctx, &book)?;

    let name = bill_name(&book, bill_id);
    if was_paid {
        output::info(format!("{name} was already paid"));
        return Ok(());
    }
    output::success(format!("Marked {name} paid"));
    if let Some(next) = successor.and_then(|next_id| book.bill(next_id)) {
        output::info(format!(
            "Next occurrence {} due {}",
            short_id(&next.id.to_string()),
            local(next.due_at, ctx.tz())
        ));
    }
    Ok(())
}

pub fn unpay(ctx: &AppContext, id: &str) -> CliResult<()> {
    let mut book = ctx.load_book()?;
    let bill_id = resolve_bill_id(&book, id)?;
    BillService::mark_unpaid(&mut book, bill_id)?;
    persist(ctx, &book)?;
    output::success(format!("Marked {} unpaid", bill_name(&book, bill_id)));
    Ok(())
}

pub fn status(ctx: &AppContext, id: &str, status: &str) -> CliResult<()> {
    let status = parse::parse_status(status)?;
    let mut book = ctx.load_book()?;
    let bill_id = resolve_bill_id(&book, id)?;
    let successor = BillService::update_status(&mut book, bill_id, status, &ctx.clock)?;
    persist(ctx, &book)?;

    output::success(format!(
        "{} is now {}",
        bill_name(&book, bill_id),
        status_label(status)
    ));
    if let Some(next) = successor.and_then(|next_id| book.bill(next_id)) {
        output::info(format!("Next occurrence due {}", local(next.due_at, ctx.tz())));
    }
    Ok(())
}

pub fn tag(ctx: &AppContext, id: &str, tags: Vec<String>) -> CliResult<()> {
    let mut book = ctx.load_book()?;
    let bill_id = resolve_bill_id(&book, id)?;
    BillService::set_tags(&mut book, bill_id, tags)?;
    persist(ctx, &book)?;
    output::success(format!("Updated tags on {}", bill_name(&book, bill_id)));
    Ok(())
}

pub fn next(ctx: &AppContext, id: &str, count: usize) -> CliResult<()> {
    let book = ctx.load_book()?;
    let bill_id = resolve_bill_id(&book, id)?;
    let Some(bill) = book.bill(bill_id) else {
        return Err(CliError::UnknownBill(id.to_string()));
    };
    let tz = ctx.tz();
    let upcoming = RecurrenceService::upcoming(bill, tz, count);
    if upcoming.is_empty() {
        output::info(format!("{} does not repeat", bill.name));
        return Ok(());
    }
    output::section(format!("{} ({})", bill.name, bill.recurrence));
    for due in upcoming {
        println!("{}", local(due, tz));
    }
    Ok(())
}

pub fn transactions(ctx: &AppContext) -> CliResult<()> {
    let book = ctx.load_book()?;
    if book.transactions.is_empty() {
        output::info("No transactions.");
        return Ok(());
    }
    let tz = ctx.tz();
    let mut rows: Vec<_> = book.transactions.iter().collect();
    rows.sort_by_key(|txn| txn.occurred_at);

    let mut table = Table::new(vec![
        TableColumn::left("When"),
        TableColumn::left("Payee").max(28),
        TableColumn::right("Amount"),
        TableColumn::left("Category"),
        TableColumn::left("Card"),
        TableColumn::left("Channel"),
    ]);
    for txn in rows {
        table.push(vec![
            local(txn.occurred_at, tz),
            txn.payee.clone(),
            format!("{:.2}", txn.amount),
            txn.category.label().to_string(),
            txn.card_reference.clone().unwrap_or_default(),
            txn.channel.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table.render());
    println!("total: {}", money(&ctx.config.currency, total_amount(&book.transactions)));
    Ok(())
}

pub fn predict(ctx: &AppContext) -> CliResult<()> {
    let book = ctx.load_book()?;
    let prediction = SpendingPredictor::new(&ctx.clock).predict(&book.bills, &book.transactions);
    let currency = &ctx.config.currency;

    output::section("Forecast");
    println!(
        "next period spending : {}",
        money(currency, prediction.next_period_spending)
    );
    println!(
        "overdue risk         : {:.1}%",
        prediction.overdue_risk_ratio * 100.0
    );
    println!(
        "savings potential    : {}",
        money(currency, prediction.savings_potential)
    );
    Ok(())
}

pub fn summary(ctx: &AppContext) -> CliResult<()> {
    let book = ctx.load_book()?;
    let summary = SummaryService::dashboard(&book, &ctx.clock);
    let currency = &ctx.config.currency;

    output::section(format!("Summary: {}", book.name));
    println!("unpaid total   : {}", money(currency, summary.unpaid_total));
    println!("overdue        : {}", summary.overdue_count);
    println!("paid           : {}", summary.paid_count);
    println!("due this month : {}", summary.due_this_month);
    if !summary.unpaid_by_category.is_empty() {
        output::section("Unpaid by category");
        for (category, total) in &summary.unpaid_by_category {
            println!("{} {:<16} {}", category.symbol(), category.label(), money(currency, *total));
        }
    }
    if !summary.spending_by_category.is_empty() {
        output::section("Spending by category");
        for (category, total) in &summary.spending_by_category {
            println!("{} {:<16} {}", category.symbol(), category.label(), money(currency, *total));
        }
    }
    Ok(())
}

pub fn analytics(ctx: &AppContext, timeframe: &str, category: Option<&str>) -> CliResult<()> {
    let timeframe: Timeframe = timeframe.parse()?;
    let category = category.map(parse::parse_category).transpose()?;
    let book = ctx.load_book()?;
    let report = AnalyticsService::report(&book, timeframe, category, &ctx.clock);
    let currency = &ctx.config.currency;

    output::section(format!(
        "Analytics: {} since {}",
        report.timeframe,
        local(report.window_start, ctx.tz())
    ));
    println!(
        "spent          : {} ({})",
        money(currency, report.total_spent),
        percent(report.spending_trend)
    );
    println!(
        "bills          : {} ({})",
        report.bill_count,
        percent(report.bill_count_trend)
    );
    println!("average bill   : {}", money(currency, report.average_bill));
    println!(
        "transactions   : {} totalling {}",
        report.transaction_count,
        money(currency, report.transaction_total)
    );
    if !report.monthly_series.is_empty() {
        output::section("By month");
        for (month, total) in &report.monthly_series {
            println!("{}  {}", month.format("%Y-%m"), money(currency, *total));
        }
    }
    if !report.by_category.is_empty() {
        output::section("By category");
        for (category, total) in &report.by_category {
            println!("{:<16} {}", category.label(), money(currency, *total));
        }
    }
    if !report.by_payment_mode.is_empty() {
        output::section("By payment mode");
        for (mode, total) in &report.by_payment_mode {
            println!("{:<16} {}", mode.label(), money(currency, *total));
        }
    }
    Ok(())
}

pub fn reminders(ctx: &AppContext) -> CliResult<()> {
    let book = ctx.load_book()?;
    let intents = ReminderService::plan(&book.bills, &ctx.config.currency, &ctx.clock);
    if intents.is_empty() {
        output::info("No upcoming reminders.");
        return Ok(());
    }
    let tz = ctx.tz();
    let mut table = Table::new(vec![
        TableColumn::left("Fires"),
        TableColumn::left("Title"),
        TableColumn::left("Message").max(60),
    ]);
    for intent in intents {
        table.push(vec![local(intent.fire_at, tz), intent.title, intent.body]);
    }
    println!("{}", table.render());
    Ok(())
}

pub fn export(ctx: &AppContext, what: ExportKind, path: Option<PathBuf>) -> CliResult<()> {
    let book = ctx.load_book()?;
    let writer: Box<dyn Write> = match &path {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    match what {
        ExportKind::Bills => write_bills_csv(writer, book.bills_by_due_date())?,
        ExportKind::Transactions => write_transactions_csv(writer, &book.transactions)?,
    }
    if let Some(path) = path {
        info!(path = %path.display(), "exported csv");
        output::success(format!("Wrote {}", path.display()));
    }
    Ok(())
}

pub fn books(ctx: &AppContext) -> CliResult<()> {
    let rows = ctx.storage.list_book_metadata()?;
    if rows.is_empty() {
        output::info("No books yet.");
        return Ok(());
    }
    let currency = &ctx.config.currency;
    let mut table = Table::new(vec![
        TableColumn::left(""),
        TableColumn::left("Book"),
        TableColumn::right("Bills"),
        TableColumn::right("Open"),
        TableColumn::right("Open total"),
        TableColumn::right("Txns"),
        TableColumn::left("Updated"),
    ]);
    for row in rows {
        let active = if row.slug == billmind_storage_json::canonical_name(&ctx.book_name) {
            "*"
        } else {
            ""
        };
        table.push(vec![
            active.to_string(),
            row.name,
            row.bill_count.to_string(),
            row.open_bill_count.to_string(),
            money(currency, row.open_total),
            row.transaction_count.to_string(),
            local(row.updated_at, ctx.tz()),
        ]);
    }
    println!("{}", table.render());
    Ok(())
}

pub fn backup(ctx: &AppContext, note: Option<&str>) -> CliResult<()> {
    let book = ctx.load_book()?;
    let info = ctx.storage.backup_book(&ctx.book_name, &book, note)?;
    output::success(format!("Backup written: {}", info.id));
    Ok(())
}

pub fn backups(ctx: &AppContext) -> CliResult<()> {
    let backups = ctx.storage.list_backups(&ctx.book_name)?;
    if backups.is_empty() {
        output::info("No backups.");
        return Ok(());
    }
    for backup in backups {
        println!("{}  {}", backup.id, backup.created_at);
    }
    Ok(())
}

pub fn restore(ctx: &AppContext, wanted: &str) -> CliResult<()> {
    billmind_config::check_backup_name(wanted)?;
    let matches: Vec<_> = ctx
        .storage
        .list_backups(&ctx.book_name)?
        .into_iter()
        .filter(|backup| backup.id == wanted || backup.id.starts_with(wanted))
        .collect();
    let backup = match matches.as_slice() {
        [only] => only,
        [] => return Err(CliError::Input(format!("no backup matches `{wanted}`"))),
        many => match many.iter().find(|backup| backup.id == wanted) {
            Some(exact) => exact,
            None => {
                return Err(CliError::Input(format!(
                    "`{wanted}` matches {} backups",
                    many.len()
                )))
            }
        },
    };
    let book = ctx.storage.restore_backup(backup)?;
    output::success(format!(
        "Restored {} from {} ({} bills)",
        book.name,
        backup.id,
        book.bills.len()
    ));
    Ok(())
}

pub fn config(ctx: &AppContext, command: ConfigCommand) -> CliResult<()> {
    let manager = &ctx.config_manager;
    match command {
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&ctx.config)?);
        }
        ConfigCommand::Set { key, value } => {
            let mut config = manager.load()?;
            apply_setting(&mut config, &key, &value)?;
            manager.save(&config)?;
            output::success(format!("Set {key} = {value}"));
        }
        ConfigCommand::Backup { note } => {
            let backup = manager.backup(&manager.load()?, note.as_deref())?;
            output::success(format!("Config backup written: {}", backup.name));
        }
        ConfigCommand::Backups => {
            let backups = manager.list_backups()?;
            if backups.is_empty() {
                output::info("No config backups.");
            }
            for backup in backups {
                let when = backup
                    .created_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default();
                println!("{}  {when}", backup.name);
            }
        }
        ConfigCommand::Restore { name } => {
            manager.restore(&name)?;
            output::success(format!("Config restored from {name}"));
        }
    }
    Ok(())
}

fn apply_setting(config: &mut billmind_config::Config, key: &str, value: &str) -> CliResult<()> {
    let value = value.trim();
    match key {
        "locale" => config.locale = value.to_string(),
        "currency" => config.currency = value.to_ascii_uppercase(),
        "time_zone" | "tz" => config.time_zone = value.to_string(),
        "reminder_days" => {
            config.reminder_days = value
                .parse()
                .map_err(|_| CliError::Input(format!("`{value}` is not a number of days")))?;
        }
        "ui_color_enabled" | "color" => {
            config.ui_color_enabled = match value.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => true,
                "false" | "no" | "off" | "0" => false,
                _ => return Err(CliError::Input(format!("`{value}` is not a boolean"))),
            };
        }
        "data_root" => config.data_root = optional_path(value),
        "backup_root" => config.backup_root = optional_path(value),
        other => return Err(CliError::Input(format!("unknown config key `{other}`"))),
    }
    Ok(())
}

fn optional_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty() && value != "default").then(|| PathBuf::from(value))
}

/// Saves the book and remembers it as the last one opened.
fn persist(ctx: &AppContext, book: &BillBook) -> CliResult<()> {
    ctx.save_book(book)?;
    if ctx.config.last_opened_book.as_deref() != Some(ctx.book_name.as_str()) {
        let name = ctx.book_name.clone();
        ctx.config_manager
            .update(|config| config.last_opened_book = Some(name))?;
    }
    Ok(())
}

fn read_stdin() -> CliResult<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(CliError::Input(
            "pass the notification text as an argument or pipe it on stdin".into(),
        ));
    }
    let mut text = String::new();
    stdin.read_to_string(&mut text)?;
    Ok(text)
}

fn bill_name(book: &BillBook, id: uuid::Uuid) -> String {
    book.bill(id)
        .map(|bill| bill.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn local(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format(LOCAL_FORMAT).to_string()
}
