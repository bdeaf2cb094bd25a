//! Command-line frontend over the BillMind services.

pub mod commands;
pub mod context;
pub mod output;
pub mod parse;
pub mod table;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::errors::CliResult;
use context::AppContext;

#[derive(Parser, Debug)]
#[command(
    name = "billmind",
    version,
    about = "Track recurring bills, import bank notifications and forecast spending"
)]
pub struct Cli {
    /// Keep config, books and backups under this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Book to operate on (default: last opened, or "default")
    #[arg(long, global = true)]
    pub book: Option<String>,

    /// IANA time zone overriding the configured one, e.g. Asia/Colombo
    #[arg(long, global = true, value_name = "ZONE")]
    pub tz: Option<String>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a bank notification and reconcile it into card bills (reads stdin without TEXT)
    Import { text: Option<String> },

    /// Add a bill
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        amount: String,

        /// Local due date, YYYY-MM-DD [HH:MM]; a bare date means 23:59
        #[arg(long)]
        due: String,

        #[arg(long, default_value = "General")]
        category: String,

        /// Payment mode: cash, card, bank-transfer, digital, check, other
        #[arg(long, default_value = "Cash")]
        mode: String,

        /// none, daily, weekly, monthly, yearly or custom
        #[arg(long, default_value = "none")]
        recurrence: String,

        /// Interval in days for a custom recurrence
        #[arg(long)]
        every: Option<i64>,

        /// Last four digits of the card this bill belongs to
        #[arg(long)]
        card: Option<String>,

        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Record a transaction by hand; a card reference reconciles it into that card's bill
    AddTransaction {
        #[arg(long)]
        payee: String,

        #[arg(long)]
        amount: String,

        /// Local time of the payment, YYYY-MM-DD [HH:MM] (default: now)
        #[arg(long)]
        date: Option<String>,

        /// food, transport, shopping, utilities or other
        #[arg(long, default_value = "Other")]
        category: String,

        /// Last four digits of the card used
        #[arg(long)]
        card: Option<String>,

        /// Currency of the amount (default: the configured currency)
        #[arg(long)]
        currency: Option<String>,
    },

    /// List bills ordered by due date
    List {
        /// Include paid and cancelled bills
        #[arg(long)]
        all: bool,

        #[arg(long)]
        tag: Option<String>,
    },

    /// Show one bill in detail
    Show { id: String },

    /// Mark a bill paid; recurring bills roll over to their next occurrence
    Pay { id: String },

    /// Revert a payment
    Unpay { id: String },

    /// Set a bill's status (pending, paid, cancelled, disputed)
    Status { id: String, status: String },

    /// Replace a bill's tags
    Tag { id: String, tags: Vec<String> },

    /// Upcoming due dates of a recurring bill
    Next {
        id: String,

        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u16).range(1..=120))]
        count: u16,
    },

    /// List recorded transactions
    Transactions,

    /// Forecast next period spending and overdue risk
    Predict,

    /// Dashboard totals
    Summary,

    /// Period-over-period analytics
    Analytics {
        /// week, month, quarter or year
        #[arg(long, default_value = "month")]
        timeframe: String,

        #[arg(long)]
        category: Option<String>,
    },

    /// Reminders that are still ahead
    Reminders,

    /// Write bills or transactions as CSV
    Export {
        #[arg(value_enum)]
        what: ExportKind,

        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List stored books
    Books,

    /// Snapshot the active book
    Backup {
        #[arg(long)]
        note: Option<String>,
    },

    /// List backups of the active book
    Backups,

    /// Restore the active book from a backup (file name or its prefix)
    Restore { backup: String },

    /// Inspect or change preferences
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Print build information
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    Bills,
    Transactions,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    /// Keys: locale, currency, time_zone, reminder_days, ui_color_enabled, data_root, backup_root
    Set { key: String, value: String },
    /// Snapshot the config file
    Backup {
        #[arg(long)]
        note: Option<String>,
    },
    Backups,
    Restore { name: String },
}

/// Parses `std::env::args` and runs the selected command.
pub fn run_cli() -> CliResult<()> {
    run(Cli::parse())
}

pub fn run(cli: Cli) -> CliResult<()> {
    if let Command::Version = cli.command {
        commands::version();
        return Ok(());
    }

    let ctx = AppContext::open(cli.data_dir, cli.book, cli.tz)?;
    output::set_color_enabled(ctx.config.ui_color_enabled && !cli.no_color);

    match cli.command {
        Command::Import { text } => commands::import(&ctx, text),
        Command::Add {
            name,
            amount,
            due,
            category,
            mode,
            recurrence,
            every,
            card,
            tags,
            notes,
        } => commands::add(
            &ctx,
            commands::NewBill {
                name,
                amount,
                due,
                category,
                mode,
                recurrence,
                every,
                card,
                tags,
                notes,
            },
        ),
        Command::AddTransaction {
            payee,
            amount,
            date,
            category,
            card,
            currency,
        } => commands::add_transaction(
            &ctx,
            commands::NewTransaction {
                payee,
                amount,
                date,
                category,
                card,
                currency,
            },
        ),
        Command::List { all, tag } => commands::list(&ctx, all, tag.as_deref()),
        Command::Show { id } => commands::show(&ctx, &id),
        Command::Pay { id } => commands::pay(&ctx, &id),
        Command::Unpay { id } => commands::unpay(&ctx, &id),
        Command::Status { id, status } => commands::status(&ctx, &id, &status),
        Command::Tag { id, tags } => commands::tag(&ctx, &id, tags),
        Command::Next { id, count } => commands::next(&ctx, &id, usize::from(count)),
        Command::Transactions => commands::transactions(&ctx),
        Command::Predict => commands::predict(&ctx),
        Command::Summary => commands::summary(&ctx),
        Command::Analytics {
            timeframe,
            category,
        } => commands::analytics(&ctx, &timeframe, category.as_deref()),
        Command::Reminders => commands::reminders(&ctx),
        Command::Export { what, output } => commands::export(&ctx, what, output),
        Command::Books => commands::books(&ctx),
        Command::Backup { note } => commands::backup(&ctx, note.as_deref()),
        Command::Backups => commands::backups(&ctx),
        Command::Restore { backup } => commands::restore(&ctx, &backup),
        Command::Config { command } => commands::config(&ctx, command),
        Command::Version => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "billmind", "list", "--all", "--data-dir", "/tmp/bm", "--tz", "UTC",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/bm")));
        assert_eq!(cli.tz.as_deref(), Some("UTC"));
        assert!(matches!(cli.command, Command::List { all: true, tag: None }));
    }

    #[test]
    fn export_kind_is_validated() {
        assert!(Cli::try_parse_from(["billmind", "export", "bills"]).is_ok());
        assert!(Cli::try_parse_from(["billmind", "export", "receipts"]).is_err());
    }

    #[test]
    fn next_count_is_bounded() {
        let cli = Cli::try_parse_from(["billmind", "next", "abc", "--count", "12"]).unwrap();
        assert!(matches!(cli.command, Command::Next { count: 12, .. }));
        assert!(Cli::try_parse_from(["billmind", "next", "abc", "--count", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["billmind", "next", "abc", "--count", "18446744073709551615"])
                .is_err()
        );
    }
}
