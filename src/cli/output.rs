use std::fmt;

use colored::{Color, Colorize};

use billmind_domain::BillStatus;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Section,
}

/// Turns ANSI colouring on or off for the rest of the process.
pub fn set_color_enabled(enabled: bool) {
    if enabled {
        colored::control::unset_override();
    } else {
        colored::control::set_override(false);
    }
}

pub fn styled(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Info => text,
        MessageKind::Success => format!("[✓] {text}").bright_green().to_string(),
        MessageKind::Warning => format!("[!] {text}").bright_yellow().to_string(),
        MessageKind::Section => format!("=== {} ===", text.trim()).bold().to_string(),
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    println!("{}", styled(kind, message));
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Status label coloured by urgency.
pub fn status_label(status: BillStatus) -> String {
    let color = match status {
        BillStatus::Paid => Color::Green,
        BillStatus::Overdue => Color::Red,
        BillStatus::Pending => Color::Yellow,
        BillStatus::Disputed => Color::Magenta,
        BillStatus::Cancelled => Color::BrightBlack,
    };
    status.to_string().color(color).to_string()
}

pub fn money(currency: &str, amount: f64) -> String {
    format!("{currency} {amount:.2}")
}

pub fn percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v >= 0.0 => format!("+{v:.1}%"),
        Some(v) => format!("{v:.1}%"),
        None => "n/a".to_string(),
    }
}
