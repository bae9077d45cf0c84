//! Terminal output for the enumperm CLI.
//!
//! Progress goes out as tagged status lines (`[OK]`, `[INFO]` on stdout,
//! `[WARN]`, `[ERROR]` on stderr). Reports switch to JSON or YAML with
//! `--output` so they can be piped.

use clap::ValueEnum;
use colored::*;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Status lines, with tables for listings
    #[default]
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Status lines are printed only for table output; JSON and YAML runs
    /// print the serialized report alone.
    pub fn is_human(self) -> bool {
        self == Self::Table
    }
}

#[derive(Clone, Copy)]
enum Status {
    Ok,
    Info,
    Warn,
    Error,
}

impl Status {
    fn tag(self) -> ColoredString {
        match self {
            Self::Ok => "[OK]".green().bold(),
            Self::Info => "[INFO]".blue().bold(),
            Self::Warn => "[WARN]".yellow().bold(),
            Self::Error => "[ERROR]".red().bold(),
        }
    }

    fn emit(self, msg: &str) {
        match self {
            Self::Ok | Self::Info => println!("{} {}", self.tag(), msg),
            Self::Warn | Self::Error => eprintln!("{} {}", self.tag(), msg),
        }
    }
}

pub fn print_success(msg: &str) {
    Status::Ok.emit(msg);
}

pub fn print_info(msg: &str) {
    Status::Info.emit(msg);
}

pub fn print_warn(msg: &str) {
    Status::Warn.emit(msg);
}

pub fn print_error(msg: &str) {
    Status::Error.emit(msg);
}

/// Rows as a rounded table, or the serialized list for JSON/YAML.
pub fn print_list<T: Tabled + Serialize>(rows: &[T], format: OutputFormat) {
    if !format.is_human() {
        print_item(rows, format);
        return;
    }
    if rows.is_empty() {
        println!("{}", "Nothing discovered.".dimmed());
        return;
    }
    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::left()));
    println!("{}", table);
}

/// Serialize a report. Table output has no tabular form for reports and
/// prints JSON.
pub fn print_item<T: Serialize + ?Sized>(item: &T, format: OutputFormat) {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(item).expect("report serializes to YAML"),
        OutputFormat::Table | OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(item).expect("report serializes to JSON");
            json.push('\n');
            json
        }
    };
    print!("{}", rendered);
}

/// Indented `key: value` line under a status line.
pub fn print_detail(key: &str, value: &str) {
    println!("    {} {}", format!("{}:", key).cyan(), value);
}

pub fn print_header(title: &str) {
    println!("\n{}\n", title.bold().underline());
}
