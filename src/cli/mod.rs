use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::application::{CategoryReport, LedgerService};
use crate::domain::{format_cents, Entry, LedgerContents, LedgerSummary};
use crate::storage::{LedgerConfig, DEFAULT_DATA_DIR, DEFAULT_LEDGER_FILE, LEDGER_HEADER};

/// Inputs that end the interactive prompt.
const QUIT_COMMANDS: [&str; 3] = ["q", "quit", "exit"];

/// Number of entries shown under the spending table.
const RECENT_ENTRIES: usize = 5;

/// Spendlog - Personal Expense Ledger
#[derive(Debug, Parser)]
#[command(name = "spendlog")]
#[command(about = "Record expenses into a CSV ledger and summarize spending by category")]
#[command(version)]
pub struct Cli {
    /// Directory holding the ledger file
    #[arg(long, env = "SPENDLOG_DATA_DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    pub data_dir: PathBuf,

    /// Ledger file name inside the data directory
    #[arg(long, env = "SPENDLOG_FILE", default_value = DEFAULT_LEDGER_FILE, global = true)]
    pub file: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the ledger file if it doesn't exist
    Init,

    /// Record a single expense
    Add {
        /// Date: YYYY-MM-DD, YYYY/MM/DD, "today" or "t"
        date: String,

        /// Amount spent (e.g., "120" or "4.50")
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Spending category (e.g., "lunch", "transit")
        category: String,

        /// Optional free-text note
        note: Vec<String>,
    },

    /// Enter expenses interactively, one per line
    Prompt,

    /// List recorded expenses in ledger order
    List {
        /// Only show the most recent N entries
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Category spending breakdown
    Summary {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
    /// Comma-separated values.
    Csv,
}

/// Install the stderr tracing subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

impl Cli {
    /// Ledger location resolved from flags and environment.
    pub fn config(&self) -> LedgerConfig {
        LedgerConfig::new(self.data_dir.clone(), self.file.clone())
    }

    pub fn run(self) -> Result<()> {
        let service = LedgerService::open(self.config());
        debug!(path = %service.ledger_path().display(), "using ledger");

        let stdout = io::stdout();
        let mut out = stdout.lock();

        match self.command {
            Commands::Init => {
                service.init().context("Failed to initialize ledger")?;
                writeln!(out, "Ledger ready: {}", service.ledger_path().display())?;
            }

            Commands::Add {
                date,
                amount,
                category,
                note,
            } => {
                let entry = service.record_expense(&date, &amount, &category, &note.join(" "))?;
                info!(
                    date = %entry.date_string(),
                    amount = %entry.amount_string(),
                    category = %entry.category,
                    "recorded expense"
                );
                writeln!(out, "Saved: {}", describe_entry(&entry))?;
            }

            Commands::Prompt => {
                let stdin = io::stdin();
                let saved = run_prompt(&service, stdin.lock(), &mut out)?;
                debug!(saved, "prompt finished");
            }

            Commands::List { limit, format } => {
                run_list_command(&service, limit, format, &mut out)?;
            }

            Commands::Summary { format } => {
                run_summary_command(&service, format, &mut out)?;
            }
        }

        Ok(())
    }
}

/// Interactive entry loop. Bad lines are reported and the loop carries on.
/// Returns the number of entries saved.
pub fn run_prompt<R: BufRead, W: Write>(
    service: &LedgerService,
    input: R,
    out: &mut W,
) -> Result<usize> {
    writeln!(out, "=== Expense Input ===")?;
    writeln!(out, "Format: date amount category [note]")?;
    writeln!(out, "Example: 2025-12-14 120 lunch bubble tea")?;
    writeln!(out, "Type 'q' to quit.")?;
    writeln!(out)?;

    let mut saved = 0;
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line.context("Failed to read input")?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if QUIT_COMMANDS
            .iter()
            .any(|quit| line.eq_ignore_ascii_case(quit))
        {
            break;
        }

        let Some((date, amount, category, note)) = split_prompt_line(line) else {
            writeln!(out, "Need at least: date amount category (note optional).")?;
            continue;
        };

        match service.record_expense(date, amount, category, &note) {
            Ok(entry) => {
                saved += 1;
                info!(
                    date = %entry.date_string(),
                    amount = %entry.amount_string(),
                    category = %entry.category,
                    "recorded expense"
                );
                writeln!(out, "Saved: {}", describe_entry(&entry))?;
            }
            Err(err) => {
                if !err.is_validation() {
                    warn!(error = %err, "failed to record expense");
                }
                writeln!(out, "Error: {}", err)?;
            }
        }
    }

    writeln!(out, "Bye! Data saved to: {}", service.ledger_path().display())?;
    Ok(saved)
}

/// Split `date amount category [note...]`; note words are re-joined by single spaces.
fn split_prompt_line(line: &str) -> Option<(&str, &str, &str, String)> {
    let mut parts = line.split_whitespace();
    let date = parts.next()?;
    let amount = parts.next()?;
    let category = parts.next()?;
    let note = parts.collect::<Vec<_>>().join(" ");
    Some((date, amount, category, note))
}

fn describe_entry(entry: &Entry) -> String {
    let mut text = format!(
        "{}, {}, {}",
        entry.date_string(),
        entry.amount_string(),
        entry.category
    );
    if !entry.note.is_empty() {
        text.push_str(&format!(", note={}", entry.note));
    }
    text
}

fn write_missing_ledger<W: Write>(service: &LedgerService, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "No ledger found at {}. Record an expense with `spendlog add` or `spendlog prompt` first.",
        service.ledger_path().display()
    )?;
    Ok(())
}

fn write_last_updated<W: Write>(service: &LedgerService, out: &mut W) -> Result<()> {
    if let Some(updated) = service.last_updated()? {
        writeln!(out, "Last updated: {}", updated.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_entry_table<W: Write>(entries: &[Entry], out: &mut W) -> Result<()> {
    writeln!(
        out,
        "{:<12} {:>12} {:<16} {}",
        "DATE", "AMOUNT", "CATEGORY", "NOTE"
    )?;
    writeln!(out, "{}", "-".repeat(56))?;
    for entry in entries {
        writeln!(
            out,
            "{:<12} {:>12} {:<16} {}",
            entry.date_string(),
            entry.amount_string(),
            entry.category,
            entry.note
        )?;
    }
    Ok(())
}

pub fn run_list_command<W: Write>(
    service: &LedgerService,
    limit: Option<usize>,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let contents = service.entries().context("Failed to read ledger")?;
    let LedgerContents::Entries(entries) = contents else {
        return write_missing_ledger(service, out);
    };
    debug!(count = entries.len(), "read ledger");

    let shown = match limit {
        Some(n) => &entries[entries.len().saturating_sub(n)..],
        None => &entries[..],
    };

    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(shown)?)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut *out);
            writer.write_record(LEDGER_HEADER)?;
            for entry in shown {
                writer.write_record([
                    entry.date_string(),
                    entry.amount_string(),
                    entry.category.clone(),
                    entry.note.clone(),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            write_last_updated(service, out)?;

            if entries.is_empty() {
                writeln!(out, "No entries recorded yet.")?;
                return Ok(());
            }

            write_entry_table(shown, out)?;
            writeln!(out, "{}", "-".repeat(56))?;
            writeln!(out, "{} of {} entries", shown.len(), entries.len())?;
        }
    }

    Ok(())
}

pub fn run_summary_command<W: Write>(
    service: &LedgerService,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let Some((summary, report)) = service.spending_report().context("Failed to read ledger")?
    else {
        return write_missing_ledger(service, out);
    };
    debug!(
        entries = report.entry_count,
        categories = report.categories.len(),
        "summarized ledger"
    );

    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "category,total,count,percentage")?;
            let mut writer = csv::Writer::from_writer(&mut *out);
            for cat in &report.categories {
                writer.write_record([
                    cat.category.clone(),
                    format_cents(cat.total),
                    cat.count.to_string(),
                    format!("{:.1}", cat.percentage),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => write_summary_table(service, &summary, &report, out)?,
    }

    Ok(())
}

fn write_summary_table<W: Write>(
    service: &LedgerService,
    summary: &LedgerSummary,
    report: &CategoryReport,
    out: &mut W,
) -> Result<()> {
    write_last_updated(service, out)?;

    if summary.is_empty() {
        writeln!(out, "No entries recorded yet.")?;
        return Ok(());
    }

    writeln!(out, "Category Spending Report")?;
    if let (Some(from), Some(to)) = (report.from_date, report.to_date) {
        writeln!(
            out,
            "Period: {} to {}",
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "{:<20} {:>12} {:>8} {:>8}",
        "CATEGORY", "TOTAL", "COUNT", "%"
    )?;
    writeln!(out, "{}", "-".repeat(51))?;
    for cat in &report.categories {
        writeln!(
            out,
            "{:<20} {:>12} {:>8} {:>7.1}%",
            cat.category,
            format_cents(cat.total),
            cat.count,
            cat.percentage
        )?;
    }
    writeln!(out, "{}", "-".repeat(51))?;
    writeln!(out, "{:<20} {:>12}", "TOTAL", format_cents(report.total))?;

    writeln!(out)?;
    writeln!(out, "Most recent entries:")?;
    write_entry_table(summary.recent(RECENT_ENTRIES), out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use clap::CommandFactory;
    use tempfile::TempDir;

    use super::*;

    fn test_service() -> (LedgerService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = LedgerService::open(LedgerConfig::in_dir(temp_dir.path()));
        (service, temp_dir)
    }

    fn output_of(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_note_words() {
        let cli = Cli::parse_from([
            "spendlog",
            "--data-dir",
            "/tmp/ledger",
            "add",
            "2025-12-14",
            "120",
            "lunch",
            "bubble",
            "tea",
        ]);

        assert_eq!(
            cli.config(),
            LedgerConfig::new("/tmp/ledger", DEFAULT_LEDGER_FILE)
        );
        match cli.command {
            Commands::Add {
                date,
                amount,
                category,
                note,
            } => {
                assert_eq!(date, "2025-12-14");
                assert_eq!(amount, "120");
                assert_eq!(category, "lunch");
                assert_eq!(note, vec!["bubble", "tea"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_add_accepts_negative_amount_for_validation() {
        let cli = Cli::parse_from(["spendlog", "add", "t", "-5", "food"]);
        assert!(matches!(cli.command, Commands::Add { ref amount, .. } if amount == "-5"));
    }

    #[test]
    fn test_parse_list_format() {
        let cli = Cli::parse_from(["spendlog", "list", "--limit", "3", "--format", "csv"]);
        assert!(matches!(
            cli.command,
            Commands::List {
                limit: Some(3),
                format: OutputFormat::Csv
            }
        ));
    }

    #[test]
    fn test_parse_summary_format() {
        let cli = Cli::parse_from(["spendlog", "summary", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Commands::Summary {
                format: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn test_split_prompt_line() {
        assert_eq!(
            split_prompt_line("2025-12-14 120 lunch bubble   tea"),
            Some(("2025-12-14", "120", "lunch", "bubble tea".to_string()))
        );
        assert_eq!(
            split_prompt_line("t 5 coffee"),
            Some(("t", "5", "coffee", String::new()))
        );
        assert_eq!(split_prompt_line("t 5"), None);
    }

    #[test]
    fn test_prompt_keeps_going_after_errors() {
        let (service, _temp) = test_service();
        let input = Cursor::new(
            "2025-12-14 120 lunch bubble tea\n\
             \n\
             not-a-date 5 food\n\
             2025-12-15 -5 food\n\
             2025-12-15 abc food\n\
             2025-12-15 5\n\
             2025/12/16 4.5 transit bus\n\
             q\n\
             2025-12-17 1 ignored\n",
        );
        let mut out = Vec::new();

        let saved = run_prompt(&service, input, &mut out).unwrap();
        let output = output_of(out);

        assert_eq!(saved, 2);
        assert!(output.contains("Saved: 2025-12-14, 120.00, lunch, note=bubble tea"));
        assert!(output.contains("Error: invalid date format"));
        assert!(output.contains("Error: negative amount"));
        assert!(output.contains("Error: invalid number"));
        assert!(output.contains("Need at least: date amount category"));
        assert!(output.contains("Saved: 2025-12-16, 4.50, transit, note=bus"));
        assert!(output.contains("Bye! Data saved to:"));

        let LedgerContents::Entries(entries) = service.entries().unwrap() else {
            panic!("ledger should exist");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].category, "transit");
    }

    #[test]
    fn test_prompt_stops_at_end_of_input() {
        let (service, _temp) = test_service();
        let mut out = Vec::new();

        let saved = run_prompt(&service, Cursor::new("t 3 coffee\n"), &mut out).unwrap();

        assert_eq!(saved, 1);
        assert!(output_of(out).contains("Bye!"));
    }

    #[test]
    fn test_list_missing_ledger() {
        let (service, _temp) = test_service();
        let mut out = Vec::new();

        run_list_command(&service, None, OutputFormat::Table, &mut out).unwrap();

        assert!(output_of(out).starts_with("No ledger found"));
    }

    #[test]
    fn test_list_empty_ledger() {
        let (service, _temp) = test_service();
        service.init().unwrap();
        let mut out = Vec::new();

        run_list_command(&service, None, OutputFormat::Table, &mut out).unwrap();

        let output = output_of(out);
        assert!(output.contains("Last updated:"));
        assert!(output.contains("No entries recorded yet."));
    }

    #[test]
    fn test_list_with_limit() {
        let (service, _temp) = test_service();
        for (i, category) in ["a", "b", "c"].iter().enumerate() {
            service
                .record_expense(&format!("2025-01-0{}", i + 1), "1", category, "")
                .unwrap();
        }
        let mut out = Vec::new();

        run_list_command(&service, Some(2), OutputFormat::Table, &mut out).unwrap();

        let output = output_of(out);
        assert!(!output.contains("2025-01-01"));
        assert!(output.contains("2025-01-02"));
        assert!(output.contains("2025-01-03"));
        assert!(output.contains("2 of 3 entries"));
    }

    #[test]
    fn test_list_json_deserializes_to_entries() {
        let (service, _temp) = test_service();
        let first = service
            .record_expense("2025-12-14", "120", "lunch", "bubble tea")
            .unwrap();
        let second = service
            .record_expense("2025-12-15", "4.5", "dining, out", "")
            .unwrap();
        let mut out = Vec::new();

        run_list_command(&service, None, OutputFormat::Json, &mut out).unwrap();

        let listed: Vec<Entry> = serde_json::from_slice(&out).unwrap();
        assert_eq!(listed, vec![first, second]);
    }

    #[test]
    fn test_list_json_empty_ledger_is_empty_array() {
        let (service, _temp) = test_service();
        service.init().unwrap();
        let mut out = Vec::new();

        run_list_command(&service, Some(3), OutputFormat::Json, &mut out).unwrap();

        let listed: Vec<Entry> = serde_json::from_slice(&out).unwrap();
        assert!(listed.is_empty());
    }

    #[test]
    fn test_list_csv_matches_ledger_layout() {
        let (service, _temp) = test_service();
        service.record_expense("2025-01-01", "1", "a", "").unwrap();
        service
            .record_expense("2025-01-02", "2.5", "dining, out", "late")
            .unwrap();
        let mut out = Vec::new();

        run_list_command(&service, Some(1), OutputFormat::Csv, &mut out).unwrap();

        assert_eq!(
            output_of(out),
            "date,amount,category,note\n2025-01-02,2.50,\"dining, out\",late\n"
        );
    }

    #[test]
    fn test_summary_table() {
        let (service, _temp) = test_service();
        service.record_expense("2025-01-01", "100", "food", "").unwrap();
        service.record_expense("2025-01-02", "50.50", "food", "").unwrap();
        service.record_expense("2025-01-03", "20", "transit", "").unwrap();
        let mut out = Vec::new();

        run_summary_command(&service, OutputFormat::Table, &mut out).unwrap();

        let output = output_of(out);
        assert!(output.contains("Period: 2025-01-01 to 2025-01-03"));
        assert!(output.contains("150.50"));
        assert!(output.contains("20.00"));
        assert!(output.contains("170.50"));
        assert!(output.contains("Most recent entries:"));
    }

    #[test]
    fn test_summary_csv() {
        let (service, _temp) = test_service();
        service.record_expense("2025-01-01", "30", "food, fancy", "").unwrap();
        service.record_expense("2025-01-02", "10", "bus", "").unwrap();
        let mut out = Vec::new();

        run_summary_command(&service, OutputFormat::Csv, &mut out).unwrap();

        assert_eq!(
            output_of(out),
            "category,total,count,percentage\n\"food, fancy\",30.00,1,75.0\nbus,10.00,1,25.0\n"
        );
    }

    #[test]
    fn test_summary_json() {
        let (service, _temp) = test_service();
        service.record_expense("2025-01-01", "12.34", "food", "").unwrap();
        let mut out = Vec::new();

        run_summary_command(&service, OutputFormat::Json, &mut out).unwrap();

        let report: CategoryReport = serde_json::from_slice(&out).unwrap();
        assert_eq!(report.total, 1234);
        assert_eq!(report.categories[0].category, "food");
    }

    #[test]
    fn test_summary_missing_ledger() {
        let (service, _temp) = test_service();
        let mut out = Vec::new();

        run_summary_command(&service, OutputFormat::Json, &mut out).unwrap();

        assert!(output_of(out).starts_with("No ledger found"));
    }
}
