// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::env;
use std::path::{Path, PathBuf};

use tallybook::{
    export_csv, export_json, format_amount, import_csv, parse_amount, restore_json,
    ImportOptions, Ledger, TransactionFilter, TransferRequest,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        None => run_ui_mode()?,
        Some("summary") => run_summary()?,
        Some("accounts") => run_accounts()?,
        Some("import") => run_import(&args[2..])?,
        Some("export") => run_export(args.get(2).map(String::as_str))?,
        Some("backup") => run_backup(args.get(2).map(String::as_str))?,
        Some("restore") => run_restore(&args[2..])?,
        Some("transfer") => run_transfer(&args[2..])?,
        Some("help") | Some("--help") | Some("-h") => print_usage(),
        Some(other) => {
            eprintln!("unknown command: {other}");
            print_usage();
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_usage() {
    println!("tallybook {}", tallybook::VERSION);
    println!();
    println!("Usage: tallybook [command]");
    println!();
    println!("Commands:");
    println!("  summary                                    totals, flow, and patrimony breakdown");
    println!("  accounts                                   accounts with balances");
    println!("  import <csv> [account]                     import a bank CSV, fallback account optional");
    println!("  export [dir]                               write transactions as CSV (default: exports/)");
    println!("  backup [dir]                               write a checksummed JSON backup (default: exports/)");
    println!("  restore <file>                             load a backup into an empty ledger");
    println!("  transfer <from> <to> <amount> <date> [description]");
    println!("                                             move money between accounts (date: YYYY-MM-DD)");
    println!();
    println!("Without a command the interactive UI opens (requires the tui feature).");
    println!("Database path comes from TALLYBOOK_DB, default ./tallybook.db");
}

fn db_path() -> PathBuf {
    env::var("TALLYBOOK_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("tallybook.db"))
}

fn open_ledger() -> Result<Ledger> {
    let path = db_path();
    Ledger::open(&path).with_context(|| format!("cannot open ledger at {}", path.display()))
}

fn run_summary() -> Result<()> {
    let ledger = open_ledger()?;

    println!("Accounts");
    for balance in ledger.balances()? {
        println!(
            "  {:<24} {:>14}  {}",
            balance.account.name,
            format_amount(balance.balance),
            balance.account.kind.label()
        );
    }

    println!();
    println!("Savings total:   {:>14}", format_amount(ledger.savings_total()?));
    println!("Patrimony total: {:>14}", format_amount(ledger.patrimony_total()?));

    if let Some(month) = ledger.monthly_flow(1)?.last() {
        println!();
        println!(
            "This month ({}-{:02}): income {} / expenses {} / net {}",
            month.year,
            month.month,
            format_amount(month.income),
            format_amount(month.expenses),
            format_amount(month.net())
        );
    }

    let slices = ledger.patrimony_distribution()?;
    if !slices.is_empty() {
        println!();
        println!("Patrimony by kind");
        for slice in slices {
            println!(
                "  {:<12} {:>14}  {:>5.1}%",
                slice.kind.label(),
                format_amount(slice.total),
                slice.share * 100.0
            );
        }
    }

    Ok(())
}

fn run_accounts() -> Result<()> {
    let ledger = open_ledger()?;
    let balances = ledger.balances()?;
    if balances.is_empty() {
        println!("no accounts yet");
        return Ok(());
    }

    println!("{:<5} {:<24} {:<12} {:>14}", "id", "name", "kind", "balance");
    for balance in balances {
        println!(
            "{:<5} {:<24} {:<12} {:>14}",
            balance.account.id,
            balance.account.name,
            balance.account.kind.label(),
            format_amount(balance.balance)
        );
    }
    Ok(())
}

fn run_import(args: &[String]) -> Result<()> {
    let Some(csv_path) = args.first() else {
        eprintln!("usage: tallybook import <csv> [account]");
        std::process::exit(2);
    };

    let mut ledger = open_ledger()?;
    let options = ImportOptions {
        fallback_account: args.get(1).cloned(),
        mapping: None,
    };

    println!("Importing {csv_path}...");
    let report = import_csv(&mut ledger, Path::new(csv_path), &options)?;

    println!(
        "Imported {} transactions ({} plain, {} transfer pairs)",
        report.total_written(),
        report.imported,
        report.transfer_pairs
    );
    if !report.skipped.is_empty() {
        println!("Skipped {} rows:", report.skipped.len());
        for row in &report.skipped {
            println!("  line {}: {}", row.line, row.reason);
        }
    }
    Ok(())
}

fn run_export(dir: Option<&str>) -> Result<()> {
    let ledger = open_ledger()?;
    let dir = Path::new(dir.unwrap_or("exports"));
    let path = export_csv(&ledger, dir, &TransactionFilter::default())?;
    println!("Exported transactions to {}", path.display());
    Ok(())
}

fn run_backup(dir: Option<&str>) -> Result<()> {
    let ledger = open_ledger()?;
    let dir = Path::new(dir.unwrap_or("exports"));
    let path = export_json(&ledger, dir)?;
    println!("Backup written to {}", path.display());
    Ok(())
}

fn run_restore(args: &[String]) -> Result<()> {
    let Some(file) = args.first() else {
        eprintln!("usage: tallybook restore <file>");
        std::process::exit(2);
    };

    let mut ledger = open_ledger()?;
    let summary = restore_json(&mut ledger, Path::new(file))?;
    println!(
        "Restored {} accounts, {} categories, {} transactions, {} assets, {} snapshots",
        summary.accounts,
        summary.categories,
        summary.transactions,
        summary.assets,
        summary.snapshots
    );
    Ok(())
}

fn run_transfer(args: &[String]) -> Result<()> {
    if args.len() < 4 {
        eprintln!("usage: tallybook transfer <from> <to> <amount> <date> [description]");
        std::process::exit(2);
    }

    let mut ledger = open_ledger()?;
    let from = resolve_account_arg(&ledger, &args[0])?;
    let to = resolve_account_arg(&ledger, &args[1])?;
    let amount = parse_amount(&args[2])?;
    let date = NaiveDate::parse_from_str(&args[3], "%Y-%m-%d")
        .context("date must be YYYY-MM-DD")?;
    let description = args.get(4).cloned().unwrap_or_default();

    let (outgoing, incoming) = ledger.transfer(&TransferRequest {
        from_account: from,
        to_account: to,
        amount,
        date,
        description,
    })?;

    let from_name = ledger.account(outgoing.account_id)?.name;
    let to_name = ledger.account(incoming.account_id)?.name;
    println!(
        "Moved {} from {} to {} on {}",
        format_amount(incoming.amount),
        from_name,
        to_name,
        date
    );
    Ok(())
}

/// Accounts can be addressed by id or by exact name.
fn resolve_account_arg(ledger: &Ledger, raw: &str) -> Result<i64> {
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(ledger.account(id)?.id);
    }
    let account = ledger
        .find_account_by_name(raw)?
        .with_context(|| format!("no account named {raw:?}"))?;
    Ok(account.id)
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    let ledger = open_ledger()?;
    let mut app = ui::App::load(&ledger)?;
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("TUI not built in; rebuild with: cargo build --features tui");
    eprintln!("Run `tallybook help` for the command list.");
    std::process::exit(1);
}
