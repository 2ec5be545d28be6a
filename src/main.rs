// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use moneypot::{
    format_money, format_percentage, AllocationStore, Cli, Command, Config, KeyValueStore,
    MemoryStore, SqliteStore,
};

type Store = AllocationStore<Box<dyn KeyValueStore>>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli);
    init_tracing(&config.log_path)?;

    let mut store = AllocationStore::new(open_storage(&config));

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_ui_mode(store, &config)?,
        command => {
            store.load();
            run_command(&mut store, command, &config);
        }
    }

    Ok(())
}

fn init_tracing(log_path: &Path) -> Result<()> {
    ensure_parent_dir(log_path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// SQLite file when configured; falls back to memory so the form still works
fn open_storage(config: &Config) -> Box<dyn KeyValueStore> {
    let Some(path) = &config.db_path else {
        info!("Ephemeral mode, nothing will be saved");
        return Box::new(MemoryStore::new());
    };

    match open_sqlite(path) {
        Ok(store) => {
            info!("Database path in use: {}", path.display());
            Box::new(store)
        }
        Err(e) => {
            warn!("Falling back to in-memory storage: {:#}", e);
            eprintln!("⚠️  Could not open {}: {:#}", path.display(), e);
            eprintln!("   Changes will not be saved this session.");
            Box::new(MemoryStore::new())
        }
    }
}

fn open_sqlite(path: &Path) -> Result<SqliteStore> {
    ensure_parent_dir(path)?;
    SqliteStore::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn resolve(store: &Store, needle: &str) -> Option<String> {
    let id = store.state().resolve_id(needle).map(str::to_string);
    if id.is_none() {
        println!("⚠ No single goal matches id '{}'", needle);
    }
    id
}

fn run_command(store: &mut Store, command: Command, config: &Config) {
    match command {
        Command::Tui | Command::Show => {}
        Command::SetTotal { value } => {
            store.set_total_amount(&value);
        }
        Command::Add { name } => match store.add_category(&name) {
            Some(id) => println!("✓ Added goal {} ({})", name.trim(), short_id(&id)),
            None => println!("⚠ Goal name cannot be empty"),
        },
        Command::Delete { id } => {
            if let Some(id) = resolve(store, &id) {
                store.delete_category(&id);
                println!("✓ Deleted goal {}", short_id(&id));
            }
        }
        Command::Rename { id, name } => {
            if let Some(id) = resolve(store, &id) {
                if !store.rename_category(&id, &name) {
                    println!("⚠ Name unchanged");
                }
            }
        }
        Command::SetPercent { id, value } => {
            if let Some(id) = resolve(store, &id) {
                store.set_percentage(&id, &value);
            }
        }
        Command::Reset { yes } => {
            if store.reset(yes) {
                println!("✓ Data reset successfully!");
            } else {
                println!("⚠ Reset not confirmed. Re-run with --yes to erase all data.");
            }
        }
    }

    print_summary(store, &config.currency);
}

fn print_summary(store: &Store, currency: &str) {
    let summary = store.summary();

    println!("\n💰 Money Pot Allocator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match summary.total_amount {
        Some(total) => println!("Total Amount Available: {}", format_money(currency, total)),
        None => println!("Total Amount Available: (not set)"),
    }

    if summary.has_total() {
        println!(
            "Total Percentage Allocated: {:.2}%   {}",
            summary.total_percentage,
            summary.status_message()
        );
    }

    println!();
    if summary.rows.is_empty() {
        println!("No savings goals yet. Add your first goal with: moneypot add <NAME>");
        return;
    }

    println!(
        "{:<10} {:<24} {:>10} {:>18}",
        "ID", "Goal", "Percentage", "Amount Allocated"
    );
    for row in &summary.rows {
        println!(
            "{:<10} {:<24} {:>10} {:>18}",
            short_id(&row.id),
            row.name,
            format!("{}%", format_percentage(row.percentage)),
            format_money(currency, row.allocated)
        );
    }

    if summary.shows_breakdown() {
        println!("──────────────────────────────────────────────────────────────────");
        println!(
            "{:<10} {:<24} {:>10} {:>18}",
            "",
            "TOTAL",
            format!("{:.2}%", summary.total_percentage),
            format_money(currency, summary.allocated_total)
        );
        if let Some(label) = summary.imbalance_label() {
            println!(
                "{:<10} {:<24} {:>10} {:>18}",
                "",
                label,
                format!("{:.2}%", summary.gap_percentage()),
                format_money(currency, summary.remaining.abs())
            );
        }
    }

    if let Ok(Some(saved_at)) = store.storage().last_saved(store.key()) {
        println!("\n💾 Last saved: {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: Store, config: &Config) -> Result<()> {
    let mut app = ui::App::new(store, config.currency.clone());
    ui::run_ui(&mut app)?;

    if config.db_path.is_some() {
        println!("\n✅ Money Pot closed. Your data is saved.");
    } else {
        println!("\n✅ Money Pot closed (ephemeral session, nothing saved).");
    }

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: Store, _config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the commands: moneypot show | add | set-percent | set-total");
    std::process::exit(1);
}
