#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use menu_configurator::remote::{CatalogSource, CsvCatalog, HttpRemote, OfflineRemote, RemoteSink};
use menu_configurator::storage::{default_session_path, default_storage_path, FileStore};
use menu_configurator::{
    MenuConfig, MenuEngine, MenuItem, MenuResult, NutritionTotals, PersistenceBridge, ToggleOutcome,
};

#[derive(Parser, Debug)]
#[command(name = "menu-configurator")]
#[command(about = "Pick dishes per category and track the meal's nutrition")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the menu with current selections
    List,
    /// Select or deselect a dish
    Toggle { category: String, name: String },
    /// Clear one category, or everything when omitted
    Clear { category: Option<String> },
    /// Show nutrition totals of the current selection
    Totals,
    /// Add a custom dish
    Add {
        category: String,
        name: String,
        #[arg(long)]
        calories: f64,
        #[arg(long, default_value_t = 0.0)]
        protein: f64,
        #[arg(long, default_value_t = 0.0)]
        fat: f64,
        #[arg(long, default_value_t = 0.0)]
        carbs: f64,
        #[arg(long)]
        image: Option<String>,
    },
    /// Delete a custom dish
    Delete { category: String, name: String },
    /// Mark a dish as discontinued
    Discontinue {
        category: String,
        name: String,
        /// Put the dish back on sale instead
        #[arg(long)]
        off: bool,
    },
    /// Restore local state from the session backup
    Restore,
}

fn init_tracing(config_level: &str) -> Result<()> {
    // LOG_LEVEL wins over the config file
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| config_level.to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install tracing subscriber")?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(MenuConfig::path);
    let config = MenuConfig::load_from(&config_path)?;
    init_tracing(&config.log_level)?;

    let (source, sink): (Box<dyn CatalogSource>, Arc<dyn RemoteSink>) = match &config.remote.base_url {
        Some(url) => {
            let http = HttpRemote::new(url.as_str());
            (Box::new(http.clone()) as Box<dyn CatalogSource>, Arc::new(http) as Arc<dyn RemoteSink>)
        }
        None => {
            info!("No remote configured, running offline");
            (Box::new(OfflineRemote) as Box<dyn CatalogSource>, Arc::new(OfflineRemote) as Arc<dyn RemoteSink>)
        }
    };
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let fallback = CsvCatalog::from_path(config.fallback_csv_path(config_dir));

    let persistence = PersistenceBridge::new(
        Box::new(FileStore::open(default_storage_path()?)),
        Box::new(FileStore::open(default_session_path()?)),
    );
    let mut engine = MenuEngine::new(config, persistence, sink);

    if engine.detect_reset_and_offer() && !matches!(cli.command, Command::Restore) {
        eprintln!("Saved selections were lost but a session backup exists. Run `menu-configurator restore` to recover it.");
    }

    let origin = engine.refresh_catalog(source.as_ref(), &fallback).await;
    info!(origin = ?origin, items = engine.catalog().len(), "Catalog ready");

    match cli.command {
        Command::List => print_menu(&engine),
        Command::Toggle { category, name } => match engine.toggle(&category, &name) {
            ToggleOutcome::Selected => println!("Selected {category}/{name}"),
            ToggleOutcome::Deselected => println!("Deselected {category}/{name}"),
            ToggleOutcome::Blocked => println!("{category}/{name} is discontinued and cannot be selected"),
            ToggleOutcome::Unknown => println!("No dish {category}/{name} on the menu"),
        },
        Command::Clear { category: Some(category) } => {
            engine.clear(&category);
            println!("Cleared {category}");
        }
        Command::Clear { category: None } => {
            engine.clear_all();
            println!("Cleared all selections");
        }
        Command::Totals => print_totals(&engine.totals()),
        Command::Add {
            category,
            name,
            calories,
            protein,
            fat,
            carbs,
            image,
        } => {
            let mut item = MenuItem::custom(category, name, protein, fat, carbs, calories);
            if let Some(image) = image {
                item = item.with_image(image);
            }
            let write = engine.add_custom(item)?;
            println!("Added {}", write.key());
            report_remote(write.await);
        }
        Command::Delete { category, name } => match engine.delete_custom(&category, &name) {
            Some(write) => {
                println!("Deleted {category}/{name}");
                report_remote(write.await);
            }
            None => println!("{category}/{name} is not a custom dish; nothing deleted"),
        },
        Command::Discontinue { category, name, off } => {
            let write = engine.set_discontinued(&category, &name, !off)?;
            let state = if off { "back on sale" } else { "discontinued" };
            println!("{category}/{name} is now {state}");
            report_remote(write.await);
        }
        Command::Restore => {
            let outcome = engine.restore_backup()?;
            if outcome.requires_reload() {
                engine.reload_local_state();
                println!("Restored {} selected dish(es) from the session backup", engine.selection().total());
            } else {
                println!("No session backup to restore");
            }
        }
    }

    Ok(())
}

fn report_remote(result: MenuResult<()>) {
    if let Err(e) = result {
        warn!(error = %e, "Remote sync failed");
        eprintln!("Warning: {e}");
    }
}

fn print_menu(engine: &MenuEngine) {
    for category in engine.ordered_categories() {
        let label = engine.label_for(&category);
        println!("{} / {} ({:?})", label.en, label.ja, engine.policy_for(&category));

        for item in engine.catalog().items_in(&category) {
            let mark = if engine.selection().is_selected(&category, &item.name) {
                "[x]"
            } else {
                "[ ]"
            };
            let mut notes = Vec::new();
            if item.is_custom() {
                notes.push("custom");
            }
            if !engine.is_selectable(&category, &item.name) {
                notes.push("discontinued");
            }
            let notes = if notes.is_empty() {
                String::new()
            } else {
                format!(" ({})", notes.join(", "))
            };
            println!("  {mark} {} {:.0} kcal{notes}", item.name, item.calories);
        }
    }
}

fn print_totals(totals: &NutritionTotals) {
    println!("Calories: {:.0} kcal", totals.calories);
    println!("Protein:  {:.1} g ({:.1}%)", totals.protein, totals.pfc.protein_percent);
    println!("Fat:      {:.1} g ({:.1}%)", totals.fat, totals.pfc.fat_percent);
    println!("Carbs:    {:.1} g ({:.1}%)", totals.carbs, totals.pfc.carbs_percent);
}
