//! Production chain resolver CLI
//!
//! Resolves quantified production trees from a catalog stored in SQLite.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use chain_resolver::{
    CatalogIndex, ResolveOptions, SelectionOverrides, configure_production_chain, db, import,
    resolver::DEFAULT_MAX_DEPTH, sample, summary,
};

#[derive(Parser)]
#[command(name = "chain-resolver")]
#[command(about = "Resolve production chains from a product/process catalog")]
struct Cli {
    /// Path to the SQLite catalog database
    #[arg(short, long, default_value = "chain_data.db")]
    database: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import JSON catalog files from a directory
    Import {
        /// Directory containing *.json catalog fragments
        source_dir: PathBuf,

        /// Clear existing catalog before import
        #[arg(long)]
        clear: bool,
    },

    /// Resolve the production chain for an end product
    Calc {
        /// Product id to produce (e.g., "44")
        product: String,

        /// Amount of the end product
        #[arg(short, long, default_value = "1.0")]
        amount: f64,

        /// Process choice for one position, as KEY=PROCESS (repeatable)
        #[arg(short, long = "choose", value_name = "KEY=PROCESS")]
        choices: Vec<String>,

        /// JSON file mapping position keys to process ids
        #[arg(long)]
        overrides: Option<PathBuf>,

        /// Maximum chain depth before giving up
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: u32,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Show detailed production tree
        #[arg(short, long)]
        verbose: bool,
    },

    /// List all products in catalog order
    ListProducts,

    /// List all processes in catalog order
    ListProcesses,

    /// Show details for a specific process
    Process {
        /// Process id
        id: String,
    },

    /// Initialize empty database with schema
    Init,

    /// Load the built-in sample catalog
    LoadSample,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Import { source_dir, clear } => {
            if clear {
                println!("Clearing existing catalog...");
                db::clear_catalog(&conn)?;
            }

            let stats = import::import_directory(&mut conn, &source_dir)
                .with_context(|| format!("Import from {} failed", source_dir.display()))?;
            println!("{}", stats);
        }

        Commands::Calc {
            product,
            amount,
            choices,
            overrides,
            max_depth,
            json,
            verbose,
        } => {
            let mut selection = match overrides {
                Some(path) => {
                    let text = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    SelectionOverrides::from_json_str(&text)?
                }
                None => SelectionOverrides::new(),
            };
            for choice in &choices {
                selection.insert_assignment(choice)?;
            }

            let catalog = CatalogIndex::new(db::load_catalog(&conn)?)?;
            let report = configure_production_chain(
                &catalog,
                &product,
                amount,
                &selection,
                ResolveOptions { max_depth },
            )?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            if verbose {
                println!("Production chain:\n");
                println!("{}", summary::format_tree(&report));
            }
            println!("{}", summary::summarize(&report));
        }

        Commands::ListProducts => {
            let products = db::list_products(&conn)?;
            if products.is_empty() {
                println!("No products in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<12} {}", "Id", "Name");
                println!("{}", "-".repeat(40));
                for p in products {
                    println!("{:<12} {}", p.id, p.name);
                }
            }
        }

        Commands::ListProcesses => {
            let catalog = db::load_catalog(&conn)?;
            if catalog.processes.is_empty() {
                println!("No processes in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<12} {:<30} {:<16} {:>4} {:>4}", "Id", "Name", "Building", "In", "Out");
                println!("{}", "-".repeat(70));
                for p in &catalog.processes {
                    println!(
                        "{:<12} {:<30} {:<16} {:>4} {:>4}",
                        p.id,
                        p.name,
                        p.building_id,
                        p.inputs.len(),
                        p.outputs.len()
                    );
                }
            }
        }

        Commands::Process { id } => {
            let catalog = CatalogIndex::new(db::load_catalog(&conn)?)?;
            let Some(process) = catalog.process_by_id(&id) else {
                println!("Process '{}' not found", id);
                return Ok(());
            };

            println!("Process: {}", process.name);
            println!("  ID: {}", process.id);
            println!("  Building: {}", process.building_id);

            let name = |product_id: &str| catalog.product_name(product_id).unwrap_or("?").to_string();
            let per_run = |units: &chain_resolver::UnitsPerRun| match units.value() {
                Some(v) => format!("{} per run", v),
                None => "n/a".to_string(),
            };

            if !process.inputs.is_empty() {
                println!("  Inputs:");
                for i in &process.inputs {
                    println!("    {} ({}) @ {}", name(&i.product_id), i.product_id, per_run(&i.units_per_run));
                }
            }
            if !process.outputs.is_empty() {
                println!("  Outputs:");
                for o in &process.outputs {
                    let alternatives = catalog.processes_producing(&o.product_id).len();
                    println!(
                        "    {} ({}) @ {}  [{} producer(s)]",
                        name(&o.product_id),
                        o.product_id,
                        per_run(&o.units_per_run),
                        alternatives
                    );
                }
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            let catalog = sample::catalog();
            db::clear_catalog(&conn)?;
            db::append_catalog(&mut conn, &catalog)?;
            println!(
                "Loaded {} sample products and {} processes",
                catalog.products.len(),
                catalog.processes.len()
            );
        }
    }

    Ok(())
}
