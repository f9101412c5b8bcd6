//! employee-sql CLI - turn an HR CSV export into a re-runnable SQL import script

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use employee_sql::config::{DEFAULT_INPUT, DEFAULT_OUTPUT};
use employee_sql::{detect_database_type, load_mappings, pipeline, RunConfig, RunReport};

/// Exit code for `--strict` runs that skipped at least one record
const EXIT_SKIPPED: i32 = 2;

#[derive(Parser)]
#[command(name = "employee-sql")]
#[command(version, about = "Convert employee CSV exports into idempotent SQL insert scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the SQL import script
    Generate {
        /// Employee CSV export
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Output SQL file (overwritten)
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// YAML file overriding the built-in lookup tables
        #[arg(short, long)]
        mappings: Option<PathBuf>,

        /// Database type (postgresql, mysql, mariadb)
        #[arg(short, long)]
        database: Option<String>,

        /// Exit with status 2 if any record was skipped
        #[arg(long)]
        strict: bool,
    },

    /// Check the input against the lookup tables without writing SQL
    Validate {
        /// Employee CSV export
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// YAML file overriding the built-in lookup tables
        #[arg(short, long)]
        mappings: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Exit with status 2 if any record would be skipped
        #[arg(long)]
        strict: bool,
    },

    /// Print the effective lookup tables as YAML
    Mappings {
        /// YAML file overriding the built-in lookup tables
        #[arg(short, long)]
        mappings: Option<PathBuf>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { input, output, mappings, database, strict } => {
            generate(input, output, mappings, database, strict)
        }
        Commands::Validate { input, mappings, json, strict } => {
            validate(input, mappings, json, strict)
        }
        Commands::Mappings { mappings, output } => {
            export_mappings(mappings, output).map(|_| 0)
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn build_config(
    input: PathBuf,
    output: PathBuf,
    mappings: Option<&Path>,
    database: Option<&str>,
) -> Result<RunConfig, String> {
    let database = detect_database_type(database)?;
    let mappings = load_mappings(mappings).map_err(|e| e.to_string())?;

    Ok(RunConfig::new(input, output)
        .with_mappings(mappings)
        .with_database(database))
}

fn print_skips(report: &RunReport) {
    for skipped in &report.skipped {
        println!("WARNING: {} (employee {})", skipped.reason, skipped.employee_no);
    }
}

fn exit_code(report: &RunReport, strict: bool) -> i32 {
    if strict && report.has_skips() {
        EXIT_SKIPPED
    } else {
        0
    }
}

/// Generate the SQL script
fn generate(
    input: PathBuf,
    output: PathBuf,
    mappings: Option<PathBuf>,
    database: Option<String>,
    strict: bool,
) -> Result<i32, String> {
    let config = build_config(input, output, mappings.as_deref(), database.as_deref())?;

    println!("🔧 Generating {} SQL from {}...", config.database, config.input.display());

    let report = pipeline::generate(&config).map_err(|e| e.to_string())?;

    print_skips(&report);
    println!("✅ SQL file generated: {}", config.output.display());
    println!("{}", report.summary);
    println!("\nℹ️  This SQL is SAFE to run multiple times - it will skip duplicates!");

    Ok(exit_code(&report, strict))
}

/// Validate input without writing output
fn validate(
    input: PathBuf,
    mappings: Option<PathBuf>,
    json: bool,
    strict: bool,
) -> Result<i32, String> {
    let config = build_config(input, PathBuf::from(DEFAULT_OUTPUT), mappings.as_deref(), None)?;
    let report = pipeline::validate(&config).map_err(|e| e.to_string())?;

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to render report: {}", e))?;
        println!("{}", rendered);
    } else {
        print_skips(&report);
        println!("{}", report.summary);
        if !report.has_skips() {
            println!("✨ All records resolved");
        }
    }

    Ok(exit_code(&report, strict))
}

/// Print or write the effective lookup tables
fn export_mappings(mappings: Option<PathBuf>, output: Option<PathBuf>) -> Result<(), String> {
    let mappings = load_mappings(mappings.as_deref()).map_err(|e| e.to_string())?;
    let yaml = mappings.to_yaml().map_err(|e| e.to_string())?;

    match output {
        Some(path) => {
            std::fs::write(&path, yaml)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            println!("✅ Mappings written to {}", path.display());
        }
        None => print!("{}", yaml),
    }

    Ok(())
}
