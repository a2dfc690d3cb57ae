//! nl2sql CLI - compile questions to SQL and inspect each pipeline stage
//!
//! Usage:
//!   nl2sql compile <question> [--schema <file.json>] [--dialect <dialect>]
//!   nl2sql normalize <question>
//!   nl2sql retrieve <question> [--scope <scope>] [--limit <n>]
//!   nl2sql plan <question>
//!   nl2sql joins <from> <to>
//!   nl2sql inspect [--table <name>]
//!
//! Examples:
//!   nl2sql compile "топ 3 клиента по выручке" --schema shop.json --dialect tsql
//!   nl2sql joins customers order_items --schema shop.json
//!   RUST_LOG=nl2sql=debug nl2sql plan "заказы за последние 7 дней"

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use nl2sql::compile::{CompileError, Pipeline};
use nl2sql::config::{Settings, SettingsError};
use nl2sql::retrieval::{Retriever, SearchScope};
use nl2sql::schema::SchemaSnapshot;
use nl2sql::sql::Dialect;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nl2sql")]
#[command(about = "nl2sql - Deterministic natural-language to multi-dialect SQL compiler")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to $NL2SQL_CONFIG, ./nl2sql.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Schema snapshot JSON (overrides [schema] path)
    #[arg(short, long, global = true)]
    schema: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a question to SQL
    Compile {
        question: String,

        /// SQL dialect to generate (defaults to [sql] dialect)
        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Show the normalized form of a question
    Normalize { question: String },

    /// Rank schema elements for a question
    Retrieve {
        question: String,

        /// tables, columns, relationships, business_terms or unified
        #[arg(long, default_value = "unified")]
        scope: SearchScope,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Show the query plan without generating SQL
    Plan { question: String },

    /// Show the shortest join path between two tables
    Joins { from: String, to: String },

    /// Summarize the indexed schema, or one table in detail
    Inspect {
        #[arg(short, long)]
        table: Option<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Postgres,
    Mysql,
    Tsql,
    Duckdb,
    Bigquery,
    Snowflake,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Tsql => Dialect::TSql,
            DialectArg::Duckdb => Dialect::DuckDb,
            DialectArg::Bigquery => Dialect::BigQuery,
            DialectArg::Snowflake => Dialect::Snowflake,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL with plan statistics and warnings
    Verbose,
    /// Output the full compile result as JSON
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Normalize { question } = &cli.command {
        return print_json(&nl2sql::compile::normalize(question));
    }

    let pipeline = match load_pipeline(cli.config.as_deref(), cli.schema.as_deref()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Compile {
            question,
            dialect,
            output,
        } => cmd_compile(&pipeline, &question, dialect, output),
        Commands::Normalize { question } => print_json(&pipeline.normalize(&question)),
        Commands::Retrieve {
            question,
            scope,
            limit,
        } => cmd_retrieve(&pipeline, &question, scope, limit),
        Commands::Plan { question } => cmd_plan(&pipeline, &question),
        Commands::Joins { from, to } => cmd_joins(&pipeline, &from, &to),
        Commands::Inspect { table } => cmd_inspect(&pipeline, table.as_deref()),
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_pipeline(config: Option<&Path>, schema: Option<&Path>) -> Result<Pipeline, CompileError> {
    let settings = match config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };

    let schema_path = match schema {
        Some(path) => path.to_path_buf(),
        None => settings.schema.resolved_path()?.ok_or_else(|| {
            SettingsError::Invalid("no schema snapshot: pass --schema or set [schema] path".into())
        })?,
    };

    let snapshot = SchemaSnapshot::from_path(&schema_path)?;
    Pipeline::from_snapshot(settings, &snapshot)
}

fn cmd_compile(
    pipeline: &Pipeline,
    question: &str,
    dialect: Option<DialectArg>,
    output: OutputFormat,
) -> ExitCode {
    let dialect = dialect
        .map(Dialect::from)
        .unwrap_or(pipeline.settings().sql.dialect);

    let result = match pipeline.compile(question, dialect) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            if let Some(plan) = e.plan() {
                eprintln!("Partial plan:");
                eprintln!("{}", to_json(plan));
            }
            return ExitCode::FAILURE;
        }
    };

    match output {
        OutputFormat::Sql => println!("{}", result.generated.sql),
        OutputFormat::Verbose => {
            let generated = &result.generated;
            println!("-- dialect: {}", generated.dialect);
            println!("-- intent: {} (confidence {:.2})", result.plan.intent, result.plan.confidence);
            println!(
                "-- complexity: {} ({:?})",
                generated.complexity_score, generated.performance
            );
            println!("-- tables: {}", generated.referenced_tables.join(", "));
            for warning in &result.warnings {
                println!("-- warning: {}", warning);
            }
            println!("-- fingerprint: {}", result.fingerprint);
            println!("{}", generated.sql);
        }
        OutputFormat::Json => return print_json(&result),
    }
    ExitCode::SUCCESS
}

fn cmd_retrieve(pipeline: &Pipeline, question: &str, scope: SearchScope, limit: usize) -> ExitCode {
    let version = pipeline.schema().current();
    let query = pipeline.normalize(question);
    let retriever = Retriever::new(&version.index, &pipeline.settings().retrieval);
    let results = retriever.search(&query.search_text(), scope, limit);

    if results.is_empty() {
        println!("No matching schema elements.");
        return ExitCode::SUCCESS;
    }
    for result in &results {
        println!("{:>6.3}  {:<13} {}", result.score, result.kind.to_string(), result.content);
    }
    ExitCode::SUCCESS
}

fn cmd_plan(pipeline: &Pipeline, question: &str) -> ExitCode {
    match pipeline.plan(question) {
        Ok(outcome) => print_json(&outcome),
        Err(e) => {
            eprintln!("Planning error: {}", e);
            if let Some(plan) = e.plan() {
                eprintln!("{}", to_json(plan));
            }
            ExitCode::FAILURE
        }
    }
}

fn cmd_joins(pipeline: &Pipeline, from: &str, to: &str) -> ExitCode {
    let version = pipeline.schema().current();
    let Some(path) = version.join_graph.find_join_path(from, to) else {
        eprintln!("No join path from '{}' to '{}'", from, to);
        return ExitCode::FAILURE;
    };

    println!(
        "{} -> {} (cost {}, confidence {:.2})",
        path.from_table,
        path.to_table,
        path.cost(),
        path.confidence
    );
    for join in &path.joins {
        println!("  {:?} JOIN {} ON {}", join.kind, join.right_table, join.condition());
    }
    ExitCode::SUCCESS
}

fn cmd_inspect(pipeline: &Pipeline, table: Option<&str>) -> ExitCode {
    let version = pipeline.schema().current();
    let index = &version.index;

    if let Some(name) = table {
        let retriever = Retriever::new(index, &pipeline.settings().retrieval);
        return match retriever.table_context(name) {
            Some(context) => print_json(&context),
            None => {
                match index.closest_table(name) {
                    Some(close) => eprintln!("Unknown table '{}' (did you mean '{}'?)", name, close),
                    None => eprintln!("Unknown table '{}'", name),
                }
                ExitCode::FAILURE
            }
        };
    }

    println!("Schema fingerprint: {}", version.fingerprint);
    println!();

    println!("Tables:");
    for entry in index.tables() {
        println!("  - {} ({} columns)", entry.name, entry.columns.len());
        for column in &entry.columns {
            println!("      {} {} [{}]", column.name, column.data_type, column.tags);
        }
    }
    println!();

    if !index.foreign_keys().is_empty() {
        println!("Foreign keys:");
        for fk in index.foreign_keys() {
            println!("  - {} -> {} ({:?})", fk.from_full(), fk.to_full(), fk.cardinality);
        }
        println!();
    }

    if !index.skipped_foreign_keys().is_empty() {
        println!("Skipped foreign keys:");
        for fk in index.skipped_foreign_keys() {
            println!("  - {}", fk);
        }
    }
    ExitCode::SUCCESS
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            ExitCode::FAILURE
        }
    }
}
