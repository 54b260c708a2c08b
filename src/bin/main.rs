//! gatherer CLI - describe, render and run catalog reports
//!
//! Usage:
//!   gatherer describe <catalog.toml> [--report <name>]
//!   gatherer render <catalog.toml> --report <name> [--query <qs>] [--dialect <dialect>]
//!   gatherer run <catalog.toml> --report <name> [--query <qs>] [--connection <name>]
//!   gatherer check <catalog.toml>
//!
//! Examples:
//!   gatherer render demos/users.toml --report users --query 'userId=5&sortColumn=username'
//!   gatherer run demos/users.toml --report users --connection demo --setup demos/users.sql
//!
//! Logging is controlled by `GATHERER_LOG` (e.g. `GATHERER_LOG=gatherer=debug`).

use clap::{Parser, Subcommand, ValueEnum};
use gatherer::config::{Settings, SettingsError};
use gatherer::exec::{QueryExecutor, SqliteExecutor, WorkerExecutor};
use gatherer::gatherer::Gatherer;
use gatherer::model::{load_catalog, Catalog, Report};
use gatherer::request::RequestParams;
use gatherer::sql::Dialect;
use gatherer::worker::WorkerClient;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "gatherer")]
#[command(about = "gatherer - join-inferring report queries over a declared schema")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to $GATHERER_CONFIG, ./gatherer.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print report descriptions as JSON
    Describe {
        /// Path to the catalog file
        file: PathBuf,

        /// Only describe this report
        #[arg(short, long)]
        report: Option<String>,
    },

    /// Render a report's SQL and bound parameters without executing it
    Render {
        /// Path to the catalog file
        file: PathBuf,

        /// Name of the report to render
        #[arg(short, long)]
        report: String,

        /// Request parameters as a query string (e.g. 'userId=5&sortOrder=desc')
        #[arg(short, long, default_value = "")]
        query: String,

        /// SQL dialect to generate (defaults to the connection's, then the config's)
        #[arg(short, long)]
        dialect: Option<DialectArg>,

        /// Connection whose dialect to use
        #[arg(long)]
        connection: Option<String>,
    },

    /// Execute a report and print rows as JSON
    Run {
        /// Path to the catalog file
        file: PathBuf,

        /// Name of the report to run
        #[arg(short, long)]
        report: String,

        /// Request parameters as a query string
        #[arg(short, long, default_value = "")]
        query: String,

        /// Connection to run against (defaults to the first configured)
        #[arg(long)]
        connection: Option<String>,

        /// SQL script run first (SQLite connections only)
        #[arg(long)]
        setup: Option<PathBuf>,
    },

    /// Validate every report in a catalog
    Check {
        /// Path to the catalog file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Mysql,
    Postgres,
    Sqlite,
    Duckdb,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Duckdb => Dialect::DuckDb,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GATHERER_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Describe { file, report } => cmd_describe(file, report),
        Commands::Render {
            file,
            report,
            query,
            dialect,
            connection,
        } => cmd_render(cli.config, file, report, query, dialect, connection),
        Commands::Run {
            file,
            report,
            query,
            connection,
            setup,
        } => cmd_run(cli.config, file, report, query, connection, setup).await,
        Commands::Check { file } => cmd_check(file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(path: Option<PathBuf>) -> Result<Settings, SettingsError> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

fn find_report<'a>(catalog: &'a Catalog, name: &str) -> Result<&'a Report, Box<dyn Error>> {
    catalog.report(name).ok_or_else(|| {
        let known: Vec<_> = catalog.reports.keys().map(String::as_str).collect();
        format!("unknown report '{}' (known: {})", name, known.join(", ")).into()
    })
}

fn cmd_describe(file: PathBuf, report: Option<String>) -> CliResult {
    let catalog = load_catalog(&file)?;

    let descriptions = match report {
        Some(name) => vec![find_report(&catalog, &name)?.describe(&catalog.schema)?],
        None => catalog
            .reports
            .values()
            .map(|r| r.describe(&catalog.schema))
            .collect::<Result<Vec<_>, _>>()?,
    };

    println!("{}", serde_json::to_string_pretty(&descriptions)?);
    Ok(())
}

fn cmd_render(
    config: Option<PathBuf>,
    file: PathBuf,
    report: String,
    query: String,
    dialect: Option<DialectArg>,
    connection: Option<String>,
) -> CliResult {
    let catalog = load_catalog(&file)?;
    let report = find_report(&catalog, &report)?;

    let dialect: Dialect = match (dialect, connection) {
        (Some(arg), _) => arg.into(),
        (None, Some(name)) => load_settings(config)?.get_connection(&name)?.dialect()?,
        (None, None) => load_settings(config)?.render.dialect,
    };

    let params = RequestParams::from_query_string(&query);
    let rendered = Gatherer::from_request(&catalog.schema, report, params)?
        .with_dialect(dialect)
        .prepare()?;

    println!("-- dialect: {}", dialect);
    println!("{}", rendered.sql);
    println!("-- params: {}", serde_json::to_string(&rendered.params)?);
    Ok(())
}

async fn cmd_run(
    config: Option<PathBuf>,
    file: PathBuf,
    report: String,
    query: String,
    connection: Option<String>,
    setup: Option<PathBuf>,
) -> CliResult {
    let catalog = load_catalog(&file)?;
    let report = find_report(&catalog, &report)?;
    let settings = load_settings(config)?;
    let conn = settings.connection(connection.as_deref())?;
    let driver = conn.driver_type()?;
    let connection_string = conn.resolved_connection_string()?;

    let executor: Box<dyn QueryExecutor> = if driver.is_embedded() {
        let sqlite = SqliteExecutor::connect(&connection_string)?;
        if let Some(setup) = setup {
            sqlite.execute_batch(&fs::read_to_string(setup)?)?;
        }
        Box::new(sqlite)
    } else {
        if setup.is_some() {
            return Err("--setup is only supported for sqlite connections".into());
        }
        let client = WorkerClient::spawn_with_settings(&settings).await?;
        Box::new(WorkerExecutor::with_client(
            client,
            driver.as_str(),
            connection_string,
        ))
    };

    let params = RequestParams::from_query_string(&query);
    let mut gatherer =
        Gatherer::from_request(&catalog.schema, report, params)?.with_dialect(conn.dialect()?);
    let rows = gatherer.run(executor.as_ref()).await?;

    println!("{}", serde_json::to_string_pretty(&rows.to_objects())?);
    Ok(())
}

fn cmd_check(file: PathBuf) -> CliResult {
    let catalog = load_catalog(&file)?;

    let mut failures = 0;
    for (name, report) in &catalog.reports {
        match report.validate(&catalog.schema) {
            Ok(()) => println!("OK: {}", name),
            Err(errors) => {
                failures += 1;
                eprintln!("FAIL: {}", name);
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} reports failed validation", failures, catalog.reports.len()).into());
    }
    println!("OK: {} is valid", file.display());
    Ok(())
}
