//! `figures-import` -- load historical figures from CSV files or spreadsheets.
//!
//! # Environment variables
//!
//! | Variable            | Required | Default              | Description                      |
//! |---------------------|----------|----------------------|----------------------------------|
//! | `DATABASE_URL`      | no       | composed             | Full connection string override  |
//! | `POSTGRES_*`        | no       | see `DatabaseConfig` | Discrete connection parts        |
//! | `GOOGLE_CREDS`      | no       | `./credentials.json` | Service-account key file         |
//! | `GSPREAD_TIMEOUT`   | no       | `15`                 | Seconds per spreadsheet call     |

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use figures_core::types::DEFAULT_BATCH_SIZE;
use figures_db::DatabaseConfig;
use figures_importer::sheets::{SheetsClient, SheetsConfig, WorksheetRef};
use figures_importer::source::CsvRowSource;
use figures_importer::{ImportDriver, ImportProgress, PgBatchSink};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "figures-import")]
#[command(about = "Import historical figures into the catalog database")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upsert rows from a CSV file whose first line is the header.
    Csv {
        /// Path to the CSV file.
        path: PathBuf,

        /// Rows committed per transaction.
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Upsert rows from a spreadsheet worksheet.
    Sheet {
        #[command(flatten)]
        sheet: SheetArgs,

        /// Rows committed per transaction.
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Print a worksheet's rows as JSON without touching the database.
    ReadSheet {
        #[command(flatten)]
        sheet: SheetArgs,
    },
}

#[derive(Args)]
struct SheetArgs {
    /// Spreadsheet id (from the sheet URL).
    #[arg(long)]
    sheet_id: String,

    /// Worksheet index (0-based) or title.
    #[arg(long, default_value = "0")]
    worksheet: WorksheetRef,

    /// Service-account key file; overrides `GOOGLE_CREDS`.
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Seconds allowed per remote call; overrides `GSPREAD_TIMEOUT`.
    #[arg(long)]
    timeout: Option<u64>,
}

impl SheetArgs {
    fn config(&self) -> anyhow::Result<SheetsConfig> {
        let mut config = SheetsConfig::from_env()?;
        if let Some(path) = &self.credentials {
            config.credentials_path = path.clone();
        }
        if let Some(secs) = self.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    async fn fetch(&self) -> anyhow::Result<Vec<figures_core::coercion::RawRow>> {
        let client = SheetsClient::authorize(&self.config()?).await?;
        let rows = client.read_sheet(&self.sheet_id, &self.worksheet).await?;
        Ok(rows)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "figures_importer=info,figures_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Csv { path, batch_size } => {
            let source = CsvRowSource::open(&path)?;
            tracing::info!(path = %path.display(), columns = source.headers().len(), "Opened CSV");

            let driver = connect_driver(batch_size).await?;
            driver.run(source, print_progress).await?;
        }
        Command::Sheet { sheet, batch_size } => {
            let rows = sheet.fetch().await?;
            let driver = connect_driver(batch_size).await?;
            driver.run(rows.into_iter().map(Ok), print_progress).await?;
        }
        Command::ReadSheet { sheet } => {
            let rows = sheet.fetch().await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}

async fn connect_driver(batch_size: usize) -> anyhow::Result<ImportDriver<PgBatchSink>> {
    let config = DatabaseConfig::from_env()?;
    let pool = figures_db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    Ok(ImportDriver::new(PgBatchSink::new(pool)).with_batch_size(batch_size)?)
}

fn print_progress(progress: &ImportProgress) {
    println!("{}", progress_line(progress));
}

/// The running count after each full batch, then one closing line that is
/// marked `(final)` only when a partial batch was flushed at the end.
fn progress_line(progress: &ImportProgress) -> String {
    let committed = progress.committed();
    match (progress.finished, progress.remainder_flushed) {
        (false, _) => format!("Inserted {committed} rows..."),
        (true, true) => format!("Inserted {committed} rows (final)"),
        (true, false) => format!("Inserted {committed} rows"),
    }
}
