//! Pulse survey manager report exporter.
//!
//! Fetches joined survey responses from Snowflake over a key-pair
//! authenticated session and writes one CSV report per manager into the
//! output directory. The run is strictly sequential: resolve credentials,
//! open one session, execute one fixed query, partition by manager, export.
//!
//! # Security Guarantees
//! - Key-pair authentication only; no password is transmitted
//! - Private key material is never logged or echoed in errors
//! - One read-only statement per run

use std::path::{Path, PathBuf};

use clap::{Args, Parser};
use pulse_survey_core::{
    Config, KeyPair, Result, SnowflakeSession, export_reports, init_logging, report_query,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "pulse-survey-export")]
#[command(about = "Exports one pulse survey CSV report per manager")]
#[command(version)]
#[command(long_about = "
Pulse Survey Exporter - per-manager survey report generation

Connects to Snowflake with key-pair authentication, runs the fixed survey
report query (responses joined to the employee hierarchy and filtered to
managers on the weekly recipient list), and writes one CSV per manager.

CONFIGURATION (environment variables):
  SNOWFLAKE_ACCOUNT      account identifier   (default: DILIGENT-DILIGENTUS1)
  SNOWFLAKE_USER         user name            (default: Cognida)
  SNOWFLAKE_ROLE         role                 (default: COGNIDA_RL)
  SNOWFLAKE_WAREHOUSE    warehouse            (default: REPORTING_WH)
  SNOWFLAKE_DATABASE     database             (default: PULSE_SURVEY)
  SNOWFLAKE_PRIVATE_KEY  PEM private key      (required, no default)

Running with no arguments performs the entire fetch-and-export in one pass.
")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Directory the report files are written into
    #[arg(long, default_value = "output", help = "Output directory for report CSVs")]
    output_dir: PathBuf,
}

#[derive(Args)]
struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let config = Config::from_env()?;
    info!("configured for {config}");

    let keypair = KeyPair::from_pem(config.private_key_pem())?;
    let session = SnowflakeSession::connect(&config, &keypair).await?;

    // The session is released on every exit path past this point.
    let outcome = run_export(&session, &cli.output_dir).await;
    session.close();
    let written = outcome?;

    println!("Export completed successfully");
    println!("Reports written: {}", written.len());
    println!("Output directory: {}", cli.output_dir.display());

    Ok(())
}

/// Fetches the report table and exports one CSV per manager.
async fn run_export(session: &SnowflakeSession, output_dir: &Path) -> Result<Vec<PathBuf>> {
    info!("Fetching data from Snowflake...");
    let table = session.execute(&report_query()).await?;
    info!("Data fetched successfully: {} row(s)", table.len());

    export_reports(&table, output_dir)
}
