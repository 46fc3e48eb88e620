//! Embark batch runner.
//!
//! Selects recently created HR person records, provisions directory
//! accounts for them, and dispatches the stakeholder reports. One
//! invocation is one batch; scheduling is the operator's concern.

mod config;
mod credentials;
mod logging;

use clap::Parser;
use tracing::{error, info};

use config::Config;
use credentials::{local_host_binding, CredentialStore};
use embark_core::{EmployeeId, Result};
use embark_directory::{AdConnector, Connector};
use embark_hr::HrSource;
use embark_provisioning::{DedupCache, IdentityDeriver, OnboardingPipeline, RunSelection};
use embark_reports::{LoggingMailGateway, ReportDispatcher};

/// Provision directory accounts for new employees.
#[derive(Parser)]
#[command(name = "embark-runner")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Lookback window in days (defaults to EMBARK_LOOKBACK_DAYS).
    #[arg(long, conflicts_with = "employee_id")]
    lookback_days: Option<u32>,

    /// Process a single employee ID instead of a change window.
    #[arg(long)]
    employee_id: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration (fail-fast on missing required values)
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        cache_path = %config.cache_path.display(),
        "Starting embark runner"
    );

    if let Err(e) = run(cli, config).await {
        error!(error = %e, "Run aborted");
        std::process::exit(1);
    }

    info!("Run complete");
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    // Read the service credential once, before any downstream connection
    let store = CredentialStore::from_hex_key(&config.credential_key, &local_host_binding())?;
    let secret = store.read_file(&config.credential_file)?;
    let config = config.with_service_secret(&secret);

    config
        .smtp
        .validate()
        .map_err(|e| embark_core::EmbarkError::configuration(e.to_string()))?;

    let selection = match &cli.employee_id {
        Some(id) => RunSelection::Single {
            employee_id: EmployeeId::new(id.clone()),
        },
        None => RunSelection::Window {
            days: cli.lookback_days.unwrap_or(config.default_lookback_days),
        },
    };

    let hr = HrSource::new(config.hr.clone())?;
    let directory = AdConnector::new(config.directory.clone())?;

    // Fail fast on an unreachable directory instead of mid-batch
    directory.test_connection().await?;

    let cache = DedupCache::open(&config.cache_path, config.cache_max_age_days)?;
    let deriver = IdentityDeriver::new(config.mail_domain.clone());

    let mut pipeline = OnboardingPipeline::new(
        &hr,
        &hr,
        &directory,
        deriver,
        config.baseline_groups.clone(),
        cache,
    );

    let (batch, summary) = pipeline.run(&selection).await?;

    info!(
        selected = summary.selected,
        processed = summary.processed,
        skipped = summary.skipped,
        partial = summary.partial,
        report_rows = batch.len(),
        "Provisioning batch finished"
    );

    // Transport behind the gateway trait; the logging implementation
    // records what would be delivered
    let gateway = LoggingMailGateway::new();
    let dispatcher = ReportDispatcher::new(
        &gateway,
        config.smtp.from_address.clone(),
        config.recipients.clone(),
    );
    dispatcher.dispatch(&batch).await;

    Ok(())
}
