use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::info;

use bulk_registration_rs::{
    ErrorReport, InMemoryRecordCreator, LogFormat, LoggingConfig, Money, RegistrationConfig,
    RegistrationError, RegistrationInput, RegistrationService, SafeTimeProvider, TermCode,
    TimeSource,
};

/// Register an administrator with its workers, clients and loans in one batch
#[derive(Parser)]
#[command(name = "bulk-register", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the repayment schedule of a loan
    Quote {
        /// Principal, e.g. 1000 or 1500.50
        #[arg(long)]
        amount: String,
        /// Term code: 15, 20, 23 or 28 (four weeks)
        #[arg(long)]
        term: u32,
    },
    /// Validate an input file and print the records it would create
    Plan {
        #[arg(long)]
        input: PathBuf,
    },
    /// Create every record of an input file
    Submit {
        #[arg(long)]
        input: PathBuf,
        /// Use an in-memory store instead of the remote service
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    init_tracing(&config.logging);

    let result = match cli.command {
        Commands::Quote { amount, term } => run_quote(&amount, term),
        Commands::Plan { input } => run_plan(config, &input),
        Commands::Submit { input, dry_run } => run_submit(config, &input, dry_run).await,
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            process::exit(0);
        }
        Err(e) => exit_with(&e),
    }
}

fn exit_with(error: &RegistrationError) -> ! {
    eprint!("{}", ErrorReport::from_error(error).render());
    process::exit(1);
}

fn load_config(path: Option<&Path>) -> bulk_registration_rs::Result<RegistrationConfig> {
    let config = match path {
        Some(path) => RegistrationConfig::load(path)?,
        None => RegistrationConfig::default(),
    };
    config.with_env_overrides()
}

/// logs go to stderr so stdout stays machine readable
fn init_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn read_input(path: &Path) -> bulk_registration_rs::Result<RegistrationInput> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        RegistrationError::validation(format!("cannot read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&raw)?)
}

fn run_quote(amount: &str, term: u32) -> bulk_registration_rs::Result<String> {
    let principal: Money = amount
        .trim()
        .parse()
        .map_err(|e| RegistrationError::validation(format!("invalid amount '{}': {}", amount, e)))?;
    let term = TermCode::try_from(term)?;

    let schedule = bulk_registration_rs::compute_schedule(principal, term)?;
    Ok(serde_json::to_string_pretty(&schedule)?)
}

fn run_plan(config: RegistrationConfig, path: &Path) -> bulk_registration_rs::Result<String> {
    let input = read_input(path)?;
    let service = RegistrationService::new(
        config,
        Arc::new(InMemoryRecordCreator::new()),
        SafeTimeProvider::new(TimeSource::System),
    )?;

    let plan = service.plan(&input)?;
    info!(steps = plan.step_count(), "plan built");
    Ok(plan.redacted().to_json_pretty()?)
}

async fn run_submit(
    config: RegistrationConfig,
    path: &Path,
    dry_run: bool,
) -> bulk_registration_rs::Result<String> {
    let input = read_input(path)?;

    let service = if dry_run {
        RegistrationService::new(
            config,
            Arc::new(InMemoryRecordCreator::new()),
            SafeTimeProvider::new(TimeSource::System),
        )?
    } else {
        info!("submitting to {}", config.api.base_url);
        RegistrationService::with_http(config)?
    };

    let outcome = service.submit(&input).await?;
    Ok(outcome.summary.render())
}
