use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

use academic_database::{
    initialize_database, postgres_health_check, DatabaseConfig, ImportStore, MemoryStore, PgStore,
};
use academic_models::{ImportReport, ReplaceMode};
use academic_utils::{
    init_logging, validate_model, AppConfig, ErrorResponse, ImportError, ImportResult,
    ImportService, StagedUpload,
};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        AppConfig::default()
    });

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    match run(&cli, &config).await {
        Ok(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to render report: {}", e),
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            let response = ErrorResponse::for_caller(&error, cli.privileged);
            match serde_json::to_string_pretty(&response) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("Error: {}", response.message),
            }
            ExitCode::from(1)
        }
    }
}

async fn run(cli: &Cli, config: &AppConfig) -> ImportResult<ImportReport> {
    validate_model(&config.import)?;

    // Staged copies live until the import finishes, whatever the outcome.
    let uploads = cli
        .command
        .files()
        .into_iter()
        .map(|path| StagedUpload::stage_path(path, &config.import))
        .collect::<ImportResult<Vec<_>>>()?;

    if cli.dry_run {
        info!("Dry run against an in-memory store");
        let service = ImportService::new(MemoryStore::new(), config.import.clone());
        return execute(&service, &cli.command, &uploads).await;
    }

    let db_config = DatabaseConfig {
        postgres_url: config.database.postgres_url.clone(),
        max_connections: config.database.max_connections,
        connection_timeout: Duration::from_secs(config.database.connection_timeout_seconds),
    };
    let pool = initialize_database(&db_config).await?;
    postgres_health_check(&pool).await?;
    info!("Database connection established");

    let service = ImportService::new(PgStore::new(pool), config.import.clone());
    execute(&service, &cli.command, &uploads).await
}

async fn execute<S: ImportStore>(
    service: &ImportService<S>,
    command: &Commands,
    uploads: &[StagedUpload],
) -> ImportResult<ImportReport> {
    let sources = uploads
        .iter()
        .map(StagedUpload::source)
        .collect::<ImportResult<Vec<_>>>()?;

    match command {
        Commands::Single { full, .. } => {
            let source = sources.first().ok_or_else(|| ImportError::EmptySource {
                label: "upload".to_string(),
            })?;
            let requested = full.then_some(ReplaceMode::Full);
            service.import_single_with(source, requested).await
        }
        Commands::Batch { .. } => service.import_batch(&sources).await,
    }
}
