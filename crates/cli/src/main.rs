mod config;

use clap::{Parser, Subcommand};
use config::Settings;
use group_core::application::{ImportServiceImpl, RunReport};
use group_core::domain::GroupReference;
use group_core::ports::{DirectoryListing, Result};
use group_core::utils::parse_reference_lines;
use http_adapter::{GoogleGeocoder, MeetupComApi, PhpUgDirectory};
use sqlite_adapter::SqliteRecordStore;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use yaml_adapter::YamlWriterAdapter;

/// CLI tool to resolve meetup.com user groups into records for the groups data file
#[derive(Parser, Debug)]
#[command(name = "group-importer")]
#[command(about = "Resolves meetup.com user groups (name, id, url, country) and prints the ones not imported yet")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shows details for meetup group(s)
    GroupDetail {
        /// Group url on meetup.com, e.g. https://www.meetup.com/Berlin-PHP-Usergroup/,
        /// or path to a file with one url per line
        source: String,
    },
    /// Resolves every meetup.com group listed in the php.ug directory
    ImportDirectory,
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    // Instantiate concrete implementations of secondary adapters
    let http = cli.settings.http_config();
    let fetcher = MeetupComApi::new(&http);
    let geocoder = GoogleGeocoder::new(&http);
    let store = SqliteRecordStore::new(cli.settings.db.clone());
    let writer = YamlWriterAdapter::new(cli.settings.output.clone());

    // Instantiate the core business service with dependency injection
    let service = ImportServiceImpl::new(&fetcher, &geocoder, &store, &writer);

    let result = match &cli.command {
        Command::GroupDetail { source } => group_detail(&service, source, cli.settings.persist),
        Command::ImportDirectory => {
            import_directory(&service, &PhpUgDirectory::new(&http), cli.settings.persist)
        }
    };

    if let Err(e) = result {
        eprintln!("Error during import: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout carries only the YAML records
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn group_detail(service: &ImportServiceImpl<'_>, source: &str, persist: bool) -> Result<()> {
    if Path::new(source).is_file() {
        let content = fs::read_to_string(source)?;
        let report = service.execute_import(parse_reference_lines(&content), persist)?;
        log_summary(&report);
        return Ok(());
    }

    let report = service.execute_import(vec![GroupReference::Url(source.trim().to_string())], persist)?;
    if let Some((_, cause)) = report.fetch_failures.first() {
        return Err(format!("could not fetch group \"{}\": {}", source, cause).into());
    }
    if !report.duplicates.is_empty() {
        eprintln!("Group \"{}\" is already imported.", source);
    }
    Ok(())
}

fn import_directory(service: &ImportServiceImpl<'_>, directory: &dyn DirectoryListing, persist: bool) -> Result<()> {
    let references: Vec<GroupReference> = directory
        .fetch_listing()?
        .into_iter()
        .map(GroupReference::Listing)
        .collect();

    let report = service.execute_import(references, persist)?;
    log_summary(&report);
    Ok(())
}

fn log_summary(report: &RunReport) {
    for (reference, cause) in &report.fetch_failures {
        warn!(url = %reference, "skipped: {cause}");
    }
    info!(
        "{} new, {} already imported, {} failed, {} not on meetup.com",
        report.emitted.len(),
        report.duplicates.len(),
        report.fetch_failures.len(),
        report.off_platform
    );
}
