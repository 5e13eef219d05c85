use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use protannot::app::{self, App};
use protannot::cache::{DEFAULT_MAX_ENTRIES, ResponseCache};
use protannot::error::AnnotError;
use protannot::fetch::HttpFetcher;
use protannot::report;

#[derive(Parser)]
#[command(name = "protannot")]
#[command(about = "Annotates a gene list with protein metadata from UniProt")]
#[command(version, author)]
struct Cli {
    /// Query list, one query per line; semicolons separate sub-queries.
    #[arg(short = 'i', long, default_value = "example.txt")]
    input: PathBuf,

    /// Human-readable report path; the table goes to `<output>.csv`.
    #[arg(short = 'o', long, default_value = "annotation.txt")]
    output: PathBuf,

    /// Directory holding the persistent response cache.
    #[arg(long, default_value = "urlcache")]
    cache_dir: String,

    /// Retention cap for the response cache (oldest entries evicted first).
    #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES)]
    max_cache_entries: usize,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(annot) = report.downcast_ref::<AnnotError>() {
            return ExitCode::from(map_exit_code(annot));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &AnnotError) -> u8 {
    match error {
        AnnotError::CacheCorrupt { .. } | AnnotError::InputRead(_) => 2,
        AnnotError::Http(_) | AnnotError::HttpStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tracing::info!(input = %cli.input.display(), "loading queries");
    let queries = app::read_queries(&cli.input).into_diagnostic()?;
    tracing::info!(count = queries.len(), "read query list");

    let cache_dir = Utf8PathBuf::from(cli.cache_dir);
    let cache = ResponseCache::load(&cache_dir, cli.max_cache_entries).into_diagnostic()?;
    let fetcher = HttpFetcher::new().into_diagnostic()?;
    let mut app = App::new(cache, fetcher);

    let records = app.run(&queries).into_diagnostic()?;

    let table_path = PathBuf::from(format!("{}.csv", cli.output.display()));
    tracing::info!(
        report = %cli.output.display(),
        table = %table_path.display(),
        records = records.len(),
        "saving results"
    );
    write_output(&cli.output, &report::render_human(&records)).into_diagnostic()?;
    write_output(&table_path, &report::render_table(&records)).into_diagnostic()?;
    tracing::info!("done");
    Ok(())
}

fn write_output(path: &std::path::Path, content: &str) -> Result<(), AnnotError> {
    fs::write(path, content).map_err(|err| AnnotError::Filesystem(err.to_string()))
}
