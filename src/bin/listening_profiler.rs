use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use listening_profiler::analysis::Analyzer;
use listening_profiler::cancel::Cancellation;
use listening_profiler::catalog::CatalogHttpClient;
use listening_profiler::config::{ConfigLoader, resolve_token};
use listening_profiler::error::{ErrorKind, ProfilerError};
use listening_profiler::output::{
    ClassifyResult, JsonOutput, OutputMode, TracingSink, print_classify_summary,
    print_report_summary, print_table,
};

#[derive(Parser)]
#[command(name = "listening-profiler")]
#[command(about = "Derive top genres, top artists and a listener archetype from streaming history")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Analyze the listener's top tracks (saved tracks as fallback)")]
    Analyze(AnalyzeArgs),
    #[command(about = "Classify a list of genres without contacting the catalog")]
    Classify(ClassifyArgs),
    #[command(about = "Show the active archetype table")]
    Archetypes,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[arg(long)]
    token: Option<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ClassifyArgs {
    #[arg(required = true)]
    genres: Vec<String>,

    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<ProfilerError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ProfilerError) -> u8 {
    match error.kind() {
        ErrorKind::Fetch => 3,
        ErrorKind::NoData | ErrorKind::ExhaustedSources => 2,
        ErrorKind::Cancelled => 130,
        ErrorKind::Config => 1,
    }
}

fn output_mode(json: bool) -> OutputMode {
    if json {
        OutputMode::Json
    } else {
        OutputMode::Summary
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let resolved = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze(args) => {
            let token = resolve_token(args.token)?;
            let catalog = CatalogHttpClient::new(&token, resolved.http.clone())?;
            let cancel = match resolved.deadline {
                Some(deadline) => Cancellation::with_timeout(deadline),
                None => Cancellation::new(),
            };
            let analyzer = Analyzer::new(catalog, resolved.archetypes, resolved.analysis)?;
            let report = analyzer.analyze_with_report(&cancel, &TracingSink)?;
            match output_mode(args.json) {
                OutputMode::Json => JsonOutput::print_profile(&report.profile).into_diagnostic()?,
                OutputMode::Summary => print_report_summary(&report),
            }
            Ok(())
        }
        Commands::Classify(args) => {
            let genres = args
                .genres
                .iter()
                .map(|genre| genre.trim().to_lowercase())
                .filter(|genre| !genre.is_empty())
                .collect::<Vec<_>>();
            let table = &resolved.archetypes;
            let result = ClassifyResult {
                archetype: table.classify(genres.as_slice()).to_string(),
                scores: table.scores(genres.as_slice()),
                genres,
            };
            match output_mode(args.json) {
                OutputMode::Json => JsonOutput::print_classify(&result).into_diagnostic()?,
                OutputMode::Summary => print_classify_summary(&result),
            }
            Ok(())
        }
        Commands::Archetypes => {
            print_table(&resolved.archetypes);
            Ok(())
        }
    }
}
