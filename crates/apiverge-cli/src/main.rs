#![forbid(unsafe_code)]

use apiverge_core::{ExitCode, MachineError, ENV_APIVERGE_LOG_LEVEL};
use apiverge_engine::{
    execute_tests_from_file, extract_routes, load_contract, ArtifactStore, DeniedGenerator,
    EngineConfig, GenerativeClient, HttpNetwork, PatternScanner, Pipeline, RealGit, TextGenerator,
};
use apiverge_model::{ContractSource, ExpectedStatus, ExtractedRoutes};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const APIVERGE_HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}
{after-help}";

#[derive(Parser)]
#[command(name = "apiverge")]
#[command(about = "Compare implemented HTTP routes against an OpenAPI contract")]
#[command(version)]
#[command(help_template = APIVERGE_HELP_TEMPLATE)]
#[command(
    after_help = "Environment:\n  APIVERGE_API_KEY    Text-generation service credential\n  APIVERGE_MODEL      Model identifier override\n  APIVERGE_ENDPOINT   Generation endpoint override\n  APIVERGE_WORKDIR    Checkout and reports directory\n  APIVERGE_LOG_LEVEL  Log verbosity override"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true, default_value_t = false)]
    trace: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a contract document and print its declared surface.
    Contract {
        /// Local path, http(s) URL, or `repo:<contents-api-url>`.
        #[arg(long)]
        source: String,
    },
    /// Extract implemented routes from a local source tree.
    Extract {
        #[arg(long)]
        root: PathBuf,
        /// Skip the model-assisted strategy; static patterns only.
        #[arg(long, default_value_t = false)]
        patterns_only: bool,
    },
    /// Sync, load, extract and analyze; persists the divergence report.
    Compare {
        #[arg(long)]
        repo: String,
        #[arg(long)]
        contract: String,
        #[arg(long, default_value_t = false)]
        purge: bool,
    },
    /// The full pipeline: compare, generate test cases, execute them.
    Run {
        #[arg(long)]
        repo: String,
        #[arg(long)]
        contract: String,
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        base_url: String,
        #[arg(long, value_enum, default_value_t = ExpectedStatusCli::Exact)]
        expected_status: ExpectedStatusCli,
        #[arg(long, default_value_t = false)]
        purge: bool,
    },
    /// Replay a persisted test-case collection against a live server.
    Execute {
        #[arg(long)]
        testcases: PathBuf,
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        base_url: String,
        #[arg(long, value_enum, default_value_t = ExpectedStatusCli::Exact)]
        expected_status: ExpectedStatusCli,
    },
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExpectedStatusCli {
    /// Steps naming 404 expect 404; everything else expects 200.
    Exact,
    /// Steps naming 404 expect 404; everything else passes unless 404.
    Lenient,
}

impl From<ExpectedStatusCli> for ExpectedStatus {
    fn from(value: ExpectedStatusCli) -> Self {
        match value {
            ExpectedStatusCli::Exact => Self::Exact,
            ExpectedStatusCli::Lenient => Self::Lenient,
        }
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.trace {
        "trace"
    } else if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_env(ENV_APIVERGE_LOG_LEVEL)
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

struct Failure {
    error: MachineError,
    exit: ExitCode,
}

impl Failure {
    fn new(code: &str, message: &str, exit: ExitCode) -> Self {
        Self {
            error: MachineError::new(code, message),
            exit,
        }
    }
}

fn emit(json: bool, value: serde_json::Value, text: String) {
    if json {
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    } else {
        println!("{text}");
    }
}

fn build_generator(config: &EngineConfig) -> Box<dyn TextGenerator> {
    match GenerativeClient::from_config(config) {
        Ok(client) => Box::new(client),
        Err(_) => Box::new(DeniedGenerator),
    }
}

fn cmd_contract(json: bool, source: &str, config: &EngineConfig) -> Result<(), Failure> {
    let source = ContractSource::parse(source);
    let network = HttpNetwork::new(config.fetch_timeout);
    let doc = load_contract(&source, &network).map_err(|err| {
        let exit = match &err {
            apiverge_engine::ContractError::Network { .. } => ExitCode::DependencyFailure,
            _ => ExitCode::Validation,
        };
        Failure::new("contract_error", &err.to_string(), exit)
    })?;
    emit(
        json,
        json!({
            "source": doc.source.as_str(),
            "path_count": doc.path_count(),
            "paths": doc.declared_paths(),
        }),
        format!(
            "contract {} declares {} path(s)\n{}",
            doc.source,
            doc.path_count(),
            doc.declared_paths().join("\n")
        ),
    );
    Ok(())
}

fn cmd_extract(
    json: bool,
    root: &PathBuf,
    patterns_only: bool,
    config: &EngineConfig,
) -> Result<(), Failure> {
    let routes = if patterns_only {
        let pattern_routes = PatternScanner.scan_paths(root).map_err(|err| {
            Failure::new("extract_error", &err.to_string(), ExitCode::Internal)
        })?;
        ExtractedRoutes::new(pattern_routes, Vec::new())
    } else {
        let generator = build_generator(config);
        extract_routes(root, generator.as_ref()).map_err(|err| {
            Failure::new(
                "extract_error",
                &err.to_string(),
                ExitCode::DependencyFailure,
            )
        })?
    };
    emit(
        json,
        serde_json::to_value(&routes).unwrap_or_default(),
        format!(
            "pattern routes: {}\nmodel routes: {}",
            routes.pattern_routes.len(),
            routes.model_routes.len()
        ),
    );
    Ok(())
}

fn cmd_compare(
    json: bool,
    repo: &str,
    contract: &str,
    purge: bool,
    config: EngineConfig,
) -> Result<(), Failure> {
    let config = config.with_purge_before_sync(purge);
    let git = RealGit;
    let network = HttpNetwork::new(config.fetch_timeout);
    let generator = build_generator(&config);
    let pipeline = Pipeline::new(&git, &network, generator.as_ref(), config);
    let source = ContractSource::parse(contract);
    let outcome = pipeline.compare(repo, &source).map_err(|err| Failure {
        error: MachineError::new(err.code(), &err.to_string()),
        exit: err.exit_code(),
    })?;
    emit(
        json,
        json!({
            "divergence_total": outcome.report.total(),
            "report_path": &outcome.report_path,
            "report": &outcome.report,
        }),
        format!(
            "{} divergence(s); report written to {}",
            outcome.report.total(),
            outcome.report_path.display()
        ),
    );
    Ok(())
}

fn cmd_run(
    json: bool,
    repo: &str,
    contract: &str,
    base_url: &str,
    expected_status: ExpectedStatusCli,
    purge: bool,
    config: EngineConfig,
) -> Result<(), Failure> {
    let config = config
        .with_expected_status(expected_status.into())
        .with_purge_before_sync(purge);
    let git = RealGit;
    let network = HttpNetwork::new(config.fetch_timeout);
    let generator = build_generator(&config);
    let pipeline = Pipeline::new(&git, &network, generator.as_ref(), config);
    let source = ContractSource::parse(contract);
    let summary = pipeline
        .run(repo, &source, base_url)
        .map_err(|err| Failure {
            error: MachineError::new(err.code(), &err.to_string()),
            exit: err.exit_code(),
        })?;
    emit(
        json,
        serde_json::to_value(&summary).unwrap_or_default(),
        format!(
            "run complete: {} divergence(s), {} test case(s)\ndivergences: {}",
            summary.divergence_total,
            summary.test_case_count,
            summary.divergence_report_path.display()
        ),
    );
    Ok(())
}

fn cmd_execute(
    json: bool,
    testcases: &PathBuf,
    base_url: &str,
    expected_status: ExpectedStatusCli,
    config: EngineConfig,
) -> Result<(), Failure> {
    let config = config.with_expected_status(expected_status.into());
    let store = ArtifactStore::new(config.reports_root.clone());
    let outcome =
        execute_tests_from_file(testcases, base_url, &config, &store).map_err(|err| {
            Failure::new("execution_error", &err.to_string(), ExitCode::Internal)
        })?;
    let passed = outcome
        .results
        .iter()
        .filter(|r| r.verdict == apiverge_model::Verdict::Pass)
        .count();
    emit(
        json,
        json!({
            "results": &outcome.results,
            "report_path": &outcome.report_path,
        }),
        format!(
            "{passed}/{} passed; report written to {}",
            outcome.results.len(),
            outcome.report_path.display()
        ),
    );
    Ok(())
}

fn dispatch(cli: &Cli) -> Result<(), Failure> {
    let config = EngineConfig::from_env();
    match &cli.command {
        Commands::Contract { source } => cmd_contract(cli.json, source, &config),
        Commands::Extract {
            root,
            patterns_only,
        } => cmd_extract(cli.json, root, *patterns_only, &config),
        Commands::Compare {
            repo,
            contract,
            purge,
        } => cmd_compare(cli.json, repo, contract, *purge, config),
        Commands::Run {
            repo,
            contract,
            base_url,
            expected_status,
            purge,
        } => cmd_run(
            cli.json,
            repo,
            contract,
            base_url,
            *expected_status,
            *purge,
            config,
        ),
        Commands::Execute {
            testcases,
            base_url,
            expected_status,
        } => cmd_execute(cli.json, testcases, base_url, *expected_status, config),
        Commands::Version => {
            emit(
                cli.json,
                json!({"name": "apiverge", "version": env!("CARGO_PKG_VERSION")}),
                format!("apiverge {}", env!("CARGO_PKG_VERSION")),
            );
            Ok(())
        }
    }
}

fn main() -> ProcessExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match dispatch(&cli) {
        Ok(()) => ProcessExitCode::SUCCESS,
        Err(failure) => {
            if cli.json {
                eprintln!(
                    "{}",
                    serde_json::to_string_pretty(&failure.error).unwrap_or_default()
                );
            } else {
                eprintln!("error: {}", failure.error);
            }
            ProcessExitCode::from(failure.exit as u8)
        }
    }
}
