use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use recruiter_automation::api::{api_router, parse_date, ApiState, LogSender};
use recruiter_automation::config::AppConfig;
use recruiter_automation::error::AppError;
use recruiter_automation::telemetry;
use recruiter_automation::workflows::leads::{
    read_leads_from_path, ColumnMap, InMemoryContactStore, KeywordSets, LeadPipeline, Phase,
    PipelineOptions, PipelineSummary,
};
use recruiter_automation::workflows::nurture::{NurtureProcessor, NurtureSequence};
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct ServiceState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "recruiter-automation",
    about = "Qualify lead exports and run nurture sequences from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Batch lead-qualification runs
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },
    /// Nurture-sequence maintenance
    Nurture {
        #[command(subcommand)]
        command: NurtureCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum PipelineCommand {
    /// Run the qualification phases over a CSV lead export
    Run(PipelineRunArgs),
}

#[derive(Args, Debug)]
struct PipelineRunArgs {
    /// Path to the CSV lead export
    #[arg(long)]
    file: PathBuf,
    /// Resume from this phase number (1-7)
    #[arg(long, default_value = "1", value_parser = parse_phase)]
    start_phase: Phase,
    /// Override the configured shortlist cap
    #[arg(long)]
    max_shortlist: Option<usize>,
    /// Skip per-phase confirmation prompts (accepted for script parity)
    #[arg(long)]
    confirm: bool,
}

#[derive(Subcommand, Debug)]
enum NurtureCommand {
    /// Poll the contact store once and advance due sequence steps
    Process(NurtureProcessArgs),
}

#[derive(Args, Debug)]
struct NurtureProcessArgs {
    /// Evaluation date for the poll (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Pipeline {
            command: PipelineCommand::Run(args),
        } => run_pipeline(args),
        Command::Nurture {
            command: NurtureCommand::Process(args),
        } => run_nurture(args),
    }
}

fn parse_phase(raw: &str) -> Result<Phase, String> {
    let number: u8 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a phase number"))?;
    Phase::from_number(number).ok_or_else(|| format!("phase number must be 1-7, got {number}"))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = ServiceState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };
    let api_state = ApiState::new(
        InMemoryContactStore::new(),
        config.pipeline.max_shortlist,
        &config.pipeline.nurture_state,
    );

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(api_router(api_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "recruiter automation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_pipeline(args: PipelineRunArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let dataset = read_leads_from_path(&args.file, &ColumnMap::jobdigger())?;
    let pipeline = LeadPipeline::new(&KeywordSets::dutch_defaults());
    let options = PipelineOptions {
        start_phase: args.start_phase,
        max_shortlist: args
            .max_shortlist
            .unwrap_or(config.pipeline.max_shortlist),
        confirm: args.confirm,
        ..PipelineOptions::default()
    };

    let store = InMemoryContactStore::new();
    let outcome = pipeline.run(dataset, &options, None, &store)?;
    render_pipeline_summary(&outcome.summary, options.start_phase);
    Ok(())
}

fn run_nurture(args: NurtureProcessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let processor = NurtureProcessor::new(
        InMemoryContactStore::new(),
        LogSender,
        NurtureSequence::standard(),
        &config.pipeline.nurture_state,
    );
    let summary = processor.process_all(today).map_err(AppError::Store)?;

    println!("Nurture poll for {today}");
    println!(
        "processed {}, sent {}, skipped {}, errors {}",
        summary.processed, summary.sent, summary.skipped, summary.errors
    );
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<ServiceState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<ServiceState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn render_pipeline_summary(summary: &PipelineSummary, start_phase: Phase) {
    println!("Lead qualification run");
    if start_phase != Phase::Filter {
        println!(
            "Resumed from phase {} ({})",
            start_phase.number(),
            start_phase.label()
        );
    }
    println!("Loaded {} rows", summary.initial);

    if let Some(filter) = &summary.filter {
        println!("\nPhase 1: clean & filter");
        println!("- duplicates removed: {}", filter.removed_duplicates);
        println!("- intermediaries removed: {}", filter.removed_intermediary);
        println!("- wrong region removed: {}", filter.removed_wrong_region);
        println!(
            "- excluded sectors removed: {}",
            filter.removed_excluded_sector
        );
        println!(
            "- excluded titles removed: {}",
            filter.removed_excluded_title
        );
        println!(
            "- non-recruiter roles removed: {}",
            filter.removed_non_recruiter
        );
    }

    if let Some(tiers) = &summary.tiers {
        println!("\nPhase 2: tier scoring");
        println!(
            "- golden {}, silver {}, bronze {}, interim {}",
            tiers.golden, tiers.silver, tiers.bronze, tiers.interim
        );
    }

    if let Some(shortlist) = &summary.shortlist {
        println!("\nPhase 3: shortlist cut");
        println!("- {} -> {}", shortlist.before, shortlist.after);
    }

    if let Some(validation) = &summary.validation {
        println!("\nPhase 4: sector validation");
        println!(
            "- unknown sector flagged: {}",
            validation.flagged_unknown_sector
        );
        println!(
            "- possible intermediaries flagged: {}",
            validation.flagged_possible_intermediary
        );
    }

    if let Some(priorities) = &summary.priorities {
        println!("\nPhase 5: success scoring");
        println!(
            "- A {}, B {}, C {}, D {}",
            priorities.a, priorities.b, priorities.c, priorities.d
        );
    }

    if let Some(enrichment) = &summary.enrichment {
        println!("\nPhase 6: contact enrichment");
        println!(
            "- candidates {}, enriched {}, unmatched {}, failed {}",
            enrichment.candidates, enrichment.enriched, enrichment.unmatched, enrichment.failed
        );
        if let Some(finals) = &summary.final_priorities {
            println!(
                "- priorities after enrichment: A {}, B {}, C {}, D {}",
                finals.a, finals.b, finals.c, finals.d
            );
        }
    }

    if let Some(exported) = summary.exported {
        println!("\nPhase 7: contact store export");
        println!("- records exported: {exported}");
    }

    println!("\nSurvivors: {}", summary.survivors);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_argument_parses_the_full_range() {
        for number in 1..=7 {
            let phase = parse_phase(&number.to_string()).expect("valid phase");
            assert_eq!(phase.number(), number);
        }
        assert!(parse_phase("0").is_err());
        assert!(parse_phase("8").is_err());
        assert!(parse_phase("three").is_err());
    }

    #[test]
    fn cli_defaults_to_serve() {
        let cli = Cli::parse_from(["recruiter-automation"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn pipeline_run_arguments_parse() {
        let cli = Cli::parse_from([
            "recruiter-automation",
            "pipeline",
            "run",
            "--file",
            "leads.csv",
            "--start-phase",
            "5",
            "--max-shortlist",
            "50",
        ]);
        let Some(Command::Pipeline {
            command: PipelineCommand::Run(args),
        }) = cli.command
        else {
            panic!("expected pipeline run command");
        };
        assert_eq!(args.file, PathBuf::from("leads.csv"));
        assert_eq!(args.start_phase, Phase::Prioritize);
        assert_eq!(args.max_shortlist, Some(50));
        assert!(!args.confirm);
    }
}
