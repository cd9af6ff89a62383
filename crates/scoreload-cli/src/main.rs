use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use opentelemetry_otlp::WithExportConfig;
use scoreload_common::config::LoadConfig;
use scoreload_common::duration::parse_duration;
use scoreload_core::interrupt::{watch_interrupts, FORCED_EXIT_CODE};
use scoreload_stub::{app, StubConfig};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "scoreload", version, about = "Load driver for the /v1/score endpoint")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive load against a scoring endpoint
    Run(RunArgs),
    /// Serve a local stand-in scoring endpoint
    ServeStub(StubArgs),
    Version,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long)]
    url: Option<String>,
    /// Concurrent virtual users
    #[arg(long)]
    vus: Option<usize>,
    /// Run duration, e.g. 20s or 1m30s
    #[arg(short, long, value_parser = duration_arg)]
    duration: Option<Duration>,
    /// Think time after each iteration
    #[arg(long, value_parser = duration_arg)]
    sleep: Option<Duration>,
    #[arg(long, value_parser = duration_arg)]
    timeout: Option<Duration>,
    /// Iterations per virtual user
    #[arg(short = 'i', long)]
    iterations: Option<u64>,
    /// Write Prometheus text metrics here once the run ends
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

impl RunArgs {
    fn apply(&self, cfg: &mut LoadConfig) {
        if let Some(url) = &self.url { cfg.url = url.clone(); }
        if let Some(v) = self.vus { cfg.vus = v; }
        if let Some(v) = self.duration { cfg.duration = v; }
        if let Some(v) = self.sleep { cfg.sleep = v; }
        if let Some(v) = self.timeout { cfg.timeout = v; }
        if let Some(v) = self.iterations { cfg.iterations = Some(v); }
    }
}

#[derive(Args, Debug)]
struct StubArgs {
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    /// Model probability the stub reports for every fresh request
    #[arg(long, default_value_t = 0.7)]
    prob_trade: f64,
    #[arg(long, default_value_t = 2.0)]
    spread_bps: f64,
}

fn duration_arg(text: &str) -> Result<Duration, String> {
    parse_duration(text).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_load(args).await,
        Commands::ServeStub(args) => serve_stub(args).await,
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn run_load(args: RunArgs) -> anyhow::Result<()> {
    let mut cfg = LoadConfig::load().context("loading run configuration")?;
    args.apply(&mut cfg);
    cfg.validate()?;

    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    tokio::spawn(async move {
        if watch_interrupts(&flag, || async { tokio::signal::ctrl_c().await.is_ok() }).await {
            std::process::exit(FORCED_EXIT_CODE);
        }
    });

    let summary = scoreload_core::run(&cfg, stop).await?;
    println!("{}", summary);

    if let Some(path) = args.metrics_out {
        scoreload_obs::write_to(&path)
            .with_context(|| format!("writing metrics to {}", path.display()))?;
    }
    Ok(())
}

async fn serve_stub(args: StubArgs) -> anyhow::Result<()> {
    let cfg = StubConfig { prob_trade: args.prob_trade, spread_bps: args.spread_bps };
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("binding port {}", args.port))?;
    tracing::info!("stub scoring endpoint on http://0.0.0.0:{}/v1/score", args.port);
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
    };
    axum::serve(listener, app(cfg))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );

    if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
            .install_simple()
            .ok();
        if let Some(tracer) = tracer {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .with(OpenTelemetryLayer::new(tracer))
                .init();
            return;
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
