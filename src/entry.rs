use std::sync::Arc;

use clap::Parser;
use tracing::info;

use loadflow::config::{ProjectConfig, load_config};
use loadflow::error::{AppError, AppResult};
use loadflow::http::ReqwestTransport;
use loadflow::runner::{LoadRunner, RunReport};
use loadflow::shutdown::setup_signal_shutdown_handler;

use crate::args::CliArgs;

pub(crate) fn run() -> AppResult<()> {
    let args = CliArgs::parse();
    crate::logger::init_logging(args.verbose, args.no_color);

    let file = load_config(args.config.as_deref())?;
    let mut project = ProjectConfig::try_from(file).map_err(AppError::config)?;
    args.apply_overrides(&mut project.load);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(project))
}

async fn run_async(project: ProjectConfig) -> AppResult<()> {
    info!("Project '{}' against {}", project.name, project.base_url);
    let transport = Arc::new(ReqwestTransport::new(project.load.timeout)?);
    let scenario = project.load.scenario;
    let runner = LoadRunner::new(project, transport);

    let signal_handle = setup_signal_shutdown_handler(&runner.shutdown_sender());
    let report = runner.run(scenario).await;
    signal_handle.abort();

    log_report(&report?);
    Ok(())
}

fn log_report(report: &RunReport) {
    let summary = &report.summary;
    info!(
        "Requests: {}  RPS: {}  Errors: {}%  Avg: {}ms  P95: {}ms  P99: {}ms",
        summary.requests,
        summary.rps(),
        summary.error_rate(),
        summary.avg_latency_ms,
        summary.p95_latency_ms,
        summary.p99_latency_ms
    );
    for endpoint in &report.endpoints {
        info!(
            "  {} {}: {} requests, {}% errors, avg {}ms, p95 {}ms",
            endpoint.method,
            endpoint.name,
            endpoint.requests,
            endpoint.error_rate(),
            endpoint.avg_latency_ms,
            endpoint.p95_latency_ms
        );
    }
    if report.transport_failures > 0 {
        info!(
            "{} iterations ended without a response",
            report.transport_failures
        );
    }
}
