//! Drives a whole load test: authenticate once, then run every virtual user
//! until the deadline.
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::auth::{AuthToken, authenticate};
use crate::config::{ProjectConfig, ScenarioKind};
use crate::error::{AppError, AppResult, HttpError};
use crate::http::{ExecutionClient, HttpTransport};
use crate::metrics::{EndpointMetrics, MetricsCollector, SummaryMetrics};
use crate::scenario::{
    FlowOutcome, FlowScenario, SimpleScenario, run_flow_scenario, run_simple_scenario,
};
use crate::shutdown::{ShutdownReceiver, ShutdownSender, shutdown_channel};

/// The scenario every virtual user repeats, shared read-only.
#[derive(Debug, Clone)]
pub enum Workload {
    Simple(Arc<SimpleScenario>),
    Flow(Arc<FlowScenario>),
}

impl Workload {
    #[must_use]
    pub fn from_project(project: &ProjectConfig, kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Simple => Workload::Simple(Arc::new(project.simple_scenario())),
            ScenarioKind::Flow => Workload::Flow(Arc::new(project.flow_scenario())),
        }
    }

    async fn run_iteration(&self, client: &mut ExecutionClient) -> Result<(), HttpError> {
        match self {
            Workload::Simple(scenario) => run_simple_scenario(client, scenario).await,
            Workload::Flow(scenario) => {
                if let FlowOutcome::Stopped { step } = run_flow_scenario(client, scenario).await? {
                    debug!("Iteration ended early at {}", step);
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub summary: SummaryMetrics,
    pub endpoints: Vec<EndpointMetrics>,
    /// Iterations cut short because a call got no response.
    pub transport_failures: u64,
    pub iterations: u64,
}

#[derive(Debug, Default)]
struct RunCounters {
    iterations: AtomicU64,
    transport_failures: AtomicU64,
}

pub struct LoadRunner {
    project: Arc<ProjectConfig>,
    transport: Arc<dyn HttpTransport>,
    metrics: Arc<MetricsCollector>,
    shutdown_tx: ShutdownSender,
}

impl LoadRunner {
    #[must_use]
    pub fn new(project: ProjectConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let (shutdown_tx, _) = shutdown_channel();
        Self {
            project: Arc::new(project),
            transport,
            metrics: Arc::new(MetricsCollector::new()),
            shutdown_tx,
        }
    }

    #[must_use]
    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    #[must_use]
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// A sender that ends the current run early when signalled.
    #[must_use]
    pub fn shutdown_sender(&self) -> ShutdownSender {
        self.shutdown_tx.clone()
    }

    /// Runs the project's authentication and parses the resulting token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` when authentication fails and
    /// `AppError::Config` when the token is malformed.
    pub async fn authenticate(&self) -> AppResult<Option<AuthToken>> {
        let result = authenticate(
            &self.project.auth,
            &self.project.base_url,
            self.transport.as_ref(),
        )
        .await;
        result
            .into_token()?
            .map(|raw| raw.parse::<AuthToken>())
            .transpose()
            .map_err(AppError::config)
    }

    /// Authenticates, then runs `virtual_users` tasks until the load
    /// duration elapses or a shutdown is signalled.
    ///
    /// # Errors
    ///
    /// Returns an error when authentication fails, before any virtual user
    /// starts, or when a virtual user task panics.
    pub async fn run(&self, kind: ScenarioKind) -> AppResult<RunReport> {
        let load = self.project.load;
        let token = self.authenticate().await?;

        self.metrics.reset();
        let workload = Workload::from_project(&self.project, kind);
        let counters = Arc::new(RunCounters::default());
        let mut deadline_rx = self.shutdown_tx.subscribe();

        info!(
            "Starting {} virtual users for {:?} ({:?} scenario)",
            load.virtual_users, load.duration, kind
        );
        let mut handles = Vec::with_capacity(load.virtual_users);
        for user in 0..load.virtual_users {
            let mut client = ExecutionClient::new(
                self.project.base_url.clone(),
                Arc::clone(&self.transport),
                Arc::clone(&self.metrics),
            );
            if let Some(token) = &token {
                client.set_auth_token(token.clone());
            }
            let virtual_user = VirtualUser {
                id: user,
                client,
                workload: workload.clone(),
                shutdown_rx: self.shutdown_tx.subscribe(),
                counters: Arc::clone(&counters),
            };
            handles.push(tokio::spawn(virtual_user.run()));
        }

        tokio::select! {
            () = sleep(load.duration) => {}
            _ = deadline_rx.recv() => info!("Shutdown requested, stopping early"),
        }
        drop(self.shutdown_tx.send(()));

        for handle in handles {
            handle.await?;
        }

        let report = RunReport {
            summary: self.metrics.summary(),
            endpoints: self.metrics.endpoint_breakdown(),
            transport_failures: counters.transport_failures.load(Ordering::Relaxed),
            iterations: counters.iterations.load(Ordering::Relaxed),
        };
        info!(
            "Finished: {} requests, {} iterations, {} transport failures",
            report.summary.requests, report.iterations, report.transport_failures
        );
        Ok(report)
    }
}

/// One sequential execution unit. Its context is private and cleared at the
/// start of every iteration.
struct VirtualUser {
    id: usize,
    client: ExecutionClient,
    workload: Workload,
    shutdown_rx: ShutdownReceiver,
    counters: Arc<RunCounters>,
}

impl VirtualUser {
    async fn run(mut self) {
        loop {
            self.client.reset_context();
            tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => break,
                result = self.workload.run_iteration(&mut self.client) => match result {
                    Ok(()) => {
                        self.counters.iterations.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        self.counters
                            .transport_failures
                            .fetch_add(1, Ordering::Relaxed);
                        warn!("VU {}: iteration aborted: {}", self.id, err);
                    }
                },
            }
            tokio::task::yield_now().await;
        }
        debug!("VU {} stopped", self.id);
    }
}
