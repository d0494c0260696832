//! Ramping virtual-user executor
//!
//! Setup runs once on VU 0. A controller then ticks over the
//! [`RampSchedule`], spawning one tokio task per virtual user and retiring
//! the newest ones when the target drops. A retired VU finishes its current
//! iteration within `graceful_ramp_down`; once the last stage ends every VU
//! gets `graceful_stop` before being aborted.

use crate::checks::CheckRegistry;
use crate::context::VuContext;
use crate::error::{RunnerError, RunnerResult};
use crate::metrics::{MetricsRegistry, Sample, Tags, ITERATIONS, ITERATION_DURATION};
use crate::stages::RampSchedule;
use crate::summary::RunSummary;
use crate::thresholds::Threshold;
use async_trait::async_trait;
use chrono::Utc;
use crocload_config::{CloudConfig, LoadConfig};
use crocload_http::HttpClient;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// A load scenario: one setup, then many iterations sharing its data
#[async_trait]
pub trait Scenario: Send + Sync + 'static {
    /// Value produced by setup and shared read-only by every iteration
    type Data: Send + Sync + 'static;

    async fn setup(&self, ctx: &VuContext) -> anyhow::Result<Self::Data>;

    async fn iteration(&self, ctx: &VuContext, data: &Self::Data) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub schedule: RampSchedule,
    pub graceful_ramp_down: Duration,
    pub graceful_stop: Duration,
    /// How often the controller re-reads the schedule
    pub tick: Duration,
    pub thresholds: BTreeMap<String, Vec<String>>,
    pub cloud: CloudConfig,
}

impl ExecutorOptions {
    pub fn from_config(config: &LoadConfig) -> Self {
        Self {
            schedule: RampSchedule::from_config(config),
            graceful_ramp_down: config.graceful_ramp_down,
            graceful_stop: config.graceful_stop,
            tick: Duration::from_millis(100),
            thresholds: config.thresholds.clone(),
            cloud: config.cloud.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct RunCounters {
    iterations: AtomicU64,
    interrupted: AtomicU64,
}

struct VuHandle {
    id: u32,
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl VuHandle {
    fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

pub struct Executor<S: Scenario> {
    scenario: Arc<S>,
    client: Arc<dyn HttpClient>,
    options: ExecutorOptions,
    thresholds: Vec<Threshold>,
}

impl<S: Scenario> Executor<S> {
    /// Fails when a threshold cannot be parsed, before anything is sent
    pub fn new(
        scenario: S,
        client: Arc<dyn HttpClient>,
        options: ExecutorOptions,
    ) -> RunnerResult<Self> {
        let thresholds = Threshold::parse_all(&options.thresholds)?;
        Ok(Self {
            scenario: Arc::new(scenario),
            client,
            options,
            thresholds,
        })
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Run the whole schedule
    pub async fn run(&self) -> RunnerResult<RunSummary> {
        self.run_until(std::future::pending()).await
    }

    /// Run the schedule, winding down early once `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> RunnerResult<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let started_at = Utc::now();
        let metrics = Arc::new(MetricsRegistry::new());
        let checks = Arc::new(CheckRegistry::new());
        let counters = Arc::new(RunCounters::default());

        info!(
            "Starting '{}': {} stages over {:?}, up to {} VUs",
            self.options.cloud.name,
            self.options.schedule.stages_len(),
            self.options.schedule.total_duration(),
            self.options.schedule.max_vus()
        );

        let setup_ctx = VuContext::new(0, self.client.clone(), metrics.clone(), checks.clone());
        let data = Arc::new(
            self.scenario
                .setup(&setup_ctx)
                .await
                .map_err(RunnerError::Setup)?,
        );
        debug!("Setup complete");

        let run_start = Instant::now();
        let total = self.options.schedule.total_duration();
        let mut active: Vec<VuHandle> = Vec::new();
        let mut retiring: Vec<(VuHandle, Instant)> = Vec::new();
        let mut next_id: u32 = 1;
        let mut vus_max: u32 = 0;
        let mut stopped_early = false;

        let mut ticker = tokio::time::interval(self.options.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => {
                    warn!("Stop requested, winding down");
                    stopped_early = true;
                    break;
                }
            }

            let elapsed = run_start.elapsed();
            if elapsed >= total {
                break;
            }

            let target = self.options.schedule.target_at(elapsed) as usize;
            while active.len() < target {
                let ctx = VuContext::new(next_id, self.client.clone(), metrics.clone(), checks.clone());
                active.push(self.spawn_vu(ctx, data.clone(), counters.clone()));
                next_id += 1;
            }
            while active.len() > target {
                if let Some(vu) = active.pop() {
                    debug!(vu = vu.id, "Retiring VU");
                    vu.request_stop();
                    retiring.push((vu, Instant::now() + self.options.graceful_ramp_down));
                }
            }
            vus_max = vus_max.max(active.len() as u32);

            let now = Instant::now();
            retiring.retain(|(vu, deadline)| {
                if vu.task.is_finished() {
                    return false;
                }
                if now >= *deadline {
                    warn!(vu = vu.id, "VU exceeded graceful ramp-down, aborting");
                    vu.task.abort();
                    counters.interrupted.fetch_add(1, Ordering::Relaxed);
                    return false;
                }
                true
            });
        }

        let stop_deadline = Instant::now() + self.options.graceful_stop;
        let draining = active
            .into_iter()
            .map(|vu| (vu, stop_deadline))
            .chain(
                retiring
                    .into_iter()
                    .map(|(vu, deadline)| (vu, deadline.min(stop_deadline))),
            );
        for (mut vu, deadline) in draining {
            vu.request_stop();
            if tokio::time::timeout_at(deadline, &mut vu.task).await.is_err() {
                warn!(vu = vu.id, "VU still busy after graceful stop, aborting");
                vu.task.abort();
                counters.interrupted.fetch_add(1, Ordering::Relaxed);
            }
        }

        let duration = run_start.elapsed();
        let threshold_results = self
            .thresholds
            .iter()
            .flat_map(|t| t.evaluate(&metrics, duration))
            .collect();

        let summary = RunSummary {
            name: self.options.cloud.name.clone(),
            project_id: self.options.cloud.project_id,
            distribution: self.options.cloud.distribution.clone(),
            started_at,
            duration,
            vus_max,
            iterations: counters.iterations.load(Ordering::Relaxed),
            iterations_interrupted: counters.interrupted.load(Ordering::Relaxed),
            stopped_early,
            metrics: RunSummary::collect_metrics(&metrics, duration),
            checks: checks.snapshot(),
            thresholds: threshold_results,
        };

        info!(
            "Finished after {:.1}s: {} iterations, {} interrupted, thresholds {}",
            duration.as_secs_f64(),
            summary.iterations,
            summary.iterations_interrupted,
            if summary.thresholds_passed() { "passed" } else { "failed" }
        );
        Ok(summary)
    }

    fn spawn_vu(
        &self,
        ctx: VuContext,
        data: Arc<S::Data>,
        counters: Arc<RunCounters>,
    ) -> VuHandle {
        let id = ctx.vu_id();
        let stop = Arc::new(AtomicBool::new(false));
        let scenario = self.scenario.clone();
        let task = tokio::spawn(vu_loop(scenario, ctx, data, stop.clone(), counters));
        debug!(vu = id, "Spawned VU");
        VuHandle { id, stop, task }
    }
}

async fn vu_loop<S: Scenario>(
    scenario: Arc<S>,
    ctx: VuContext,
    data: Arc<S::Data>,
    stop: Arc<AtomicBool>,
    counters: Arc<RunCounters>,
) {
    let mut iteration: u64 = 0;
    while !stop.load(Ordering::Relaxed) {
        let iteration_ctx = ctx.clone().with_iteration(iteration);
        let started = Instant::now();
        match scenario.iteration(&iteration_ctx, &data).await {
            Ok(()) => {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                counters.iterations.fetch_add(1, Ordering::Relaxed);
                ctx.metrics().add_all([
                    Sample::new(ITERATIONS, 1.0, Tags::new()),
                    Sample::new(ITERATION_DURATION, elapsed_ms, Tags::new()),
                ]);
            }
            Err(e) => {
                warn!(vu = ctx.vu_id(), iteration, "Iteration aborted: {:#}", e);
                counters.interrupted.fetch_add(1, Ordering::Relaxed);
                // A failing iteration may never reach an await point
                tokio::task::yield_now().await;
            }
        }
        iteration += 1;
    }
}
