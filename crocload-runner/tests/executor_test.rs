use async_trait::async_trait;
use crocload_config::{LoadConfig, Stage};
use crocload_http::{HttpClient, HttpManager, HttpMethod, HttpRequest, MockResponse};
use crocload_runner::metrics::{Tags, HTTP_REQ_DURATION, ITERATIONS};
use crocload_runner::{Executor, ExecutorOptions, RunnerError, Sample, Scenario, VuContext};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const LOGIN_URL: &str = "http://localhost/auth/token/login/";

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn options(stages: Vec<Stage>) -> ExecutorOptions {
    let load = LoadConfig {
        start_vus: 0,
        stages,
        thresholds: BTreeMap::new(),
        graceful_ramp_down: secs(30),
        graceful_stop: secs(30),
        ..LoadConfig::default()
    };
    ExecutorOptions::from_config(&load)
}

fn client() -> Arc<dyn HttpClient> {
    let mut manager = HttpManager::offline();
    manager.add_mock(
        HttpMethod::Post,
        LOGIN_URL,
        MockResponse::json(200, &json!({"access": "token-1"})),
    );
    Arc::new(manager)
}

#[derive(Default)]
struct Recorder {
    setups: AtomicUsize,
    iterations: AtomicUsize,
    tokens: Mutex<HashSet<String>>,
    vus: Mutex<HashSet<u32>>,
}

/// Logs in once, then paces iterations at one per second
struct TokenScenario {
    recorder: Arc<Recorder>,
    iteration_sleep: Duration,
    fail_odd_iterations: bool,
}

impl TokenScenario {
    fn new(recorder: Arc<Recorder>) -> Self {
        Self {
            recorder,
            iteration_sleep: secs(1),
            fail_odd_iterations: false,
        }
    }
}

#[async_trait]
impl Scenario for TokenScenario {
    type Data = String;

    async fn setup(&self, ctx: &VuContext) -> anyhow::Result<String> {
        self.recorder.setups.fetch_add(1, Ordering::SeqCst);
        let res = ctx.request(HttpRequest::post(LOGIN_URL)).await?;
        let token = res
            .json_field("access")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        ctx.check("Logged in successfully", !token.is_empty());
        Ok(token)
    }

    async fn iteration(&self, ctx: &VuContext, token: &String) -> anyhow::Result<()> {
        self.recorder.iterations.fetch_add(1, Ordering::SeqCst);
        self.recorder.tokens.lock().insert(token.clone());
        self.recorder.vus.lock().insert(ctx.vu_id());
        ctx.sleep(self.iteration_sleep).await;
        if self.fail_odd_iterations && ctx.iteration() % 2 == 1 {
            anyhow::bail!("odd iteration");
        }
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_setup_runs_once_and_token_is_shared() {
    let recorder = Arc::new(Recorder::default());
    let executor = Executor::new(
        TokenScenario::new(recorder.clone()),
        client(),
        options(vec![Stage::new(secs(10), 5), Stage::new(secs(5), 0)]),
    )
    .unwrap();

    let summary = executor.run().await.unwrap();

    assert_eq!(recorder.setups.load(Ordering::SeqCst), 1);
    assert_eq!(
        recorder.tokens.lock().iter().cloned().collect::<Vec<_>>(),
        vec!["token-1".to_string()]
    );
    assert!(!recorder.vus.lock().contains(&0));
    assert_eq!(summary.vus_max, 5);
    assert!(summary.iterations > 10);
    assert_eq!(summary.iterations as usize, recorder.iterations.load(Ordering::SeqCst));
    assert_eq!(summary.iterations_interrupted, 0);
    assert!(!summary.stopped_early);
    assert!(summary.metrics.contains_key(ITERATIONS));

    let login = summary
        .checks
        .iter()
        .find(|c| c.name == "Logged in successfully")
        .unwrap();
    assert_eq!((login.passes, login.fails), (1, 0));
}

#[tokio::test(start_paused = true)]
async fn test_setup_failure_aborts_the_run() {
    let recorder = Arc::new(Recorder::default());
    let executor = Executor::new(
        TokenScenario::new(recorder.clone()),
        Arc::new(HttpManager::offline()),
        options(vec![Stage::new(secs(10), 5)]),
    )
    .unwrap();

    let result = executor.run().await;
    assert!(matches!(result, Err(RunnerError::Setup(_))));
    assert_eq!(recorder.iterations.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_iteration_errors_are_counted_and_vu_continues() {
    let recorder = Arc::new(Recorder::default());
    let scenario = TokenScenario {
        fail_odd_iterations: true,
        ..TokenScenario::new(recorder.clone())
    };
    let executor = Executor::new(scenario, client(), options(vec![Stage::new(secs(10), 1)])).unwrap();

    let summary = executor.run().await.unwrap();
    assert!(summary.iterations >= 3);
    assert!(summary.iterations_interrupted >= 3);
    assert_eq!(
        (summary.iterations + summary.iterations_interrupted) as usize,
        recorder.iterations.load(Ordering::SeqCst)
    );
}

#[tokio::test(start_paused = true)]
async fn test_stragglers_are_aborted_after_graceful_stop() {
    let recorder = Arc::new(Recorder::default());
    let scenario = TokenScenario {
        iteration_sleep: secs(600),
        ..TokenScenario::new(recorder.clone())
    };
    let mut opts = options(vec![Stage::new(Duration::ZERO, 2), Stage::new(secs(5), 2)]);
    opts.graceful_stop = secs(2);
    let executor = Executor::new(scenario, client(), opts).unwrap();

    let summary = executor.run().await.unwrap();
    assert_eq!(summary.iterations, 0);
    assert_eq!(summary.iterations_interrupted, 2);
    assert!(summary.duration < secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_signal_stops_early() {
    let recorder = Arc::new(Recorder::default());
    let executor = Executor::new(
        TokenScenario::new(recorder.clone()),
        client(),
        options(vec![Stage::new(Duration::ZERO, 3), Stage::new(secs(600), 3)]),
    )
    .unwrap();

    let summary = executor
        .run_until(tokio::time::sleep(secs(3)))
        .await
        .unwrap();
    assert!(summary.stopped_early);
    assert!(summary.duration < secs(10));
    assert!(summary.iterations > 0);
}

/// Feeds fixed request durations so thresholds have data to judge
struct FixedLatencyScenario {
    create_durations: Vec<f64>,
}

#[async_trait]
impl Scenario for FixedLatencyScenario {
    type Data = ();

    async fn setup(&self, ctx: &VuContext) -> anyhow::Result<()> {
        let mut tags = Tags::new();
        tags.insert("name".to_string(), "Create".to_string());
        ctx.metrics().add_all(
            self.create_durations
                .iter()
                .map(|d| Sample::new(HTTP_REQ_DURATION, *d, tags.clone())),
        );
        Ok(())
    }

    async fn iteration(&self, ctx: &VuContext, _: &()) -> anyhow::Result<()> {
        ctx.sleep(secs(1)).await;
        Ok(())
    }
}

fn create_threshold_options() -> ExecutorOptions {
    let mut opts = options(vec![Stage::new(secs(3), 1)]);
    opts.thresholds.insert(
        "http_req_duration{name:Create}".to_string(),
        vec!["avg<600".to_string(), "max<1000".to_string()],
    );
    opts
}

#[tokio::test(start_paused = true)]
async fn test_create_thresholds_pass() {
    let scenario = FixedLatencyScenario {
        create_durations: vec![200.0, 550.0, 900.0],
    };
    let summary = Executor::new(scenario, client(), create_threshold_options())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.thresholds.len(), 2);
    assert!(summary.thresholds_passed());
}

#[tokio::test(start_paused = true)]
async fn test_create_threshold_fails_on_slow_max() {
    let scenario = FixedLatencyScenario {
        create_durations: vec![100.0, 100.0, 100.0, 100.0, 1100.0],
    };
    let summary = Executor::new(scenario, client(), create_threshold_options())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(!summary.thresholds_passed());
    let failed: Vec<_> = summary.failed_thresholds().map(|t| t.expression.as_str()).collect();
    assert_eq!(failed, vec!["max<1000"]);
}

#[test]
fn test_invalid_threshold_is_rejected_up_front() {
    let mut opts = options(vec![Stage::new(secs(3), 1)]);
    opts.thresholds
        .insert("http_req_duration".to_string(), vec!["p95<500".to_string()]);
    let result = Executor::new(
        FixedLatencyScenario {
            create_durations: vec![],
        },
        client(),
        opts,
    );
    assert!(matches!(result, Err(RunnerError::InvalidExpression { .. })));
}
