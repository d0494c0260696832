//! Per-VU execution context handed to scenarios

use crate::checks::CheckRegistry;
use crate::metrics::{MetricsRegistry, Sample, Tags, CHECKS, HTTP_REQS, HTTP_REQ_DURATION, HTTP_REQ_FAILED};
use crocload_http::{HttpClient, HttpError, HttpRequest, HttpResponse, NAME_TAG};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const GROUP_TAG: &str = "group";
pub const METHOD_TAG: &str = "method";
pub const STATUS_TAG: &str = "status";

const GROUP_SEPARATOR: &str = "::";

/// Handle through which a scenario issues requests and records checks.
///
/// Cloning is cheap: the client and both registries are shared.
#[derive(Clone)]
pub struct VuContext {
    vu_id: u32,
    iteration: u64,
    group: String,
    client: Arc<dyn HttpClient>,
    metrics: Arc<MetricsRegistry>,
    checks: Arc<CheckRegistry>,
}

impl std::fmt::Debug for VuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VuContext")
            .field("vu_id", &self.vu_id)
            .field("iteration", &self.iteration)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

impl VuContext {
    pub fn new(
        vu_id: u32,
        client: Arc<dyn HttpClient>,
        metrics: Arc<MetricsRegistry>,
        checks: Arc<CheckRegistry>,
    ) -> Self {
        Self {
            vu_id,
            iteration: 0,
            group: String::new(),
            client,
            metrics,
            checks,
        }
    }

    pub fn with_iteration(mut self, iteration: u64) -> Self {
        self.iteration = iteration;
        self
    }

    /// 0 for setup, 1.. for virtual users
    pub fn vu_id(&self) -> u32 {
        self.vu_id
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Current group path, `""` at the top level
    pub fn group_path(&self) -> &str {
        &self.group
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn checks(&self) -> &Arc<CheckRegistry> {
        &self.checks
    }

    /// Child context whose requests and checks are tagged with `name`
    pub fn group(&self, name: &str) -> VuContext {
        let mut child = self.clone();
        child.group = format!("{}{}{}", self.group, GROUP_SEPARATOR, name);
        child
    }

    /// Send one request and record its metrics
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let tags = self.request_tags(&request);
        let result = self.client.send(request).await;
        self.record_request(tags, &result);
        result
    }

    /// Send requests concurrently; results keep the input order
    pub async fn batch(&self, requests: Vec<HttpRequest>) -> Vec<Result<HttpResponse, HttpError>> {
        let tags: Vec<Tags> = requests.iter().map(|r| self.request_tags(r)).collect();
        let results = self.client.batch(requests).await;
        for (tags, result) in tags.into_iter().zip(&results) {
            self.record_request(tags, result);
        }
        results
    }

    /// Record a non-fatal assertion and hand back its outcome
    pub fn check(&self, name: &str, passed: bool) -> bool {
        self.checks.record(&self.group, name, passed);

        let mut tags = Tags::new();
        tags.insert("check".to_string(), name.to_string());
        tags.insert(GROUP_TAG.to_string(), self.group.clone());
        self.metrics
            .add(Sample::new(CHECKS, if passed { 1.0 } else { 0.0 }, tags));

        if !passed {
            debug!(vu = self.vu_id, group = %self.group, "Check failed: {}", name);
        }
        passed
    }

    pub async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn request_tags(&self, request: &HttpRequest) -> Tags {
        let mut tags = request.tags.clone();
        tags.insert(NAME_TAG.to_string(), request.name().to_string());
        tags.insert(METHOD_TAG.to_string(), request.method.to_string());
        tags.insert(GROUP_TAG.to_string(), self.group.clone());
        tags
    }

    fn record_request(&self, mut tags: Tags, result: &Result<HttpResponse, HttpError>) {
        let mut samples = Vec::with_capacity(3);
        let failed = match result {
            Ok(response) => {
                tags.insert(STATUS_TAG.to_string(), response.status.to_string());
                samples.push(Sample::new(
                    HTTP_REQ_DURATION,
                    response.duration.as_secs_f64() * 1000.0,
                    tags.clone(),
                ));
                !(200..400).contains(&response.status)
            }
            Err(e) => {
                warn!(vu = self.vu_id, "Request {} failed: {}", tags[NAME_TAG], e);
                tags.insert(STATUS_TAG.to_string(), "0".to_string());
                true
            }
        };

        samples.push(Sample::new(HTTP_REQS, 1.0, tags.clone()));
        samples.push(Sample::new(HTTP_REQ_FAILED, if failed { 1.0 } else { 0.0 }, tags));
        self.metrics.add_all(samples);
    }
}
