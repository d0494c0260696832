//! Load execution for crocload
//!
//! A small harness: it runs a [`Scenario`]'s setup exactly once,
//! fans iterations out over a pool of virtual users that follows a
//! [`RampSchedule`], records tagged samples and check outcomes, and finally
//! evaluates thresholds into a [`RunSummary`].

pub mod checks;
pub mod context;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod stages;
pub mod summary;
pub mod thresholds;

pub use checks::{CheckRegistry, CheckResult};
pub use context::VuContext;
pub use error::{RunnerError, RunnerResult};
pub use executor::{Executor, ExecutorOptions, Scenario};
pub use metrics::{MetricKind, MetricsRegistry, Sample, TrendStats};
pub use stages::RampSchedule;
pub use summary::{MetricSummary, RunSummary};
pub use thresholds::{Aggregation, Comparison, Expression, Selector, Threshold, ThresholdResult};
