//! Threshold parsing and evaluation
//!
//! A threshold pairs a metric selector such as
//! `http_req_duration{name:Create}` with expressions such as `avg<600` or
//! `p(95)<500`. Selectors may filter on any number of tags; a sample matches
//! when it carries every listed tag with the same value.

use crate::error::{RunnerError, RunnerResult};
use crate::metrics::{self, MetricKind, MetricsRegistry, Tags};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    pub metric: String,
    pub tags: Tags,
}

impl FromStr for Selector {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| RunnerError::InvalidSelector {
            selector: s.to_string(),
            reason: reason.to_string(),
        };

        let s_trimmed = s.trim();
        let (metric, tags) = match s_trimmed.find('{') {
            None => (s_trimmed, Tags::new()),
            Some(open) => {
                let inner = s_trimmed[open + 1..]
                    .strip_suffix('}')
                    .ok_or_else(|| invalid("missing closing '}'"))?;

                let mut tags = Tags::new();
                for pair in inner.split(',').filter(|p| !p.trim().is_empty()) {
                    let (key, value) = pair
                        .split_once(':')
                        .ok_or_else(|| invalid("tag filters must look like key:value"))?;
                    let (key, value) = (key.trim(), value.trim());
                    if key.is_empty() || value.is_empty() {
                        return Err(invalid("tag filters must look like key:value"));
                    }
                    tags.insert(key.to_string(), value.to_string());
                }
                (&s_trimmed[..open], tags)
            }
        };

        let metric = metric.trim();
        if metric.is_empty() {
            return Err(invalid("metric name is empty"));
        }

        Ok(Self {
            metric: metric.to_string(),
            tags,
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.metric)?;
        if !self.tags.is_empty() {
            let tags: Vec<String> = self.tags.iter().map(|(k, v)| format!("{}:{}", k, v)).collect();
            write!(f, "{{{}}}", tags.join(","))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Avg,
    Min,
    Max,
    Med,
    Percentile(f64),
    Count,
    Rate,
}

impl Aggregation {
    fn supported_by(&self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Trend => !matches!(self, Aggregation::Count | Aggregation::Rate),
            MetricKind::Counter => matches!(self, Aggregation::Count | Aggregation::Rate),
            MetricKind::Rate => matches!(self, Aggregation::Rate),
        }
    }

    /// Aggregate `values`; counter rates are per second of `elapsed`
    pub fn apply(&self, kind: MetricKind, values: &[f64], elapsed: Duration) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        match (self, kind) {
            (Aggregation::Avg, _) => Some(values.iter().sum::<f64>() / values.len() as f64),
            (Aggregation::Min, _) => values.iter().copied().reduce(f64::min),
            (Aggregation::Max, _) => values.iter().copied().reduce(f64::max),
            (Aggregation::Med, _) => metrics::percentile(values, 50.0),
            (Aggregation::Percentile(p), _) => metrics::percentile(values, *p),
            (Aggregation::Count, _) => Some(values.iter().sum()),
            (Aggregation::Rate, MetricKind::Counter) => {
                let secs = elapsed.as_secs_f64();
                (secs > 0.0).then(|| values.iter().sum::<f64>() / secs)
            }
            (Aggregation::Rate, _) => metrics::rate(values),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Avg => write!(f, "avg"),
            Aggregation::Min => write!(f, "min"),
            Aggregation::Max => write!(f, "max"),
            Aggregation::Med => write!(f, "med"),
            Aggregation::Percentile(p) => write!(f, "p({})", p),
            Aggregation::Count => write!(f, "count"),
            Aggregation::Rate => write!(f, "rate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    // Two-character operators first so `<=` is not read as `<`
    const OPERATORS: [(&'static str, Comparison); 6] = [
        ("<=", Comparison::Le),
        (">=", Comparison::Ge),
        ("==", Comparison::Eq),
        ("!=", Comparison::Ne),
        ("<", Comparison::Lt),
        (">", Comparison::Gt),
    ];

    pub fn holds(&self, observed: f64, limit: f64) -> bool {
        match self {
            Comparison::Lt => observed < limit,
            Comparison::Le => observed <= limit,
            Comparison::Gt => observed > limit,
            Comparison::Ge => observed >= limit,
            Comparison::Eq => observed == limit,
            Comparison::Ne => observed != limit,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        }
    }
}

/// One assertion such as `p(95)<500`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub aggregation: Aggregation,
    pub comparison: Comparison,
    pub limit: f64,
}

impl FromStr for Expression {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| RunnerError::InvalidExpression {
            expression: s.to_string(),
            reason,
        };

        let (position, op, comparison) = Comparison::OPERATORS
            .iter()
            .filter_map(|(op, cmp)| s.find(op).map(|pos| (pos, *op, *cmp)))
            .min_by_key(|(pos, op, _)| (*pos, std::cmp::Reverse(op.len())))
            .ok_or_else(|| invalid("no comparison operator".to_string()))?;

        let aggregation = parse_aggregation(s[..position].trim()).map_err(invalid)?;
        let limit_str = s[position + op.len()..].trim();
        let limit: f64 = limit_str
            .parse()
            .map_err(|_| invalid(format!("'{}' is not a number", limit_str)))?;

        Ok(Self {
            aggregation,
            comparison,
            limit,
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.aggregation, self.comparison.as_str(), self.limit)
    }
}

fn parse_aggregation(s: &str) -> Result<Aggregation, String> {
    match s {
        "avg" => Ok(Aggregation::Avg),
        "min" => Ok(Aggregation::Min),
        "max" => Ok(Aggregation::Max),
        "med" => Ok(Aggregation::Med),
        "count" => Ok(Aggregation::Count),
        "rate" => Ok(Aggregation::Rate),
        other => {
            let p = other
                .strip_prefix("p(")
                .and_then(|rest| rest.strip_suffix(')'))
                .ok_or_else(|| format!("unknown aggregation '{}'", other))?;
            let p: f64 = p
                .trim()
                .parse()
                .map_err(|_| format!("percentile '{}' is not a number", p))?;
            if !(0.0..=100.0).contains(&p) {
                return Err(format!("percentile {} is outside 0..=100", p));
            }
            Ok(Aggregation::Percentile(p))
        }
    }
}

/// A selector with its ordered expressions
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub source: String,
    pub selector: Selector,
    pub kind: MetricKind,
    pub expressions: Vec<(String, Expression)>,
}

/// Outcome of one expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub selector: String,
    pub expression: String,
    /// `None` when no sample matched the selector
    pub observed: Option<f64>,
    pub passed: bool,
}

impl Threshold {
    pub fn parse(selector: &str, expressions: &[String]) -> RunnerResult<Self> {
        let parsed_selector: Selector = selector.parse()?;
        let kind = MetricKind::of(&parsed_selector.metric).ok_or_else(|| {
            RunnerError::InvalidSelector {
                selector: selector.to_string(),
                reason: format!("unknown metric '{}'", parsed_selector.metric),
            }
        })?;

        let mut parsed = Vec::with_capacity(expressions.len());
        for source in expressions {
            let expression: Expression = source.parse()?;
            if !expression.aggregation.supported_by(kind) {
                return Err(RunnerError::InvalidExpression {
                    expression: source.clone(),
                    reason: format!(
                        "'{}' does not apply to {:?} metric '{}'",
                        expression.aggregation, kind, parsed_selector.metric
                    ),
                });
            }
            parsed.push((source.clone(), expression));
        }

        Ok(Self {
            source: selector.to_string(),
            selector: parsed_selector,
            kind,
            expressions: parsed,
        })
    }

    /// Parse a whole `selector -> expressions` table
    pub fn parse_all(table: &BTreeMap<String, Vec<String>>) -> RunnerResult<Vec<Self>> {
        table
            .iter()
            .map(|(selector, expressions)| Self::parse(selector, expressions))
            .collect()
    }

    pub fn evaluate_values(&self, values: &[f64], elapsed: Duration) -> Vec<ThresholdResult> {
        self.expressions
            .iter()
            .map(|(source, expression)| {
                let observed = expression.aggregation.apply(self.kind, values, elapsed);
                // Without data there is nothing to fail on
                let passed = observed
                    .map(|value| expression.comparison.holds(value, expression.limit))
                    .unwrap_or(true);
                ThresholdResult {
                    selector: self.source.clone(),
                    expression: source.clone(),
                    observed,
                    passed,
                }
            })
            .collect()
    }

    pub fn evaluate(&self, registry: &MetricsRegistry, elapsed: Duration) -> Vec<ThresholdResult> {
        let values = registry.values(&self.selector.metric, &self.selector.tags);
        self.evaluate_values(&values, elapsed)
    }
}
