//! OTLP/JSON rendering of a metrics snapshot.
//!
//! Produces the `resourceMetrics` document accepted by OTLP HTTP receivers.
//! Counters are cumulative monotonic sums; `active_users`, the factory
//! latency and host usage are gauges. Every data point carries a `source`
//! attribute.

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::MetricsSnapshot;

const CUMULATIVE: &str = "AGGREGATION_TEMPORALITY_CUMULATIVE";

/// Top-level OTLP/JSON document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub resource_metrics: Vec<ResourceMetrics>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetrics {
    pub scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Debug, Serialize)]
pub struct ScopeMetrics {
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Serialize)]
pub struct Metric {
    pub name: String,
    pub unit: &'static str,
    #[serde(flatten)]
    pub data: MetricData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricData {
    Sum(Sum),
    Gauge(Gauge),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sum {
    pub data_points: Vec<DataPoint>,
    pub aggregation_temporality: &'static str,
    pub is_monotonic: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    pub data_points: Vec<DataPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_double: Option<f64>,
    pub time_unix_nano: u64,
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnyValue {
    pub string_value: String,
}

/// Value of a data point.
#[derive(Debug, Clone, Copy)]
enum Value {
    Int(i64),
    Double(f64),
}

struct Builder<'a> {
    source: &'a str,
    time_unix_nano: u64,
    metrics: Vec<Metric>,
}

impl Builder<'_> {
    fn point(&self, value: Value, attributes: &[(&str, &str)]) -> DataPoint {
        let (as_int, as_double) = match value {
            Value::Int(v) => (Some(v), None),
            Value::Double(v) => (None, Some(v)),
        };
        let attributes = attributes
            .iter()
            .copied()
            .chain(std::iter::once(("source", self.source)))
            .map(|(key, value)| KeyValue {
                key: key.to_string(),
                value: AnyValue {
                    string_value: value.to_string(),
                },
            })
            .collect();

        DataPoint {
            as_int,
            as_double,
            time_unix_nano: self.time_unix_nano,
            attributes,
        }
    }

    fn sum(&mut self, name: &str, unit: &'static str, value: Value, attributes: &[(&str, &str)]) {
        let point = self.point(value, attributes);
        self.metrics.push(Metric {
            name: name.to_string(),
            unit,
            data: MetricData::Sum(Sum {
                data_points: vec![point],
                aggregation_temporality: CUMULATIVE,
                is_monotonic: true,
            }),
        });
    }

    fn gauge(&mut self, name: &str, unit: &'static str, value: Value) {
        let point = self.point(value, &[]);
        self.metrics.push(Metric {
            name: name.to_string(),
            unit,
            data: MetricData::Gauge(Gauge {
                data_points: vec![point],
            }),
        });
    }
}

fn count(value: u64) -> Value {
    Value::Int(i64::try_from(value).unwrap_or(i64::MAX))
}

/// Render `snapshot` as an OTLP/JSON document.
#[must_use]
pub fn build_payload(snapshot: &MetricsSnapshot, source: &str, time_unix_nano: u64) -> Payload {
    let mut builder = Builder {
        source,
        time_unix_nano,
        metrics: Vec::new(),
    };

    for (endpoint, total) in &snapshot.requests_by_endpoint {
        builder.sum("requests", "1", count(*total), &[("endpoint", endpoint.as_str())]);
    }
    for (method, total) in &snapshot.requests_by_method {
        builder.sum("http_requests", "1", count(*total), &[("method", method.as_str())]);
    }

    builder.sum(
        "auth_attempts",
        "1",
        count(snapshot.auth_successes),
        &[("status", "success")],
    );
    builder.sum(
        "auth_attempts",
        "1",
        count(snapshot.auth_failures),
        &[("status", "failure")],
    );
    builder.gauge("active_users", "1", Value::Int(snapshot.active_users));

    builder.sum("pizzas_sold", "1", count(snapshot.pizzas_sold), &[]);
    builder.sum("pizza_failures", "1", count(snapshot.pizza_failures), &[]);
    builder.sum(
        "revenue",
        "1",
        Value::Double(snapshot.revenue.to_f64().unwrap_or(0.0)),
        &[],
    );
    builder.gauge(
        "pizza_latency",
        "ms",
        count(snapshot.factory_latency_ms),
    );

    builder.gauge("cpu_usage", "%", Value::Double(snapshot.cpu_usage_percent));
    builder.gauge("memory_usage", "%", Value::Double(snapshot.memory_usage_percent));

    Payload {
        resource_metrics: vec![ResourceMetrics {
            scope_metrics: vec![ScopeMetrics {
                metrics: builder.metrics,
            }],
        }],
    }
}
