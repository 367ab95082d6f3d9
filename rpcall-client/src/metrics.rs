//! Client metrics definitions
//!
//! OpenTelemetry instruments recorded by every call engine when metrics are
//! enabled. They go to whatever global meter provider the application
//! installed (see `rpcall_core::init_observability`).
//!
//! # Metrics Collected
//!
//! - **rpcall.client.calls.total**: Calls completed, by method and status (counter)
//! - **rpcall.client.call.duration**: Call latency in seconds, by method and status (histogram)
//! - **rpcall.client.errors.total**: Failed calls, by error kind (counter)
//! - **rpcall.client.messages.dropped**: Inbound WebSocket messages that matched no call (counter)
//! - **rpcall.client.connection.state**: 0=disconnected, 1=connecting, 2=connected (gauge)

use crate::connection_state::ConnectionState;
use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    InstrumentationScope, KeyValue,
};
use rpcall_core::{Error, Result};
use std::time::Duration;

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Connection state gauge
    pub connection_state: Gauge<i64>,
    /// Calls completed
    pub calls_total: Counter<u64>,
    /// Call duration in seconds
    pub call_duration: Histogram<f64>,
    /// Failed calls
    pub errors_total: Counter<u64>,
    /// Inbound messages dropped by the receive loop
    pub messages_dropped: Counter<u64>,
}

impl ClientMetrics {
    /// Create metrics on the global meter provider under `service_name`
    pub fn new(service_name: impl Into<String>) -> Self {
        let scope = InstrumentationScope::builder(service_name.into())
            .with_version(env!("CARGO_PKG_VERSION"))
            .build();
        Self::new_with_meter(&global::meter_with_scope(scope))
    }

    /// Create metrics on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("rpcall.client.connection.state")
                .with_description("Connection state (0=disconnected, 1=connecting, 2=connected)")
                .build(),
            calls_total: meter
                .u64_counter("rpcall.client.calls.total")
                .with_description("Total number of calls completed")
                .build(),
            call_duration: meter
                .f64_histogram("rpcall.client.call.duration")
                .with_description("Call duration in seconds")
                .with_unit("s")
                .build(),
            errors_total: meter
                .u64_counter("rpcall.client.errors.total")
                .with_description("Total number of failed calls")
                .build(),
            messages_dropped: meter
                .u64_counter("rpcall.client.messages.dropped")
                .with_description("Inbound messages that could not be matched to a call")
                .build(),
        }
    }

    /// Record the outcome of one call
    pub fn record_call<T>(&self, method: &str, outcome: &Result<T>, elapsed: Duration) {
        let status = if outcome.is_ok() { "success" } else { "error" };
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status),
        ];
        self.calls_total.add(1, attributes);
        self.call_duration.record(elapsed.as_secs_f64(), attributes);

        if let Err(error) = outcome {
            self.record_error(error);
        }
    }

    /// Record a failed call by error kind
    pub fn record_error(&self, error: &Error) {
        self.errors_total
            .add(1, &[KeyValue::new("error_type", error.label())]);
    }

    /// Record an inbound message the receive loop discarded
    pub fn record_dropped_message(&self, reason: &'static str) {
        self.messages_dropped
            .add(1, &[KeyValue::new("reason", reason)]);
    }

    /// Update the connection state gauge
    pub fn update_connection_state(&self, state: ConnectionState) {
        self.connection_state.record(state.as_gauge(), &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::metrics::MeterProvider;
    use opentelemetry_sdk::metrics::data::{AggregatedMetrics, Metric, MetricData, ResourceMetrics};
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};
    use rpcall_core::{ErrorClassifier, JsonRpcErrorData};

    /// Metrics on an SDK provider whose exports land in memory
    fn in_memory_metrics() -> (ClientMetrics, SdkMeterProvider, InMemoryMetricExporter) {
        let exporter = InMemoryMetricExporter::default();
        let provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(exporter.clone()).build())
            .build();
        let metrics = ClientMetrics::new_with_meter(&provider.meter("rpcall-test"));
        (metrics, provider, exporter)
    }

    fn collect(provider: &SdkMeterProvider, exporter: &InMemoryMetricExporter) -> ResourceMetrics {
        provider.force_flush().unwrap();
        exporter.get_finished_metrics().unwrap().pop().unwrap()
    }

    fn find<'a>(resource: &'a ResourceMetrics, name: &str) -> &'a Metric {
        resource
            .scope_metrics()
            .flat_map(|scope| scope.metrics())
            .find(|metric| metric.name() == name)
            .unwrap_or_else(|| panic!("metric {} not exported", name))
    }

    fn has_labels<'a>(
        attributes: impl Iterator<Item = &'a KeyValue>,
        labels: &[(&str, &str)],
    ) -> bool {
        let attributes: Vec<_> = attributes
            .map(|kv| (kv.key.as_str().to_string(), kv.value.as_str().to_string()))
            .collect();
        labels
            .iter()
            .all(|(k, v)| attributes.iter().any(|(ak, av)| ak == k && av == v))
    }

    /// Counter value for the data point carrying `labels`
    fn counter(resource: &ResourceMetrics, name: &str, labels: &[(&str, &str)]) -> u64 {
        match find(resource, name).data() {
            AggregatedMetrics::U64(MetricData::Sum(sum)) => sum
                .data_points()
                .filter(|point| has_labels(point.attributes(), labels))
                .map(|point| point.value())
                .sum(),
            _ => panic!("{} is not a u64 counter", name),
        }
    }

    #[test]
    fn test_metrics_recording() {
        let (metrics, provider, exporter) = in_memory_metrics();

        metrics.record_call::<()>("ping", &Ok(()), Duration::from_millis(5));
        metrics.record_call::<()>("ping", &Ok(()), Duration::from_millis(7));
        metrics.record_call::<()>("ping", &Err(Error::Timeout), Duration::from_secs(1));
        metrics.record_call("add", &Ok(5), Duration::from_millis(2));
        metrics.record_dropped_message("unmatched");
        metrics.record_dropped_message("unmatched");
        metrics.record_dropped_message("malformed");

        let resource = collect(&provider, &exporter);
        let calls = "rpcall.client.calls.total";
        assert_eq!(counter(&resource, calls, &[("method", "ping"), ("status", "success")]), 2);
        assert_eq!(counter(&resource, calls, &[("method", "ping"), ("status", "error")]), 1);
        assert_eq!(counter(&resource, calls, &[("method", "add"), ("status", "success")]), 1);

        // A failed call also counts as an error of its kind
        assert_eq!(
            counter(&resource, "rpcall.client.errors.total", &[("error_type", "timeout")]),
            1
        );

        let dropped = "rpcall.client.messages.dropped";
        assert_eq!(counter(&resource, dropped, &[("reason", "unmatched")]), 2);
        assert_eq!(counter(&resource, dropped, &[("reason", "malformed")]), 1);

        match find(&resource, "rpcall.client.call.duration").data() {
            AggregatedMetrics::F64(MetricData::Histogram(histogram)) => {
                let ping_ok = histogram
                    .data_points()
                    .find(|point| {
                        has_labels(point.attributes(), &[("method", "ping"), ("status", "success")])
                    })
                    .unwrap();
                assert_eq!(ping_ok.count(), 2);
                assert!((ping_ok.sum() - 0.012).abs() < 1e-9);
            }
            _ => panic!("call duration is not an f64 histogram"),
        }

        let _ = provider.shutdown();
    }

    #[test]
    fn test_connection_state_metrics() {
        let (metrics, provider, exporter) = in_memory_metrics();

        metrics.update_connection_state(ConnectionState::Disconnected);
        metrics.update_connection_state(ConnectionState::Connecting);
        metrics.update_connection_state(ConnectionState::Connected);

        let resource = collect(&provider, &exporter);
        match find(&resource, "rpcall.client.connection.state").data() {
            AggregatedMetrics::I64(MetricData::Gauge(gauge)) => {
                let values: Vec<i64> = gauge.data_points().map(|point| point.value()).collect();
                assert_eq!(values, vec![2]);
            }
            _ => panic!("connection state is not an i64 gauge"),
        }

        metrics.update_connection_state(ConnectionState::Disconnected);
        let resource = collect(&provider, &exporter);
        match find(&resource, "rpcall.client.connection.state").data() {
            AggregatedMetrics::I64(MetricData::Gauge(gauge)) => {
                let values: Vec<i64> = gauge.data_points().map(|point| point.value()).collect();
                assert_eq!(values, vec![0]);
            }
            _ => panic!("connection state is not an i64 gauge"),
        }

        let _ = provider.shutdown();
    }

    #[test]
    fn test_error_metrics_by_kind() {
        let (metrics, provider, exporter) = in_memory_metrics();
        let classifier = ErrorClassifier::new();

        metrics.record_error(&classifier.into_error(JsonRpcErrorData::new(-32601, "nope")));
        metrics.record_error(&classifier.into_error(JsonRpcErrorData::new(-32601, "still no")));
        metrics.record_error(&Error::ConnectionClosed);
        metrics.record_error(&Error::invalid_response("garbage"));

        let resource = collect(&provider, &exporter);
        let errors = "rpcall.client.errors.total";
        assert_eq!(counter(&resource, errors, &[("error_type", "method_not_found")]), 2);
        assert_eq!(counter(&resource, errors, &[("error_type", "connection_closed")]), 1);
        assert_eq!(counter(&resource, errors, &[("error_type", "invalid_response")]), 1);
        assert_eq!(counter(&resource, errors, &[]), 4);

        let _ = provider.shutdown();
    }

    #[test]
    fn test_global_metrics_without_provider() {
        // Falls back to the no-op global meter
        let metrics = ClientMetrics::new("test-client");
        metrics.record_call::<()>("ping", &Ok(()), Duration::from_millis(5));
        metrics.update_connection_state(ConnectionState::Connected);
    }
}
