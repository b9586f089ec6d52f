//! Prometheus metrics definitions for stockcast
//!
//! All metrics use the `stockcast_` prefix.

use prometheus::{CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics for the forecast server
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Forecast requests by outcome (ok, bad_request, not_found, error)
    pub forecast_requests_total: CounterVec,
    /// End-to-end forecast latency in seconds
    pub forecast_latency_seconds: Histogram,
    /// 1 when a model artifact is loaded, 0 when degraded
    pub model_loaded: Gauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let forecast_requests_total = CounterVec::new(
            Opts::new(
                "stockcast_forecast_requests_total",
                "Total forecast requests by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(forecast_requests_total.clone()))?;

        let forecast_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "stockcast_forecast_latency_seconds",
                "Forecast request latency in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        registry.register(Box::new(forecast_latency_seconds.clone()))?;

        let model_loaded = Gauge::with_opts(Opts::new(
            "stockcast_model_loaded",
            "Model artifact status (1=loaded, 0=degraded)",
        ))?;
        registry.register(Box::new(model_loaded.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            forecast_requests_total,
            forecast_latency_seconds,
            model_loaded,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn record_forecast(&self, outcome: &str, latency_secs: f64) {
        self.forecast_requests_total
            .with_label_values(&[outcome])
            .inc();
        self.forecast_latency_seconds.observe(latency_secs);
    }

    pub fn set_model_loaded(&self, loaded: bool) {
        self.model_loaded.set(if loaded { 1.0 } else { 0.0 });
    }
}
