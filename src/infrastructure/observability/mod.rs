//! Pull-based observability for stockcast
//!
//! Metrics are kept in a private Prometheus registry and rendered on demand
//! by the HTTP interface at `GET /metrics`.

pub mod metrics;

pub use metrics::Metrics;
