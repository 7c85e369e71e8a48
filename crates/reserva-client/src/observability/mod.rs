//! Observability for the client: metrics only; logging goes through `tracing`.

pub mod metrics;
