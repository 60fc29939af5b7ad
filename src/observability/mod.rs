//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handler produces:
//!     → logging.rs (structured log events, request ID on every line)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
