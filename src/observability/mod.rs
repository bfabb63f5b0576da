//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handlers, store, lifecycle
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms, gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (opt-in)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every access-log event
//! - Metrics are opt-in and cheap when disabled

pub mod logging;
pub mod metrics;
