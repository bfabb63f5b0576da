//! Employee directory REST API.
//!
//! CRUD over a single `employees` table held in a managed Postgres (reached
//! through its PostgREST interface) plus a CSV export.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ request id ─▶ trace ─▶ CORS ─▶ timeout ─▶ handlers
//!                                                                  │
//!                                                                  ▼
//!                                                     Arc<dyn EmployeeStore>
//!                                                        │            │
//!                                                   RestStore    MemoryStore
//!                                                   (PostgREST)  (in-process)
//! ```

pub mod config;
pub mod export;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::{Employee, EmployeeStore, MemoryStore, RestStore, StoreError};
