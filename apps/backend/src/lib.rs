#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod adapters;
pub mod config;
pub mod ctx;
pub mod db;
pub mod domain;
pub mod entities;
pub mod error;
pub mod errors;
pub mod messaging;
pub mod middleware;
pub mod repos;
pub mod routes;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod telemetry;

// Re-exports for public API
pub use ctx::Ctx;
pub use error::AppError;
pub use messaging::{LoggingMessenger, MessageRef, Messenger};
pub use middleware::request_trace::RequestTrace;
pub use scheduler::{Scheduler, TaskHandler, TaskRouter};
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    backend_test_support::test_logging::init();
}
