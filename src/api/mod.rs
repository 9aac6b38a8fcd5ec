//! HTTP API for the recurring-task backend.

pub mod server;

pub use server::{ApiServer, build_router, start_server};
