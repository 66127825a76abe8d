//! filestore-gateway HTTP server library
//!
//! This module exports the server components for use in integration tests.

pub mod cli;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod router;

pub use error::ApiError;
pub use openapi::with_api_docs;
pub use router::{create_router, AppState};
