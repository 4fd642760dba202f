//! # Curio Common Library
//!
//! Shared code for the Curio services:
//! - Error types
//! - Configuration file loading
//! - Upstream HTTP client with bounded timeouts

pub mod config;
pub mod error;
pub mod http_client;

pub use error::{Error, Result};
pub use http_client::{ApiClient, ClientTimeouts, FetchError};
