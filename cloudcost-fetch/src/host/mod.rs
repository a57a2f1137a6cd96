//! Host services available to provider adapters.
//!
//! - [`http`] - HTTP client with tracing and JSON helpers
//! - [`process`] - Subprocess execution for vendor CLIs

pub mod http;
pub mod process;

pub use http::HttpClient;
pub use process::{ProcessOutput, ProcessRunner};
