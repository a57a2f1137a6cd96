//! OVHcloud provider implementation.
//!
//! OVH signs every request with the application secret and consumer key.
//! The `endpoint` credential names the API region (`ovh-eu`, `ovh-ca`, ...)
//! or is a base URL.

mod adapter;
mod signer;

pub use adapter::OvhAdapter;
pub use signer::{resolve_endpoint, RequestSigner};
