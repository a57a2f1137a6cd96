//! CLI command implementations.

pub mod accounts;
pub mod cost;
pub mod life;
pub mod providers;
pub mod token;
