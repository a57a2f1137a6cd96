//! DigitalOcean provider implementation.
//!
//! Cost comes from the customer balance (`month_to_date_usage`). The
//! lifetime check reads hourly items of the latest invoice.

mod adapter;
mod api;

pub use adapter::DigitalOceanAdapter;
pub use api::{Balance, Invoice, InvoiceItem};
