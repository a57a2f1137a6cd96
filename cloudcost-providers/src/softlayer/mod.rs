//! IBM SoftLayer and Bluemix provider implementation.
//!
//! Both products bill through the SoftLayer account API. They differ only in
//! which billing categories they keep: Bluemix owns the `paas*` categories,
//! SoftLayer everything else.
//!
//! Each run reports two items: the upcoming invoice (current cycle) and the
//! latest recurring invoice (previous cycle, no start date).

mod adapter;
mod api;

pub use adapter::{CategoryFilter, SoftLayerAdapter};
