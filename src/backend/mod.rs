//! Analysis backend access.
//!
//! This module normalizes calls to the external intelligence backends
//! into a uniform request/parsed-reply contract.

pub mod adapter;

pub use adapter::{BackendClient, BackendReply};
