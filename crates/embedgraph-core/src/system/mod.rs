//! # System Module
//!
//! Store-wide statistics.
//!
//! Metrics are pure reads over a `Graph`; they never mutate or gate any
//! operation.

mod metrics;

pub use metrics::*;
