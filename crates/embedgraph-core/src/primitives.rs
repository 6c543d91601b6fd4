//! # Store Limits
//!
//! Hardcoded bounds compiled into the store.

/// Maximum hop count for `GraphStore::traverse_depth`.
///
/// - All traversals must be computationally bounded.
/// - Larger requested depths are clamped to this value.
pub const MAX_TRAVERSAL_DEPTH: usize = 100;
