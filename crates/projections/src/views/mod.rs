//! Read model views.

pub mod allocations;

pub use allocations::{AllocationEntry, AllocationsView};
