//! Vendor payables: open items and payment allocations.

pub mod error;
pub mod tracker;
pub mod types;

pub use error::AllocationError;
pub use tracker::PayablesTracker;
pub use types::{
    AllocationRequest, NewVendor, OpenItem, PayableLine, Vendor, VendorAllocation,
};
