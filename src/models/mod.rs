//! Data models for the rental catalog backend.
//!
//! Upstream records keep the booking platform's snake_case wire names; local
//! records and response-only views use camelCase for the frontend.

mod local;
mod merged;
mod pricing;
mod property;

pub use local::*;
pub use merged::*;
pub use pricing::*;
pub use property::*;
