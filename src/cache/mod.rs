//! Aggregation caching layer
//!
//! One `ResourceCache` per resource type keeps upstream listings from being
//! repeated on every request.

pub mod clock;
pub mod resource;

pub use clock::{Clock, SystemClock};
pub use resource::{CacheStatus, ResourceCache, DEFAULT_FRESHNESS};
