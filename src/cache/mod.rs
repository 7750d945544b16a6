//! In-memory fetch cache shared by the data stores of a review session.
//!
//! This module provides a request-level cache that:
//! - Keys responses by endpoint name + parameters
//! - Shares one network request between concurrent callers of the same key
//! - Offers an uncached mode for mutations
//! - Is invalidated explicitly by its owners, never by a timer

mod layer;

pub use layer::FetchCache;
