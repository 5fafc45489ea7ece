// Keyed response cache with tag invalidation and single-flight fetches

pub mod cache;
pub mod tag;

pub use cache::QueryCache;
pub use tag::{Tag, TagId};
