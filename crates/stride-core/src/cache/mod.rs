//! In-memory caching of derived data.

pub mod derived;

pub use derived::{TtlCache, CONTEXT_TTL_MINUTES, DEFAULT_TTL_MINUTES};
