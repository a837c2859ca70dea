//! Remote store client module.
//!
//! The authoritative cloud copy of user entities lives behind the
//! `RemoteStore` trait: `HttpRemoteStore` in production,
//! `MemoryRemoteStore` for tests and offline demos.

pub mod client;
pub mod error;
pub mod memory;

pub use client::{EntityDraft, HttpRemoteStore, RemoteStore};
pub use error::RemoteError;
pub use memory::MemoryRemoteStore;
