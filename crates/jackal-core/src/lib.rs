//! Core abstractions for the Jackal Memory client: error taxonomy and the
//! remote service contract. This crate is intentionally small to keep
//! dependency surface minimal.

pub mod error;
pub mod service;

pub use error::MemoryError;
pub use service::{
    InMemoryMemoryService, MemoryService, ProvisionReceipt, SaveReceipt, UsageReport,
};
