//! Store client for the Jackal Memory service: a reqwest-backed transport
//! implementing the `MemoryService` contract, and the `MemoryClient`
//! composition layer that seals content before upload and opens it after
//! download.

pub mod client;
pub mod http;

pub use client::MemoryClient;
pub use http::{HttpMemoryService, ServiceConfig, DEFAULT_BASE_URL};
