//! Client-side encryption for Jackal Memory: key resolution/persistence and
//! the AES-256-GCM envelope codec. Plaintext never leaves the process.

pub mod envelope;
pub mod keys;

pub use envelope::{open, seal, EnvelopeError, Opened};
pub use keys::{KeyError, KeyResolver, KeySource, SymmetricKey};
