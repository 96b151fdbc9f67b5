use clap::{Parser, Subcommand};

/// CLI surface definition. One subcommand per service operation, plus local
/// key generation.
#[derive(Parser, Debug)]
#[command(
    name = "jackal-memory",
    about = "Client-side encrypted memory store backed by Jackal",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate a new encryption key and print it (no network access).
    Keygen,
    /// Provision backing storage for a Jackal address.
    Provision {
        /// Jackal wallet address to provision storage for.
        jackal_address: String,
    },
    /// Encrypt content and store it under a key.
    Save {
        /// Caller-chosen memory key, unique per account.
        key: String,
        /// Content to encrypt and store.
        content: String,
    },
    /// Fetch and decrypt the content stored under a key.
    Load {
        /// Memory key to fetch.
        key: String,
    },
    /// Show storage usage reported by the service.
    Usage,
}
