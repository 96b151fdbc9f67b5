use std::{
    fmt, fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use rand::{rngs::OsRng, RngCore};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

/// Key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// 256-bit symmetric key. External form is a lowercase 64-char hex string.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Decode from hex, rejecting anything that is not exactly 64 hex chars.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|e| KeyError::InvalidHex {
            detail: e.to_string(),
        })?;
        if bytes.len() != KEY_LEN {
            return Err(KeyError::WrongLength { got: bytes.len() });
        }
        let mut out = [0u8; KEY_LEN];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

// Key bytes must never appear in debug output or logs.
impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Where the active key came from. `Generated` means a new key was persisted
/// this invocation and the backup notice was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Explicit,
    Persisted,
    Generated,
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key is not valid hex: {detail}")]
    InvalidHex { detail: String },
    #[error("key is {got} bytes, expected {KEY_LEN}")]
    WrongLength { got: usize },
    #[error("key file i/o: {0}")]
    Io(#[from] io::Error),
}

/// Resolves the single active key for this invocation.
///
/// Precedence is fixed: an explicit key (config/env) wins, then the persisted
/// key file, then generate-and-persist. A malformed explicit key or a corrupt
/// key file is fatal, never silently skipped.
#[derive(Debug, Clone)]
pub struct KeyResolver {
    explicit: Option<String>,
    key_file: PathBuf,
}

impl KeyResolver {
    pub fn new(explicit: Option<String>, key_file: impl Into<PathBuf>) -> Self {
        Self {
            explicit,
            key_file: key_file.into(),
        }
    }

    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    pub fn resolve(&self) -> Result<(SymmetricKey, KeySource), KeyError> {
        if let Some(explicit) = self.explicit.as_deref() {
            let trimmed = explicit.trim();
            if !trimmed.is_empty() {
                return Ok((SymmetricKey::from_hex(trimmed)?, KeySource::Explicit));
            }
        }

        let (key, generated) = load_or_generate(&self.key_file)?;
        if generated {
            // Backup notice goes to the diagnostic channel, not stdout.
            info!(
                "generated a new encryption key and saved it to {}; back it up: {}",
                self.key_file.display(),
                key.to_hex()
            );
            Ok((key, KeySource::Generated))
        } else {
            Ok((key, KeySource::Persisted))
        }
    }
}

/// Load the key file, or generate and persist a fresh key if it is absent.
/// Returns the key and whether this call created it.
///
/// Creation stages the full key in a temp file and links it into place
/// without clobbering, so the key file is only ever observed fully written.
/// If another process wins the race, we defer to its key rather than
/// overwriting the file.
pub fn load_or_generate(path: &Path) -> Result<(SymmetricKey, bool), KeyError> {
    match read_key_file(path) {
        Ok(key) => return Ok((key, false)),
        Err(KeyError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let key = SymmetricKey::generate();
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(key.to_hex().as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok((key, true)),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
            // Another process created the file first; its key wins.
            Ok((read_key_file(path)?, false))
        }
        Err(err) => Err(err.error.into()),
    }
}

fn read_key_file(path: &Path) -> Result<SymmetricKey, KeyError> {
    let contents = fs::read_to_string(path)?;
    SymmetricKey::from_hex(contents.trim())
}
