use jackal_core::{MemoryError, MemoryService, ProvisionReceipt, SaveReceipt, UsageReport};
use jackal_crypto::{envelope, KeyResolver, Opened};
use tracing::{debug, instrument};

/// Client composition layer: resolves the encryption key, seals content
/// before it leaves the process, and opens content after download.
///
/// Generic over the service so tests run against the in-memory double.
pub struct MemoryClient<S: MemoryService> {
    service: S,
    resolver: KeyResolver,
}

impl<S: MemoryService> MemoryClient<S> {
    pub fn new(service: S, resolver: KeyResolver) -> Self {
        Self { service, resolver }
    }

    /// Provision backing storage. Pure passthrough, no key involvement.
    pub async fn provision(&self, jackal_address: &str) -> Result<ProvisionReceipt, MemoryError> {
        self.service.provision(jackal_address).await
    }

    /// Seal plaintext and store it under `key_name`. The service receives
    /// only the envelope.
    #[instrument(skip_all, fields(key_name))]
    pub async fn save(&self, key_name: &str, plaintext: &[u8]) -> Result<SaveReceipt, MemoryError> {
        let (key, source) = self.resolver.resolve().map_err(config_err)?;
        debug!(?source, "resolved encryption key");
        let sealed = envelope::seal(plaintext, &key)
            .map_err(|e| MemoryError::config(e.to_string()))?;
        self.service.save(key_name, &sealed).await
    }

    /// Fetch and open the content stored under `key_name`. Returns the typed
    /// outcome so callers can tell recovered ciphertext from content that was
    /// stored as plain text before encryption existed.
    #[instrument(skip_all, fields(key_name))]
    pub async fn load(&self, key_name: &str) -> Result<Opened, MemoryError> {
        let (key, source) = self.resolver.resolve().map_err(config_err)?;
        debug!(?source, "resolved encryption key");
        let content = self.service.load(key_name).await?;
        Ok(envelope::open(&content, &key))
    }

    /// Service-reported accounting, verbatim.
    pub async fn usage(&self) -> Result<UsageReport, MemoryError> {
        self.service.usage().await
    }
}

fn config_err(err: jackal_crypto::KeyError) -> MemoryError {
    MemoryError::config(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jackal_core::InMemoryMemoryService;
    use jackal_crypto::SymmetricKey;
    use std::path::PathBuf;

    fn key_file(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("jackal-memory").join("key")
    }

    fn client_with(
        service: InMemoryMemoryService,
        explicit: Option<String>,
        dir: &tempfile::TempDir,
    ) -> MemoryClient<InMemoryMemoryService> {
        MemoryClient::new(service, KeyResolver::new(explicit, key_file(dir)))
    }

    #[tokio::test]
    async fn save_then_load_round_trips_with_generated_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let client = client_with(InMemoryMemoryService::new(), None, &dir);

        let receipt = client.save("note", b"hello").await.expect("save");
        assert_eq!(receipt.key, "note");

        let opened = client.load("note").await.expect("load");
        assert_eq!(opened, Opened::Decrypted(b"hello".to_vec()));
        assert!(key_file(&dir).exists(), "key file must be persisted");
    }

    #[tokio::test]
    async fn save_then_load_round_trips_with_preexisting_key_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = key_file(&dir);
        std::fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
        std::fs::write(&path, SymmetricKey::generate().to_hex()).expect("seed key");

        let client = client_with(InMemoryMemoryService::new(), None, &dir);
        client.save("note", b"hello").await.expect("save");
        let opened = client.load("note").await.expect("load");
        assert_eq!(opened, Opened::Decrypted(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn service_never_sees_plaintext() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = InMemoryMemoryService::new();
        let client = client_with(service.clone(), None, &dir);

        client.save("note", b"top-secret-payload").await.expect("save");
        let stored = service.load("note").await.expect("raw load");
        assert!(!stored.contains("top-secret-payload"));
    }

    #[tokio::test]
    async fn legacy_plaintext_loads_back_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = InMemoryMemoryService::new();
        service.seed("old-note", "saved before encryption existed");

        let client = client_with(service, None, &dir);
        let opened = client.load("old-note").await.expect("load");
        assert_eq!(
            opened,
            Opened::Passthrough(b"saved before encryption existed".to_vec())
        );
    }

    #[tokio::test]
    async fn load_of_missing_key_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let client = client_with(InMemoryMemoryService::new(), None, &dir);
        let err = client.load("missing").await.expect_err("should miss");
        assert_eq!(
            err,
            MemoryError::NotFound {
                key: "missing".into()
            }
        );
    }

    #[tokio::test]
    async fn explicit_key_is_used_for_both_directions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = InMemoryMemoryService::new();
        let explicit = SymmetricKey::generate().to_hex();

        let saver = client_with(service.clone(), Some(explicit.clone()), &dir);
        saver.save("note", b"shared").await.expect("save");

        // A second client with the same explicit key decrypts; the key file
        // is never consulted.
        let other_dir = tempfile::tempdir().expect("tempdir");
        let loader = client_with(service, Some(explicit), &other_dir);
        let opened = loader.load("note").await.expect("load");
        assert_eq!(opened, Opened::Decrypted(b"shared".to_vec()));
        assert!(!key_file(&other_dir).exists());
    }

    #[tokio::test]
    async fn malformed_explicit_key_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let client = client_with(InMemoryMemoryService::new(), Some("nope".into()), &dir);
        let err = client.save("note", b"x").await.expect_err("should reject");
        assert!(matches!(err, MemoryError::Config { .. }));
    }

    #[tokio::test]
    async fn usage_is_a_pure_passthrough() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = InMemoryMemoryService::with_quota(1000);
        let client = client_with(service, None, &dir);

        client.save("note", b"0123456789").await.expect("save");
        let report = client.usage().await.expect("usage");
        assert_eq!(report.quota_bytes, 1000);
        assert!(report.bytes_used > 0);
    }

    #[tokio::test]
    async fn provision_is_a_pure_passthrough() {
        let dir = tempfile::tempdir().expect("tempdir");
        let client = client_with(InMemoryMemoryService::new(), None, &dir);
        let receipt = client.provision("jkl1abc").await.expect("provision");
        assert_eq!(receipt.jackal_address, "jkl1abc");
        assert!(!key_file(&dir).exists(), "provision must not touch keys");
    }
}
