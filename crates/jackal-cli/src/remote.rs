use std::env;

use color_eyre::Result;
use jackal_client::{HttpMemoryService, MemoryClient, ServiceConfig, DEFAULT_BASE_URL};
use jackal_crypto::KeyResolver;
use tracing::debug;

use crate::config::{self, Config};

/// Build the production client from config-file values and environment
/// overrides. All ambient lookups happen here; the client layers below
/// receive explicit values only.
pub fn client_from_config(config: &Config) -> Result<MemoryClient<HttpMemoryService>> {
    let service = HttpMemoryService::new(service_config(config))?;
    let resolver = key_resolver(config)?;
    Ok(MemoryClient::new(service, resolver))
}

pub fn service_config(config: &Config) -> ServiceConfig {
    let api_token = env_override("JACKAL_MEMORY_API_KEY")
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();
    let base_url = env_override("JACKAL_MEMORY_BASE_URL")
        .or_else(|| config.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    ServiceConfig {
        base_url,
        api_token,
    }
}

pub fn key_resolver(config: &Config) -> Result<KeyResolver> {
    let explicit = env_override("JACKAL_MEMORY_ENCRYPTION_KEY")
        .or_else(|| config.encryption_key.clone());

    let key_file = match &config.key_file {
        Some(path) => path.clone(),
        None => config::default_key_file()?,
    };
    debug!(?key_file, "key file location resolved");

    Ok(KeyResolver::new(explicit, key_file))
}

/// An environment variable set to an empty or whitespace value counts as
/// unset, so it cannot shadow a populated config-file field.
fn env_override(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
