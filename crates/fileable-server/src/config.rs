use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Args;
use fileable_core::{FileableError, OwnerRegistry};
use fileable_ingest::{IngestConfig, OrphanPolicy};

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "FILEABLE_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(long, env = "FILEABLE_PORT", default_value = "3720")]
    pub port: u16,

    /// Owner types accepted in URLs, comma separated. Empty accepts any
    /// well-formed tag.
    #[arg(long = "owner-types", env = "FILEABLE_OWNER_TYPES", value_delimiter = ',')]
    pub owner_types: Vec<String>,

    /// Storage directory used when a request does not name one
    #[arg(long, env = "FILEABLE_DEFAULT_PATH", default_value = "uploads")]
    pub default_path: String,

    /// Largest accepted request body, in megabytes
    #[arg(long, env = "FILEABLE_MAX_UPLOAD_MB", default_value = "25")]
    pub max_upload_mb: usize,

    /// Timeout for URL downloads (seconds). Unset waits indefinitely.
    #[arg(long, env = "FILEABLE_DOWNLOAD_TIMEOUT")]
    pub download_timeout: Option<u64>,

    /// Leave stored files in place when their attachment row cannot be written
    #[arg(long, env = "FILEABLE_KEEP_ORPHANS")]
    pub keep_orphans: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::from([0, 0, 0, 0]),
            port: 3720,
            owner_types: Vec::new(),
            default_path: "uploads".into(),
            max_upload_mb: 25,
            download_timeout: None,
            keep_orphans: false,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn owner_registry(&self) -> Result<OwnerRegistry, FileableError> {
        let tags: Vec<&str> = self
            .owner_types
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if tags.is_empty() {
            return Ok(OwnerRegistry::open());
        }
        let mut registry = OwnerRegistry::new();
        for tag in tags {
            registry.register_tag(tag)?;
        }
        Ok(registry)
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            orphan_policy: if self.keep_orphans {
                OrphanPolicy::Keep
            } else {
                OrphanPolicy::Compensate
            },
            download_timeout: self.download_timeout.map(Duration::from_secs),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_owner_types_is_open() {
        let registry = ServerConfig::default().owner_registry().unwrap();
        assert!(registry.is_open());
    }

    #[test]
    fn owner_types_are_registered() {
        let config = ServerConfig {
            owner_types: vec!["post".into(), " user ".into(), "".into()],
            ..Default::default()
        };
        let registry = config.owner_registry().unwrap();
        assert!(!registry.is_open());
        assert_eq!(registry.tags().collect::<Vec<_>>(), vec!["post", "user"]);

        let bad = ServerConfig {
            owner_types: vec!["Post".into()],
            ..Default::default()
        };
        assert!(bad.owner_registry().is_err());
    }

    #[test]
    fn ingest_config_follows_flags() {
        let config = ServerConfig {
            download_timeout: Some(30),
            keep_orphans: true,
            ..Default::default()
        };
        let ingest = config.ingest_config();
        assert_eq!(ingest.orphan_policy, OrphanPolicy::Keep);
        assert_eq!(ingest.download_timeout, Some(Duration::from_secs(30)));
        assert_eq!(ServerConfig::default().max_upload_bytes(), 25 * 1024 * 1024);
    }
}
