use std::time::Duration;

use anyhow::{anyhow, Result};

/// Number of task ids sent in one status lookup. The lookup is a GET request
/// and the ids travel in the query string, more than this overflows the
/// provider's url length limit.
pub const DEFAULT_SYNC_BATCH_SIZE: usize = 36;

pub const DEFAULT_SYNC_INTERVAL: &str = "30s";

pub const DEFAULT_PLATFORM: &str = "Suno";

/// Where re-hosted media is kept. The db store keeps the bytes in the
/// `resource_infos` table, the fs store writes one file per resource
/// under the given directory.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    Db,
    FS(String),
}

impl Resource {
    pub fn from_type(resource_type: &str, resource_path: String) -> Result<Self> {
        match resource_type {
            "db" => Ok(Resource::Db),
            "fs" => {
                if resource_path.is_empty() {
                    return Err(anyhow!("fs resource type needs a fs-resource-path"));
                }
                Ok(Resource::FS(resource_path))
            }
            other => Err(anyhow!("unknown resource type {}, expect db or fs", other)),
        }
    }
}

/// Provider connection
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub url: String,
    pub token: Option<String>,
    /// Recorded on every generated task
    pub platform: String,
}

/// Save configuration information related to musicproxy
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub url: String,
    pub db_dsn: String,
    pub debug_sql: bool,
    pub log_level: String,
    pub resource: Resource,
    pub provider: ProviderConfig,

    pub disable_sync: bool,
    pub sync_interval: Duration,
    pub sync_batch_size: usize,
}

impl ServiceConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        url: String,
        db_dsn: String,
        debug_sql: bool,
        log_level: String,
        resource_type: String,
        resource_path: String,
        provider: ProviderConfig,
        disable_sync: bool,
        sync_interval: String,
        sync_batch_size: usize,
    ) -> Result<Self> {
        let resource = Resource::from_type(resource_type.as_str(), resource_path)?;
        let sync_interval = duration_str::parse(sync_interval.as_str())
            .map_err(|e| anyhow!("invalid sync interval {}: {}", sync_interval, e))?;
        if sync_batch_size == 0 {
            return Err(anyhow!("sync batch size must be greater than 0"));
        }

        Ok(Self {
            url,
            db_dsn,
            debug_sql,
            log_level,
            resource,
            provider,
            disable_sync,
            sync_interval,
            sync_batch_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ProviderConfig {
        ProviderConfig {
            url: "http://127.0.0.1:3000".to_string(),
            token: None,
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }

    fn build(resource_type: &str, path: &str, interval: &str, batch: usize) -> Result<ServiceConfig> {
        ServiceConfig::new(
            "127.0.0.1:18888".to_string(),
            "sqlite://musicproxy.db".to_string(),
            false,
            "info".to_string(),
            resource_type.to_string(),
            path.to_string(),
            provider(),
            false,
            interval.to_string(),
            batch,
        )
    }

    #[test]
    fn parse_service_config() {
        let cfg = build("fs", "/tmp/music", "5m", DEFAULT_SYNC_BATCH_SIZE).unwrap();
        assert_eq!(cfg.resource, Resource::FS("/tmp/music".to_string()));
        assert_eq!(cfg.sync_interval, Duration::from_secs(300));
        assert_eq!(cfg.sync_batch_size, 36);

        let cfg = build("db", "", DEFAULT_SYNC_INTERVAL, 10).unwrap();
        assert_eq!(cfg.resource, Resource::Db);
        assert_eq!(cfg.sync_interval, Duration::from_secs(30));
    }

    #[test]
    fn reject_bad_config() {
        assert!(build("s3", "", "30s", 36).is_err());
        assert!(build("fs", "", "30s", 36).is_err());
        assert!(build("db", "", "soon", 36).is_err());
        assert!(build("db", "", "30s", 0).is_err());
    }
}
