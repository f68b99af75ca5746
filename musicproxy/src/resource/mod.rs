use crate::music_rpc::db_ops::ResourceRepo;
use crate::utils::Base64Byte;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Id of a stored file, derived from its content so the same media is kept once
pub fn resource_id_of(data: &[u8]) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, data).to_string()
}

/// Internal file store that media is re-hosted on
#[async_trait]
pub trait ResourceOp: ResourceRepo + Send + Sync {
    /// Keep `data` and return the reference it can be read back with
    async fn store(&self, data: Vec<u8>) -> Result<String> {
        let resource_id = resource_id_of(&data);
        if self.has_resource(resource_id.clone()).await? {
            debug!("resource {} already stored", resource_id);
            return Ok(resource_id);
        }
        let err = match self.store_resource_info(resource_id.clone(), data).await {
            Ok(id) => return Ok(id),
            Err(e) => e,
        };
        // a concurrent writer stored the same content first
        if self.has_resource(resource_id.clone()).await.unwrap_or(false) {
            debug!("resource {} stored concurrently: {}", resource_id, err);
            return Ok(resource_id);
        }
        Err(err)
    }
}
impl<T> ResourceOp for T where T: ResourceRepo + Send + Sync {}

/// Use files to persist media
pub struct FileResource {
    root: PathBuf,
}

impl FileResource {
    pub fn new(root: String) -> Self {
        FileResource { root: root.into() }
    }

    fn path_of(&self, resource_id: &str) -> Result<PathBuf> {
        // ids are plain uuids, anything with a separator would escape the root
        if resource_id.is_empty() || resource_id.contains(['/', '\\']) || resource_id.contains("..") {
            return Err(anyhow!("invalid resource id {}", resource_id));
        }
        Ok(self.root.join(resource_id))
    }
}

#[async_trait]
impl ResourceRepo for FileResource {
    async fn has_resource(&self, resource_id: String) -> Result<bool> {
        let path = self.path_of(&resource_id)?;
        Ok(tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }

    async fn get_resource_info(&self, resource_id: String) -> Result<Base64Byte> {
        let path = self.path_of(&resource_id)?;
        if !path.is_file() {
            return Err(anyhow!("resource {} not found", resource_id));
        }
        let content = tokio::fs::read(&path)
            .await
            .with_context(|| format!("read file: {}", path.display()))?;
        Ok(Base64Byte::new(content))
    }

    async fn store_resource_info(&self, resource_id: String, resource: Vec<u8>) -> Result<String> {
        let path = self.path_of(&resource_id)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create dir: {}", self.root.display()))?;
        tokio::fs::write(&path, resource)
            .await
            .with_context(|| format!("write file: {}", path.display()))?;
        Ok(resource_id)
    }
}

/// Use database to persist media
pub struct DbResource {
    resource_repo: Arc<dyn ResourceRepo + Send + Sync>,
}

impl DbResource {
    pub fn new(resource_repo: Arc<dyn ResourceRepo + Send + Sync>) -> Self {
        DbResource { resource_repo }
    }
}

#[async_trait]
impl ResourceRepo for DbResource {
    async fn has_resource(&self, resource_id: String) -> Result<bool> {
        self.resource_repo.has_resource(resource_id).await
    }

    async fn get_resource_info(&self, resource_id: String) -> Result<Base64Byte> {
        self.resource_repo.get_resource_info(resource_id).await
    }

    async fn store_resource_info(&self, resource_id: String, resource: Vec<u8>) -> Result<String> {
        self.resource_repo
            .store_resource_info(resource_id, resource)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music_rpc::db_ops::tests::memory_db;
    use crate::music_rpc::db_ops::DbOpsImpl;

    #[tokio::test]
    async fn file_resource_store_and_read() {
        let root = std::env::temp_dir().join(format!("musicproxy-res-{}", Uuid::new_v4()));
        let store = FileResource::new(root.display().to_string());

        let id = store.store(b"mp3 bytes".to_vec()).await.unwrap();
        assert_eq!(id, resource_id_of(b"mp3 bytes"));
        assert!(store.has_resource(id.clone()).await.unwrap());
        let again = store.store(b"mp3 bytes".to_vec()).await.unwrap();
        assert_eq!(id, again);

        let data: Vec<u8> = store.get_resource_info(id).await.unwrap().into();
        assert_eq!(data, b"mp3 bytes".to_vec());
        assert!(store
            .get_resource_info(resource_id_of(b"other"))
            .await
            .is_err());
        assert!(store.has_resource("../etc".to_string()).await.is_err());
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn db_resource_dedupe() {
        let repo = Arc::new(DbOpsImpl::new(memory_db().await));
        let store = DbResource::new(repo.clone());
        let first = store.store(vec![9; 16]).await.unwrap();
        // a second insert with the same primary key would fail
        let second = store.store(vec![9; 16]).await.unwrap();
        assert_eq!(first, second);
        let data: Vec<u8> = repo.get_resource_info(first).await.unwrap().into();
        assert_eq!(data, vec![9; 16]);
    }

    /// Misses the lookup, then loses the insert to another writer of the same content
    struct LateWriter {
        stored: std::sync::atomic::AtomicBool,
        written_by_other: bool,
    }

    #[async_trait]
    impl ResourceRepo for LateWriter {
        async fn has_resource(&self, _: String) -> Result<bool> {
            Ok(self.stored.load(std::sync::atomic::Ordering::SeqCst))
        }

        async fn get_resource_info(&self, resource_id: String) -> Result<Base64Byte> {
            Err(anyhow!("resource {} not found", resource_id))
        }

        async fn store_resource_info(&self, resource_id: String, _: Vec<u8>) -> Result<String> {
            if self.written_by_other {
                self.stored.store(true, std::sync::atomic::Ordering::SeqCst);
            }
            Err(anyhow!("UNIQUE constraint failed: resource_infos.id {}", resource_id))
        }
    }

    #[tokio::test]
    async fn store_tolerates_concurrent_duplicate() {
        let store = LateWriter {
            stored: Default::default(),
            written_by_other: true,
        };
        let id = store.store(b"same media".to_vec()).await.unwrap();
        assert_eq!(id, resource_id_of(b"same media"));

        let store = LateWriter {
            stored: Default::default(),
            written_by_other: false,
        };
        assert!(store.store(b"same media".to_vec()).await.is_err());
    }

    #[tokio::test]
    async fn db_resource_concurrent_store() {
        let repo = Arc::new(DbOpsImpl::new(memory_db().await));
        let store = Arc::new(DbResource::new(repo.clone()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.store(vec![7; 32]).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), resource_id_of(&[7; 32]));
        }
    }
}
