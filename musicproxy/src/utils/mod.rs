use anyhow::{anyhow, Result};
use log::info;
use std::fmt::Display;
use std::path::Path;

mod base64bytes;
pub use base64bytes::Base64Byte;

pub trait IntoAnyhow<T> {
    fn anyhow(self) -> anyhow::Result<T>;
}

impl<T, E> IntoAnyhow<T> for std::result::Result<T, E>
where
    E: Display,
{
    fn anyhow(self) -> anyhow::Result<T> {
        self.map_err(|e| anyhow!(e.to_string()))
    }
}

pub trait IfNotFound<T> {
    fn if_not_found<S: Display>(self, what: S) -> anyhow::Result<T>;
}

impl<T> IfNotFound<T> for Option<T> {
    fn if_not_found<S: Display>(self, what: S) -> anyhow::Result<T> {
        match self {
            Some(t) => Ok(t),
            _ => Err(anyhow!("{} not found", what)),
        }
    }
}

pub trait IntoJsonRpcResult<T> {
    fn internal_call_error(self) -> jsonrpsee::core::RpcResult<T>;
}

impl<T, E> IntoJsonRpcResult<T> for std::result::Result<T, E>
where
    E: Display,
{
    fn internal_call_error(self) -> jsonrpsee::core::RpcResult<T> {
        self.map_err(|e| jsonrpsee::core::Error::Custom(e.to_string()))
    }
}

/// sqlx refuses to open a sqlite file that does not exist, create it first.
/// Other databases are left alone.
pub async fn ensure_db_file(dsn: &str) -> Result<()> {
    let path = match dsn.strip_prefix("sqlite://") {
        Some(rest) => rest.split('?').next().unwrap_or_default(),
        None => return Ok(()),
    };
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    let path = Path::new(path);
    if tokio::fs::metadata(path).await.is_ok() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::File::create(path).await?;
    info!("create sqlite database file {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_sqlite_file() {
        let dir = std::env::temp_dir().join(format!("musicproxy-{}", uuid::Uuid::new_v4()));
        let db = dir.join("music.db");
        let dsn = format!("sqlite://{}?mode=rwc", db.display());

        ensure_db_file(dsn.as_str()).await.unwrap();
        assert!(db.is_file());
        // second call keeps the existing file
        ensure_db_file(dsn.as_str()).await.unwrap();

        ensure_db_file("sqlite::memory:").await.unwrap();
        ensure_db_file("mysql://root@localhost/music").await.unwrap();
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn if_not_found_message() {
        let none: Option<i32> = None;
        let err = none.if_not_found("resource abc").unwrap_err();
        assert_eq!(err.to_string(), "resource abc not found");
        assert_eq!(Some(3).if_not_found("x").unwrap(), 3);
    }
}
