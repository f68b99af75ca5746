use crate::error::{MusicError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Pull provider hosted media before it is re-hosted
#[async_trait]
pub trait MediaFetcher {
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        HttpFetcher {
            client: Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| MusicError::Transport(format!("download {}: {}", url, e)))?;
        resp.bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| MusicError::Transport(format!("read body of {}: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::serve_once;

    #[tokio::test]
    async fn missing_media_is_transport_error() {
        let (addr, server) = serve_once("404 Not Found", "").await;
        let url = format!("http://{}/a.mp3", addr);
        let err = HttpFetcher::new().download(&url).await.unwrap_err();
        assert!(matches!(err, MusicError::Transport(_)), "{:?}", err);
        assert!(err.to_string().contains("404"), "{}", err);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn download_media_bytes() {
        let (addr, server) = serve_once("200 OK", "ID3 audio").await;
        let url = format!("http://{}/a.mp3", addr);
        let data = HttpFetcher::new().download(&url).await.unwrap();
        assert_eq!(data, b"ID3 audio".to_vec());
        let head = server.await.unwrap();
        assert!(head.starts_with("GET /a.mp3 HTTP/1.1"), "{}", head);
    }
}
