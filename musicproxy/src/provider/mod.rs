//! Client side of the generative-audio provider.
//!
//! The provider speaks the suno-api dialect: tracks are generated
//! asynchronously and their progress is looked up by id later on.

mod fetch;
mod suno;

pub use fetch::{HttpFetcher, MediaFetcher};
pub use suno::SunoClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One track as the provider reports it. Only `id` is guaranteed, the rest
/// fills in while the provider works on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderTrack {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub lyric: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub gpt_description_prompt: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, rename = "type")]
    pub track_type: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    /// Seconds, only known once the audio is complete
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Remaining credits of the provider account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitUsage {
    pub credits_left: i64,
    #[serde(default)]
    pub period: Option<String>,
    pub monthly_limit: i64,
    pub monthly_usage: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LyricsData {
    pub text: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
}

#[async_trait]
pub trait MusicProvider {
    /// Generate from caller supplied lyric, `tags` is comma joined
    async fn generate_by_lyric(
        &self,
        prompt: String,
        model: String,
        tags: String,
        title: String,
    ) -> Result<Vec<ProviderTrack>>;

    /// Generate from a free text description
    async fn generate_by_description(
        &self,
        prompt: String,
        model: String,
        make_instrumental: bool,
    ) -> Result<Vec<ProviderTrack>>;

    /// Look up the progress of tracks by provider id
    async fn get_status(&self, ids: Vec<String>) -> Result<Vec<ProviderTrack>>;

    async fn get_limit(&self) -> Result<LimitUsage>;

    async fn generate_lyrics(&self, prompt: String) -> Result<LyricsData>;
}

#[cfg(test)]
pub(crate) mod tests {
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer exactly one http request with a canned response. The handle
    /// resolves to the head of the request that was received.
    pub(crate) async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (SocketAddr, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before the request head");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let content_length = head
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < head_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }

            let resp = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(resp.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            head
        });
        (addr, handle)
    }
}
