use crate::error::{MusicError, Result};
use crate::provider::{LimitUsage, LyricsData, MusicProvider, ProviderTrack};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Body of both generate endpoints, the unused half stays out of the json
#[derive(Debug, Serialize)]
struct GenerateBody {
    prompt: String,
    #[serde(rename = "mv")]
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    make_instrumental: Option<bool>,
    wait_audio: bool,
}

#[derive(Debug, Serialize)]
struct LyricsBody {
    prompt: String,
}

/// HTTP client of a suno-api compatible provider
pub struct SunoClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl SunoClient {
    pub fn new(base_url: String, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| MusicError::Upstream(format!("build provider client: {}", e)))?;
        Ok(SunoClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, req: RequestBuilder) -> Result<T> {
        debug!("call provider {}", path);
        let resp = req
            .send()
            .await
            .map_err(|e| MusicError::Upstream(format!("call {}: {}", path, e)))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MusicError::Upstream(format!(
                "call {} status {}: {}",
                path, status, body
            )));
        }
        resp.json::<T>()
            .await
            .map_err(|e| MusicError::Upstream(format!("decode response of {}: {}", path, e)))
    }
}

#[async_trait]
impl MusicProvider for SunoClient {
    async fn generate_by_lyric(
        &self,
        prompt: String,
        model: String,
        tags: String,
        title: String,
    ) -> Result<Vec<ProviderTrack>> {
        let path = "/api/custom_generate";
        let body = GenerateBody {
            prompt,
            model,
            tags: Some(tags),
            title: Some(title),
            make_instrumental: None,
            wait_audio: false,
        };
        self.send(path, self.request(Method::POST, path).json(&body))
            .await
    }

    async fn generate_by_description(
        &self,
        prompt: String,
        model: String,
        make_instrumental: bool,
    ) -> Result<Vec<ProviderTrack>> {
        let path = "/api/generate";
        let body = GenerateBody {
            prompt,
            model,
            tags: None,
            title: None,
            make_instrumental: Some(make_instrumental),
            wait_audio: false,
        };
        self.send(path, self.request(Method::POST, path).json(&body))
            .await
    }

    async fn get_status(&self, ids: Vec<String>) -> Result<Vec<ProviderTrack>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let path = "/api/get";
        let req = self
            .request(Method::GET, path)
            .query(&[("ids", ids.join(","))]);
        self.send(path, req).await
    }

    async fn get_limit(&self) -> Result<LimitUsage> {
        let path = "/api/get_limit";
        self.send(path, self.request(Method::GET, path)).await
    }

    async fn generate_lyrics(&self, prompt: String) -> Result<LyricsData> {
        let path = "/api/generate_lyrics";
        self.send(
            path,
            self.request(Method::POST, path).json(&LyricsBody { prompt }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::serve_once;

    #[test]
    fn generate_body_shape() {
        let lyric = GenerateBody {
            prompt: "[Verse] hello".to_string(),
            model: "chirp-v3-5".to_string(),
            tags: Some("pop,rock".to_string()),
            title: Some("Hello".to_string()),
            make_instrumental: None,
            wait_audio: false,
        };
        assert_eq!(
            serde_json::to_value(&lyric).unwrap(),
            serde_json::json!({
                "prompt": "[Verse] hello",
                "mv": "chirp-v3-5",
                "tags": "pop,rock",
                "title": "Hello",
                "wait_audio": false,
            })
        );

        let description = GenerateBody {
            prompt: "a calm piano song".to_string(),
            model: "chirp-v3-5".to_string(),
            tags: None,
            title: None,
            make_instrumental: Some(true),
            wait_audio: false,
        };
        assert_eq!(
            serde_json::to_value(&description).unwrap(),
            serde_json::json!({
                "prompt": "a calm piano song",
                "mv": "chirp-v3-5",
                "make_instrumental": true,
                "wait_audio": false,
            })
        );
    }

    #[test]
    fn decode_provider_track() {
        let raw = r#"[{
            "id": "5b8f",
            "title": "Hello",
            "image_url": "https://cdn.example/5b8f.png",
            "lyric": "[Verse] hello",
            "audio_url": "https://cdn.example/5b8f.mp3",
            "video_url": "",
            "created_at": "2024-06-01T10:00:00.000Z",
            "model_name": "chirp-v3",
            "status": "streaming",
            "gpt_description_prompt": null,
            "prompt": "[Verse] hello",
            "type": "gen",
            "tags": "pop,rock",
            "duration": 120.5
        }]"#;
        let tracks: Vec<ProviderTrack> = serde_json::from_str(raw).unwrap();
        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.id, "5b8f");
        assert_eq!(track.status.as_deref(), Some("streaming"));
        assert_eq!(track.track_type.as_deref(), Some("gen"));
        assert_eq!(track.gpt_description_prompt, None);
        assert_eq!(track.duration, Some(120.5));
        assert_eq!(track.error_message, None);
    }

    #[test]
    fn trim_base_url() {
        let client = SunoClient::new("http://127.0.0.1:3000/".to_string(), Some("".to_string())).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:3000");
        assert_eq!(client.token, None);
    }

    #[tokio::test]
    async fn provider_error_status_is_upstream() {
        let (addr, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let client = SunoClient::new(format!("http://{}", addr), None).unwrap();
        let err = client.get_status(vec!["a".to_string()]).await.unwrap_err();
        assert!(matches!(err, MusicError::Upstream(_)), "{:?}", err);
        assert!(err.to_string().contains("500"), "{}", err);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_body_is_upstream() {
        let (addr, server) = serve_once("200 OK", "not json").await;
        let client = SunoClient::new(format!("http://{}", addr), None).unwrap();
        let err = client
            .generate_by_lyric(
                "[Verse] hi".to_string(),
                "chirp-v3-5".to_string(),
                "pop".to_string(),
                "Hi".to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MusicError::Upstream(_)), "{:?}", err);
        let head = server.await.unwrap();
        assert!(head.starts_with("POST /api/custom_generate "), "{}", head);
    }

    #[tokio::test]
    async fn status_lookup_sends_ids_and_token() {
        let (addr, server) =
            serve_once("200 OK", r#"[{"id":"a","status":"complete"},{"id":"b"}]"#).await;
        let client = SunoClient::new(format!("http://{}/", addr), Some("secret".to_string())).unwrap();
        let tracks = client
            .get_status(vec!["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].status.as_deref(), Some("complete"));
        assert_eq!(tracks[1].status, None);

        let head = server.await.unwrap();
        // the comma separator is percent encoded in the query string
        assert!(head.starts_with("GET /api/get?ids=a%2Cb%2Cc HTTP/1.1"), "{}", head);
        assert!(
            head.to_lowercase().contains("authorization: bearer secret"),
            "{}",
            head
        );
    }

    #[tokio::test]
    async fn status_lookup_without_ids_skips_request() {
        // nothing listens here, a request would fail
        let client = SunoClient::new("http://127.0.0.1:1".to_string(), None).unwrap();
        assert!(client.get_status(vec![]).await.unwrap().is_empty());
    }
}
