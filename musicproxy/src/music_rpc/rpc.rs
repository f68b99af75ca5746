use crate::music_rpc::model::{GenerateRequest, PageQuery, PageResult};
use crate::music_rpc::service::MusicWorkflowService;
use crate::provider::{LimitUsage, LyricsData};
use crate::utils::{Base64Byte, IntoAnyhow, IntoJsonRpcResult};
use anyhow::Result;
use entity::music_tasks::Model as Music;
use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::http_server::{HttpServerBuilder, HttpServerHandle};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;

pub const ONE_GIB: u32 = 1024 * 1024 * 1024;

#[rpc(server, client)]
pub trait MusicRpc {
    #[method(name = "Music.Generate")]
    async fn generate(&self, user_id: i64, request: GenerateRequest) -> RpcResult<Vec<i64>>;

    #[method(name = "Music.Sync")]
    async fn sync(&self) -> RpcResult<usize>;

    #[method(name = "Music.UpdatePublicStatus")]
    async fn update_public_status(&self, id: i64, public_status: bool) -> RpcResult<bool>;

    #[method(name = "Music.Delete")]
    async fn delete(&self, id: i64) -> RpcResult<bool>;

    #[method(name = "Music.Get")]
    async fn get(&self, id: i64) -> RpcResult<Music>;

    #[method(name = "Music.GetPage")]
    async fn get_page(&self, query: PageQuery) -> RpcResult<PageResult<Music>>;

    #[method(name = "Music.GetResource")]
    async fn get_resource(&self, resource_id: String) -> RpcResult<Base64Byte>;

    #[method(name = "Music.GetLimit")]
    async fn get_limit(&self) -> RpcResult<LimitUsage>;

    #[method(name = "Music.GenerateLyrics")]
    async fn generate_lyrics(&self, prompt: String) -> RpcResult<LyricsData>;
}

pub struct MusicImpl {
    service: Arc<MusicWorkflowService>,
}

#[async_trait]
impl MusicRpcServer for MusicImpl {
    /// Generate music for a user, returns the ids of the new tasks
    async fn generate(&self, user_id: i64, request: GenerateRequest) -> RpcResult<Vec<i64>> {
        self.service
            .generate(user_id, request)
            .await
            .internal_call_error()
    }

    /// Sync in-progress tasks now instead of waiting for the syncer
    async fn sync(&self) -> RpcResult<usize> {
        self.service.sync_music().await.internal_call_error()
    }

    async fn update_public_status(&self, id: i64, public_status: bool) -> RpcResult<bool> {
        self.service
            .update_public_status(id, public_status)
            .await
            .map(|_| true)
            .internal_call_error()
    }

    async fn delete(&self, id: i64) -> RpcResult<bool> {
        self.service.delete(id).await.map(|_| true).internal_call_error()
    }

    async fn get(&self, id: i64) -> RpcResult<Music> {
        self.service.get(id).await.internal_call_error()
    }

    async fn get_page(&self, query: PageQuery) -> RpcResult<PageResult<Music>> {
        self.service.get_page(query).await.internal_call_error()
    }

    /// Get re-hosted media by the reference stored on a task
    async fn get_resource(&self, resource_id: String) -> RpcResult<Base64Byte> {
        self.service
            .get_resource(resource_id)
            .await
            .internal_call_error()
    }

    async fn get_limit(&self) -> RpcResult<LimitUsage> {
        self.service.get_limit().await.internal_call_error()
    }

    async fn generate_lyrics(&self, prompt: String) -> RpcResult<LyricsData> {
        self.service
            .generate_lyrics(prompt)
            .await
            .internal_call_error()
    }
}

/// new music api impl and get rpc module
pub fn register(service: Arc<MusicWorkflowService>) -> RpcModule<MusicImpl> {
    MusicImpl { service }.into_rpc()
}

pub fn start_api(url: &str, module: RpcModule<MusicImpl>) -> Result<(SocketAddr, HttpServerHandle)> {
    let server = HttpServerBuilder::default()
        .max_request_body_size(ONE_GIB)
        .build(url.parse::<SocketAddr>()?)?;

    let addr = server.local_addr()?;
    let server_handle = server.start(module)?;

    Ok((addr, server_handle))
}

/// get music api by url, a bare `host:port` is taken as http
pub async fn get_music_api(url: String) -> Result<WrapClient> {
    let url = if url.contains("://") {
        url
    } else {
        format!("http://{}", url)
    };
    HttpClientBuilder::default()
        .max_request_body_size(ONE_GIB)
        .build(url.as_str())
        .map(|val| WrapClient { client: val })
        .anyhow()
}

/// WrapClient for rpc error, convert RpcResult to anyhow Result
pub struct WrapClient {
    client: HttpClient,
}

#[async_trait]
pub trait MusicServiceRpcClient {
    async fn generate(&self, user_id: i64, request: GenerateRequest) -> Result<Vec<i64>>;
    async fn sync(&self) -> Result<usize>;
    async fn update_public_status(&self, id: i64, public_status: bool) -> Result<bool>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn get(&self, id: i64) -> Result<Music>;
    async fn get_page(&self, query: PageQuery) -> Result<PageResult<Music>>;
    async fn get_resource(&self, resource_id: String) -> Result<Base64Byte>;
    async fn get_limit(&self) -> Result<LimitUsage>;
    async fn generate_lyrics(&self, prompt: String) -> Result<LyricsData>;
}

#[async_trait]
impl MusicServiceRpcClient for WrapClient {
    async fn generate(&self, user_id: i64, request: GenerateRequest) -> Result<Vec<i64>> {
        MusicRpcClient::generate(&self.client, user_id, request)
            .await
            .anyhow()
    }

    async fn sync(&self) -> Result<usize> {
        MusicRpcClient::sync(&self.client).await.anyhow()
    }

    async fn update_public_status(&self, id: i64, public_status: bool) -> Result<bool> {
        MusicRpcClient::update_public_status(&self.client, id, public_status)
            .await
            .anyhow()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        MusicRpcClient::delete(&self.client, id).await.anyhow()
    }

    async fn get(&self, id: i64) -> Result<Music> {
        MusicRpcClient::get(&self.client, id).await.anyhow()
    }

    async fn get_page(&self, query: PageQuery) -> Result<PageResult<Music>> {
        MusicRpcClient::get_page(&self.client, query).await.anyhow()
    }

    async fn get_resource(&self, resource_id: String) -> Result<Base64Byte> {
        MusicRpcClient::get_resource(&self.client, resource_id)
            .await
            .anyhow()
    }

    async fn get_limit(&self) -> Result<LimitUsage> {
        MusicRpcClient::get_limit(&self.client).await.anyhow()
    }

    async fn generate_lyrics(&self, prompt: String) -> Result<LyricsData> {
        MusicRpcClient::generate_lyrics(&self.client, prompt)
            .await
            .anyhow()
    }
}
