use crate::config::DEFAULT_SYNC_BATCH_SIZE;
use crate::error::{MusicError, Result};
use crate::music_rpc::db_ops::{MusicTaskRepo, ResourceRepo};
use crate::music_rpc::model::{
    GenerateRequest, MappedTrack, NewMusic, PageQuery, PageResult, Provenance,
};
use crate::provider::{LimitUsage, LyricsData, MediaFetcher, MusicProvider, ProviderTrack};
use crate::resource::ResourceOp;
use crate::utils::Base64Byte;
use entity::music_tasks::{Model as Music, Tags};
use entity::{GenerateMode, MusicStatus};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Generate, sync and re-host music produced by the provider
pub struct MusicWorkflowService {
    repo: Arc<dyn MusicTaskRepo + Send + Sync>,
    provider: Arc<dyn MusicProvider + Send + Sync>,
    fetcher: Arc<dyn MediaFetcher + Send + Sync>,
    resource: Arc<dyn ResourceOp + Send + Sync>,
    platform: String,
    sync_batch_size: usize,
}

impl MusicWorkflowService {
    pub fn new(
        repo: Arc<dyn MusicTaskRepo + Send + Sync>,
        provider: Arc<dyn MusicProvider + Send + Sync>,
        fetcher: Arc<dyn MediaFetcher + Send + Sync>,
        resource: Arc<dyn ResourceOp + Send + Sync>,
        platform: String,
    ) -> Self {
        MusicWorkflowService {
            repo,
            provider,
            fetcher,
            resource,
            platform,
            sync_batch_size: DEFAULT_SYNC_BATCH_SIZE,
        }
    }

    pub fn with_sync_batch_size(mut self, sync_batch_size: usize) -> Self {
        self.sync_batch_size = sync_batch_size.max(1);
        self
    }

    /// Ask the provider for new tracks and save one row per track. Returns the
    /// new ids in the order the provider listed the tracks.
    pub async fn generate(&self, user_id: i64, request: GenerateRequest) -> Result<Vec<i64>> {
        let mode = GenerateMode::try_from(request.generate_mode).map_err(|_| {
            MusicError::InvalidArgument(format!(
                "unknown generate mode {}",
                request.generate_mode
            ))
        })?;

        let tracks = match mode {
            GenerateMode::Lyric => {
                self.provider
                    .generate_by_lyric(
                        request.prompt,
                        request.model,
                        request.tags.join(","),
                        request.title,
                    )
                    .await?
            }
            GenerateMode::Description => {
                self.provider
                    .generate_by_description(
                        request.prompt,
                        request.model,
                        request.make_instrumental,
                    )
                    .await?
            }
        };
        if tracks.is_empty() {
            warn!("provider returned no track for user {} in {} mode", user_id, mode);
            return Ok(vec![]);
        }

        let provenance = Provenance {
            user_id,
            platform: request
                .platform
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| self.platform.clone()),
            generate_mode: mode,
        };
        let mut musics = Vec::with_capacity(tracks.len());
        for track in tracks {
            musics.push(NewMusic {
                provenance: provenance.clone(),
                track: self.map_track(track).await?,
            });
        }

        let ids = self.repo.insert_batch(musics).await?;
        info!("user {} generate {} music tasks {:?}", user_id, ids.len(), ids);
        Ok(ids)
    }

    /// Refresh every in-progress task from the provider. Returns how many
    /// tasks were in progress, whether or not their batch was refreshed.
    pub async fn sync_music(&self) -> Result<usize> {
        let in_progress = self.repo.list_by_status(MusicStatus::InProgress).await?;
        if in_progress.is_empty() {
            return Ok(0);
        }
        info!("start to sync {} music tasks from provider", in_progress.len());

        for chunk in in_progress.chunks(self.sync_batch_size) {
            let task_ids: Vec<String> = chunk.iter().map(|m| m.task_id.clone()).collect();
            let id_of: HashMap<&str, i64> =
                chunk.iter().map(|m| (m.task_id.as_str(), m.id)).collect();

            let tracks = self.provider.get_status(task_ids.clone()).await?;
            if tracks.is_empty() {
                warn!(
                    "sync music tasks fail, provider knows none of [{}]",
                    task_ids.join(",")
                );
                continue;
            }

            let mut updates = Vec::with_capacity(tracks.len());
            for track in tracks {
                let id = match id_of.get(track.id.as_str()) {
                    Some(id) => *id,
                    None => {
                        warn!("provider returned unrequested task {}, skip it", track.id);
                        continue;
                    }
                };
                if let Some(err_msg) = track.error_message.as_deref().filter(|m| !m.is_empty()) {
                    warn!("provider reports task {} error: {}", track.id, err_msg);
                }
                updates.push((id, self.map_track(track).await?));
            }
            let rows = self.repo.update_batch(updates).await?;
            debug!("sync batch of {} tasks, {} updated", chunk.len(), rows);
        }
        Ok(in_progress.len())
    }

    pub async fn update_public_status(&self, id: i64, public_status: bool) -> Result<()> {
        self.validate_exists(id).await?;
        self.repo.update_public_status(id, public_status).await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.validate_exists(id).await?;
        self.repo.delete_by_id(id).await?;
        info!("delete music task {}", id);
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Music> {
        self.validate_exists(id).await
    }

    pub async fn get_page(&self, query: PageQuery) -> Result<PageResult<Music>> {
        Ok(self.repo.list_page(query).await?)
    }

    /// Read back re-hosted media by the reference kept on a task
    pub async fn get_resource(&self, resource_id: String) -> Result<Base64Byte> {
        Ok(self.resource.get_resource_info(resource_id).await?)
    }

    pub async fn get_limit(&self) -> Result<LimitUsage> {
        self.provider.get_limit().await
    }

    pub async fn generate_lyrics(&self, prompt: String) -> Result<LyricsData> {
        if prompt.trim().is_empty() {
            return Err(MusicError::InvalidArgument("empty lyrics prompt".to_string()));
        }
        self.provider.generate_lyrics(prompt).await
    }

    async fn validate_exists(&self, id: i64) -> Result<Music> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(MusicError::NotFound(id))
    }

    async fn map_track(&self, track: ProviderTrack) -> Result<MappedTrack> {
        let audio_url = self.materialize(track.audio_url.as_deref()).await?;
        let video_url = self.materialize(track.video_url.as_deref()).await?;
        let image_url = self.materialize(track.image_url.as_deref()).await?;
        Ok(MappedTrack {
            status: MusicStatus::from_provider(track.status.as_deref()),
            tags: Tags::parse(track.tags.as_deref()),
            task_id: track.id,
            model: track.model_name.unwrap_or_default(),
            prompt: track.prompt.unwrap_or_default(),
            description_prompt: track.gpt_description_prompt.unwrap_or_default(),
            title: track.title.unwrap_or_default(),
            lyric: track.lyric.unwrap_or_default(),
            audio_url,
            video_url,
            image_url,
        })
    }

    /// Copy a provider hosted file into the internal store. Blank urls have
    /// nothing to copy.
    async fn materialize(&self, url: Option<&str>) -> Result<Option<String>> {
        let url = match url {
            Some(url) if !url.trim().is_empty() => url,
            _ => return Ok(None),
        };
        let data = self.fetcher.download(url).await?;
        let reference = self
            .resource
            .store(data)
            .await
            .map_err(|e| MusicError::Transport(format!("store media of {}: {}", url, e)))?;
        debug!("re-host {} as {}", url, reference);
        Ok(Some(reference))
    }
}
