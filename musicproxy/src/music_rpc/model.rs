use chrono::Utc;
use entity::music_tasks as MusicTasks;
use entity::music_tasks::Tags;
use entity::{GenerateMode, MusicStatus};
use sea_orm::ActiveValue::{NotSet, Set};
use serde::{Deserialize, Serialize};

/// Request of `Music.Generate`. `generate_mode` stays a raw number so an
/// unknown mode reaches the workflow and is rejected there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Falls back to the configured platform when absent
    #[serde(default)]
    pub platform: Option<String>,
    pub generate_mode: i32,
    pub prompt: String,
    pub model: String,
    /// Lyric mode only
    #[serde(default)]
    pub tags: Vec<String>,
    /// Lyric mode only
    #[serde(default)]
    pub title: String,
    /// Description mode only
    #[serde(default)]
    pub make_instrumental: bool,
}

/// Everything the provider tells us about one track, with the media already
/// re-hosted. Built in one go from a provider track.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedTrack {
    pub task_id: String,
    pub model: String,
    pub prompt: String,
    pub description_prompt: String,
    pub title: String,
    pub lyric: String,
    pub tags: Tags,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub status: MusicStatus,
}

/// Who asked for a generation, stamped on every track it returned
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub user_id: i64,
    pub platform: String,
    pub generate_mode: GenerateMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMusic {
    pub provenance: Provenance,
    pub track: MappedTrack,
}

impl NewMusic {
    pub fn into_active_model(self) -> MusicTasks::ActiveModel {
        let now = Utc::now().timestamp();
        let NewMusic { provenance, track } = self;
        MusicTasks::ActiveModel {
            id: NotSet,
            task_id: Set(track.task_id),
            user_id: Set(provenance.user_id),
            platform: Set(provenance.platform),
            generate_mode: Set(provenance.generate_mode),
            model: Set(track.model),
            prompt: Set(track.prompt),
            description_prompt: Set(track.description_prompt),
            title: Set(track.title),
            lyric: Set(track.lyric),
            tags: Set(track.tags),
            audio_url: Set(track.audio_url),
            video_url: Set(track.video_url),
            image_url: Set(track.image_url),
            status: Set(track.status),
            public_status: Set(false),
            create_at: Set(now),
            update_at: Set(now),
        }
    }
}

/// Filters of `Music.GetPage`, `page_no` starts at 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default = "default_page_no")]
    pub page_no: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<MusicStatus>,
    #[serde(default)]
    pub generate_mode: Option<GenerateMode>,
    #[serde(default)]
    pub public_status: Option<bool>,
}

fn default_page_no() -> u64 {
    1
}

fn default_page_size() -> u64 {
    10
}

pub const MAX_PAGE_SIZE: u64 = 100;

impl PageQuery {
    /// Zero based page index and page size. The size is capped at
    /// [`MAX_PAGE_SIZE`] and the index so that the row offset fits in an i64.
    pub fn page_window(&self) -> (u64, u64) {
        let page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        let last_page = i64::MAX as u64 / page_size;
        (self.page_no.clamp(1, last_page) - 1, page_size)
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        PageQuery {
            page_no: default_page_no(),
            page_size: default_page_size(),
            user_id: None,
            title: None,
            status: None,
            generate_mode: None,
            public_status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub list: Vec<T>,
    pub total: u64,
}
