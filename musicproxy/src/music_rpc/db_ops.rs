use entity::music_tasks as MusicTasks;
use entity::resource_info as ResourceInfos;
use MusicTasks::Model as Music;
use ResourceInfos::Model as ResourceInfo;

use crate::music_rpc::model::{MappedTrack, NewMusic, PageQuery, PageResult};
use crate::utils::*;
use anyhow::Result;
use chrono::Utc;
use entity::MusicStatus;
use log::debug;

use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, Order};
use sea_orm::ActiveValue::Set;
use sea_orm::{DatabaseConnection, PaginatorTrait, QueryOrder, TransactionTrait};

/// Persist re-hosted media, the id is chosen by the caller
#[async_trait]
pub trait ResourceRepo {
    async fn has_resource(&self, resource_id: String) -> Result<bool>;
    async fn get_resource_info(&self, resource_id: String) -> Result<Base64Byte>;
    async fn store_resource_info(&self, resource_id: String, resource: Vec<u8>) -> Result<String>;
}

#[async_trait]
pub trait MusicTaskRepo {
    /// Insert all rows in one transaction, ids come back in input order
    async fn insert_batch(&self, musics: Vec<NewMusic>) -> Result<Vec<i64>>;
    /// Refresh the provider side fields of in-progress rows, returns the rows touched
    async fn update_batch(&self, updates: Vec<(i64, MappedTrack)>) -> Result<u64>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Music>>;
    async fn list_by_status(&self, status: MusicStatus) -> Result<Vec<Music>>;
    async fn list_page(&self, query: PageQuery) -> Result<PageResult<Music>>;
    async fn update_public_status(&self, id: i64, public_status: bool) -> Result<()>;
    async fn delete_by_id(&self, id: i64) -> Result<()>;
}

pub struct DbOpsImpl {
    conn: DatabaseConnection,
}

impl DbOpsImpl {
    pub fn new(conn: DatabaseConnection) -> Self {
        DbOpsImpl { conn }
    }
}

#[async_trait]
impl MusicTaskRepo for DbOpsImpl {
    async fn insert_batch(&self, musics: Vec<NewMusic>) -> Result<Vec<i64>> {
        self.conn
            .transaction::<_, Vec<i64>, DbErr>(|txn| {
                Box::pin(async move {
                    let mut ids = Vec::with_capacity(musics.len());
                    for music in musics {
                        let inserted = music.into_active_model().insert(txn).await?;
                        ids.push(inserted.id);
                    }
                    Ok(ids)
                })
            })
            .await
            .anyhow()
    }

    async fn update_batch(&self, updates: Vec<(i64, MappedTrack)>) -> Result<u64> {
        let now = Utc::now().timestamp();
        self.conn
            .transaction::<_, u64, DbErr>(|txn| {
                Box::pin(async move {
                    let mut rows = 0;
                    for (id, track) in updates {
                        // a finished row is never rewritten
                        let result = MusicTasks::Entity::update_many()
                            .col_expr(MusicTasks::Column::Model, Expr::value(track.model))
                            .col_expr(MusicTasks::Column::Prompt, Expr::value(track.prompt))
                            .col_expr(
                                MusicTasks::Column::DescriptionPrompt,
                                Expr::value(track.description_prompt),
                            )
                            .col_expr(MusicTasks::Column::Title, Expr::value(track.title))
                            .col_expr(MusicTasks::Column::Lyric, Expr::value(track.lyric))
                            .col_expr(MusicTasks::Column::Tags, Expr::value(track.tags))
                            .col_expr(MusicTasks::Column::AudioUrl, Expr::value(track.audio_url))
                            .col_expr(MusicTasks::Column::VideoUrl, Expr::value(track.video_url))
                            .col_expr(MusicTasks::Column::ImageUrl, Expr::value(track.image_url))
                            .col_expr(MusicTasks::Column::Status, Expr::value(track.status))
                            .col_expr(MusicTasks::Column::UpdateAt, Expr::value(now))
                            .filter(MusicTasks::Column::Id.eq(id))
                            .filter(MusicTasks::Column::Status.eq(MusicStatus::InProgress))
                            .exec(txn)
                            .await?;
                        rows += result.rows_affected;
                    }
                    Ok(rows)
                })
            })
            .await
            .map(|rows| {
                debug!("update {} music tasks from provider", rows);
                rows
            })
            .anyhow()
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Music>> {
        MusicTasks::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .anyhow()
    }

    async fn list_by_status(&self, status: MusicStatus) -> Result<Vec<Music>> {
        MusicTasks::Entity::find()
            .filter(MusicTasks::Column::Status.eq(status))
            .order_by(MusicTasks::Column::Id, Order::Asc)
            .all(&self.conn)
            .await
            .anyhow()
    }

    async fn list_page(&self, page: PageQuery) -> Result<PageResult<Music>> {
        let (page_index, page_size) = page.page_window();
        let mut query = MusicTasks::Entity::find();
        if let Some(user_id) = page.user_id {
            query = query.filter(MusicTasks::Column::UserId.eq(user_id));
        }
        if let Some(title) = page.title.filter(|t| !t.is_empty()) {
            query = query.filter(MusicTasks::Column::Title.contains(title.as_str()));
        }
        if let Some(status) = page.status {
            query = query.filter(MusicTasks::Column::Status.eq(status));
        }
        if let Some(generate_mode) = page.generate_mode {
            query = query.filter(MusicTasks::Column::GenerateMode.eq(generate_mode));
        }
        if let Some(public_status) = page.public_status {
            query = query.filter(MusicTasks::Column::PublicStatus.eq(public_status));
        }

        let paginator = query
            .order_by(MusicTasks::Column::Id, Order::Desc)
            .paginate(&self.conn, page_size);
        let total = paginator.num_items().await?;
        let list = paginator.fetch_page(page_index).await?;
        Ok(PageResult { list, total })
    }

    async fn update_public_status(&self, id: i64, public_status: bool) -> Result<()> {
        MusicTasks::Entity::update_many()
            .col_expr(MusicTasks::Column::PublicStatus, Expr::value(public_status))
            .col_expr(
                MusicTasks::Column::UpdateAt,
                Expr::value(Utc::now().timestamp()),
            )
            .filter(MusicTasks::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .map(|_| ())
            .anyhow()
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        MusicTasks::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map(|_| ())
            .anyhow()
    }
}

#[async_trait]
impl ResourceRepo for DbOpsImpl {
    async fn has_resource(&self, resource_id: String) -> Result<bool> {
        ResourceInfos::Entity::find()
            .filter(ResourceInfos::Column::Id.eq(resource_id))
            .count(&self.conn)
            .await
            .map(|count| count > 0)
            .anyhow()
    }

    async fn get_resource_info(&self, resource_id: String) -> Result<Base64Byte> {
        ResourceInfos::Entity::find()
            .filter(ResourceInfos::Column::Id.eq(resource_id.clone()))
            .one(&self.conn)
            .await?
            .if_not_found(format!("resource {}", resource_id))
            .map(|val: ResourceInfo| Base64Byte::new(val.data))
    }

    async fn store_resource_info(&self, resource_id: String, resource: Vec<u8>) -> Result<String> {
        let resource_info = ResourceInfos::ActiveModel {
            id: Set(resource_id.clone()),
            data: Set(resource),
            create_at: Set(Utc::now().timestamp()),
        };

        resource_info
            .insert(&self.conn)
            .await
            .map(|_| resource_id)
            .anyhow()
    }
}
