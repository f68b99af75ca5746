use sea_orm_migration::prelude::*;

use entity::music_tasks as MusicTasks;
use log::warn;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240601_000002_create_index"
    }
}

const INDEXES: &[(&str, &[MusicTasks::Column])] = &[
    ("music_tasks_status", &[MusicTasks::Column::Status]),
    ("music_tasks_user_id", &[MusicTasks::Column::UserId]),
    (
        "music_tasks_userid_status",
        &[MusicTasks::Column::UserId, MusicTasks::Column::Status],
    ),
    ("music_tasks_public_status", &[MusicTasks::Column::PublicStatus]),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, cols) in INDEXES {
            let mut index = Index::create();
            index.table(MusicTasks::Entity).name(*name);
            for col in cols.iter() {
                index.col(*col);
            }
            manager.create_index(index.take()).await.ignore_exist()?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, _) in INDEXES {
            manager
                .drop_index(Index::drop().table(MusicTasks::Entity).name(*name).to_owned())
                .await?;
        }
        Ok(())
    }
}

trait IgnoreExistDbResult {
    fn ignore_exist(self) -> Result<(), DbErr>;
}

impl IgnoreExistDbResult for Result<(), DbErr> {
    fn ignore_exist(self) -> Result<(), DbErr> {
        match self {
            Err(e) => {
                let e_str = e.to_string();
                if e_str.contains("Duplicate key name") || e_str.contains("already exists") {
                    warn!("ignore duplicate index {}", e_str);
                    Ok(())
                } else {
                    Err(e)
                }
            }
            _ => Ok(()),
        }
    }
}
