use sea_orm_migration::prelude::*;

use entity::music_tasks as MusicTasks;
use entity::resource_info as ResourceInfos;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240601_000001_create_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ResourceInfos::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourceInfos::Column::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ResourceInfos::Column::Data)
                            .custom(Alias::new("longblob"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourceInfos::Column::CreateAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MusicTasks::Entity)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MusicTasks::Column::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MusicTasks::Column::TaskId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(MusicTasks::Column::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MusicTasks::Column::Platform).string().not_null())
                    .col(
                        ColumnDef::new(MusicTasks::Column::GenerateMode)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MusicTasks::Column::Model).string().not_null())
                    .col(ColumnDef::new(MusicTasks::Column::Prompt).text().not_null())
                    .col(
                        ColumnDef::new(MusicTasks::Column::DescriptionPrompt)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MusicTasks::Column::Title).string().not_null())
                    .col(ColumnDef::new(MusicTasks::Column::Lyric).text().not_null())
                    .col(ColumnDef::new(MusicTasks::Column::Tags).json().not_null())
                    .col(ColumnDef::new(MusicTasks::Column::AudioUrl).string().null())
                    .col(ColumnDef::new(MusicTasks::Column::VideoUrl).string().null())
                    .col(ColumnDef::new(MusicTasks::Column::ImageUrl).string().null())
                    .col(ColumnDef::new(MusicTasks::Column::Status).integer().not_null())
                    .col(
                        ColumnDef::new(MusicTasks::Column::PublicStatus)
                            .boolean()
                            .default(false)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MusicTasks::Column::CreateAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MusicTasks::Column::UpdateAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MusicTasks::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ResourceInfos::Entity).to_owned())
            .await
    }
}
