use crate::{GenerateMode, MusicStatus};
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Ordered style tags of a track, saved as a json array
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Tags(pub Vec<String>);

impl Tags {
    /// Split the provider's comma separated tag string, pieces are kept verbatim
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if !s.is_empty() => Tags(s.split(',').map(|t| t.to_string()).collect()),
            _ => Tags::default(),
        }
    }
}

// One generated track. `task_id` is the provider's id, `id` is ours.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "music_tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub task_id: String,
    pub user_id: i64,
    pub platform: String,
    pub generate_mode: GenerateMode,
    pub model: String,
    #[sea_orm(column_type = "Text")]
    pub prompt: String,
    #[sea_orm(column_type = "Text")]
    pub description_prompt: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub lyric: String,
    #[sea_orm(column_type = "Json")]
    pub tags: Tags,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub status: MusicStatus,
    pub public_status: bool,
    pub create_at: i64,
    pub update_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags_keeps_order_and_pieces() {
        assert_eq!(
            Tags::parse(Some("pop,rock, lofi")),
            Tags(vec!["pop".to_string(), "rock".to_string(), " lofi".to_string()])
        );
        assert_eq!(Tags::parse(Some("solo")), Tags(vec!["solo".to_string()]));
        assert_eq!(Tags::parse(Some("")), Tags::default());
        assert_eq!(Tags::parse(None), Tags::default());
    }

    #[test]
    fn tags_as_json_array() {
        let tags = Tags::parse(Some("pop,rock"));
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["pop","rock"]"#);
    }
}
