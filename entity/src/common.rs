use num_enum::{IntoPrimitive, TryFromPrimitive};
use sea_orm::entity::prelude::*;
use serde_repr::*;

use std::fmt;

/// Progress of a music task as reported by the provider, the inner type is i32
/// 10 InProgress every new task starts here, the provider has not reported `complete` yet
/// 20 Success provider reported `complete` and the media has been re-hosted
///
/// There is no failed state, a task the provider gave up on stays in progress.
#[repr(i32)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize_repr,
    Deserialize_repr,
    EnumIter,
    DeriveActiveEnum,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum MusicStatus {
    #[sea_orm(num_value = 10)]
    InProgress = 10,
    #[sea_orm(num_value = 20)]
    Success = 20,
}

impl MusicStatus {
    /// Provider status string for a finished track
    pub const PROVIDER_COMPLETE: &'static str = "complete";

    pub fn from_provider(status: Option<&str>) -> Self {
        match status {
            Some(Self::PROVIDER_COMPLETE) => MusicStatus::Success,
            _ => MusicStatus::InProgress,
        }
    }
}

impl fmt::Display for MusicStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MusicStatus::InProgress => write!(f, "InProgress"),
            MusicStatus::Success => write!(f, "Success"),
        }
    }
}

/// How the music was requested
/// 1 Description the provider writes the lyric from a free text description
/// 2 Lyric the caller supplies the lyric, tags and title
#[repr(i32)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize_repr,
    Deserialize_repr,
    EnumIter,
    DeriveActiveEnum,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum GenerateMode {
    #[sea_orm(num_value = 1)]
    Description = 1,
    #[sea_orm(num_value = 2)]
    Lyric = 2,
}

impl fmt::Display for GenerateMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GenerateMode::Description => write!(f, "Description"),
            GenerateMode::Lyric => write!(f, "Lyric"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_status_mapping() {
        assert_eq!(MusicStatus::from_provider(Some("complete")), MusicStatus::Success);
        assert_eq!(MusicStatus::from_provider(Some("streaming")), MusicStatus::InProgress);
        assert_eq!(MusicStatus::from_provider(Some("error")), MusicStatus::InProgress);
        assert_eq!(MusicStatus::from_provider(Some("")), MusicStatus::InProgress);
        assert_eq!(MusicStatus::from_provider(Some("COMPLETE")), MusicStatus::InProgress);
        assert_eq!(MusicStatus::from_provider(None), MusicStatus::InProgress);
    }

    #[test]
    fn generate_mode_from_raw() {
        assert_eq!(GenerateMode::try_from(1).unwrap(), GenerateMode::Description);
        assert_eq!(GenerateMode::try_from(2).unwrap(), GenerateMode::Lyric);
        assert!(GenerateMode::try_from(0).is_err());
        assert!(GenerateMode::try_from(3).is_err());
    }
}
