use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::User;
use crate::entities::{episode_progress, episodes, files, genres, messages, parsers, titles};
use crate::services::TitleDetails;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TitleDto {
    pub id: Uuid,
    pub id_on_website: String,
    pub parser_id: String,
    pub name: String,
    pub en_name: Option<String>,
    pub image_url: Option<String>,
    pub shikimori_id: Option<i64>,
    pub shikimori_fetched: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<titles::Model> for TitleDto {
    fn from(model: titles::Model) -> Self {
        Self {
            id: model.id,
            id_on_website: model.id_on_website,
            parser_id: model.parser_id,
            name: model.name,
            en_name: model.en_name,
            image_url: model.image_url,
            shikimori_id: model.shikimori_id,
            shikimori_fetched: model.shikimori_fetched,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TitleDetailsDto {
    #[serde(flatten)]
    pub title: TitleDto,
    pub genres: Vec<GenreDto>,
    pub related: Vec<TitleDto>,
    pub other_parsers: Vec<TitleDto>,
    pub is_favorite: bool,
}

impl From<TitleDetails> for TitleDetailsDto {
    fn from(details: TitleDetails) -> Self {
        Self {
            title: details.title.into(),
            genres: details.genres.into_iter().map(GenreDto::from).collect(),
            related: details.related.into_iter().map(TitleDto::from).collect(),
            other_parsers: details
                .other_parsers
                .into_iter()
                .map(TitleDto::from)
                .collect(),
            is_favorite: details.is_favorite,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenreDto {
    pub id: Uuid,
    pub name: String,
}

impl From<genres::Model> for GenreDto {
    fn from(model: genres::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EpisodeDto {
    pub id: Uuid,
    pub title_id: Uuid,
    pub id_on_website: String,
    pub name: String,
    pub number: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl From<episodes::Model> for EpisodeDto {
    fn from(model: episodes::Model) -> Self {
        Self {
            id: model.id,
            title_id: model.title_id,
            id_on_website: model.id_on_website,
            name: model.name,
            number: model.number,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressDto {
    pub episode_id: Uuid,
    pub seconds: f64,
    pub completed: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProgressDto {
    /// Progress of an episode the user never started.
    #[must_use]
    pub const fn empty(episode_id: Uuid) -> Self {
        Self {
            episode_id,
            seconds: 0.0,
            completed: false,
            updated_at: None,
        }
    }
}

impl From<episode_progress::Model> for ProgressDto {
    fn from(model: episode_progress::Model) -> Self {
        Self {
            episode_id: model.episode_id,
            seconds: model.seconds,
            completed: model.completed,
            updated_at: Some(model.updated_at),
        }
    }
}

/// A user as seen by the user themselves or a superuser.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            is_superuser: user.is_superuser,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// A user as seen by everyone else.
#[derive(Debug, Serialize)]
pub struct PublicUserDto {
    pub id: Uuid,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<User> for PublicUserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserDto,
    pub api_key: String,
}

impl From<User> for AuthResponse {
    fn from(user: User) -> Self {
        let api_key = user.api_key.clone();
        Self {
            user: user.into(),
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ParserDto {
    pub id: String,
    pub name: String,
    pub base_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<parsers::Model> for ParserDto {
    fn from(model: parsers::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            base_url: model.base_url,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<files::Model> for FileDto {
    fn from(model: files::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            filename: model.filename,
            content_type: model.content_type,
            size: model.size,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<messages::Model> for MessageDto {
    fn from(model: messages::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title_id: model.title_id,
            text: model.text,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CountDto {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct FavoriteDto {
    pub title_id: Uuid,
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct SyncResultDto {
    pub created: usize,
    pub updated: usize,
    pub titles: Vec<TitleDto>,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct DeletedDto {
    pub deleted: bool,
}

/// `?page=&page_size=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}
