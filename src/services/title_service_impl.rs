//! `SeaORM` implementation of the `TitleService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::shikimori::ShikimoriClient;
use crate::config::Settings;
use crate::db::Store;
use crate::entities::{episodes, titles};
use crate::models::episode::ParsedEpisode;
use crate::models::title::{LinkParsedTitle, NewTitle, ParsedTitle};
use crate::services::title_service::{SyncSummary, TitleDetails, TitleError, TitleService};

pub struct SeaOrmTitleService {
    store: Store,
    settings: Arc<Settings>,
    shikimori: ShikimoriClient,
}

impl SeaOrmTitleService {
    #[must_use]
    pub const fn new(store: Store, settings: Arc<Settings>, shikimori: ShikimoriClient) -> Self {
        Self {
            store,
            settings,
            shikimori,
        }
    }

    async fn require_title(&self, title_id: Uuid) -> Result<titles::Model, TitleError> {
        self.store
            .titles()
            .get_title_by_id(title_id)
            .await?
            .ok_or_else(|| TitleError::NotFound(title_id.to_string()))
    }

    async fn require_parser(&self, parser_id: &str) -> Result<(), TitleError> {
        if self.store.parsers().get(parser_id).await?.is_none() {
            return Err(TitleError::ParserNotFound(parser_id.to_string()));
        }
        Ok(())
    }
}

/// Whether a stored Shikimori lookup has to be repeated.
#[must_use]
pub fn shikimori_lookup_expired(
    title: &titles::Model,
    expiration_hours: u32,
    now: DateTime<Utc>,
) -> bool {
    if !title.shikimori_fetched {
        return true;
    }
    match title.shikimori_fetched_at {
        Some(fetched_at) => now - fetched_at >= Duration::hours(i64::from(expiration_hours)),
        None => true,
    }
}

/// Rejects a whole batch before anything is written.
fn validate_parsed_titles(parsed: &[ParsedTitle]) -> Result<(), TitleError> {
    if let Some(pos) = parsed
        .iter()
        .position(|t| t.id_on_website.trim().is_empty() || t.name.trim().is_empty())
    {
        return Err(TitleError::InvalidData(format!(
            "Title #{} needs a website id and a name",
            pos + 1
        )));
    }
    Ok(())
}

fn validate_parsed_episodes(parsed: &[ParsedEpisode]) -> Result<(), TitleError> {
    if let Some(pos) = parsed.iter().position(|e| e.id_on_website.trim().is_empty()) {
        return Err(TitleError::InvalidData(format!(
            "Episode #{} needs a website id",
            pos + 1
        )));
    }
    Ok(())
}

/// English name when present, the primary name otherwise.
fn search_name(title: &titles::Model) -> &str {
    title
        .en_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&title.name)
}

#[async_trait]
impl TitleService for SeaOrmTitleService {
    async fn sync_parser_titles(
        &self,
        parser_id: &str,
        parsed: Vec<ParsedTitle>,
    ) -> Result<SyncSummary, TitleError> {
        self.require_parser(parser_id).await?;
        validate_parsed_titles(&parsed)?;

        let repo = self.store.titles();
        let genre_repo = self.store.genres();
        let mut summary = SyncSummary::default();

        for item in parsed {
            let title = match repo
                .get_title_by_website_id(&item.id_on_website, parser_id)
                .await?
            {
                Some(existing) => {
                    summary.updated += 1;
                    repo.update_title(existing, &item).await?
                }
                None => {
                    summary.created += 1;
                    repo.create_title(NewTitle::from(&item), parser_id).await?
                }
            };

            let genres = genre_repo.get_or_create_by_names(&item.genres).await?;
            let genre_ids: Vec<Uuid> = genres.iter().map(|g| g.id).collect();
            genre_repo.set_title_genres(title.id, &genre_ids).await?;

            summary.titles.push(title);
        }

        info!(
            parser = parser_id,
            created = summary.created,
            updated = summary.updated,
            "Parser titles synced"
        );
        metrics::counter!("titles_synced_total").increment(summary.titles.len() as u64);

        Ok(summary)
    }

    async fn link_titles(
        &self,
        title_id: Uuid,
        link: LinkParsedTitle,
    ) -> Result<Vec<titles::Model>, TitleError> {
        let title = self.require_title(title_id).await?;
        self.require_parser(&link.parser_id).await?;

        let repo = self.store.titles();

        let other = match repo
            .get_title_by_website_id(&link.id_on_website, &link.parser_id)
            .await?
        {
            Some(existing) => existing,
            None => {
                repo.create_title(NewTitle::from(&link), &link.parser_id)
                    .await?
            }
        };

        if other.id == title.id {
            return Err(TitleError::InvalidData(
                "A title cannot be linked to itself".to_string(),
            ));
        }

        let own_link = repo.get_related_link_by_title_id(title.id).await?;
        let other_link = repo.get_related_link_by_title_id(other.id).await?;

        let link_id = match (own_link, other_link) {
            (Some(own), Some(theirs)) => {
                if own.id != theirs.id {
                    repo.merge_related_links(own.id, theirs.id).await?;
                }
                own.id
            }
            (Some(own), None) => own.id,
            (None, Some(theirs)) => theirs.id,
            (None, None) => repo.create_related_link().await?.id,
        };

        for id in [title.id, other.id] {
            if repo.get_related_title(id, link_id).await?.is_none() {
                repo.create_related_title(id, link_id).await?;
            }
        }

        debug!(title_id = %title.id, other_id = %other.id, link_id = %link_id, "Titles linked");

        Ok(repo.get_related_titles_by_title_id(title.id).await?)
    }

    async fn set_shikimori_id(
        &self,
        title_id: Uuid,
        shikimori_id: i64,
    ) -> Result<titles::Model, TitleError> {
        if shikimori_id <= 0 {
            return Err(TitleError::InvalidData(
                "Shikimori id must be positive".to_string(),
            ));
        }

        let title = self.require_title(title_id).await?;
        Ok(self
            .store
            .titles()
            .update_shikimori_info(title, shikimori_id)
            .await?)
    }

    async fn refresh_shikimori(
        &self,
        title_id: Uuid,
        force: bool,
    ) -> Result<titles::Model, TitleError> {
        let title = self.require_title(title_id).await?;

        if !force
            && !shikimori_lookup_expired(&title, self.settings.shikimori_expiration_hours, Utc::now())
        {
            debug!(title_id = %title.id, "Shikimori lookup still fresh");
            return Ok(title);
        }

        let name = search_name(&title).to_string();
        metrics::counter!("shikimori_lookups_total").increment(1);

        let found = self
            .shikimori
            .find_best_match(&name)
            .await
            .map_err(|e| {
                warn!(title_id = %title.id, error = %e, "Shikimori lookup failed");
                TitleError::shikimori_error(e.to_string())
            })?;

        let repo = self.store.titles();
        let updated = match found {
            Some(anime) => {
                info!(title_id = %title.id, shikimori_id = anime.id, "Matched '{}' on Shikimori", name);
                repo.update_shikimori_info(title, anime.id).await?
            }
            None => {
                info!(title_id = %title.id, "No Shikimori match for '{}'", name);
                repo.mark_shikimori_fetched(title).await?
            }
        };

        Ok(updated)
    }

    async fn title_details(
        &self,
        title_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<TitleDetails, TitleError> {
        let title = self.require_title(title_id).await?;
        let repo = self.store.titles();

        let genres = self.store.genres().get_genres_by_title_id(title.id).await?;
        let related = repo.get_related_titles_by_title_id(title.id).await?;
        let other_parsers = repo.get_title_on_other_parsers(&title).await?;
        let is_favorite = match user_id {
            Some(user_id) => repo.title_is_favorite(title.id, user_id).await?,
            None => false,
        };

        Ok(TitleDetails {
            title,
            genres,
            related,
            other_parsers,
            is_favorite,
        })
    }

    async fn sync_episodes(
        &self,
        parser_id: &str,
        website_id: &str,
        parsed: Vec<ParsedEpisode>,
    ) -> Result<Vec<episodes::Model>, TitleError> {
        let title = self
            .store
            .titles()
            .get_title_by_website_id(website_id, parser_id)
            .await?
            .ok_or_else(|| TitleError::NotFound(format!("{parser_id}/{website_id}")))?;

        validate_parsed_episodes(&parsed)?;

        let repo = self.store.episodes();
        for item in &parsed {
            match repo.get_by_website_id(title.id, &item.id_on_website).await? {
                Some(existing) => {
                    repo.update(existing, item).await?;
                }
                None => {
                    repo.create(title.id, item).await?;
                }
            }
        }

        info!(title_id = %title.id, count = parsed.len(), "Episodes synced");

        Ok(repo.list_by_title_id(title.id).await?)
    }
}
