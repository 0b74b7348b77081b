use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const SEARCH_LIMIT: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct ShikimoriAnime {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub russian: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub episodes: Option<i32>,
    #[serde(default)]
    pub aired_on: Option<String>,
}

#[derive(Clone)]
pub struct ShikimoriClient {
    client: Client,
    base_url: String,
    kinds: Vec<String>,
}

impl ShikimoriClient {
    #[must_use]
    pub fn new(client: Client, base_url: &str, kinds: Vec<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            kinds,
        }
    }

    pub async fn search_anime(&self, query: &str) -> Result<Vec<ShikimoriAnime>> {
        let url = format!("{}/api/animes", self.base_url);
        let limit = SEARCH_LIMIT.to_string();
        let kinds = self.kinds.join(",");

        let mut params = vec![("search", query), ("limit", limit.as_str())];
        if !kinds.is_empty() {
            params.push(("kind", kinds.as_str()));
        }

        let response = self.client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Shikimori API error: {status} - {body}"));
        }

        let results: Vec<ShikimoriAnime> = response.json().await?;
        debug!("Shikimori returned {} results for '{}'", results.len(), query);
        Ok(results)
    }

    /// Searches for `name` and picks the best candidate.
    pub async fn find_best_match(&self, name: &str) -> Result<Option<ShikimoriAnime>> {
        let results = self.search_anime(name).await?;
        Ok(pick_best_match(name, results))
    }
}

/// An exact case-insensitive match on either name wins, otherwise the first
/// result.
#[must_use]
pub fn pick_best_match(name: &str, results: Vec<ShikimoriAnime>) -> Option<ShikimoriAnime> {
    let wanted = name.trim().to_lowercase();

    let exact = results.iter().position(|anime| {
        anime.name.to_lowercase() == wanted
            || anime
                .russian
                .as_deref()
                .is_some_and(|r| r.to_lowercase() == wanted)
    });

    let index = exact.unwrap_or(0);
    results.into_iter().nth(index)
}
