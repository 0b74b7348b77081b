use std::sync::Arc;

use crate::clients::google::GoogleClient;
use crate::clients::shikimori::ShikimoriClient;
use crate::config::Settings;
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService, SeaOrmTitleService, TitleService};

const HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused by every outbound client so connections are pooled.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("anilink/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub settings: Arc<Settings>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub title_service: Arc<dyn TitleService>,
}

impl SharedState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &settings.database_url()?,
            settings.max_db_connections,
            settings.min_db_connections,
        )
        .await?;

        Self::with_store(settings, store)
    }

    /// Wires services around an already connected store.
    pub fn with_store(settings: Settings, store: Store) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);
        let http_client = build_shared_http_client(HTTP_TIMEOUT_SECONDS)?;

        let shikimori = ShikimoriClient::new(
            http_client.clone(),
            &settings.shikimori_base_url,
            settings.shikimori_kinds.clone(),
        );
        let google = GoogleClient::new(
            http_client,
            &settings.google_tokeninfo_url,
            &settings.google_client_id,
        );

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            settings.clone(),
            google,
        )) as Arc<dyn AuthService>;

        let title_service = Arc::new(SeaOrmTitleService::new(
            store.clone(),
            settings.clone(),
            shikimori,
        )) as Arc<dyn TitleService>;

        Ok(Self {
            settings,
            store,
            auth_service,
            title_service,
        })
    }
}
