use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::{
    memory::InMemoryStore, postgres::PgStore, AccountStore, AppointmentStore, CategoryStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: Arc<dyn AccountStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub categories: Arc<dyn CategoryStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        crate::auth::services::prepare_login();

        match config.database_url.clone() {
            Some(url) => {
                let store = PgStore::connect(&url, config.db_max_connections).await?;
                if let Err(e) = store.migrate().await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Ok(Self::with_store(config, Arc::new(store)))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
                Ok(Self::with_store(config, Arc::new(InMemoryStore::new())))
            }
        }
    }

    pub fn with_store<S>(config: Arc<AppConfig>, store: Arc<S>) -> Self
    where
        S: AccountStore + AppointmentStore + CategoryStore + 'static,
    {
        Self {
            config,
            accounts: store.clone(),
            appointments: store.clone(),
            categories: store,
        }
    }

    /// In-memory state with a fixed test configuration.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::JwtConfig;

        let config = Arc::new(AppConfig {
            database_url: None,
            db_max_connections: 1,
            jwt: JwtConfig {
                secret: "test-secret-test-secret-test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60 * 24,
            },
            host: "127.0.0.1".into(),
            port: 0,
            request_timeout_secs: 60,
            enable_global_listing: false,
        });
        Self::with_store(config, Arc::new(InMemoryStore::new()))
    }
}
