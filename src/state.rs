use crate::{
    auth::TokenIssuer,
    config::AppConfig,
    db::DbPool,
    fetchers::Fetch,
    store::OrmStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: OrmStore,
    pub pool: DbPool,
    pub issuer: TokenIssuer,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: OrmStore, pool: DbPool, config: AppConfig) -> Self {
        let issuer = TokenIssuer::new(config.jwt_secret.clone(), config.session_ttl_hours);
        Self {
            store,
            pool,
            issuer,
            config,
        }
    }

    pub fn fetch(&self) -> Fetch<'_, OrmStore> {
        Fetch::new(&self.store, self.config.join_strategy)
    }
}
