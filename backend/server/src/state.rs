use std::sync::Arc;

use anyhow::Result;

use super::{
    channel::Hub,
    config::Config,
    database::{Database, init_database},
    menu::load_seed,
};

pub struct AppState {
    pub config: Config,
    pub database: Database,
    pub hub: Arc<Hub>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let database = init_database(&config.database_path)?;
        load_seed(&database, &config.menu_seed_path).await?;

        let hub = Hub::new(config.channel_capacity, config.max_subscribers);

        Ok(Arc::new(Self {
            config,
            database,
            hub,
        }))
    }
}
