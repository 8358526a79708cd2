use std::{path::PathBuf, sync::Arc};

use crate::{
    config::{AppConfig, RelayMode},
    platform::SessionFactory,
    service::PostFetcher,
};

/// Shared by every request. Holds configuration and the session factory only.
#[derive(Clone)]
pub struct AppState {
    pub mode: RelayMode,
    pub download_root: PathBuf,
    pub fetcher: PostFetcher,
}

impl AppState {
    pub fn new(config: &AppConfig, factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            mode: config.relay.mode,
            download_root: config.relay.download_root.clone(),
            fetcher: PostFetcher::from_config(&config.relay, factory),
        }
    }
}
