use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::bulk::BulkClient;
use crate::candidates::CandidateListController;
use crate::config::Config;
use crate::errors::AppError;
use crate::events::NotificationBus;

/// Shared application state: one HTTP client, one bus, and the components
/// built on top of them.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub bus: Arc<NotificationBus>,
    pub candidates: Arc<CandidateListController>,
    pub bulk: BulkClient,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let api = ApiClient::with_timeout(
            config.api_base_url.clone(),
            config.api_token.clone(),
            config.http_timeout(),
        )?;
        let bus = NotificationBus::new();
        let candidates = Arc::new(CandidateListController::with_poll_policy(
            Arc::new(api.clone()),
            Arc::clone(&bus),
            config.page_size,
            config.poll_policy(),
        ));
        let bulk = BulkClient::new(api.clone());

        Ok(Self {
            config,
            api,
            bus,
            candidates,
            bulk,
        })
    }
}
