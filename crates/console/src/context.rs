use std::sync::Arc;

use crewboard_client::api::BackendApi;
use crewboard_client::backend::SchedulingBackend;
use crewboard_core::team::OrgConfig;

use crate::config::ConsoleConfig;
use crate::loading::LoadingTracker;
use crate::toast::ToastBus;

/// Shared state handed to every panel.
///
/// Cheaply cloneable: everything lives behind `Arc`.
#[derive(Clone)]
pub struct AppContext {
    /// Console configuration.
    pub config: Arc<ConsoleConfig>,
    /// Data access for all panels.
    pub backend: Arc<dyn SchedulingBackend>,
    /// Global busy overlay.
    pub loading: Arc<LoadingTracker>,
    /// User notifications.
    pub toasts: Arc<ToastBus>,
    /// Org feature flags and picklists, fetched once at startup.
    pub org_config: Arc<OrgConfig>,
}

impl AppContext {
    pub fn new(config: ConsoleConfig, backend: Arc<dyn SchedulingBackend>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            loading: Arc::new(LoadingTracker::new()),
            toasts: Arc::new(ToastBus::default()),
            org_config: Arc::new(OrgConfig::default()),
        }
    }

    /// Build a context talking to `config.backend_url` and load the org
    /// configuration. An unreachable `/config` leaves every feature off.
    pub async fn connect(config: ConsoleConfig) -> Self {
        let backend = Arc::new(BackendApi::new(config.backend_url.clone()));
        let mut ctx = Self::new(config, backend);
        ctx.load_org_config().await;
        ctx
    }

    /// Fetch `GET /config` into `org_config`.
    pub async fn load_org_config(&mut self) {
        let result = self.loading.track(self.backend.fetch_config()).await;
        match result {
            Ok(org) => {
                tracing::info!(
                    features = org.features.len(),
                    picklists = org.picklists.len(),
                    "Org configuration loaded"
                );
                self.org_config = Arc::new(org);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Org configuration unavailable, using defaults");
            }
        }
    }
}
