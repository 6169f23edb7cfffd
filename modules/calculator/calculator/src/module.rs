use std::sync::Arc;

use axum::Router;
use calculator_sdk::CalculatorClientV1;
use tracing::{info, warn};

use crate::api::rest::routes;
use crate::api::rest::session::SessionState;
use crate::config::CalculatorConfig;
use crate::domain::service::Service;
use crate::infra::storage::FileHistoryRepository;
use crate::local_client::LocalClient;

/// The calculator module: owns the history store, the domain service and the
/// session signer, and exposes them over REST and in-process.
pub struct CalculatorModule {
    service: Arc<Service>,
    sessions: SessionState,
}

impl CalculatorModule {
    /// Key of this module under `modules` in the application config.
    pub const NAME: &'static str = "calculator";

    /// Open the history store under `data_dir` and wire the service.
    ///
    /// `data_dir` is taken as given; callers expand `~` beforehand.
    ///
    /// # Errors
    /// Returns an error if the histories directory cannot be created.
    pub fn init(cfg: &CalculatorConfig, data_dir: &std::path::Path) -> anyhow::Result<Self> {
        if cfg.session.uses_default_secret() {
            warn!("Using the default session secret; set SECRET_KEY in production");
        }

        let repo = FileHistoryRepository::open(data_dir)?;
        info!(dir = %repo.dir().display(), "History store ready");

        Ok(Self {
            service: Arc::new(Service::new(Arc::new(repo))),
            sessions: SessionState::new(&cfg.session),
        })
    }

    /// Mount the module's REST routes onto `router`.
    #[must_use]
    pub fn register_rest(&self, router: Router) -> Router {
        routes::register_routes(router, self.service.clone(), self.sessions.clone())
    }

    /// In-process client for other components of the same process.
    #[must_use]
    pub fn client(&self) -> Arc<dyn CalculatorClientV1> {
        Arc::new(LocalClient::new(self.service.clone()))
    }
}
