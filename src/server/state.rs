use std::sync::Arc;
use std::time::Instant;

use crate::auth::JwtValidator;
use crate::config::Settings;
use crate::domain::catalog::GlobalTemplateCatalog;
use crate::domain::lifecycle::{ConfigRepository, DraftPublishManager};
use crate::domain::template::TemplateLibrary;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub jwt_validator: Arc<JwtValidator>,
    pub store: Arc<dyn DocumentStore>,
    pub manager: Arc<DraftPublishManager>,
    pub library: Arc<TemplateLibrary>,
    pub catalog: Arc<GlobalTemplateCatalog>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn DocumentStore>) -> Self {
        let jwt_validator = Arc::new(JwtValidator::new(&settings.jwt));
        let manager = Arc::new(DraftPublishManager::new(ConfigRepository::new(store.clone())));
        let catalog = Arc::new(GlobalTemplateCatalog::new(store.clone()));
        let library = Arc::new(TemplateLibrary::new(manager.clone(), catalog.clone()));

        Self {
            settings: Arc::new(settings),
            jwt_validator,
            store,
            manager,
            library,
            catalog,
            start_time: Instant::now(),
        }
    }
}
