//! Default configuration for newly initialized tenants.

use serde_json::Map;

use crate::domain::error::{ConfigError, ConfigResult};

use super::config::{Basemap, Configuration, DataSettings, Disclaimer, Messages, UiSettings};
use super::tenant::TenantSeed;

pub const DEFAULT_BASEMAP_ID: &str = "streets";

/// Build the configuration written as `liveConfig` on initialize.
pub fn default_configuration(seed: &TenantSeed) -> ConfigResult<Configuration> {
    let display_name = seed.display_name.trim();
    if display_name.is_empty() {
        return Err(ConfigError::validation("Display name must not be empty"));
    }

    Ok(Configuration {
        ui: UiSettings {
            header_title: display_name.to_string(),
            ..UiSettings::default()
        },
        messages: Messages {
            welcome_title: format!("Welcome to {}", display_name),
            welcome_text: "Ask a question about the map to get started.".to_string(),
            example_questions: vec![
                "What layers are available?".to_string(),
                "Show me features near downtown".to_string(),
            ],
            important_note: None,
            search_tip: None,
            extra: Map::new(),
        },
        disclaimer: Disclaimer {
            enabled: false,
            title: "Disclaimer".to_string(),
            content: "This map is provided for informational purposes only.".to_string(),
            confirm_button_text: "I understand".to_string(),
            extra: Map::new(),
        },
        basemaps: vec![Basemap {
            id: DEFAULT_BASEMAP_ID.to_string(),
            name: "Streets".to_string(),
            url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            thumbnail_url: None,
            attribution: Some("© OpenStreetMap contributors".to_string()),
            extra: Map::new(),
        }],
        data: DataSettings::default(),
        export_templates: Vec::new(),
        feature_export_templates: Vec::new(),
        help_documentation: Vec::new(),
        use_global_help: true,
        supplement_global_help: false,
        extra: Map::new(),
    })
}
