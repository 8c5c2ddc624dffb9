//! Tenant configuration document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::template::{ExportTemplate, TemplateKind};

/// A tenant's complete Atlas configuration, stored as either `liveConfig`
/// or `draftConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub ui: UiSettings,
    #[serde(default)]
    pub messages: Messages,
    #[serde(default)]
    pub disclaimer: Disclaimer,
    #[serde(default)]
    pub basemaps: Vec<Basemap>,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub export_templates: Vec<ExportTemplate>,
    #[serde(default)]
    pub feature_export_templates: Vec<ExportTemplate>,
    #[serde(default)]
    pub help_documentation: Vec<HelpDocument>,
    #[serde(default = "default_true")]
    pub use_global_help: bool,
    #[serde(default)]
    pub supplement_global_help: bool,
    /// Keys this service does not model, carried through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Configuration {
    pub fn templates(&self, kind: TemplateKind) -> &[ExportTemplate] {
        match kind {
            TemplateKind::Map => &self.export_templates,
            TemplateKind::Feature => &self.feature_export_templates,
        }
    }

    pub fn templates_mut(&mut self, kind: TemplateKind) -> &mut Vec<ExportTemplate> {
        match kind {
            TemplateKind::Map => &mut self.export_templates,
            TemplateKind::Feature => &mut self.feature_export_templates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSettings {
    #[serde(default)]
    pub header_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_icon_url: Option<String>,
    #[serde(default = "default_theme_color")]
    pub theme_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_map_id: Option<String>,
    #[serde(default = "default_true")]
    pub show_sidebar: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_title: String::new(),
            header_subtitle: None,
            header_icon_url: None,
            theme_color: default_theme_color(),
            default_map_id: None,
            show_sidebar: true,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Messages {
    pub welcome_title: String,
    pub welcome_text: String,
    pub example_questions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub important_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_tip: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Notice shown before first use.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Disclaimer {
    pub enabled: bool,
    pub title: String,
    pub content: String,
    pub confirm_button_text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basemap {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSettings {
    /// Only changed through the map list path, never by a section edit
    #[serde(default)]
    pub maps: Vec<MapDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_feature_limit")]
    pub feature_limit: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            maps: Vec::new(),
            system_prompt: None,
            feature_limit: default_feature_limit(),
            extra: Map::new(),
        }
    }
}

/// A tenant map. Everything beyond `id` and `name` is carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpDocument {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HelpDocument {
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }
}

fn default_true() -> bool {
    true
}

fn default_theme_color() -> String {
    "#2563eb".to_string()
}

fn default_feature_limit() -> u32 {
    1000
}
