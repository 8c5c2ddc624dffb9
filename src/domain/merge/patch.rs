//! Typed partial inputs, one per configuration section.
//!
//! Scalar fields are `Option<T>`: omitted keeps the current value. Nullable
//! fields are `Option<Option<T>>`: omitted keeps, `null` clears, a value sets.

use serde::{Deserialize, Deserializer};

use crate::domain::model::{Basemap, ExportTemplate, HelpDocument, TemplateKind};

/// One section edit. On the wire: `{"section": "ui", "value": {...}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "section", content = "value", rename_all = "camelCase")]
pub enum SectionUpdate {
    Ui(UiPatch),
    Messages(MessagesPatch),
    Disclaimer(DisclaimerPatch),
    /// Replaces the list
    Basemaps(Vec<Basemap>),
    /// Never touches `data.maps`
    Data(DataPatch),
    ExportTemplates(Vec<ExportTemplate>),
    FeatureExportTemplates(Vec<ExportTemplate>),
    HelpDocumentation(Vec<HelpDocument>),
    /// `useGlobalHelp` / `supplementGlobalHelp`
    HelpSettings(HelpSettingsPatch),
}

impl SectionUpdate {
    /// Replace the template list of the given kind.
    pub fn templates(kind: TemplateKind, templates: Vec<ExportTemplate>) -> Self {
        match kind {
            TemplateKind::Map => SectionUpdate::ExportTemplates(templates),
            TemplateKind::Feature => SectionUpdate::FeatureExportTemplates(templates),
        }
    }

    /// Section name, as used on the wire and in metrics.
    pub fn section(&self) -> &'static str {
        match self {
            SectionUpdate::Ui(_) => "ui",
            SectionUpdate::Messages(_) => "messages",
            SectionUpdate::Disclaimer(_) => "disclaimer",
            SectionUpdate::Basemaps(_) => "basemaps",
            SectionUpdate::Data(_) => "data",
            SectionUpdate::ExportTemplates(_) => "exportTemplates",
            SectionUpdate::FeatureExportTemplates(_) => "featureExportTemplates",
            SectionUpdate::HelpDocumentation(_) => "helpDocumentation",
            SectionUpdate::HelpSettings(_) => "helpSettings",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPatch {
    pub header_title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub header_subtitle: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub header_icon_url: Option<Option<String>>,
    pub theme_color: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub default_map_id: Option<Option<String>>,
    pub show_sidebar: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesPatch {
    pub welcome_title: Option<String>,
    pub welcome_text: Option<String>,
    /// Blank entries are dropped when the edit is saved
    pub example_questions: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub important_note: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub search_tip: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclaimerPatch {
    pub enabled: Option<bool>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub confirm_button_text: Option<String>,
}

/// Settings-tab fields of `data`. A `maps` key in the input is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub system_prompt: Option<Option<String>>,
    pub feature_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpSettingsPatch {
    pub use_global_help: Option<bool>,
    pub supplement_global_help: Option<bool>,
}

/// Distinguish an explicit `null` (`Some(None)`) from an omitted key (`None`,
/// via `#[serde(default)]`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_update_wire_format() {
        let update: SectionUpdate = serde_json::from_value(json!({
            "section": "ui",
            "value": {"headerTitle": "Springfield GIS"}
        }))
        .unwrap();

        match update {
            SectionUpdate::Ui(patch) => {
                assert_eq!(patch.header_title.as_deref(), Some("Springfield GIS"));
                assert!(patch.header_subtitle.is_none());
            }
            other => panic!("unexpected update {:?}", other),
        }
    }

    #[test]
    fn test_null_distinguished_from_omitted() {
        let patch: UiPatch = serde_json::from_value(json!({"headerSubtitle": null})).unwrap();
        assert_eq!(patch.header_subtitle, Some(None));
        assert_eq!(patch.header_icon_url, None);

        let patch: UiPatch = serde_json::from_value(json!({"headerSubtitle": "Sub"})).unwrap();
        assert_eq!(patch.header_subtitle, Some(Some("Sub".to_string())));
    }

    #[test]
    fn test_data_patch_ignores_maps() {
        let update: SectionUpdate = serde_json::from_value(json!({
            "section": "data",
            "value": {"maps": [], "featureLimit": 50}
        }))
        .unwrap();
        assert_eq!(update.section(), "data");
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<SectionUpdate, _> =
            serde_json::from_value(json!({"section": "liveConfig", "value": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_templates_constructor_by_kind() {
        assert_eq!(
            SectionUpdate::templates(TemplateKind::Feature, vec![]).section(),
            "featureExportTemplates"
        );
    }
}
