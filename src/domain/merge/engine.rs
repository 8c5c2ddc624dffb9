//! Field merge engine.
//!
//! Computes the configuration to persist for one section edit. Scalar
//! sections merge key by key, list sections are replaced wholesale, and
//! `data.maps` always carries over from the working configuration. Free-text
//! lists are sanitized here, at the point an edit is saved.

use std::collections::HashSet;

use crate::domain::error::{ConfigError, ConfigResult};
use crate::domain::model::{Configuration, ExportTemplate, HelpDocument, MapDefinition};

use super::patch::{
    DataPatch, DisclaimerPatch, HelpSettingsPatch, MessagesPatch, SectionUpdate, UiPatch,
};

/// Merge one section update onto the working configuration.
pub fn merge_section(
    working: &Configuration,
    update: SectionUpdate,
) -> ConfigResult<Configuration> {
    let mut next = working.clone();

    match update {
        SectionUpdate::Ui(patch) => merge_ui(&mut next, patch)?,
        SectionUpdate::Messages(patch) => merge_messages(&mut next, patch),
        SectionUpdate::Disclaimer(patch) => merge_disclaimer(&mut next, patch),
        SectionUpdate::Basemaps(basemaps) => {
            if basemaps.is_empty() {
                return Err(ConfigError::validation(
                    "At least one basemap must remain configured",
                ));
            }
            next.basemaps = basemaps;
        }
        SectionUpdate::Data(patch) => merge_data(&mut next, patch),
        SectionUpdate::ExportTemplates(templates) => {
            check_unique_ids(&templates)?;
            next.export_templates = templates;
        }
        SectionUpdate::FeatureExportTemplates(templates) => {
            check_unique_ids(&templates)?;
            next.feature_export_templates = templates;
        }
        SectionUpdate::HelpDocumentation(documents) => {
            next.help_documentation = sanitize_help_documents(documents);
        }
        SectionUpdate::HelpSettings(patch) => merge_help_settings(&mut next, patch),
    }

    Ok(next)
}

/// Replace `data.maps`, leaving every other field untouched.
pub fn replace_maps(
    working: &Configuration,
    maps: Vec<MapDefinition>,
) -> ConfigResult<Configuration> {
    let mut seen = HashSet::new();
    if let Some(dup) = maps.iter().find(|m| !seen.insert(m.id.as_str())) {
        return Err(ConfigError::validation(format!("Duplicate map id '{}'", dup.id)));
    }

    let mut next = working.clone();
    next.data.maps = maps;
    Ok(next)
}

fn merge_ui(config: &mut Configuration, patch: UiPatch) -> ConfigResult<()> {
    let ui = &mut config.ui;

    if let Some(title) = patch.header_title {
        ui.header_title = title;
    }
    if let Some(subtitle) = patch.header_subtitle {
        ui.header_subtitle = subtitle;
    }
    if let Some(icon) = patch.header_icon_url {
        ui.header_icon_url = icon;
    }
    if let Some(color) = patch.theme_color {
        ui.theme_color = color;
    }
    if let Some(map_id) = patch.default_map_id {
        ui.default_map_id = map_id;
    }
    if let Some(show) = patch.show_sidebar {
        ui.show_sidebar = show;
    }

    if ui.header_title.trim().is_empty() {
        return Err(ConfigError::validation("Header title is required"));
    }
    Ok(())
}

fn merge_messages(config: &mut Configuration, patch: MessagesPatch) {
    let messages = &mut config.messages;

    if let Some(title) = patch.welcome_title {
        messages.welcome_title = title;
    }
    if let Some(text) = patch.welcome_text {
        messages.welcome_text = text;
    }
    if let Some(questions) = patch.example_questions {
        messages.example_questions = questions
            .into_iter()
            .filter(|q| !q.trim().is_empty())
            .collect();
    }
    if let Some(note) = patch.important_note {
        messages.important_note = note;
    }
    if let Some(tip) = patch.search_tip {
        messages.search_tip = tip;
    }
}

fn merge_disclaimer(config: &mut Configuration, patch: DisclaimerPatch) {
    let disclaimer = &mut config.disclaimer;

    if let Some(enabled) = patch.enabled {
        disclaimer.enabled = enabled;
    }
    if let Some(title) = patch.title {
        disclaimer.title = title;
    }
    if let Some(content) = patch.content {
        disclaimer.content = content;
    }
    if let Some(text) = patch.confirm_button_text {
        disclaimer.confirm_button_text = text;
    }
}

fn merge_data(config: &mut Configuration, patch: DataPatch) {
    if let Some(prompt) = patch.system_prompt {
        config.data.system_prompt = prompt;
    }
    if let Some(limit) = patch.feature_limit {
        config.data.feature_limit = limit;
    }
}

fn merge_help_settings(config: &mut Configuration, patch: HelpSettingsPatch) {
    if let Some(use_global) = patch.use_global_help {
        config.use_global_help = use_global;
    }
    if let Some(supplement) = patch.supplement_global_help {
        config.supplement_global_help = supplement;
    }
}

fn sanitize_help_documents(documents: Vec<HelpDocument>) -> Vec<HelpDocument> {
    documents.into_iter().filter(|d| !d.is_blank()).collect()
}

/// Entries are validated one at a time where they are saved; the list as a
/// whole only needs unique ids.
fn check_unique_ids(templates: &[ExportTemplate]) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for template in templates {
        if !seen.insert(template.id.as_str()) {
            return Err(ConfigError::validation(format!(
                "Duplicate template id '{}'",
                template.id
            )));
        }
    }
    Ok(())
}
