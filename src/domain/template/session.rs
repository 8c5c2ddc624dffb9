//! Template editor sessions.
//!
//! A session holds an unsaved template. Nothing is persisted until the
//! session is passed to [`TemplateLibrary::save`](super::TemplateLibrary::save).

use serde::{Deserialize, Serialize};

use crate::domain::model::{ExportTemplate, LayoutElement, Orientation, PageSize, TemplateKind};

/// Where a session's template came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum SessionOrigin {
    Blank,
    Starter(String),
    Global(String),
    /// Editing the stored template with this id
    Existing(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSession {
    pub kind: TemplateKind,
    pub origin: SessionOrigin,
    pub template: ExportTemplate,
}

impl EditorSession {
    pub fn new(kind: TemplateKind, origin: SessionOrigin, template: ExportTemplate) -> Self {
        Self {
            kind,
            origin,
            template,
        }
    }

    /// Whether saving appends a new entry rather than replacing one.
    pub fn is_new(&self) -> bool {
        !matches!(self.origin, SessionOrigin::Existing(_))
    }

    /// Overwrite the editable fields with `input`.
    pub fn apply(&mut self, input: TemplateInput) {
        input.apply_to(&mut self.template);
    }
}

/// Editable template fields, as submitted by an editor form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub page_size: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub custom_width: Option<f64>,
    #[serde(default)]
    pub custom_height: Option<f64>,
    #[serde(default)]
    pub elements: Vec<LayoutElement>,
    #[serde(default)]
    pub map_export_template_id: Option<String>,
}

impl TemplateInput {
    pub fn apply_to(self, template: &mut ExportTemplate) {
        template.name = self.name;
        template.description = self.description;
        template.page_size = self.page_size;
        template.orientation = self.orientation;
        template.custom_width = self.custom_width;
        template.custom_height = self.custom_height;
        template.elements = self.elements;
        template.map_export_template_id = self.map_export_template_id;
    }
}

impl From<&ExportTemplate> for TemplateInput {
    fn from(template: &ExportTemplate) -> Self {
        Self {
            name: template.name.clone(),
            description: template.description.clone(),
            page_size: template.page_size,
            orientation: template.orientation,
            custom_width: template.custom_width,
            custom_height: template.custom_height,
            elements: template.elements.clone(),
            map_export_template_id: template.map_export_template_id.clone(),
        }
    }
}
