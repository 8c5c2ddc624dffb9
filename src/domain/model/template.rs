//! Export layout templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::{ConfigError, ConfigResult};

/// Which of the two template families a template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// Map-export layouts
    Map,
    /// Feature-export layouts
    Feature,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Map => "map",
            TemplateKind::Feature => "feature",
        }
    }

    /// Prefix of minted template ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            TemplateKind::Map => "template",
            TemplateKind::Feature => "feature-template",
        }
    }

    /// Configuration section holding a tenant's templates of this kind.
    pub fn section(&self) -> &'static str {
        match self {
            TemplateKind::Map => "exportTemplates",
            TemplateKind::Feature => "featureExportTemplates",
        }
    }

    /// Catalog document field holding global templates of this kind.
    pub fn catalog_field(&self) -> &'static str {
        match self {
            TemplateKind::Map => "globalExportTemplates",
            TemplateKind::Feature => "globalFeatureExportTemplates",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    Letter,
    Legal,
    Tabloid,
    A4,
    A3,
    /// Uses `customWidth`/`customHeight` in inches
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
}

/// Layout element type. Unknown types are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementType {
    Map,
    Title,
    Legend,
    Scalebar,
    NorthArrow,
    Text,
    Date,
    PageNumber,
    AttributeData,
    Logo,
    Image,
    Shape,
    #[serde(untagged)]
    Other(String),
}

/// Type-specific element settings, stored and copied but never inspected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementContent(pub Value);

/// A positioned element on a template page. Geometry is in percent of the
/// page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutElement {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub content: ElementContent,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LayoutElement {
    fn validate(&self) -> ConfigResult<()> {
        let geometry = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
        ];
        for (name, value) in geometry {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::validation(format!(
                    "Element '{}' {} must be between 0 and 100, got {}",
                    self.id, name, value
                )));
            }
        }
        Ok(())
    }
}

/// A map-export or feature-export template.
///
/// Both kinds share this shape; `mapExportTemplateId` is only meaningful for
/// feature templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTemplate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub page_size: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_height: Option<f64>,
    #[serde(default)]
    pub elements: Vec<LayoutElement>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Map template used for combined exports (feature templates only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_export_template_id: Option<String>,
    /// Keys this service does not model, carried through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExportTemplate {
    /// An empty, enabled template with no elements.
    pub fn blank(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: None,
            page_size: PageSize::default(),
            orientation: Orientation::default(),
            custom_width: None,
            custom_height: None,
            elements: Vec::new(),
            enabled: true,
            created_at: Utc::now(),
            updated_at: None,
            map_export_template_id: None,
            extra: Map::new(),
        }
    }

    /// Validate the template's own fields.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::validation("Template id must not be empty"));
        }

        if self.name.trim().is_empty() {
            return Err(ConfigError::validation("Template name must not be empty"));
        }

        if self.page_size == PageSize::Custom {
            match (self.custom_width, self.custom_height) {
                (Some(w), Some(h)) if w > 0.0 && h > 0.0 => {}
                _ => {
                    return Err(ConfigError::validation(
                        "Custom page size requires positive customWidth and customHeight",
                    ))
                }
            }
        }

        self.elements.iter().try_for_each(LayoutElement::validate)
    }
}

fn default_true() -> bool {
    true
}
