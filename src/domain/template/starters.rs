//! Built-in starter templates.

use serde::Serialize;
use serde_json::{json, Map};

use crate::domain::model::{
    ElementContent, ElementType, ExportTemplate, LayoutElement, Orientation, PageSize,
    TemplateKind,
};

/// Summary of a starter for pickers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarterInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

const MAP_STARTERS: &[StarterInfo] = &[
    StarterInfo {
        id: "standard",
        name: "Standard",
        description: "Landscape letter page with map, title, legend and scale bar",
    },
    StarterInfo {
        id: "portrait-report",
        name: "Portrait Report",
        description: "Portrait letter page with map above a text block",
    },
];

const FEATURE_STARTERS: &[StarterInfo] = &[
    StarterInfo {
        id: "feature-summary",
        name: "Feature Summary",
        description: "Title and attribute table for a single feature",
    },
    StarterInfo {
        id: "feature-with-map",
        name: "Feature with Map",
        description: "Feature attributes next to a map of its location",
    },
];

pub fn list_starters(kind: TemplateKind) -> &'static [StarterInfo] {
    match kind {
        TemplateKind::Map => MAP_STARTERS,
        TemplateKind::Feature => FEATURE_STARTERS,
    }
}

/// Build a starter template. The returned template keeps the starter id;
/// callers mint a new one before saving.
pub fn starter_template(kind: TemplateKind, starter_id: &str) -> Option<ExportTemplate> {
    let info = list_starters(kind).iter().find(|s| s.id == starter_id)?;

    let mut template = ExportTemplate::blank(info.id);
    template.name = info.name.to_string();
    template.description = Some(info.description.to_string());

    match (kind, info.id) {
        (TemplateKind::Map, "standard") => {
            template.elements = vec![
                element("title", ElementType::Title, (2.0, 2.0, 96.0, 8.0), json!({"text": "{{mapTitle}}", "fontSize": 24})),
                element("map", ElementType::Map, (2.0, 12.0, 72.0, 80.0), json!({})),
                element("legend", ElementType::Legend, (76.0, 12.0, 22.0, 60.0), json!({"showTitle": true})),
                element("scalebar", ElementType::Scalebar, (76.0, 74.0, 22.0, 6.0), json!({"units": "imperial"})),
                element("north-arrow", ElementType::NorthArrow, (76.0, 82.0, 8.0, 10.0), json!({})),
                element("date", ElementType::Date, (86.0, 94.0, 12.0, 4.0), json!({"format": "YYYY-MM-DD"})),
            ];
        }
        (TemplateKind::Map, _) => {
            template.orientation = Orientation::Portrait;
            template.elements = vec![
                element("title", ElementType::Title, (4.0, 2.0, 92.0, 6.0), json!({"text": "{{mapTitle}}", "fontSize": 20})),
                element("map", ElementType::Map, (4.0, 10.0, 92.0, 55.0), json!({})),
                element("text", ElementType::Text, (4.0, 67.0, 92.0, 25.0), json!({"text": ""})),
                element("page-number", ElementType::PageNumber, (88.0, 95.0, 8.0, 3.0), json!({})),
            ];
        }
        (TemplateKind::Feature, "feature-summary") => {
            template.orientation = Orientation::Portrait;
            template.elements = vec![
                element("title", ElementType::Title, (4.0, 2.0, 92.0, 6.0), json!({"text": "{{featureTitle}}", "fontSize": 20})),
                element("attributes", ElementType::AttributeData, (4.0, 10.0, 92.0, 82.0), json!({"layout": "table"})),
                element("date", ElementType::Date, (80.0, 95.0, 16.0, 3.0), json!({"format": "YYYY-MM-DD"})),
            ];
        }
        (TemplateKind::Feature, _) => {
            template.elements = vec![
                element("title", ElementType::Title, (2.0, 2.0, 96.0, 8.0), json!({"text": "{{featureTitle}}", "fontSize": 22})),
                element("map", ElementType::Map, (2.0, 12.0, 56.0, 84.0), json!({"zoomToFeature": true})),
                element("attributes", ElementType::AttributeData, (60.0, 12.0, 38.0, 84.0), json!({"layout": "list"})),
            ];
        }
    }

    template.page_size = PageSize::Letter;
    Some(template)
}

fn element(
    id: &str,
    element_type: ElementType,
    (x, y, width, height): (f64, f64, f64, f64),
    content: serde_json::Value,
) -> LayoutElement {
    LayoutElement {
        id: id.to_string(),
        element_type,
        x,
        y,
        width,
        height,
        locked: false,
        visible: true,
        content: ElementContent(content),
        extra: Map::new(),
    }
}
