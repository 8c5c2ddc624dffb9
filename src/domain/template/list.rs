//! Operations on an ordered template list.
//!
//! Shared by the tenant library and the global catalog. Each function
//! returns the new list; the caller writes it back.

use std::collections::HashSet;

use chrono::Utc;

use crate::domain::error::{ConfigError, ConfigResult};
use crate::domain::model::{ExportTemplate, TemplateKind};

use super::ids::{ensure_unique_id, mint_id};

pub fn find<'a>(templates: &'a [ExportTemplate], id: &str) -> ConfigResult<&'a ExportTemplate> {
    templates
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| ConfigError::NotFound(format!("Template {}", id)))
}

/// Append a new template, stamping `createdAt` and enabling it.
pub fn append_new(
    mut templates: Vec<ExportTemplate>,
    mut template: ExportTemplate,
) -> ConfigResult<(Vec<ExportTemplate>, ExportTemplate)> {
    template.id = ensure_unique_id(&template.id, &templates);
    template.created_at = Utc::now();
    template.updated_at = None;
    template.enabled = true;
    template.validate()?;

    templates.push(template.clone());
    Ok((templates, template))
}

/// Replace the entry with the same id, stamping `updatedAt`.
pub fn replace(
    mut templates: Vec<ExportTemplate>,
    mut template: ExportTemplate,
) -> ConfigResult<(Vec<ExportTemplate>, ExportTemplate)> {
    template.validate()?;

    let slot = templates
        .iter_mut()
        .find(|t| t.id == template.id)
        .ok_or_else(|| ConfigError::NotFound(format!("Template {}", template.id)))?;

    template.created_at = slot.created_at;
    template.updated_at = Some(Utc::now());
    *slot = template.clone();
    Ok((templates, template))
}

/// Append a copy of `id` with a fresh id and `" (Copy)"` name suffix.
pub fn duplicate(
    templates: Vec<ExportTemplate>,
    kind: TemplateKind,
    id: &str,
) -> ConfigResult<(Vec<ExportTemplate>, ExportTemplate)> {
    let mut copy = find(&templates, id)?.clone();
    copy.id = mint_id(kind);
    copy.name = format!("{} (Copy)", copy.name);
    copy.created_at = Utc::now();
    copy.updated_at = None;

    let mut templates = templates;
    copy.id = ensure_unique_id(&copy.id, &templates);
    templates.push(copy.clone());
    Ok((templates, copy))
}

pub fn remove(
    mut templates: Vec<ExportTemplate>,
    id: &str,
) -> ConfigResult<(Vec<ExportTemplate>, ExportTemplate)> {
    let index = templates
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| ConfigError::NotFound(format!("Template {}", id)))?;
    let removed = templates.remove(index);
    Ok((templates, removed))
}

/// Flip `enabled` on one entry.
pub fn toggle_enabled(
    mut templates: Vec<ExportTemplate>,
    id: &str,
) -> ConfigResult<(Vec<ExportTemplate>, ExportTemplate)> {
    let slot = templates
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| ConfigError::NotFound(format!("Template {}", id)))?;
    slot.enabled = !slot.enabled;
    slot.updated_at = Some(Utc::now());
    let toggled = slot.clone();
    Ok((templates, toggled))
}

/// Reorder to match `ordered_ids`, which must be a permutation of the
/// current ids.
pub fn reorder(
    templates: Vec<ExportTemplate>,
    ordered_ids: &[String],
) -> ConfigResult<Vec<ExportTemplate>> {
    let unique: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
    if unique.len() != ordered_ids.len() || ordered_ids.len() != templates.len() {
        return Err(ConfigError::validation(
            "Order must list every template id exactly once",
        ));
    }

    let mut remaining = templates;
    let mut ordered = Vec::with_capacity(remaining.len());
    for id in ordered_ids {
        let index = remaining
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| {
                ConfigError::validation(format!("Unknown template id '{}' in order", id))
            })?;
        ordered.push(remaining.swap_remove(index));
    }
    Ok(ordered)
}

/// Feature templates may only reference an existing map template from
/// `map_templates`; map templates may not reference anything.
pub fn validate_map_reference(
    map_templates: &[ExportTemplate],
    kind: TemplateKind,
    template: &ExportTemplate,
) -> ConfigResult<()> {
    match (&template.map_export_template_id, kind) {
        (Some(map_id), TemplateKind::Feature) => find(map_templates, map_id)
            .map(|_| ())
            .map_err(|_| {
                ConfigError::validation(format!("Unknown map export template '{}'", map_id))
            }),
        (Some(_), TemplateKind::Map) => Err(ConfigError::validation(
            "Map export templates cannot reference another map template",
        )),
        (None, _) => Ok(()),
    }
}

/// Clear `mapExportTemplateId` on feature templates pointing at `map_id`.
/// Returns how many were cleared.
pub fn clear_map_references(templates: &mut [ExportTemplate], map_id: &str) -> usize {
    let mut cleared = 0;
    for template in templates.iter_mut() {
        if template.map_export_template_id.as_deref() == Some(map_id) {
            template.map_export_template_id = None;
            cleared += 1;
        }
    }
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(id: &str, name: &str) -> ExportTemplate {
        let mut t = ExportTemplate::blank(id);
        t.name = name.to_string();
        t
    }

    #[test]
    fn test_duplicate_appends_copy() {
        let original = template("a", "Standard");
        let (list, copy) = duplicate(vec![original.clone()], TemplateKind::Map, "a").unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0], original);
        assert_eq!(list[1], copy);
        assert_ne!(copy.id, "a");
        assert!(copy.id.starts_with("template-"));
        assert_eq!(copy.name, "Standard (Copy)");
        assert_eq!(copy.elements, original.elements);
        assert_eq!(copy.page_size, original.page_size);
        assert!(copy.updated_at.is_none());
    }

    #[test]
    fn test_duplicate_missing() {
        let result = duplicate(vec![], TemplateKind::Map, "a");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_toggle_twice_restores() {
        let list = vec![template("a", "A")];
        let (list, toggled) = toggle_enabled(list, "a").unwrap();
        assert!(!toggled.enabled);
        let (list, toggled) = toggle_enabled(list, "a").unwrap();
        assert!(toggled.enabled);
        assert!(list[0].enabled);
    }

    #[test]
    fn test_append_new_resolves_id_collision() {
        let list = vec![template("template-x", "A")];
        let (list, saved) = append_new(list, template("template-x", "B")).unwrap();
        assert_eq!(saved.id, "template-x-2");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_replace_keeps_created_at_and_stamps_updated_at() {
        let original = template("a", "A");
        let mut edited = template("a", "A2");
        edited.created_at = Utc::now() + chrono::Duration::days(1);

        let (list, saved) = replace(vec![original.clone()], edited).unwrap();
        assert_eq!(saved.created_at, original.created_at);
        assert!(saved.updated_at.is_some());
        assert_eq!(list[0].name, "A2");
    }

    #[test]
    fn test_replace_missing_is_not_found() {
        let result = replace(vec![], template("a", "A"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_remove() {
        let list = vec![template("a", "A"), template("b", "B")];
        let (list, removed) = remove(list, "a").unwrap();
        assert_eq!(removed.id, "a");
        assert_eq!(list.len(), 1);
        assert!(remove(list, "a").is_err());
    }

    #[test]
    fn test_reorder() {
        let list = vec![template("a", "A"), template("b", "B"), template("c", "C")];
        let order = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        let list = reorder(list, &order).unwrap();
        let ids: Vec<&str> = list.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_reorder_rejects_non_permutation() {
        let list = vec![template("a", "A"), template("b", "B")];
        assert!(reorder(list.clone(), &["a".to_string()]).is_err());
        assert!(reorder(list.clone(), &["a".to_string(), "a".to_string()]).is_err());
        assert!(reorder(list, &["a".to_string(), "z".to_string()]).is_err());
    }

    #[test]
    fn test_validate_map_reference() {
        let maps = vec![template("m1", "Base")];
        let mut feature = template("f1", "Sheet");

        feature.map_export_template_id = Some("m1".to_string());
        assert!(validate_map_reference(&maps, TemplateKind::Feature, &feature).is_ok());
        assert!(validate_map_reference(&maps, TemplateKind::Map, &feature).is_err());

        feature.map_export_template_id = Some("m2".to_string());
        assert!(validate_map_reference(&maps, TemplateKind::Feature, &feature).is_err());
    }

    #[test]
    fn test_clear_map_references() {
        let mut features = vec![template("f1", "F1"), template("f2", "F2")];
        features[0].map_export_template_id = Some("m1".to_string());
        features[1].map_export_template_id = Some("m2".to_string());

        assert_eq!(clear_map_references(&mut features, "m1"), 1);
        assert!(features[0].map_export_template_id.is_none());
        assert_eq!(features[1].map_export_template_id.as_deref(), Some("m2"));
    }
}
