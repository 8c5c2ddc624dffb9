//! Tenant template library.
//!
//! CRUD over a tenant's `exportTemplates` and `featureExportTemplates`. Every
//! write goes through the draft/publish manager as a section edit, so
//! template changes are staged in the draft like any other configuration
//! change.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::catalog::GlobalTemplateCatalog;
use crate::domain::error::{ConfigError, ConfigResult};
use crate::domain::lifecycle::{DraftPublishManager, TenantSnapshot};
use crate::domain::merge::SectionUpdate;
use crate::domain::model::{Configuration, ExportTemplate, TemplateKind, TenantId};
use crate::metrics::TemplateMetrics;

use super::ids::mint_id;
use super::list;
use super::session::{EditorSession, SessionOrigin};
use super::starters::starter_template;

/// Caller's confirmation that a template may be deleted.
///
/// Must name the template being deleted.
#[derive(Debug, Clone)]
pub struct DeleteConfirmation {
    template_id: String,
}

impl DeleteConfirmation {
    pub fn for_template(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
        }
    }

    fn covers(&self, template_id: &str) -> bool {
        self.template_id == template_id
    }
}

pub struct TemplateLibrary {
    manager: Arc<DraftPublishManager>,
    catalog: Arc<GlobalTemplateCatalog>,
}

impl TemplateLibrary {
    pub fn new(manager: Arc<DraftPublishManager>, catalog: Arc<GlobalTemplateCatalog>) -> Self {
        Self { manager, catalog }
    }

    pub async fn list(
        &self,
        tenant_id: &TenantId,
        kind: TemplateKind,
    ) -> ConfigResult<Vec<ExportTemplate>> {
        let (_, working) = self.load(tenant_id).await?;
        Ok(working.templates(kind).to_vec())
    }

    /// Templates offered to end users.
    pub async fn list_enabled(
        &self,
        tenant_id: &TenantId,
        kind: TemplateKind,
    ) -> ConfigResult<Vec<ExportTemplate>> {
        let mut templates = self.list(tenant_id, kind).await?;
        templates.retain(|t| t.enabled);
        Ok(templates)
    }

    pub async fn get(
        &self,
        tenant_id: &TenantId,
        kind: TemplateKind,
        id: &str,
    ) -> ConfigResult<ExportTemplate> {
        let (_, working) = self.load(tenant_id).await?;
        list::find(working.templates(kind), id).cloned()
    }

    /// Session for a new, empty template.
    pub fn create_blank(&self, kind: TemplateKind) -> EditorSession {
        EditorSession::new(kind, SessionOrigin::Blank, ExportTemplate::blank(mint_id(kind)))
    }

    /// Session seeded with a copy of a built-in starter.
    pub fn create_from_starter(
        &self,
        kind: TemplateKind,
        starter_id: &str,
    ) -> ConfigResult<EditorSession> {
        let starter = starter_template(kind, starter_id)
            .ok_or_else(|| ConfigError::NotFound(format!("Starter template {}", starter_id)))?;

        Ok(EditorSession::new(
            kind,
            SessionOrigin::Starter(starter_id.to_string()),
            copy_of(kind, starter),
        ))
    }

    /// Session seeded with a copy of a global catalog template. The copy
    /// keeps no link to its source.
    pub async fn create_from_global(
        &self,
        kind: TemplateKind,
        global_id: &str,
    ) -> ConfigResult<EditorSession> {
        let global = self.catalog.get(kind, global_id).await?;

        let mut template = copy_of(kind, global);
        // Global references point into the catalog, not the tenant's list
        template.map_export_template_id = None;

        Ok(EditorSession::new(
            kind,
            SessionOrigin::Global(global_id.to_string()),
            template,
        ))
    }

    /// Session for editing a stored template.
    pub async fn edit_existing(
        &self,
        tenant_id: &TenantId,
        kind: TemplateKind,
        id: &str,
    ) -> ConfigResult<EditorSession> {
        let template = self.get(tenant_id, kind, id).await?;
        Ok(EditorSession::new(
            kind,
            SessionOrigin::Existing(id.to_string()),
            template,
        ))
    }

    /// Persist a session: append if new, otherwise replace by id.
    pub async fn save(
        &self,
        tenant_id: &TenantId,
        session: EditorSession,
        expected_version: Option<u64>,
    ) -> ConfigResult<ExportTemplate> {
        let kind = session.kind;
        let op = if session.is_new() { "create" } else { "update" };
        let (snapshot, working) = self.load(tenant_id).await?;
        list::validate_map_reference(&working.export_templates, kind, &session.template)?;

        let current = working.templates(kind).to_vec();
        let (templates, saved) = match &session.origin {
            SessionOrigin::Existing(id) => {
                let mut template = session.template;
                template.id = id.clone();
                list::replace(current, template)?
            }
            _ => list::append_new(current, session.template)?,
        };

        let updates = vec![SectionUpdate::templates(kind, templates)];
        self.write(tenant_id, kind, op, &snapshot, expected_version, updates)
            .await?;

        tracing::info!(
            tenant_id = %tenant_id,
            kind = kind.as_str(),
            template_id = %saved.id,
            op,
            "Template saved"
        );
        Ok(saved)
    }

    /// Append a copy with a new id and `" (Copy)"` suffix, immediately.
    pub async fn duplicate(
        &self,
        tenant_id: &TenantId,
        kind: TemplateKind,
        id: &str,
    ) -> ConfigResult<ExportTemplate> {
        let (snapshot, working) = self.load(tenant_id).await?;
        let (templates, copy) = list::duplicate(working.templates(kind).to_vec(), kind, id)?;

        let updates = vec![SectionUpdate::templates(kind, templates)];
        self.write(tenant_id, kind, "duplicate", &snapshot, None, updates)
            .await?;
        Ok(copy)
    }

    /// Remove a template. Deleting a map template also clears references to
    /// it from the tenant's feature templates, in the same draft write.
    pub async fn delete(
        &self,
        tenant_id: &TenantId,
        kind: TemplateKind,
        id: &str,
        confirmation: DeleteConfirmation,
    ) -> ConfigResult<ExportTemplate> {
        if !confirmation.covers(id) {
            return Err(ConfigError::validation(format!(
                "Deletion of template {} was not confirmed",
                id
            )));
        }

        let (snapshot, working) = self.load(tenant_id).await?;
        let (templates, removed) = list::remove(working.templates(kind).to_vec(), id)?;

        let mut updates = vec![SectionUpdate::templates(kind, templates)];
        if kind == TemplateKind::Map {
            let mut features = working.feature_export_templates.clone();
            let cleared = list::clear_map_references(&mut features, id);
            if cleared > 0 {
                tracing::debug!(
                    tenant_id = %tenant_id,
                    template_id = %id,
                    cleared,
                    "Cleared feature template references"
                );
                updates.push(SectionUpdate::templates(TemplateKind::Feature, features));
            }
        }

        self.write(tenant_id, kind, "delete", &snapshot, None, updates).await?;
        Ok(removed)
    }

    pub async fn toggle_enabled(
        &self,
        tenant_id: &TenantId,
        kind: TemplateKind,
        id: &str,
    ) -> ConfigResult<ExportTemplate> {
        let (snapshot, working) = self.load(tenant_id).await?;
        let (templates, toggled) = list::toggle_enabled(working.templates(kind).to_vec(), id)?;

        let updates = vec![SectionUpdate::templates(kind, templates)];
        self.write(tenant_id, kind, "toggle", &snapshot, None, updates)
            .await?;
        Ok(toggled)
    }

    /// Reorder the list; `ordered_ids` must name every template once.
    pub async fn reorder(
        &self,
        tenant_id: &TenantId,
        kind: TemplateKind,
        ordered_ids: &[String],
    ) -> ConfigResult<Vec<ExportTemplate>> {
        let (snapshot, working) = self.load(tenant_id).await?;
        let templates = list::reorder(working.templates(kind).to_vec(), ordered_ids)?;

        let updates = vec![SectionUpdate::templates(kind, templates.clone())];
        self.write(tenant_id, kind, "reorder", &snapshot, None, updates)
            .await?;
        Ok(templates)
    }

    async fn load(&self, tenant_id: &TenantId) -> ConfigResult<(TenantSnapshot, Configuration)> {
        let snapshot = self.manager.snapshot(tenant_id).await?;
        let working = snapshot.working().cloned().ok_or_else(|| {
            ConfigError::NotFound(format!("Tenant {} has no configuration", tenant_id))
        })?;
        Ok((snapshot, working))
    }

    /// Write through the manager, conditional on the version the list was
    /// read at (or the caller's expected version, if given).
    async fn write(
        &self,
        tenant_id: &TenantId,
        kind: TemplateKind,
        op: &'static str,
        read: &TenantSnapshot,
        expected_version: Option<u64>,
        updates: Vec<SectionUpdate>,
    ) -> ConfigResult<TenantSnapshot> {
        if let Some(expected) = expected_version {
            if expected != read.version {
                return Err(ConfigError::Conflict {
                    expected,
                    actual: read.version,
                });
            }
        }

        let snapshot = self
            .manager
            .edit_sections(tenant_id, updates, Some(read.version))
            .await?;
        TemplateMetrics::record_tenant(kind.as_str(), op);
        Ok(snapshot)
    }
}

/// A fresh copy of `source`: new id, new `createdAt`, enabled.
fn copy_of(kind: TemplateKind, source: ExportTemplate) -> ExportTemplate {
    ExportTemplate {
        id: mint_id(kind),
        created_at: Utc::now(),
        updated_at: None,
        enabled: true,
        ..source
    }
}
