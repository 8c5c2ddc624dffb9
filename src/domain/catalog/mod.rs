//! Global template catalog.
//!
//! Organization-independent templates of both kinds, kept in the system
//! document `system/atlas`. Any tenant may read the catalog and copy from
//! it; only holders of a [`CatalogMaintainer`] capability may change it.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::auth::Claims;
use crate::domain::error::{ConfigError, ConfigResult};
use crate::domain::model::{ExportTemplate, TemplateKind};
use crate::domain::template::ids::mint_id;
use crate::domain::template::list;
use crate::domain::template::TemplateInput;
use crate::metrics::{LifecycleMetrics, TemplateMetrics};
use crate::store::{Document, DocumentStore, FieldUpdate, Precondition};

pub const CATALOG_DOCUMENT_KEY: &str = "system/atlas";

/// Proof that the caller may modify the global catalog.
///
/// Only obtainable from verified claims carrying the catalog maintainer
/// role.
#[derive(Debug, Clone)]
pub struct CatalogMaintainer {
    operator_id: String,
}

impl CatalogMaintainer {
    pub fn from_claims(claims: &Claims) -> ConfigResult<Self> {
        if !claims.is_catalog_maintainer() {
            return Err(ConfigError::PermissionDenied(format!(
                "Operator {} may not modify the global template catalog",
                claims.operator_id()
            )));
        }

        Ok(Self {
            operator_id: claims.operator_id().to_string(),
        })
    }

    pub fn operator_id(&self) -> &str {
        &self.operator_id
    }
}

/// The catalog as read at one store version.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub global_export_templates: Vec<ExportTemplate>,
    pub global_feature_export_templates: Vec<ExportTemplate>,
    pub version: u64,
}

impl CatalogSnapshot {
    pub fn templates(&self, kind: TemplateKind) -> &[ExportTemplate] {
        match kind {
            TemplateKind::Map => &self.global_export_templates,
            TemplateKind::Feature => &self.global_feature_export_templates,
        }
    }

    fn from_document(doc: &Document) -> ConfigResult<Self> {
        Ok(Self {
            global_export_templates: decode_list(doc, TemplateKind::Map)?,
            global_feature_export_templates: decode_list(doc, TemplateKind::Feature)?,
            version: doc.version,
        })
    }
}

fn decode_list(doc: &Document, kind: TemplateKind) -> ConfigResult<Vec<ExportTemplate>> {
    match doc.field(kind.catalog_field()) {
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            ConfigError::PersistenceFailure(format!(
                "Stored {} is malformed: {}",
                kind.catalog_field(),
                e
            ))
        }),
        None => Ok(Vec::new()),
    }
}

fn encode_list(kind: TemplateKind, templates: &[ExportTemplate]) -> ConfigResult<FieldUpdate> {
    let value: Value = serde_json::to_value(templates)
        .map_err(|e| ConfigError::PersistenceFailure(format!("Failed to encode templates: {}", e)))?;
    Ok(FieldUpdate::set(kind.catalog_field(), value))
}

pub struct GlobalTemplateCatalog {
    store: Arc<dyn DocumentStore>,
}

impl GlobalTemplateCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn snapshot(&self) -> ConfigResult<CatalogSnapshot> {
        match self.store.get(CATALOG_DOCUMENT_KEY).await? {
            Some(doc) => CatalogSnapshot::from_document(&doc),
            None => Ok(CatalogSnapshot::default()),
        }
    }

    pub async fn list(&self, kind: TemplateKind) -> ConfigResult<Vec<ExportTemplate>> {
        Ok(self.snapshot().await?.templates(kind).to_vec())
    }

    pub async fn get(&self, kind: TemplateKind, id: &str) -> ConfigResult<ExportTemplate> {
        let snapshot = self.snapshot().await?;
        list::find(snapshot.templates(kind), id).cloned()
    }

    pub async fn create(
        &self,
        maintainer: &CatalogMaintainer,
        kind: TemplateKind,
        input: TemplateInput,
    ) -> ConfigResult<ExportTemplate> {
        let mut template = ExportTemplate::blank(mint_id(kind));
        input.apply_to(&mut template);

        self.modify(maintainer, kind, "create", |snapshot| {
            list::validate_map_reference(&snapshot.global_export_templates, kind, &template)?;
            list::append_new(snapshot.templates(kind).to_vec(), template)
        })
        .await
    }

    pub async fn update(
        &self,
        maintainer: &CatalogMaintainer,
        kind: TemplateKind,
        id: &str,
        input: TemplateInput,
    ) -> ConfigResult<ExportTemplate> {
        self.modify(maintainer, kind, "update", |snapshot| {
            let mut template = list::find(snapshot.templates(kind), id)?.clone();
            input.apply_to(&mut template);
            list::validate_map_reference(&snapshot.global_export_templates, kind, &template)?;
            list::replace(snapshot.templates(kind).to_vec(), template)
        })
        .await
    }

    pub async fn duplicate(
        &self,
        maintainer: &CatalogMaintainer,
        kind: TemplateKind,
        id: &str,
    ) -> ConfigResult<ExportTemplate> {
        self.modify(maintainer, kind, "duplicate", |snapshot| {
            list::duplicate(snapshot.templates(kind).to_vec(), kind, id)
        })
        .await
    }

    pub async fn toggle_enabled(
        &self,
        maintainer: &CatalogMaintainer,
        kind: TemplateKind,
        id: &str,
    ) -> ConfigResult<ExportTemplate> {
        self.modify(maintainer, kind, "toggle", |snapshot| {
            list::toggle_enabled(snapshot.templates(kind).to_vec(), id)
        })
        .await
    }

    /// Remove a global template. Deleting a map template also clears
    /// references to it from global feature templates, in the same write.
    pub async fn delete(
        &self,
        maintainer: &CatalogMaintainer,
        kind: TemplateKind,
        id: &str,
    ) -> ConfigResult<ExportTemplate> {
        let snapshot = self.snapshot().await?;
        let (remaining, removed) = list::remove(snapshot.templates(kind).to_vec(), id)?;

        let mut updates = vec![encode_list(kind, &remaining)?];
        if kind == TemplateKind::Map {
            let mut features = snapshot.global_feature_export_templates.clone();
            if list::clear_map_references(&mut features, id) > 0 {
                updates.push(encode_list(TemplateKind::Feature, &features)?);
            }
        }

        self.write(maintainer, kind, "delete", &snapshot, updates).await?;
        Ok(removed)
    }

    pub fn subscribe(&self) -> CatalogSubscription {
        LifecycleMetrics::subscription_opened();
        CatalogSubscription {
            receiver: self.store.subscribe(CATALOG_DOCUMENT_KEY),
            last_version: 0,
        }
    }

    async fn modify<F>(
        &self,
        maintainer: &CatalogMaintainer,
        kind: TemplateKind,
        op: &'static str,
        change: F,
    ) -> ConfigResult<ExportTemplate>
    where
        F: FnOnce(&CatalogSnapshot) -> ConfigResult<(Vec<ExportTemplate>, ExportTemplate)>,
    {
        let snapshot = self.snapshot().await?;
        let (templates, affected) = change(&snapshot)?;
        self.write(maintainer, kind, op, &snapshot, vec![encode_list(kind, &templates)?])
            .await?;
        Ok(affected)
    }

    async fn write(
        &self,
        maintainer: &CatalogMaintainer,
        kind: TemplateKind,
        op: &'static str,
        read: &CatalogSnapshot,
        updates: Vec<FieldUpdate>,
    ) -> ConfigResult<()> {
        let doc = self
            .store
            .update_fields(CATALOG_DOCUMENT_KEY, updates, Precondition::Version(read.version))
            .await?;

        TemplateMetrics::record_global(kind.as_str(), op);
        tracing::info!(
            operator_id = %maintainer.operator_id(),
            kind = kind.as_str(),
            op,
            version = doc.version,
            "Global template catalog updated"
        );
        Ok(())
    }
}

/// Stream of catalog snapshots pushed after every write.
pub struct CatalogSubscription {
    receiver: broadcast::Receiver<Document>,
    last_version: u64,
}

impl CatalogSubscription {
    /// Next snapshot newer than any already returned.
    pub async fn next(&mut self) -> Option<ConfigResult<CatalogSnapshot>> {
        loop {
            match self.receiver.recv().await {
                Ok(doc) if doc.version <= self.last_version => {}
                Ok(doc) => {
                    self.last_version = doc.version;
                    return Some(CatalogSnapshot::from_document(&doc));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Catalog subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for CatalogSubscription {
    fn drop(&mut self) {
        LifecycleMetrics::subscription_closed();
    }
}
