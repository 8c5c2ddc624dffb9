//! Draft/publish manager.
//!
//! Every operation reads the tenant record once, checks the lifecycle
//! transition, and issues exactly one store write conditional on the version
//! it read. A concurrent writer in between makes the operation fail with
//! `Conflict`; nothing is retried.

use serde::Deserialize;

use crate::domain::error::{ConfigError, ConfigResult};
use crate::domain::merge::{merge_section, replace_maps, SectionUpdate};
use crate::domain::model::{
    default_configuration, Configuration, MapDefinition, TenantId, TenantSeed,
};
use crate::metrics::LifecycleMetrics;
use crate::store::Precondition;

use super::repository::{ConfigRepository, ConfigWrite, TenantSnapshot, TenantSubscription};
use super::state::LifecycleOp;

/// Which configuration a renderer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    #[default]
    Live,
    /// Draft if present, otherwise live
    Draft,
}

pub struct DraftPublishManager {
    repository: ConfigRepository,
}

impl DraftPublishManager {
    pub fn new(repository: ConfigRepository) -> Self {
        Self { repository }
    }

    pub async fn snapshot(&self, tenant_id: &TenantId) -> ConfigResult<TenantSnapshot> {
        let snapshot = self.repository.load(tenant_id).await?;
        tracing::debug!(
            tenant_id = %tenant_id,
            status = snapshot.status().as_str(),
            version = snapshot.version,
            "Loaded tenant configuration"
        );
        Ok(snapshot)
    }

    /// The configuration editors work on: draft if present, else live.
    pub async fn working(&self, tenant_id: &TenantId) -> ConfigResult<Configuration> {
        self.snapshot(tenant_id)
            .await?
            .working()
            .cloned()
            .ok_or_else(|| no_configuration(tenant_id))
    }

    /// Configuration for the end-user application.
    pub async fn resolve_for_render(
        &self,
        tenant_id: &TenantId,
        preview: PreviewMode,
    ) -> ConfigResult<Configuration> {
        let snapshot = self.snapshot(tenant_id).await?;
        let resolved = match preview {
            PreviewMode::Live => snapshot.live,
            PreviewMode::Draft => snapshot.draft.or(snapshot.live),
        };
        resolved.ok_or_else(|| {
            ConfigError::NotFound(format!("Tenant {} has no published configuration", tenant_id))
        })
    }

    pub fn subscribe(&self, tenant_id: &TenantId) -> TenantSubscription {
        self.repository.subscribe(tenant_id)
    }

    /// Create the tenant's configuration and write it directly as live.
    pub async fn initialize(
        &self,
        tenant_id: &TenantId,
        seed: &TenantSeed,
    ) -> ConfigResult<TenantSnapshot> {
        let op = LifecycleOp::Initialize;
        let result = async {
            let snapshot = self.load_expected(tenant_id, None).await?;
            snapshot.status().transition(op, tenant_id)?;
            let config = default_configuration(seed)?;
            self.commit(&snapshot, ConfigWrite::SetLive(config)).await
        }
        .await;
        self.record(op, tenant_id, result)
    }

    /// Apply one section update to the working configuration and save it as
    /// the draft.
    pub async fn edit(
        &self,
        tenant_id: &TenantId,
        update: SectionUpdate,
        expected_version: Option<u64>,
    ) -> ConfigResult<TenantSnapshot> {
        self.edit_sections(tenant_id, vec![update], expected_version).await
    }

    /// Apply several section updates in order and save the result as one
    /// draft write.
    pub async fn edit_sections(
        &self,
        tenant_id: &TenantId,
        updates: Vec<SectionUpdate>,
        expected_version: Option<u64>,
    ) -> ConfigResult<TenantSnapshot> {
        let sections: Vec<&'static str> = updates.iter().map(SectionUpdate::section).collect();

        let result = self
            .write_draft(tenant_id, expected_version, |working| {
                updates
                    .into_iter()
                    .try_fold(working.clone(), |config, update| merge_section(&config, update))
            })
            .await;

        if result.is_ok() {
            for section in &sections {
                LifecycleMetrics::record_section_edit(section);
            }
        }
        self.record(LifecycleOp::Edit, tenant_id, result)
    }

    /// Promote the draft to live and clear it, in one write.
    pub async fn publish(
        &self,
        tenant_id: &TenantId,
        expected_version: Option<u64>,
    ) -> ConfigResult<TenantSnapshot> {
        let op = LifecycleOp::Publish;
        let result = async {
            let snapshot = self.load_expected(tenant_id, expected_version).await?;
            snapshot.status().transition(op, tenant_id)?;
            let draft = snapshot
                .draft
                .clone()
                .ok_or_else(|| ConfigError::NoDraftToPublish(tenant_id.to_string()))?;
            self.commit(&snapshot, ConfigWrite::Promote(draft)).await
        }
        .await;
        self.record(op, tenant_id, result)
    }

    /// Drop the draft, leaving live untouched.
    pub async fn discard(
        &self,
        tenant_id: &TenantId,
        expected_version: Option<u64>,
    ) -> ConfigResult<TenantSnapshot> {
        let op = LifecycleOp::Discard;
        let result = async {
            let snapshot = self.load_expected(tenant_id, expected_version).await?;
            snapshot.status().transition(op, tenant_id)?;
            self.commit(&snapshot, ConfigWrite::ClearDraft).await
        }
        .await;
        self.record(op, tenant_id, result)
    }

    /// Remove the tenant's configuration. Blocked while any map remains.
    pub async fn uninitialize(
        &self,
        tenant_id: &TenantId,
        expected_version: Option<u64>,
    ) -> ConfigResult<TenantSnapshot> {
        let op = LifecycleOp::Uninitialize;
        let result = async {
            let snapshot = self.load_expected(tenant_id, expected_version).await?;
            snapshot.status().transition(op, tenant_id)?;

            let count = snapshot.working().map_or(0, |c| c.data.maps.len());
            if count > 0 {
                return Err(ConfigError::MapsStillConfigured {
                    tenant_id: tenant_id.to_string(),
                    count,
                });
            }

            self.commit(&snapshot, ConfigWrite::ClearAll).await
        }
        .await;
        self.record(op, tenant_id, result)
    }

    /// Replace the tenant's map list through the draft path.
    pub async fn set_maps(
        &self,
        tenant_id: &TenantId,
        maps: Vec<MapDefinition>,
        expected_version: Option<u64>,
    ) -> ConfigResult<TenantSnapshot> {
        let result = self
            .write_draft(tenant_id, expected_version, |working| replace_maps(working, maps))
            .await;
        if result.is_ok() {
            LifecycleMetrics::record_section_edit("maps");
        }
        self.record(LifecycleOp::Edit, tenant_id, result)
    }

    pub async fn add_map(
        &self,
        tenant_id: &TenantId,
        map: MapDefinition,
        expected_version: Option<u64>,
    ) -> ConfigResult<TenantSnapshot> {
        let result = self
            .write_draft(tenant_id, expected_version, |working| {
                let mut maps = working.data.maps.clone();
                maps.push(map);
                replace_maps(working, maps)
            })
            .await;
        if result.is_ok() {
            LifecycleMetrics::record_section_edit("maps");
        }
        self.record(LifecycleOp::Edit, tenant_id, result)
    }

    pub async fn remove_map(
        &self,
        tenant_id: &TenantId,
        map_id: &str,
        expected_version: Option<u64>,
    ) -> ConfigResult<TenantSnapshot> {
        let result = self
            .write_draft(tenant_id, expected_version, |working| {
                let mut maps = working.data.maps.clone();
                let before = maps.len();
                maps.retain(|m| m.id != map_id);
                if maps.len() == before {
                    return Err(ConfigError::NotFound(format!("Map {}", map_id)));
                }
                replace_maps(working, maps)
            })
            .await;
        if result.is_ok() {
            LifecycleMetrics::record_section_edit("maps");
        }
        self.record(LifecycleOp::Edit, tenant_id, result)
    }

    async fn write_draft<F>(
        &self,
        tenant_id: &TenantId,
        expected_version: Option<u64>,
        compute: F,
    ) -> ConfigResult<TenantSnapshot>
    where
        F: FnOnce(&Configuration) -> ConfigResult<Configuration>,
    {
        let snapshot = self.load_expected(tenant_id, expected_version).await?;
        snapshot.status().transition(LifecycleOp::Edit, tenant_id)?;

        let working = snapshot
            .working()
            .ok_or_else(|| no_configuration(tenant_id))?;
        let draft = compute(working)?;

        self.commit(&snapshot, ConfigWrite::SetDraft(draft)).await
    }

    async fn load_expected(
        &self,
        tenant_id: &TenantId,
        expected_version: Option<u64>,
    ) -> ConfigResult<TenantSnapshot> {
        let snapshot = self.repository.load(tenant_id).await?;
        match expected_version {
            Some(expected) if expected != snapshot.version => Err(ConfigError::Conflict {
                expected,
                actual: snapshot.version,
            }),
            _ => Ok(snapshot),
        }
    }

    async fn commit(
        &self,
        read: &TenantSnapshot,
        write: ConfigWrite,
    ) -> ConfigResult<TenantSnapshot> {
        self.repository
            .write(&read.tenant_id, write, Precondition::Version(read.version))
            .await
    }

    fn record(
        &self,
        op: LifecycleOp,
        tenant_id: &TenantId,
        result: ConfigResult<TenantSnapshot>,
    ) -> ConfigResult<TenantSnapshot> {
        match &result {
            Ok(snapshot) => {
                LifecycleMetrics::record_transition(op.as_str());
                tracing::info!(
                    tenant_id = %tenant_id,
                    op = op.as_str(),
                    status = snapshot.status().as_str(),
                    version = snapshot.version,
                    "Configuration updated"
                );
            }
            Err(e) => {
                LifecycleMetrics::record_rejection(op.as_str(), e.code());
                tracing::warn!(
                    tenant_id = %tenant_id,
                    op = op.as_str(),
                    code = e.code(),
                    error = %e,
                    "Configuration operation rejected"
                );
            }
        }
        result
    }
}

fn no_configuration(tenant_id: &TenantId) -> ConfigError {
    ConfigError::NotFound(format!("Tenant {} has no configuration", tenant_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::lifecycle::ConfigStatus;
    use crate::domain::merge::UiPatch;
    use crate::store::MemoryDocumentStore;
    use serde_json::Map;

    fn manager() -> DraftPublishManager {
        DraftPublishManager::new(ConfigRepository::new(Arc::new(MemoryDocumentStore::new())))
    }

    fn tenant() -> TenantId {
        TenantId::parse("T1").unwrap()
    }

    fn title(title: &str) -> SectionUpdate {
        SectionUpdate::Ui(UiPatch {
            header_title: Some(title.to_string()),
            ..Default::default()
        })
    }

    fn map(id: &str) -> MapDefinition {
        MapDefinition {
            id: id.to_string(),
            name: format!("Map {}", id),
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_initialize_writes_live_only() {
        let manager = manager();
        let snapshot = manager
            .initialize(&tenant(), &TenantSeed::new("Springfield"))
            .await
            .unwrap();

        assert_eq!(snapshot.status(), ConfigStatus::Live);
        assert_eq!(snapshot.live.unwrap().ui.header_title, "Springfield");
        assert!(snapshot.draft.is_none());
    }

    #[tokio::test]
    async fn test_initialize_twice_rejected() {
        let manager = manager();
        manager.initialize(&tenant(), &TenantSeed::new("A")).await.unwrap();

        let result = manager.initialize(&tenant(), &TenantSeed::new("B")).await;
        assert!(matches!(result, Err(ConfigError::AlreadyInitialized(_))));
    }

    #[tokio::test]
    async fn test_edit_uninitialized_is_not_found() {
        let result = manager().edit(&tenant(), title("X"), None).await;
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_edit_then_discard_restores_live() {
        let manager = manager();
        let initial = manager.initialize(&tenant(), &TenantSeed::new("Springfield")).await.unwrap();

        manager.edit(&tenant(), title("Changed"), None).await.unwrap();
        let snapshot = manager.discard(&tenant(), None).await.unwrap();

        assert_eq!(snapshot.live, initial.live);
        assert!(snapshot.draft.is_none());
        assert_eq!(snapshot.status(), ConfigStatus::Live);
    }

    #[tokio::test]
    async fn test_publish_without_draft() {
        let manager = manager();
        manager.initialize(&tenant(), &TenantSeed::new("A")).await.unwrap();

        let result = manager.publish(&tenant(), None).await;
        assert!(matches!(result, Err(ConfigError::NoDraftToPublish(_))));

        let result = manager.discard(&tenant(), None).await;
        assert!(matches!(result, Err(ConfigError::NoDraftToDiscard(_))));
    }

    #[tokio::test]
    async fn test_expected_version_mismatch() {
        let manager = manager();
        let snapshot = manager.initialize(&tenant(), &TenantSeed::new("A")).await.unwrap();

        manager.edit(&tenant(), title("B"), Some(snapshot.version)).await.unwrap();
        let stale = manager.edit(&tenant(), title("C"), Some(snapshot.version)).await;

        assert!(matches!(stale, Err(ConfigError::Conflict { .. })));
        let working = manager.working(&tenant()).await.unwrap();
        assert_eq!(working.ui.header_title, "B");
    }

    #[tokio::test]
    async fn test_uninitialize_blocked_by_maps() {
        let manager = manager();
        manager.initialize(&tenant(), &TenantSeed::new("A")).await.unwrap();
        manager.add_map(&tenant(), map("m1"), None).await.unwrap();

        let result = manager.uninitialize(&tenant(), None).await;
        assert!(matches!(
            result,
            Err(ConfigError::MapsStillConfigured { count: 1, .. })
        ));

        manager.remove_map(&tenant(), "m1", None).await.unwrap();
        let snapshot = manager.uninitialize(&tenant(), None).await.unwrap();
        assert_eq!(snapshot.status(), ConfigStatus::Uninitialized);
    }

    #[tokio::test]
    async fn test_remove_unknown_map() {
        let manager = manager();
        manager.initialize(&tenant(), &TenantSeed::new("A")).await.unwrap();

        let result = manager.remove_map(&tenant(), "missing", None).await;
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_for_render() {
        let manager = manager();
        assert!(manager
            .resolve_for_render(&tenant(), PreviewMode::Live)
            .await
            .is_err());

        manager.initialize(&tenant(), &TenantSeed::new("Live title")).await.unwrap();
        manager.edit(&tenant(), title("Draft title"), None).await.unwrap();

        let live = manager.resolve_for_render(&tenant(), PreviewMode::Live).await.unwrap();
        let draft = manager.resolve_for_render(&tenant(), PreviewMode::Draft).await.unwrap();
        assert_eq!(live.ui.header_title, "Live title");
        assert_eq!(draft.ui.header_title, "Draft title");
    }

    #[tokio::test]
    async fn test_failed_edit_leaves_record_untouched() {
        let manager = manager();
        let before = manager.initialize(&tenant(), &TenantSeed::new("A")).await.unwrap();

        let result = manager
            .edit(&tenant(), SectionUpdate::Basemaps(vec![]), None)
            .await;
        assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));

        let after = manager.snapshot(&tenant()).await.unwrap();
        assert_eq!(after, before);
    }
}
