//! Lifecycle and template library integration tests
//!
//! Runs the draft/publish manager, tenant template library and global
//! catalog together over one in-memory document store.

use std::sync::Arc;

use serde_json::Map;

use atlas_config_service::domain::catalog::{CatalogMaintainer, GlobalTemplateCatalog};
use atlas_config_service::domain::lifecycle::{
    ConfigRepository, ConfigStatus, DraftPublishManager, PreviewMode,
};
use atlas_config_service::domain::merge::{DataPatch, SectionUpdate, UiPatch};
use atlas_config_service::domain::model::{
    ExportTemplate, MapDefinition, TemplateKind, TenantId, TenantSeed,
};
use atlas_config_service::domain::template::{DeleteConfirmation, TemplateInput, TemplateLibrary};
use atlas_config_service::auth::{Claims, CATALOG_MAINTAINER_ROLE};
use atlas_config_service::store::{DocumentStore, MemoryDocumentStore};
use atlas_config_service::ConfigError;

struct TestEnvironment {
    manager: Arc<DraftPublishManager>,
    library: TemplateLibrary,
    catalog: Arc<GlobalTemplateCatalog>,
}

fn create_test_environment() -> TestEnvironment {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let manager = Arc::new(DraftPublishManager::new(ConfigRepository::new(store.clone())));
    let catalog = Arc::new(GlobalTemplateCatalog::new(store));
    let library = TemplateLibrary::new(manager.clone(), catalog.clone());

    TestEnvironment {
        manager,
        library,
        catalog,
    }
}

fn tenant(id: &str) -> TenantId {
    TenantId::parse(id).unwrap()
}

fn ui_title(title: &str) -> SectionUpdate {
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

fn maintainer() -> CatalogMaintainer {
    let claims = Claims {
        sub: "curator".to_string(),
        exp: chrono::Utc::now().timestamp() + 300,
        iat: chrono::Utc::now().timestamp(),
        roles: vec![CATALOG_MAINTAINER_ROLE.to_string()],
        tenant_id: None,
        extra: Default::default(),
    };
    CatalogMaintainer::from_claims(&claims).unwrap()
}

fn input(name: &str) -> TemplateInput {
    TemplateInput::from(&ExportTemplate {
        name: name.to_string(),
        ..ExportTemplate::blank("unused")
    })
}

// =============================================================================
// Draft/Publish Lifecycle Tests
// =============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_springfield_scenario() {
        let env = create_test_environment();
        let t1 = tenant("t1");

        let snapshot = env
            .manager
            .initialize(&t1, &TenantSeed::new("Springfield"))
            .await
            .unwrap();
        assert_eq!(snapshot.status(), ConfigStatus::Live);
        assert_eq!(snapshot.live.as_ref().unwrap().ui.header_title, "Springfield");
        assert!(snapshot.draft.is_none());

        let snapshot = env.manager.edit(&t1, ui_title("Springfield GIS"), None).await.unwrap();
        assert_eq!(snapshot.status(), ConfigStatus::LiveWithDraft);
        assert_eq!(snapshot.draft.as_ref().unwrap().ui.header_title, "Springfield GIS");
        assert_eq!(snapshot.live.as_ref().unwrap().ui.header_title, "Springfield");

        let snapshot = env.manager.publish(&t1, None).await.unwrap();
        assert_eq!(snapshot.status(), ConfigStatus::Live);
        assert_eq!(snapshot.live.as_ref().unwrap().ui.header_title, "Springfield GIS");
        assert!(snapshot.draft.is_none());
    }

    #[tokio::test]
    async fn test_edit_then_discard_restores_live() {
        let env = create_test_environment();
        let t1 = tenant("t1");
        let initial = env
            .manager
            .initialize(&t1, &TenantSeed::new("Springfield"))
            .await
            .unwrap();

        env.manager.edit(&t1, ui_title("Changed"), None).await.unwrap();
        let snapshot = env.manager.discard(&t1, None).await.unwrap();

        assert_eq!(snapshot.live, initial.live);
        assert!(snapshot.draft.is_none());
    }

    #[tokio::test]
    async fn test_publish_takes_latest_edit() {
        let env = create_test_environment();
        let t1 = tenant("t1");
        env.manager
            .initialize(&t1, &TenantSeed::new("Springfield"))
            .await
            .unwrap();

        env.manager.edit(&t1, ui_title("First"), None).await.unwrap();
        let edited = env.manager.edit(&t1, ui_title("Second"), None).await.unwrap();
        let published = env.manager.publish(&t1, None).await.unwrap();

        assert_eq!(published.live, edited.draft);
        assert!(published.draft.is_none());
    }

    #[tokio::test]
    async fn test_render_preview_modes() {
        let env = create_test_environment();
        let t1 = tenant("t1");
        env.manager
            .initialize(&t1, &TenantSeed::new("Springfield"))
            .await
            .unwrap();
        env.manager.edit(&t1, ui_title("Preview"), None).await.unwrap();

        let live = env.manager.resolve_for_render(&t1, PreviewMode::Live).await.unwrap();
        let draft = env.manager.resolve_for_render(&t1, PreviewMode::Draft).await.unwrap();
        assert_eq!(live.ui.header_title, "Springfield");
        assert_eq!(draft.ui.header_title, "Preview");
    }

    #[tokio::test]
    async fn test_rejected_transitions() {
        let env = create_test_environment();
        let t1 = tenant("t1");

        assert!(matches!(
            env.manager.edit(&t1, ui_title("x"), None).await,
            Err(ConfigError::NotFound(_))
        ));
        assert!(matches!(
            env.manager.publish(&t1, None).await,
            Err(ConfigError::NoDraftToPublish(_))
        ));

        env.manager
            .initialize(&t1, &TenantSeed::new("Springfield"))
            .await
            .unwrap();
        assert!(matches!(
            env.manager.initialize(&t1, &TenantSeed::new("Again")).await,
            Err(ConfigError::AlreadyInitialized(_))
        ));
        assert!(matches!(
            env.manager.discard(&t1, None).await,
            Err(ConfigError::NoDraftToDiscard(_))
        ));
    }

    #[tokio::test]
    async fn test_uninitialize_blocked_by_maps() {
        let env = create_test_environment();
        let t1 = tenant("t1");
        env.manager
            .initialize(&t1, &TenantSeed::new("Springfield"))
            .await
            .unwrap();
        env.manager
            .set_maps(&t1, vec![map("m1"), map("m2")], None)
            .await
            .unwrap();

        let result = env.manager.uninitialize(&t1, None).await;
        assert!(matches!(
            result,
            Err(ConfigError::MapsStillConfigured { count: 2, .. })
        ));

        env.manager.set_maps(&t1, vec![], None).await.unwrap();
        let snapshot = env.manager.uninitialize(&t1, None).await.unwrap();
        assert_eq!(snapshot.status(), ConfigStatus::Uninitialized);
    }

    #[tokio::test]
    async fn test_data_edit_keeps_maps() {
        let env = create_test_environment();
        let t1 = tenant("t1");
        env.manager
            .initialize(&t1, &TenantSeed::new("Springfield"))
            .await
            .unwrap();
        env.manager
            .set_maps(&t1, vec![map("m1"), map("m2")], None)
            .await
            .unwrap();

        let update = SectionUpdate::Data(DataPatch {
            system_prompt: Some(Some("Be concise".to_string())),
            feature_limit: Some(250),
        });
        let snapshot = env.manager.edit(&t1, update, None).await.unwrap();
        let data = &snapshot.draft.as_ref().unwrap().data;

        let ids: Vec<&str> = data.maps.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert_eq!(data.feature_limit, 250);
    }

    #[tokio::test]
    async fn test_stale_expected_version_conflicts() {
        let env = create_test_environment();
        let t1 = tenant("t1");
        let initial = env
            .manager
            .initialize(&t1, &TenantSeed::new("Springfield"))
            .await
            .unwrap();

        env.manager
            .edit(&t1, ui_title("A"), Some(initial.version))
            .await
            .unwrap();
        let stale = env.manager.edit(&t1, ui_title("B"), Some(initial.version)).await;
        assert!(matches!(stale, Err(ConfigError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_subscription_sees_publish() {
        let env = create_test_environment();
        let t1 = tenant("t1");
        env.manager
            .initialize(&t1, &TenantSeed::new("Springfield"))
            .await
            .unwrap();
        env.manager.edit(&t1, ui_title("Next"), None).await.unwrap();

        let mut subscription = env.manager.subscribe(&t1);
        env.manager.publish(&t1, None).await.unwrap();

        let snapshot = subscription.next().await.unwrap().unwrap();
        assert_eq!(snapshot.status(), ConfigStatus::Live);
        assert_eq!(snapshot.live.unwrap().ui.header_title, "Next");
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let env = create_test_environment();
        let t1 = tenant("t1");
        let t2 = tenant("t2");
        env.manager.initialize(&t1, &TenantSeed::new("One")).await.unwrap();
        env.manager.initialize(&t2, &TenantSeed::new("Two")).await.unwrap();

        env.manager.edit(&t1, ui_title("One edited"), None).await.unwrap();

        let other = env.manager.snapshot(&t2).await.unwrap();
        assert_eq!(other.status(), ConfigStatus::Live);
        assert_eq!(other.live.unwrap().ui.header_title, "Two");
    }
}

// =============================================================================
// Template Library Tests
// =============================================================================

mod library_tests {
    use super::*;

    async fn initialized(env: &TestEnvironment, id: &str) -> TenantId {
        let t = tenant(id);
        env.manager
            .initialize(&t, &TenantSeed::new("Springfield"))
            .await
            .unwrap();
        t
    }

    #[tokio::test]
    async fn test_duplicate_standard_scenario() {
        let env = create_test_environment();
        let t1 = initialized(&env, "t1").await;

        let mut original = ExportTemplate::blank("a");
        original.name = "Standard".to_string();
        env.manager
            .edit(
                &t1,
                SectionUpdate::ExportTemplates(vec![original.clone()]),
                None,
            )
            .await
            .unwrap();

        let copy = env.library.duplicate(&t1, TemplateKind::Map, "a").await.unwrap();
        let templates = env.library.list(&t1, TemplateKind::Map).await.unwrap();

        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].id, "a");
        assert_eq!(templates[0].name, "Standard");
        assert_eq!(templates[1].id, copy.id);
        assert_ne!(copy.id, "a");
        assert_eq!(copy.name, "Standard (Copy)");
        assert_eq!(copy.elements, original.elements);
    }

    #[tokio::test]
    async fn test_template_edits_go_to_draft() {
        let env = create_test_environment();
        let t1 = initialized(&env, "t1").await;

        let session = env
            .library
            .create_from_starter(TemplateKind::Map, "standard")
            .unwrap();
        let saved = env.library.save(&t1, session, None).await.unwrap();

        let snapshot = env.manager.snapshot(&t1).await.unwrap();
        assert_eq!(snapshot.status(), ConfigStatus::LiveWithDraft);
        assert!(snapshot.live.unwrap().export_templates.is_empty());
        assert_eq!(snapshot.draft.unwrap().export_templates[0].id, saved.id);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores() {
        let env = create_test_environment();
        let t1 = initialized(&env, "t1").await;
        let mut session = env.library.create_blank(TemplateKind::Feature);
        session.apply(input("Sheet"));
        let saved = env.library.save(&t1, session, None).await.unwrap();

        let once = env
            .library
            .toggle_enabled(&t1, TemplateKind::Feature, &saved.id)
            .await
            .unwrap();
        assert_eq!(once.enabled, !saved.enabled);

        let twice = env
            .library
            .toggle_enabled(&t1, TemplateKind::Feature, &saved.id)
            .await
            .unwrap();
        assert_eq!(twice.enabled, saved.enabled);
    }

    #[tokio::test]
    async fn test_delete_requires_matching_confirmation() {
        let env = create_test_environment();
        let t1 = initialized(&env, "t1").await;
        let mut session = env.library.create_blank(TemplateKind::Map);
        session.apply(input("Doomed"));
        let saved = env.library.save(&t1, session, None).await.unwrap();

        let wrong = env
            .library
            .delete(
                &t1,
                TemplateKind::Map,
                &saved.id,
                DeleteConfirmation::for_template("something-else"),
            )
            .await;
        assert!(matches!(wrong, Err(ConfigError::ValidationFailed(_))));

        env.library
            .delete(
                &t1,
                TemplateKind::Map,
                &saved.id,
                DeleteConfirmation::for_template(saved.id.clone()),
            )
            .await
            .unwrap();
        assert!(env.library.list(&t1, TemplateKind::Map).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_copy_from_global_catalog() {
        let env = create_test_environment();
        let t1 = initialized(&env, "t1").await;

        let global = env
            .catalog
            .create(&maintainer(), TemplateKind::Map, input("County Standard"))
            .await
            .unwrap();

        let session = env
            .library
            .create_from_global(TemplateKind::Map, &global.id)
            .await
            .unwrap();
        let saved = env.library.save(&t1, session, None).await.unwrap();

        assert_eq!(saved.name, "County Standard");
        assert_eq!(env.library.list(&t1, TemplateKind::Map).await.unwrap().len(), 1);
        // The catalog entry is untouched by tenant saves
        assert_eq!(env.catalog.list(TemplateKind::Map).await.unwrap(), vec![global]);
    }
}
