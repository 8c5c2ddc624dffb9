//! Configuration and template data model.

pub mod config;
pub mod defaults;
pub mod template;
pub mod tenant;

pub use config::{
    Basemap, Configuration, DataSettings, Disclaimer, HelpDocument, MapDefinition, Messages,
    UiSettings,
};
pub use defaults::{default_configuration, DEFAULT_BASEMAP_ID};
pub use template::{
    ElementContent, ElementType, ExportTemplate, LayoutElement, Orientation, PageSize,
    TemplateKind,
};
pub use tenant::{TenantId, TenantSeed};
