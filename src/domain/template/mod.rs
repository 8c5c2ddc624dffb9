//! Tenant template library and the shared template list operations.

pub mod ids;
pub mod library;
pub mod list;
pub mod session;
pub mod starters;

pub use ids::{ensure_unique_id, mint_id};
pub use library::{DeleteConfirmation, TemplateLibrary};
pub use session::{EditorSession, SessionOrigin, TemplateInput};
pub use starters::{list_starters, starter_template, StarterInfo};
