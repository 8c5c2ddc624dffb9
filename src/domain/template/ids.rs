//! Template id minting.

use uuid::Uuid;

use crate::domain::model::{ExportTemplate, TemplateKind};

/// A fresh id of the form `{prefix}-{uuid}`.
pub fn mint_id(kind: TemplateKind) -> String {
    format!("{}-{}", kind.id_prefix(), Uuid::new_v4().simple())
}

/// Return `candidate`, or `candidate-2`, `candidate-3`, ... if it is already
/// taken in `existing`.
pub fn ensure_unique_id(candidate: &str, existing: &[ExportTemplate]) -> String {
    let taken = |id: &str| existing.iter().any(|t| t.id == id);

    if !taken(candidate) {
        return candidate.to_string();
    }

    (2u32..)
        .map(|n| format!("{}-{}", candidate, n))
        .find(|id| !taken(id))
        .unwrap_or_else(|| format!("{}-{}", candidate, Uuid::new_v4().simple()))
}
