//! Audit trail for vault access.
//!
//! Every create, reset, and view writes exactly one row before the result
//! reaches the caller. A failed write fails the surrounding operation.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::db::{Store, VaultAccessLog};

/// Action kinds recorded in the vault audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultAction {
    Create,
    Reset,
    View,
}

impl VaultAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Reset => "reset",
            Self::View => "view",
        }
    }
}

impl std::fmt::Display for VaultAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct AuditRecorder {
    store: Store,
}

impl AuditRecorder {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Append one audit row. The error propagates so the caller can abort
    /// the operation it belongs to.
    pub async fn record(
        &self,
        vault_entry_id: i32,
        accessed_by: i32,
        action: VaultAction,
        origin: &str,
    ) -> Result<()> {
        self.store
            .record_vault_access(vault_entry_id, accessed_by, action.as_str(), origin)
            .await?;

        info!(
            event = "vault_access_recorded",
            vault_entry_id,
            accessed_by,
            action = action.as_str(),
            "Vault access recorded"
        );

        Ok(())
    }

    /// Audit rows for one vault entry, newest first.
    pub async fn history(&self, vault_entry_id: i32) -> Result<Vec<VaultAccessLog>> {
        self.store.vault_access_history(vault_entry_id).await
    }

    /// Recent audit rows across all entries, paginated.
    pub async fn recent(&self, page: u64, page_size: u64) -> Result<(Vec<VaultAccessLog>, u64)> {
        self.store.recent_vault_access(page, page_size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_match_stored_values() {
        assert_eq!(VaultAction::Create.as_str(), "create");
        assert_eq!(VaultAction::Reset.as_str(), "reset");
        assert_eq!(VaultAction::View.as_str(), "view");
    }

    #[test]
    fn action_display_matches_as_str() {
        assert_eq!(VaultAction::View.to_string(), "view");
    }
}
