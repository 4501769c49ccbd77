use crate::domain::model::{AutoReplyConfig, GroupMembership, Identity, OneTimeCredential};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Identity-directory capability consumed by the workflow. Every call is a
/// blocking remote mutation or query; implementations must not retry.
#[async_trait]
pub trait DirectoryPort: Send + Sync {
    /// Must return the assigned license SKU set along with the identity.
    async fn get_identity(&self, reference: &str) -> Result<Identity>;

    /// Idempotent: disabling an already-disabled account succeeds.
    async fn disable_sign_in(&self, reference: &str) -> Result<()>;

    /// The credential value must never be logged or echoed back.
    async fn set_one_time_credential(
        &self,
        reference: &str,
        credential: &OneTimeCredential,
    ) -> Result<()>;

    /// Invalidates all currently valid tokens. Future sign-ins are governed
    /// by `disable_sign_in`, not by this call.
    async fn revoke_all_sessions(&self, reference: &str) -> Result<()>;

    /// Pages through all results; callers never see a partial page.
    async fn list_group_memberships(&self, reference: &str) -> Result<Vec<GroupMembership>>;

    /// May legitimately fail for dynamic or externally-governed groups.
    async fn remove_group_membership(&self, reference: &str, group_id: &str) -> Result<()>;

    /// No-op success when `sku_ids` is empty. Must never add grants.
    async fn remove_license_grants(&self, reference: &str, sku_ids: &[String]) -> Result<()>;
}

/// Mailbox-service capability consumed by the workflow.
#[async_trait]
pub trait MailboxPort: Send + Sync {
    /// Called once per run; `false` skips the whole mailbox branch.
    async fn probe_availability(&self) -> bool;

    async fn mailbox_exists(&self, reference: &str) -> Result<bool>;

    async fn convert_to_shared(&self, reference: &str) -> Result<()>;

    async fn set_forwarding(&self, reference: &str, target: &str) -> Result<()>;

    async fn set_auto_reply(&self, reference: &str, config: &AutoReplyConfig) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn directory_base_url(&self) -> &str;
    fn mailbox_base_url(&self) -> &str;
    fn directory_token(&self) -> &str;
    fn mailbox_token(&self) -> &str;
}
