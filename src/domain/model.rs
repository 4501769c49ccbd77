use serde::{Deserialize, Serialize};
use std::fmt;

/// 目錄中待停用帳號的快照，於流程開始時讀取一次。
/// 後續的授權移除只依據這份快照的 `license_skus`，不會重新查詢。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub user_principal_name: String,
    pub display_name: String,
    pub license_skus: Vec<String>,
}

/// `memberOf` 連結的目錄物件類型。只有真正的群組可以被移除。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    Group,
    DirectoryRole,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMembership {
    pub id: String,
    pub display_name: String,
    pub kind: MembershipKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailboxType {
    Individual,
    Shared,
}

/// 信箱目前的狀態。只在信箱存在時才會被讀取或變更。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxState {
    pub mailbox_type: MailboxType,
    pub forwarding_to: Option<String>,
    pub auto_reply: AutoReplyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoReplyConfig {
    pub enabled: bool,
    pub internal_message: String,
    pub external_message: String,
}

/// One-time credential handed to the directory during the reset step.
/// The value is opaque to the workflow and must never reach logs or output;
/// Debug is deliberately redacted.
pub struct OneTimeCredential(String);

impl OneTimeCredential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Only the directory adapter should call this, immediately before the
    /// reset request is sent.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OneTimeCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OneTimeCredential(<redacted>)")
    }
}
