pub mod report;
pub mod workflow;

pub use crate::domain::model::{
    AutoReplyConfig, GroupMembership, Identity, MembershipKind, OneTimeCredential,
};
pub use crate::domain::ports::{ConfigProvider, DirectoryPort, MailboxPort};
pub use crate::utils::error::Result;
