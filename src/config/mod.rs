#[cfg(feature = "cli")]
pub mod cli;
pub mod file;

use crate::domain::model::AutoReplyConfig;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};

pub const DEFAULT_DIRECTORY_TOKEN_ENV: &str = "OFFBOARD_DIRECTORY_TOKEN";
pub const DEFAULT_MAILBOX_TOKEN_ENV: &str = "OFFBOARD_MAILBOX_TOKEN";

pub const DEFAULT_INTERNAL_MESSAGE: &str =
    "This account has been deactivated. Please contact the IT service desk for assistance.";
pub const DEFAULT_EXTERNAL_MESSAGE: &str =
    "This mailbox is no longer monitored. Please reach the organization through its public channels.";

/// 命令列旗標與設定檔合併後的最終執行設定。
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub directory_base_url: String,
    pub mailbox_base_url: String,
    pub directory_token: String,
    pub mailbox_token: String,
    pub auto_reply: AutoReplyConfig,
}

impl ConfigProvider for ResolvedConfig {
    fn directory_base_url(&self) -> &str {
        &self.directory_base_url
    }

    fn mailbox_base_url(&self) -> &str {
        &self.mailbox_base_url
    }

    fn directory_token(&self) -> &str {
        &self.directory_token
    }

    fn mailbox_token(&self) -> &str {
        &self.mailbox_token
    }
}

impl Validate for ResolvedConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("directory.base_url", &self.directory_base_url)?;
        validation::validate_url("mailbox.base_url", &self.mailbox_base_url)?;
        validation::validate_non_empty_string("directory token", &self.directory_token)?;
        validation::validate_non_empty_string("mailbox token", &self.mailbox_token)?;
        Ok(())
    }
}
