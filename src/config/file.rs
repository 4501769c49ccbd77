use crate::utils::error::{OffboardError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 服務端點設定檔。權杖本身不放在檔案裡，只記環境變數名稱。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub directory: ServiceEndpoint,
    pub mailbox: ServiceEndpoint,
    #[serde(default)]
    pub auto_reply: Option<AutoReplySettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub base_url: String,
    #[serde(default)]
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoReplySettings {
    #[serde(default)]
    pub internal_message: Option<String>,
    #[serde(default)]
    pub external_message: Option<String>,
}

impl FileConfig {
    /// 從 TOML 檔案載入設定
    pub fn from_file(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Err(OffboardError::ConfigError {
                message: format!("Config file not found: {}", path),
            });
        }

        let content = fs::read_to_string(path)?;
        let config: FileConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("directory.base_url", &self.directory.base_url)?;
        validation::validate_url("mailbox.base_url", &self.mailbox.base_url)?;
        Ok(())
    }
}
