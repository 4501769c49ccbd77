use crate::config::file::FileConfig;
use crate::config::{
    ResolvedConfig, DEFAULT_DIRECTORY_TOKEN_ENV, DEFAULT_EXTERNAL_MESSAGE,
    DEFAULT_INTERNAL_MESSAGE, DEFAULT_MAILBOX_TOKEN_ENV,
};
use crate::domain::model::AutoReplyConfig;
use crate::utils::error::{OffboardError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "offboard")]
#[command(about = "Deactivate a directory identity and its mailbox resources")]
pub struct CliConfig {
    /// Principal name of the identity to offboard
    #[arg(long)]
    pub user: String,

    /// Forward the converted mailbox to this address
    #[arg(long)]
    pub forward_to: Option<String>,

    /// TOML file with service endpoints
    #[arg(long)]
    pub config: Option<String>,

    /// Directory service base URL (overrides the config file)
    #[arg(long)]
    pub directory_url: Option<String>,

    /// Mailbox service base URL (overrides the config file)
    #[arg(long)]
    pub mailbox_url: Option<String>,

    /// Environment variable holding the one-time credential value
    #[arg(long, default_value = "OFFBOARD_CREDENTIAL")]
    pub credential_env: String,

    /// Write the report as JSON to this path
    #[arg(long)]
    pub report_path: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// 合併設定檔與旗標；權杖一律從環境變數讀入。
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let file = match &self.config {
            Some(path) => Some(FileConfig::from_file(path)?),
            None => None,
        };

        let directory_base_url = self
            .directory_url
            .clone()
            .or_else(|| file.as_ref().map(|f| f.directory.base_url.clone()))
            .ok_or_else(|| OffboardError::MissingConfigError {
                field: "directory base URL (--directory-url or [directory].base_url)".to_string(),
            })?;

        let mailbox_base_url = self
            .mailbox_url
            .clone()
            .or_else(|| file.as_ref().map(|f| f.mailbox.base_url.clone()))
            .ok_or_else(|| OffboardError::MissingConfigError {
                field: "mailbox base URL (--mailbox-url or [mailbox].base_url)".to_string(),
            })?;

        let directory_token_env = file
            .as_ref()
            .and_then(|f| f.directory.token_env.clone())
            .unwrap_or_else(|| DEFAULT_DIRECTORY_TOKEN_ENV.to_string());
        let mailbox_token_env = file
            .as_ref()
            .and_then(|f| f.mailbox.token_env.clone())
            .unwrap_or_else(|| DEFAULT_MAILBOX_TOKEN_ENV.to_string());

        let directory_token = read_token(&directory_token_env)?;
        let mailbox_token = read_token(&mailbox_token_env)?;

        let auto_reply_settings = file.as_ref().and_then(|f| f.auto_reply.clone());
        let auto_reply = AutoReplyConfig {
            enabled: true,
            internal_message: auto_reply_settings
                .as_ref()
                .and_then(|s| s.internal_message.clone())
                .unwrap_or_else(|| DEFAULT_INTERNAL_MESSAGE.to_string()),
            external_message: auto_reply_settings
                .as_ref()
                .and_then(|s| s.external_message.clone())
                .unwrap_or_else(|| DEFAULT_EXTERNAL_MESSAGE.to_string()),
        };

        let resolved = ResolvedConfig {
            directory_base_url,
            mailbox_base_url,
            directory_token,
            mailbox_token,
            auto_reply,
        };
        resolved.validate()?;
        Ok(resolved)
    }
}

fn read_token(env_name: &str) -> Result<String> {
    std::env::var(env_name).map_err(|_| OffboardError::MissingConfigError {
        field: env_name.to_string(),
    })
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_address("user", &self.user)?;

        if let Some(target) = self.forward_to.as_deref() {
            // 空字串代表「不設定轉寄」，由流程記為跳過，不是設定錯誤
            if !target.trim().is_empty() {
                validation::validate_address("forward_to", target)?;
            }
        }

        if let Some(url) = &self.directory_url {
            validation::validate_url("directory_url", url)?;
        }
        if let Some(url) = &self.mailbox_url {
            validation::validate_url("mailbox_url", url)?;
        }

        validation::validate_non_empty_string("credential_env", &self.credential_env)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(user: &str) -> CliConfig {
        CliConfig {
            user: user.to_string(),
            forward_to: None,
            config: None,
            directory_url: Some("https://directory.example.com".to_string()),
            mailbox_url: Some("https://mailbox.example.com".to_string()),
            credential_env: "OFFBOARD_CREDENTIAL".to_string(),
            report_path: None,
            verbose: false,
            log_json: false,
        }
    }

    #[test]
    fn test_valid_cli_config() {
        assert!(cli("alice@contoso.com").validate().is_ok());
    }

    #[test]
    fn test_invalid_user_is_rejected() {
        assert!(cli("not-an-address").validate().is_err());
    }

    #[test]
    fn test_empty_forwarding_target_is_allowed() {
        let mut config = cli("alice@contoso.com");
        config.forward_to = Some(String::new());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_forwarding_target_is_rejected() {
        let mut config = cli("alice@contoso.com");
        config.forward_to = Some("nowhere".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_requires_tokens_in_env() {
        let config = cli("alice@contoso.com");
        // 確保測試環境沒有殘留預設變數
        std::env::remove_var(DEFAULT_DIRECTORY_TOKEN_ENV);
        let result = config.resolve();
        assert!(matches!(result, Err(OffboardError::MissingConfigError { .. })));
    }

    #[test]
    fn test_resolve_reads_tokens_from_env() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("offboard.toml");
        std::fs::write(
            &path,
            r#"
            [directory]
            base_url = "https://file.example.com/directory"
            token_env = "RESOLVE_TEST_DIR_TOKEN"

            [mailbox]
            base_url = "https://file.example.com/mailbox"
            token_env = "RESOLVE_TEST_MBX_TOKEN"
            "#,
        )
        .unwrap();

        let mut config = cli("alice@contoso.com");
        config.config = Some(path.to_str().unwrap().to_string());
        std::env::set_var("RESOLVE_TEST_DIR_TOKEN", "dir-secret");
        std::env::set_var("RESOLVE_TEST_MBX_TOKEN", "mbx-secret");

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.directory_token, "dir-secret");
        assert_eq!(resolved.mailbox_token, "mbx-secret");
        // 旗標優先於設定檔
        assert_eq!(resolved.directory_base_url, "https://directory.example.com");
        assert_eq!(resolved.auto_reply.internal_message, DEFAULT_INTERNAL_MESSAGE);
        assert!(resolved.auto_reply.enabled);
    }
}
