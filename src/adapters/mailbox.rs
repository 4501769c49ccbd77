use crate::domain::model::{AutoReplyConfig, MailboxState, MailboxType};
use crate::domain::ports::{ConfigProvider, MailboxPort};
use crate::utils::error::{OffboardError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

/// 信箱管理服務的 REST 介接層。
#[derive(Debug, Clone)]
pub struct RestMailbox {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MailboxResponse {
    mailbox_type: String,
    #[serde(default)]
    forwarding_to: Option<String>,
    #[serde(default)]
    auto_reply: Option<AutoReplyResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AutoReplyResponse {
    enabled: bool,
    #[serde(default)]
    internal_message: String,
    #[serde(default)]
    external_message: String,
}

impl MailboxResponse {
    fn into_state(self) -> MailboxState {
        let mailbox_type = if self.mailbox_type.eq_ignore_ascii_case("shared") {
            MailboxType::Shared
        } else {
            MailboxType::Individual
        };
        let auto_reply = match self.auto_reply {
            Some(reply) => AutoReplyConfig {
                enabled: reply.enabled,
                internal_message: reply.internal_message,
                external_message: reply.external_message,
            },
            None => AutoReplyConfig {
                enabled: false,
                internal_message: String::new(),
                external_message: String::new(),
            },
        };
        MailboxState {
            mailbox_type,
            forwarding_to: self.forwarding_to,
            auto_reply,
        }
    }
}

impl RestMailbox {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(config.mailbox_base_url(), config.mailbox_token())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Best-effort sign-out. The caller swallows the error.
    pub async fn close(&self) -> Result<()> {
        let url = self.url("/logout");
        let response = self.client.post(&url).bearer_auth(&self.token).send().await?;
        if !response.status().is_success() {
            return Err(OffboardError::MailboxApiError {
                status: response.status().as_u16(),
                detail: "sign-out rejected".to_string(),
            });
        }
        tracing::debug!("Mailbox session closed");
        Ok(())
    }
}

async fn mailbox_error(resource: &str, response: Response) -> OffboardError {
    let status = response.status().as_u16();
    match status {
        401 => OffboardError::UnauthorizedError {
            operation: resource.to_string(),
        },
        403 => OffboardError::PermissionDeniedError {
            resource: resource.to_string(),
        },
        404 => OffboardError::NotFoundError {
            resource: resource.to_string(),
        },
        _ => {
            let detail = response.text().await.unwrap_or_default();
            OffboardError::MailboxApiError { status, detail }
        }
    }
}

#[async_trait]
impl MailboxPort for RestMailbox {
    async fn probe_availability(&self) -> bool {
        let url = self.url("/health");
        match self.client.get(&url).bearer_auth(&self.token).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!("Mailbox service probe returned {}", response.status());
                false
            }
            Err(e) => {
                tracing::warn!("Mailbox service probe failed: {}", e);
                false
            }
        }
    }

    async fn mailbox_exists(&self, reference: &str) -> Result<bool> {
        let url = self.url(&format!("/mailboxes/{}", reference));

        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(mailbox_error(&format!("mailbox {}", reference), response).await);
        }

        let state = response.json::<MailboxResponse>().await?.into_state();
        tracing::debug!("Mailbox for {} is {:?}", reference, state.mailbox_type);
        Ok(true)
    }

    async fn convert_to_shared(&self, reference: &str) -> Result<()> {
        let url = self.url(&format!("/mailboxes/{}/convert", reference));
        let body = serde_json::json!({ "mailboxType": "shared" });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(mailbox_error(&format!("mailbox {}", reference), response).await);
        }
        Ok(())
    }

    async fn set_forwarding(&self, reference: &str, target: &str) -> Result<()> {
        let url = self.url(&format!("/mailboxes/{}/forwarding", reference));
        let body = serde_json::json!({
            "forwardTo": target,
            "deliverToMailboxAndForward": false,
        });

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(mailbox_error(&format!("forwarding for {}", reference), response).await);
        }
        Ok(())
    }

    async fn set_auto_reply(&self, reference: &str, config: &AutoReplyConfig) -> Result<()> {
        let url = self.url(&format!("/mailboxes/{}/autoreply", reference));
        let body = serde_json::json!({
            "enabled": config.enabled,
            "internalMessage": config.internal_message,
            "externalMessage": config.external_message,
        });

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(mailbox_error(&format!("auto-reply for {}", reference), response).await);
        }
        Ok(())
    }
}
