use crate::domain::model::{GroupMembership, Identity, MembershipKind, OneTimeCredential};
use crate::domain::ports::{ConfigProvider, DirectoryPort};
use crate::utils::error::{OffboardError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;

/// 身分目錄的 REST 介接層（Graph 風格 API）。
/// 所有呼叫都是單發、不重試；狀態碼在這裡換成領域錯誤。
#[derive(Debug, Clone)]
pub struct RestDirectory {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    id: String,
    display_name: String,
    user_principal_name: String,
    #[serde(default)]
    assigned_licenses: Vec<AssignedLicense>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignedLicense {
    sku_id: String,
}

#[derive(Debug, Deserialize)]
struct DirectoryPage {
    #[serde(default)]
    value: Vec<serde_json::Value>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

impl RestDirectory {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(config.directory_base_url(), config.directory_token())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Best-effort sign-out. The caller swallows the error.
    pub async fn close(&self) -> Result<()> {
        let url = self.url("/logout");
        let response = self.client.post(&url).bearer_auth(&self.token).send().await?;
        if !response.status().is_success() {
            return Err(OffboardError::DirectoryApiError {
                status: response.status().as_u16(),
                detail: "sign-out rejected".to_string(),
            });
        }
        tracing::debug!("Directory session closed");
        Ok(())
    }
}

async fn directory_error(resource: &str, response: Response) -> OffboardError {
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
        409 => OffboardError::ConflictError {
            resource: resource.to_string(),
        },
        _ => {
            let detail = response.text().await.unwrap_or_default();
            OffboardError::DirectoryApiError { status, detail }
        }
    }
}

fn membership_from_json(value: &serde_json::Value) -> Option<GroupMembership> {
    let id = value.get("id")?.as_str()?.to_string();
    let display_name = value
        .get("displayName")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    // memberOf 回傳的不只是群組，用 @odata.type 區分
    let kind = match value.get("@odata.type").and_then(|v| v.as_str()) {
        Some("#microsoft.graph.group") => MembershipKind::Group,
        Some("#microsoft.graph.directoryRole") => MembershipKind::DirectoryRole,
        _ => MembershipKind::Other,
    };
    Some(GroupMembership {
        id,
        display_name,
        kind,
    })
}

#[async_trait]
impl DirectoryPort for RestDirectory {
    async fn get_identity(&self, reference: &str) -> Result<Identity> {
        let url = self.url(&format!(
            "/users/{}?$select=id,displayName,userPrincipalName,assignedLicenses",
            reference
        ));
        tracing::debug!("Fetching identity from {}", url);

        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
        if !response.status().is_success() {
            return Err(directory_error(&format!("user {}", reference), response).await);
        }

        let user: UserResponse = response.json().await?;
        Ok(Identity {
            id: user.id,
            user_principal_name: user.user_principal_name,
            display_name: user.display_name,
            license_skus: user
                .assigned_licenses
                .into_iter()
                .map(|license| license.sku_id)
                .collect(),
        })
    }

    async fn disable_sign_in(&self, reference: &str) -> Result<()> {
        let url = self.url(&format!("/users/{}", reference));
        let body = serde_json::json!({ "accountEnabled": false });

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(directory_error(&format!("user {}", reference), response).await);
        }
        Ok(())
    }

    async fn set_one_time_credential(
        &self,
        reference: &str,
        credential: &OneTimeCredential,
    ) -> Result<()> {
        let url = self.url(&format!("/users/{}", reference));
        // 憑證值只進入請求本文，不得出現在日誌
        let body = serde_json::json!({
            "passwordProfile": {
                "password": credential.expose(),
                "forceChangePasswordNextSignIn": true,
            }
        });

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(directory_error(&format!("user {}", reference), response).await);
        }
        Ok(())
    }

    async fn revoke_all_sessions(&self, reference: &str) -> Result<()> {
        let url = self.url(&format!("/users/{}/revokeSignInSessions", reference));

        let response = self.client.post(&url).bearer_auth(&self.token).send().await?;
        if !response.status().is_success() {
            return Err(directory_error(&format!("sessions of {}", reference), response).await);
        }
        Ok(())
    }

    async fn list_group_memberships(&self, reference: &str) -> Result<Vec<GroupMembership>> {
        let mut url = self.url(&format!("/users/{}/memberOf?$select=id,displayName", reference));
        let mut memberships = Vec::new();

        // 跟著 nextLink 翻頁，呼叫端永遠拿到完整結果
        loop {
            let response = self.client.get(&url).bearer_auth(&self.token).send().await?;
            if !response.status().is_success() {
                return Err(
                    directory_error(&format!("memberships of {}", reference), response).await,
                );
            }

            let page: DirectoryPage = response.json().await?;
            memberships.extend(page.value.iter().filter_map(membership_from_json));

            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }

        tracing::debug!("Enumerated {} memberships for {}", memberships.len(), reference);
        Ok(memberships)
    }

    async fn remove_group_membership(&self, reference: &str, group_id: &str) -> Result<()> {
        let url = self.url(&format!("/groups/{}/members/{}/$ref", group_id, reference));

        let response = self.client.delete(&url).bearer_auth(&self.token).send().await?;
        if !response.status().is_success() {
            return Err(directory_error(&format!("group {}", group_id), response).await);
        }
        Ok(())
    }

    async fn remove_license_grants(&self, reference: &str, sku_ids: &[String]) -> Result<()> {
        if sku_ids.is_empty() {
            return Ok(());
        }

        let url = self.url(&format!("/users/{}/assignLicense", reference));
        // addLicenses 永遠是空的，這個操作只拿回座位
        let body = serde_json::json!({
            "addLicenses": [],
            "removeLicenses": sku_ids,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(directory_error(&format!("licenses of {}", reference), response).await);
        }
        Ok(())
    }
}
