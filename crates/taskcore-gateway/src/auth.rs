//! Stub `AuthProvider` (spec §1/§9: real identity is out of scope, but the
//! seam is real). Tokens are `"{user_id}:{organization_id}"` — enough to
//! drive authorization and org-scoping in tests and local development
//! without a real identity provider behind it.

use async_trait::async_trait;
use taskcore_kernel::error::{TaskCoreError, TaskCoreResult};
use taskcore_kernel::traits::{AuthProvider, AuthenticatedUser};

pub struct StaticTokenAuthProvider;

impl StaticTokenAuthProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StaticTokenAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuthProvider {
    async fn authenticate(&self, bearer_token: &str) -> TaskCoreResult<AuthenticatedUser> {
        let (user_id, organization_id) = bearer_token
            .split_once(':')
            .ok_or_else(|| TaskCoreError::Unauthorized("malformed bearer token".to_string()))?;
        if user_id.is_empty() || organization_id.is_empty() {
            return Err(TaskCoreError::Unauthorized("malformed bearer token".to_string()));
        }
        Ok(AuthenticatedUser { user_id: user_id.to_string(), organization_id: organization_id.to_string() })
    }

    fn authorize_task_access(&self, user: &AuthenticatedUser, task_owner_org: &str) -> TaskCoreResult<()> {
        if user.organization_id == task_owner_org {
            Ok(())
        } else {
            Err(TaskCoreError::Forbidden(format!("organization {} cannot access tasks owned by {task_owner_org}", user.organization_id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn authenticate_parses_user_and_org_from_the_token() {
        let provider = StaticTokenAuthProvider::new();
        let user = provider.authenticate("u1:org1").await.unwrap();
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.organization_id, "org1");
    }

    #[tokio::test]
    async fn authenticate_rejects_a_token_without_a_colon() {
        let provider = StaticTokenAuthProvider::new();
        assert!(provider.authenticate("not-a-valid-token").await.is_err());
    }

    #[test]
    fn authorize_rejects_cross_organization_access() {
        let provider = StaticTokenAuthProvider::new();
        let user = AuthenticatedUser { user_id: "u1".into(), organization_id: "org1".into() };
        assert!(provider.authorize_task_access(&user, "org1").is_ok());
        assert!(provider.authorize_task_access(&user, "org2").is_err());
    }
}
