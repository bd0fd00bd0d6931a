//! External collaborator seam: identity and authorization (spec §1, out of
//! scope to implement for real — this is the narrow boundary the gateway
//! depends on).

use async_trait::async_trait;

use crate::error::TaskCoreResult;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub organization_id: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, bearer_token: &str) -> TaskCoreResult<AuthenticatedUser>;

    /// Authorize an already-authenticated user against a specific task's
    /// owner (cross-organization access is always `Forbidden`).
    fn authorize_task_access(&self, user: &AuthenticatedUser, task_owner_org: &str) -> TaskCoreResult<()>;
}
