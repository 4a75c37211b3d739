use std::sync::Arc;

use uuid::Uuid;

use crate::{
    domain::access_control::{plan_sync, Permission, PermissionPolicy, SyncReport},
    entities::token::Claims,
    errors::AppError,
    repositories::permission::PermissionRepository,
};

/// Role and permission operations over the compiled-in policy.
pub struct AccessControlHandler<R>
where
    R: PermissionRepository + ?Sized,
{
    pub permission_repo: Arc<R>,
    pub policy: &'static PermissionPolicy,
}

impl<R> AccessControlHandler<R>
where
    R: PermissionRepository + ?Sized,
{
    pub fn new(permission_repo: Arc<R>) -> Self {
        AccessControlHandler {
            permission_repo,
            policy: PermissionPolicy::standard(),
        }
    }

    pub fn with_policy(permission_repo: Arc<R>, policy: &'static PermissionPolicy) -> Self {
        AccessControlHandler { permission_repo, policy }
    }

    /// Brings stored permissions and role grants in line with the policy.
    ///
    /// Only `prune` deletes roles or permissions the policy does not declare.
    pub async fn sync(&self, prune: bool) -> Result<SyncReport, AppError> {
        let snapshot = self.permission_repo.snapshot().await?;
        let plan = plan_sync(self.policy, &snapshot, prune);
        let report = SyncReport::from_plan(&plan, prune);

        if plan.is_empty() {
            tracing::info!(prune, "Permissions already in sync");
            return Ok(report);
        }

        if !plan.prune_roles.is_empty() || !plan.prune_permissions.is_empty() {
            tracing::warn!(
                roles = ?plan.prune_roles,
                permissions = ?plan.prune_permissions,
                "Pruning undeclared roles and permissions"
            );
        }

        self.permission_repo.apply_sync(&plan).await?;

        tracing::info!(%report, "Permissions synchronized");
        Ok(report)
    }

    /// Admins pass every check; everyone else needs a role granting `permission`.
    pub async fn authorize(&self, claims: &Claims, permission: Permission) -> Result<(), AppError> {
        if claims.admin {
            return Ok(());
        }

        let user_id = claims.user_id().map_err(|_| AppError::UnauthorizedAccess)?;
        if self.permission_repo.user_has_permission(user_id, permission).await? {
            Ok(())
        } else {
            tracing::warn!(%user_id, %permission, "Permission denied");
            Err(AppError::ForbiddenAccess)
        }
    }

    pub async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        self.permission_repo.roles_for_user(user_id).await
    }

    pub async fn assign_role(&self, user_id: Uuid, role: &str) -> Result<(), AppError> {
        if !self.policy.declares_role(role) {
            return Err(AppError::field("role", format!("Unknown role '{role}'")));
        }

        self.permission_repo.assign_role(user_id, role).await?;
        tracing::info!(%user_id, role, "Role assigned");
        Ok(())
    }
}
