use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    domain::access_control::{AccessSnapshot, Permission, SyncPlan},
    errors::{AppError, DbViolation},
    repositories::sqlx_repo::SqlxPermissionRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Stored permissions and the grants of every stored role.
    async fn snapshot(&self) -> Result<AccessSnapshot, AppError>;

    /// Applies every write of `plan` in one transaction.
    async fn apply_sync(&self, plan: &SyncPlan) -> Result<(), AppError>;

    async fn user_has_permission(&self, user_id: Uuid, permission: Permission) -> Result<bool, AppError>;

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<String>, AppError>;

    /// Gives `role` to the user; assigning a held role is a no-op.
    async fn assign_role(&self, user_id: Uuid, role: &str) -> Result<(), AppError>;
}

impl SqlxPermissionRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxPermissionRepo { pool }
    }

    async fn write_grants(conn: &mut PgConnection, sql: &str, pairs: &[(String, String)]) -> Result<u64, AppError> {
        if pairs.is_empty() {
            return Ok(0);
        }

        let (roles, permissions): (Vec<String>, Vec<String>) = pairs.iter().cloned().unzip();
        let result = sqlx::query(sql)
            .bind(roles)
            .bind(permissions)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

const INSERT_GRANTS: &str = r#"
    INSERT INTO role_permissions (role_id, permission_id)
    SELECT r.id, p.id
    FROM UNNEST($1::text[], $2::text[]) AS g(role_name, permission_name)
    JOIN roles r ON r.name = g.role_name
    JOIN permissions p ON p.name = g.permission_name
    ON CONFLICT DO NOTHING
"#;

const DELETE_GRANTS: &str = r#"
    DELETE FROM role_permissions rp
    USING roles r, permissions p, UNNEST($1::text[], $2::text[]) AS g(role_name, permission_name)
    WHERE rp.role_id = r.id
      AND rp.permission_id = p.id
      AND r.name = g.role_name
      AND p.name = g.permission_name
"#;

#[async_trait]
impl PermissionRepository for SqlxPermissionRepo {
    async fn snapshot(&self) -> Result<AccessSnapshot, AppError> {
        let permissions: Vec<String> = sqlx::query_scalar("SELECT name FROM permissions")
            .fetch_all(&self.pool)
            .await?;

        let grants: Vec<(String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT r.name, p.name
            FROM roles r
            LEFT JOIN role_permissions rp ON rp.role_id = r.id
            LEFT JOIN permissions p ON p.id = rp.permission_id
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        let mut snapshot = AccessSnapshot {
            permissions: permissions.into_iter().collect(),
            ..AccessSnapshot::default()
        };
        for (role, permission) in grants {
            let held: &mut BTreeSet<String> = snapshot.roles.entry(role).or_default();
            if let Some(permission) = permission {
                held.insert(permission);
            }
        }

        Ok(snapshot)
    }

    async fn apply_sync(&self, plan: &SyncPlan) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if !plan.create_permissions.is_empty() {
            sqlx::query("INSERT INTO permissions (name) SELECT UNNEST($1::text[]) ON CONFLICT (name) DO NOTHING")
                .bind(&plan.create_permissions)
                .execute(&mut *tx)
                .await?;
        }

        if !plan.create_roles.is_empty() {
            sqlx::query("INSERT INTO roles (name) SELECT UNNEST($1::text[]) ON CONFLICT (name) DO NOTHING")
                .bind(&plan.create_roles)
                .execute(&mut *tx)
                .await?;
        }

        let revoked = Self::write_grants(&mut tx, DELETE_GRANTS, &plan.revocations).await?;
        let granted = Self::write_grants(&mut tx, INSERT_GRANTS, &plan.grants).await?;

        // Grants go with the rows through ON DELETE CASCADE.
        if !plan.prune_roles.is_empty() {
            sqlx::query("DELETE FROM roles WHERE name = ANY($1)")
                .bind(&plan.prune_roles)
                .execute(&mut *tx)
                .await?;
        }

        if !plan.prune_permissions.is_empty() {
            sqlx::query("DELETE FROM permissions WHERE name = ANY($1)")
                .bind(&plan.prune_permissions)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(granted, revoked, "Role grants written");
        Ok(())
    }

    async fn user_has_permission(&self, user_id: Uuid, permission: Permission) -> Result<bool, AppError> {
        let allowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM user_roles ur
                JOIN role_permissions rp ON rp.role_id = ur.role_id
                JOIN permissions p ON p.id = rp.permission_id
                WHERE ur.user_id = $1 AND p.name = $2
            )
            "#
        )
        .bind(user_id)
        .bind(permission.as_ref())
        .fetch_one(&self.pool)
        .await?;

        Ok(allowed)
    }

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let roles: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    async fn assign_role(&self, user_id: Uuid, role: &str) -> Result<(), AppError> {
        let role_id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM roles WHERE name = $1")
            .bind(role)
            .fetch_optional(&self.pool)
            .await?;

        let role_id = role_id.ok_or_else(|| {
            AppError::NotFound(format!("Role '{role}' does not exist; run permissions:sync first"))
        })?;

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbViolation::of(&e) {
                Some(DbViolation::ForeignKey(_)) => AppError::NotFound("User not found".into()),
                _ => AppError::from(e),
            })?;

        Ok(())
    }
}
