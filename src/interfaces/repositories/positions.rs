use sqlx::PgConnection;
use uuid::Uuid;

use crate::{domain::ordering::ReorderPlan, errors::AppError};

/// A table holding per-user ordered rows (`id`, `user_id`, `position`).
///
/// All methods expect to run inside a transaction that already holds the
/// owner lock taken by [`PositionedList::lock_owner`].
#[derive(Debug, Clone, Copy)]
pub struct PositionedList {
    table: &'static str,
}

pub const SKILLS: PositionedList = PositionedList { table: "skills" };
pub const EXTERNAL_PROFILES: PositionedList = PositionedList { table: "external_profiles" };

impl PositionedList {
    /// Serializes list mutations of one owner by locking the user row.
    pub async fn lock_owner(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Owner's ids in current display order.
    pub async fn owned_ids(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let sql = format!(
            "SELECT id FROM {} WHERE user_id = $1 ORDER BY position ASC",
            self.table
        );

        let ids = sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(ids)
    }

    /// Owner's (id, position) rows in display order.
    pub async fn stored(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<(Uuid, i32)>, AppError> {
        let sql = format!(
            "SELECT id, position FROM {} WHERE user_id = $1 ORDER BY position ASC",
            self.table
        );

        let rows = sqlx::query_as::<_, (Uuid, i32)>(&sql)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows)
    }

    pub async fn max_position(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<Option<i32>, AppError> {
        let sql = format!("SELECT MAX(position) FROM {} WHERE user_id = $1", self.table);

        let max = sqlx::query_scalar::<_, Option<i32>>(&sql)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(max)
    }

    /// Writes `plan` in two phases so `(user_id, position)` never collides:
    /// every row of the owner moves to the negative range first, then the
    /// final values are assigned in a single statement.
    pub async fn apply(&self, conn: &mut PgConnection, user_id: Uuid, plan: &ReorderPlan) -> Result<(), AppError> {
        let park = format!(
            "UPDATE {} SET position = -position WHERE user_id = $1 AND position > 0",
            self.table
        );
        sqlx::query(&park)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        if plan.is_empty() {
            return Ok(());
        }

        let assign = format!(
            r#"
            UPDATE {table} AS t
            SET position = o.position,
                updated_at = NOW()
            FROM UNNEST($2::uuid[], $3::int4[]) AS o(id, position)
            WHERE t.id = o.id AND t.user_id = $1
            "#,
            table = self.table
        );

        let result = sqlx::query(&assign)
            .bind(user_id)
            .bind(plan.ids())
            .bind(plan.positions())
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() != plan.len() as u64 {
            tracing::error!(
                table = self.table,
                %user_id,
                expected = plan.len(),
                updated = result.rows_affected(),
                "Renumbering touched an unexpected number of rows"
            );
            return Err(AppError::InternalError("List changed during renumbering".into()));
        }

        Ok(())
    }
}
