//! Whole-table operations shared by every entity kind.

use anyhow::{bail, Context, Result};
use sqlx::PgConnection;

use academic_models::EntityKind;

pub struct TableRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> TableRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Delete every row of `kind`, returning the number removed
    pub async fn delete_all(&mut self, kind: EntityKind) -> Result<u64> {
        let sql = format!("DELETE FROM {}", kind.table_name());
        let result = sqlx::query(&sql)
            .execute(&mut *self.conn)
            .await
            .with_context(|| format!("Failed to delete rows from {}", kind))?;

        Ok(result.rows_affected())
    }

    pub async fn count(&mut self, kind: EntityKind) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table_name());
        let row: (i64,) = sqlx::query_as(&sql)
            .fetch_one(&mut *self.conn)
            .await
            .with_context(|| format!("Failed to count {}", kind))?;

        Ok(row.0)
    }

    /// Count rows of `kind` attached to one department
    pub async fn count_by_department(&mut self, kind: EntityKind, department_id: i64) -> Result<i64> {
        if !has_department_column(kind) {
            bail!("{} rows are not keyed by department", kind);
        }

        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE department_id = $1",
            kind.table_name()
        );
        let row: (i64,) = sqlx::query_as(&sql)
            .bind(department_id)
            .fetch_one(&mut *self.conn)
            .await
            .with_context(|| format!("Failed to count {} by department", kind))?;

        Ok(row.0)
    }
}

pub(crate) fn has_department_column(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::Student
            | EntityKind::DepartmentKpi
            | EntityKind::Publication
            | EntityKind::ResearchProject
    )
}
