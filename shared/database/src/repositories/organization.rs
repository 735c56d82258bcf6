//! College and Department Repositories
//!
//! Idempotent get-or-create keyed by natural key, plus the joined department
//! listing used when a source carries department names without colleges.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};

use academic_models::{College, Department, DepartmentWithCollege};

pub struct CollegeRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> CollegeRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Find college by ID
    pub async fn find_by_id(&mut self, id: i64) -> Result<Option<College>> {
        sqlx::query_as::<_, College>("SELECT id, name, created_at FROM colleges WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await
            .context("Failed to fetch college by ID")
    }

    /// Fetch the college named `name`, creating it when absent
    pub async fn get_or_create_by_name(&mut self, name: &str) -> Result<College> {
        sqlx::query("INSERT INTO colleges (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&mut *self.conn)
            .await
            .context("Failed to insert college")?;

        sqlx::query_as::<_, College>("SELECT id, name, created_at FROM colleges WHERE name = $1")
            .bind(name)
            .fetch_one(&mut *self.conn)
            .await
            .with_context(|| format!("Failed to fetch college '{}'", name))
    }
}

pub struct DepartmentRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> DepartmentRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Fetch the department `name` under `college`, creating it when absent
    pub async fn get_or_create_by_college_and_name(
        &mut self,
        college: &College,
        name: &str,
    ) -> Result<Department> {
        sqlx::query(
            r#"
            INSERT INTO departments (college_id, name)
            VALUES ($1, $2)
            ON CONFLICT (college_id, name) DO NOTHING
            "#,
        )
        .bind(college.id)
        .bind(name)
        .execute(&mut *self.conn)
        .await
        .context("Failed to insert department")?;

        sqlx::query_as::<_, Department>(
            r#"
            SELECT id, college_id, name, created_at
            FROM departments
            WHERE college_id = $1 AND name = $2
            "#,
        )
        .bind(college.id)
        .bind(name)
        .fetch_one(&mut *self.conn)
        .await
        .with_context(|| format!("Failed to fetch department '{}' of '{}'", name, college.name))
    }

    /// All departments joined with their college
    pub async fn find_all_with_college(&mut self) -> Result<Vec<DepartmentWithCollege>> {
        let rows: Vec<DepartmentJoinRow> = sqlx::query_as(
            r#"
            SELECT c.id AS college_id, c.name AS college_name, c.created_at AS college_created_at,
                   d.id AS department_id, d.name AS department_name,
                   d.created_at AS department_created_at
            FROM departments d
            JOIN colleges c ON c.id = d.college_id
            ORDER BY c.name, d.name
            "#,
        )
        .fetch_all(&mut *self.conn)
        .await
        .context("Failed to fetch departments")?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

/// Internal row type for the department/college join
#[derive(Debug, FromRow)]
struct DepartmentJoinRow {
    college_id: i64,
    college_name: String,
    college_created_at: DateTime<Utc>,
    department_id: i64,
    department_name: String,
    department_created_at: DateTime<Utc>,
}

impl From<DepartmentJoinRow> for DepartmentWithCollege {
    fn from(row: DepartmentJoinRow) -> Self {
        Self {
            college: College {
                id: row.college_id,
                name: row.college_name,
                created_at: row.college_created_at,
            },
            department: Department {
                id: row.department_id,
                college_id: row.college_id,
                name: row.department_name,
                created_at: row.department_created_at,
            },
        }
    }
}
