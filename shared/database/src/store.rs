//! Storage collaborator for the import pipeline
//!
//! The pipeline only talks to storage through [`ImportStore`] and
//! [`StoreSession`]. A session is one unit of work: nothing it does is visible
//! to other sessions until [`StoreSession::commit`], and dropping it without a
//! commit discards its work.

#![allow(async_fn_in_trait)]

use anyhow::{Context, Result};
use sqlx::{Postgres, Transaction};

use academic_models::{
    College, Department, DepartmentKpi, DepartmentWithCollege, EntityKind, NewDepartmentKpi,
    NewProjectExpense, NewPublication, NewResearchProject, NewStudent, ProjectExpense,
    Publication, ResearchProject, Student,
};

use crate::postgres::PostgresPool;
use crate::repositories::{
    CollegeRepository, DepartmentKpiRepository, DepartmentRepository, ProjectExpenseRepository,
    PublicationRepository, ResearchProjectRepository, StudentRepository, TableRepository,
};

pub trait ImportStore {
    type Session: StoreSession;

    /// Open a new unit of work.
    async fn begin(&self) -> Result<Self::Session>;
}

pub trait StoreSession {
    async fn get_college(&mut self, id: i64) -> Result<Option<College>>;

    async fn get_or_create_college(&mut self, name: &str) -> Result<College>;

    async fn get_or_create_department(&mut self, college: &College, name: &str) -> Result<Department>;

    /// Every department joined with its college.
    async fn list_departments(&mut self) -> Result<Vec<DepartmentWithCollege>>;

    async fn insert_students(&mut self, students: &[NewStudent]) -> Result<Vec<Student>>;

    async fn insert_kpis(&mut self, kpis: &[NewDepartmentKpi]) -> Result<Vec<DepartmentKpi>>;

    async fn insert_publications(&mut self, publications: &[NewPublication]) -> Result<Vec<Publication>>;

    async fn insert_projects(&mut self, projects: &[NewResearchProject]) -> Result<Vec<ResearchProject>>;

    async fn insert_expenses(&mut self, expenses: &[NewProjectExpense]) -> Result<Vec<ProjectExpense>>;

    /// Remove every row of `kind`; returns the number of rows removed.
    async fn delete_all(&mut self, kind: EntityKind) -> Result<u64>;

    async fn count(&mut self, kind: EntityKind) -> Result<i64>;

    async fn count_by_department(&mut self, kind: EntityKind, department_id: i64) -> Result<i64>;

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

/// Postgres-backed store; each session is a database transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PostgresPool,
}

impl PgStore {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }
}

impl ImportStore for PgStore {
    type Session = PgSession;

    async fn begin(&self) -> Result<PgSession> {
        let tx = self.pool
            .begin()
            .await
            .context("Failed to begin import transaction")?;

        Ok(PgSession { tx })
    }
}

pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

impl StoreSession for PgSession {
    async fn get_college(&mut self, id: i64) -> Result<Option<College>> {
        CollegeRepository::new(&mut self.tx).find_by_id(id).await
    }

    async fn get_or_create_college(&mut self, name: &str) -> Result<College> {
        CollegeRepository::new(&mut self.tx).get_or_create_by_name(name).await
    }

    async fn get_or_create_department(&mut self, college: &College, name: &str) -> Result<Department> {
        DepartmentRepository::new(&mut self.tx)
            .get_or_create_by_college_and_name(college, name)
            .await
    }

    async fn list_departments(&mut self) -> Result<Vec<DepartmentWithCollege>> {
        DepartmentRepository::new(&mut self.tx).find_all_with_college().await
    }

    async fn insert_students(&mut self, students: &[NewStudent]) -> Result<Vec<Student>> {
        StudentRepository::new(&mut self.tx).bulk_create(students).await
    }

    async fn insert_kpis(&mut self, kpis: &[NewDepartmentKpi]) -> Result<Vec<DepartmentKpi>> {
        DepartmentKpiRepository::new(&mut self.tx).bulk_create(kpis).await
    }

    async fn insert_publications(&mut self, publications: &[NewPublication]) -> Result<Vec<Publication>> {
        PublicationRepository::new(&mut self.tx).bulk_create(publications).await
    }

    async fn insert_projects(&mut self, projects: &[NewResearchProject]) -> Result<Vec<ResearchProject>> {
        ResearchProjectRepository::new(&mut self.tx).bulk_create(projects).await
    }

    async fn insert_expenses(&mut self, expenses: &[NewProjectExpense]) -> Result<Vec<ProjectExpense>> {
        ProjectExpenseRepository::new(&mut self.tx).bulk_create(expenses).await
    }

    async fn delete_all(&mut self, kind: EntityKind) -> Result<u64> {
        TableRepository::new(&mut self.tx).delete_all(kind).await
    }

    async fn count(&mut self, kind: EntityKind) -> Result<i64> {
        TableRepository::new(&mut self.tx).count(kind).await
    }

    async fn count_by_department(&mut self, kind: EntityKind, department_id: i64) -> Result<i64> {
        TableRepository::new(&mut self.tx)
            .count_by_department(kind, department_id)
            .await
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await.context("Failed to commit import transaction")
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.context("Failed to roll back import transaction")
    }
}
