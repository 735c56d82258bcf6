//! Research Project and Project Expense Repositories

use anyhow::{Context, Result};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use academic_models::{NewProjectExpense, NewResearchProject, ProjectExpense, ResearchProject};

use super::BULK_CHUNK_ROWS;

pub struct ResearchProjectRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> ResearchProjectRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn bulk_create(&mut self, projects: &[NewResearchProject]) -> Result<Vec<ResearchProject>> {
        let mut created = Vec::with_capacity(projects.len());

        for chunk in projects.chunks(BULK_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO research_projects (project_number, name, principal_investigator, \
                 department_id, funding_agency, total_funding_amount) ",
            );
            builder.push_values(chunk, |mut b, p| {
                b.push_bind(p.project_number.clone())
                    .push_bind(p.name.clone())
                    .push_bind(p.principal_investigator.clone())
                    .push_bind(p.department_id)
                    .push_bind(p.funding_agency.clone())
                    .push_bind(p.total_funding_amount);
            });
            builder.push(
                " RETURNING id, project_number, name, principal_investigator, department_id, \
                 funding_agency, total_funding_amount, created_at",
            );

            let rows: Vec<ResearchProject> = builder
                .build_query_as()
                .fetch_all(&mut *self.conn)
                .await
                .context("Failed to bulk insert research projects")?;
            created.extend(rows);
        }

        Ok(created)
    }
}

pub struct ProjectExpenseRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> ProjectExpenseRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn bulk_create(&mut self, expenses: &[NewProjectExpense]) -> Result<Vec<ProjectExpense>> {
        let mut created = Vec::with_capacity(expenses.len());

        for chunk in expenses.chunks(BULK_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO project_expenses (execution_id, project_id, execution_date, item, \
                 amount, status, notes) ",
            );
            builder.push_values(chunk, |mut b, e| {
                b.push_bind(e.execution_id.clone())
                    .push_bind(e.project_id)
                    .push_bind(e.execution_date)
                    .push_bind(e.item.clone())
                    .push_bind(e.amount)
                    .push_bind(e.status.clone())
                    .push_bind(e.notes.clone());
            });
            builder.push(
                " RETURNING id, execution_id, project_id, execution_date, item, amount, status, \
                 notes, created_at",
            );

            let rows: Vec<ProjectExpense> = builder
                .build_query_as()
                .fetch_all(&mut *self.conn)
                .await
                .context("Failed to bulk insert project expenses")?;
            created.extend(rows);
        }

        Ok(created)
    }
}
