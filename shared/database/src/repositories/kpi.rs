//! Department KPI Repository

use anyhow::{Context, Result};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use academic_models::{DepartmentKpi, NewDepartmentKpi};

use super::BULK_CHUNK_ROWS;

pub struct DepartmentKpiRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> DepartmentKpiRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn bulk_create(&mut self, kpis: &[NewDepartmentKpi]) -> Result<Vec<DepartmentKpi>> {
        let mut created = Vec::with_capacity(kpis.len());

        for chunk in kpis.chunks(BULK_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO department_kpis (department_id, evaluation_year, employment_rate, \
                 full_time_faculty_count, visiting_faculty_count, tech_transfer_income, \
                 international_conferences_count) ",
            );
            builder.push_values(chunk, |mut b, k| {
                b.push_bind(k.department_id)
                    .push_bind(k.evaluation_year)
                    .push_bind(k.employment_rate)
                    .push_bind(k.full_time_faculty_count)
                    .push_bind(k.visiting_faculty_count)
                    .push_bind(k.tech_transfer_income)
                    .push_bind(k.international_conferences_count);
            });
            builder.push(
                " RETURNING id, department_id, evaluation_year, employment_rate, \
                 full_time_faculty_count, visiting_faculty_count, tech_transfer_income, \
                 international_conferences_count, created_at",
            );

            let rows: Vec<DepartmentKpi> = builder
                .build_query_as()
                .fetch_all(&mut *self.conn)
                .await
                .context("Failed to bulk insert department KPIs")?;
            created.extend(rows);
        }

        Ok(created)
    }
}
