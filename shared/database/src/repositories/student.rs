//! Student Repository

use anyhow::{Context, Result};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use academic_models::{NewStudent, Student};

use super::BULK_CHUNK_ROWS;

pub struct StudentRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> StudentRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert all students, returning the created rows
    pub async fn bulk_create(&mut self, students: &[NewStudent]) -> Result<Vec<Student>> {
        let mut created = Vec::with_capacity(students.len());

        for chunk in students.chunks(BULK_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO students (student_id_number, name, department_id, grade, \
                 program_level, status, gender, admission_year, advisor_name, email) ",
            );
            builder.push_values(chunk, |mut b, s| {
                b.push_bind(s.student_id_number.clone())
                    .push_bind(s.name.clone())
                    .push_bind(s.department_id)
                    .push_bind(s.grade)
                    .push_bind(s.program_level.clone())
                    .push_bind(s.status.clone())
                    .push_bind(s.gender.clone())
                    .push_bind(s.admission_year)
                    .push_bind(s.advisor_name.clone())
                    .push_bind(s.email.clone());
            });
            builder.push(
                " RETURNING id, student_id_number, name, department_id, grade, program_level, \
                 status, gender, admission_year, advisor_name, email, created_at",
            );

            let rows: Vec<Student> = builder
                .build_query_as()
                .fetch_all(&mut *self.conn)
                .await
                .context("Failed to bulk insert students")?;
            created.extend(rows);
        }

        Ok(created)
    }
}
