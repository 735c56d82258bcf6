//! Publication Repository

use anyhow::{Context, Result};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use academic_models::{NewPublication, Publication};

use super::BULK_CHUNK_ROWS;

pub struct PublicationRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PublicationRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn bulk_create(&mut self, publications: &[NewPublication]) -> Result<Vec<Publication>> {
        let mut created = Vec::with_capacity(publications.len());

        for chunk in publications.chunks(BULK_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO publications (publication_id_str, publication_date, department_id, \
                 title, primary_author, contributing_authors, journal_name, journal_rank, \
                 impact_factor, is_project_linked) ",
            );
            builder.push_values(chunk, |mut b, p| {
                b.push_bind(p.publication_id_str.clone())
                    .push_bind(p.publication_date)
                    .push_bind(p.department_id)
                    .push_bind(p.title.clone())
                    .push_bind(p.primary_author.clone())
                    .push_bind(p.contributing_authors.clone())
                    .push_bind(p.journal_name.clone())
                    .push_bind(p.journal_rank.clone())
                    .push_bind(p.impact_factor)
                    .push_bind(p.is_project_linked);
            });
            builder.push(
                " RETURNING id, publication_id_str, publication_date, department_id, title, \
                 primary_author, contributing_authors, journal_name, journal_rank, \
                 impact_factor, is_project_linked, created_at",
            );

            let rows: Vec<Publication> = builder
                .build_query_as()
                .fetch_all(&mut *self.conn)
                .await
                .context("Failed to bulk insert publications")?;
            created.extend(rows);
        }

        Ok(created)
    }
}
