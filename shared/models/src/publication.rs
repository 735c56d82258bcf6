use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Publication {
    pub id: i64,
    /// External publication identifier; unique when present.
    pub publication_id_str: Option<String>,
    pub publication_date: NaiveDate,
    pub department_id: i64,
    pub title: String,
    pub primary_author: Option<String>,
    pub contributing_authors: Option<String>,
    pub journal_name: Option<String>,
    pub journal_rank: Option<String>,
    pub impact_factor: Option<f64>,
    pub is_project_linked: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`Publication`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPublication {
    pub publication_id_str: Option<String>,
    pub publication_date: NaiveDate,
    pub department_id: i64,
    pub title: String,
    pub primary_author: Option<String>,
    pub contributing_authors: Option<String>,
    pub journal_name: Option<String>,
    pub journal_rank: Option<String>,
    pub impact_factor: Option<f64>,
    pub is_project_linked: bool,
}
