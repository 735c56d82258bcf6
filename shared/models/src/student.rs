use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Student roster entry, unique by student number.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Student {
    pub id: i64,
    pub student_id_number: String,
    pub name: String,
    pub department_id: i64,
    pub grade: Option<i16>,
    pub program_level: String,
    pub status: String,
    pub gender: Option<String>,
    pub admission_year: Option<i32>,
    pub advisor_name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`Student`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewStudent {
    pub student_id_number: String,
    pub name: String,
    pub department_id: i64,
    pub grade: Option<i16>,
    pub program_level: String,
    pub status: String,
    pub gender: Option<String>,
    pub admission_year: Option<i32>,
    pub advisor_name: Option<String>,
    pub email: Option<String>,
}
