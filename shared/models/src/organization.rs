//! Organizational units: colleges and the departments they own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A college, unique by name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct College {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A department, unique by `(college_id, name)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Department {
    pub id: i64,
    pub college_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A department joined with the college that owns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepartmentWithCollege {
    pub college: College,
    pub department: Department,
}
