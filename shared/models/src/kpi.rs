use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Yearly department KPI sheet entry, unique by `(department_id, evaluation_year)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct DepartmentKpi {
    pub id: i64,
    pub department_id: i64,
    pub evaluation_year: i32,
    pub employment_rate: Option<f64>,
    pub full_time_faculty_count: Option<i32>,
    pub visiting_faculty_count: Option<i32>,
    /// Annual technology transfer income, in hundred-million won.
    pub tech_transfer_income: Option<f64>,
    pub international_conferences_count: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`DepartmentKpi`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDepartmentKpi {
    pub department_id: i64,
    pub evaluation_year: i32,
    pub employment_rate: Option<f64>,
    pub full_time_faculty_count: Option<i32>,
    pub visiting_faculty_count: Option<i32>,
    pub tech_transfer_income: Option<f64>,
    pub international_conferences_count: Option<i32>,
}
