//! Research projects and their expense ledger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Research project, unique by project number.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ResearchProject {
    pub id: i64,
    pub project_number: String,
    pub name: String,
    pub principal_investigator: Option<String>,
    pub department_id: i64,
    pub funding_agency: Option<String>,
    pub total_funding_amount: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewResearchProject {
    pub project_number: String,
    pub name: String,
    pub principal_investigator: Option<String>,
    pub department_id: i64,
    pub funding_agency: Option<String>,
    pub total_funding_amount: Option<i64>,
}

/// One execution line of a project budget, unique by execution id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ProjectExpense {
    pub id: i64,
    pub execution_id: String,
    pub project_id: i64,
    pub execution_date: NaiveDate,
    pub item: String,
    pub amount: i64,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProjectExpense {
    pub execution_id: String,
    pub project_id: i64,
    pub execution_date: NaiveDate,
    pub item: String,
    pub amount: i64,
    pub status: String,
    pub notes: Option<String>,
}
