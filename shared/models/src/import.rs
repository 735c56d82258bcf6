//! Import vocabulary shared by the pipeline, the storage layer and callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Semantic category of a parsed source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Students,
    Kpis,
    Publications,
    Projects,
}

impl Role {
    /// Persistence order: parents referenced by later roles come first.
    pub const ALL: [Role; 4] = [Role::Students, Role::Kpis, Role::Publications, Role::Projects];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Kpis => "kpis",
            Self::Publications => "publications",
            Self::Projects => "projects",
        }
    }

    /// Label used when reporting validation failures for this role's table.
    pub fn table_label(&self) -> &'static str {
        match self {
            Self::Students => "student_roster",
            Self::Kpis => "department_kpi",
            Self::Publications => "publication_list",
            Self::Projects => "research_project_data",
        }
    }

    /// Entity tables populated from this role, children first.
    pub fn entity_kinds(&self) -> &'static [EntityKind] {
        match self {
            Self::Students => &[EntityKind::Student],
            Self::Kpis => &[EntityKind::DepartmentKpi],
            Self::Publications => &[EntityKind::Publication],
            Self::Projects => &[EntityKind::ProjectExpense, EntityKind::ResearchProject],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every persisted entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    College,
    Department,
    Student,
    DepartmentKpi,
    Publication,
    ResearchProject,
    ProjectExpense,
}

impl EntityKind {
    /// Child-before-parent order satisfying the RESTRICT/CASCADE foreign keys.
    pub const DELETION_ORDER: [EntityKind; 7] = [
        EntityKind::ProjectExpense,
        EntityKind::ResearchProject,
        EntityKind::Publication,
        EntityKind::DepartmentKpi,
        EntityKind::Student,
        EntityKind::Department,
        EntityKind::College,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Self::College => "colleges",
            Self::Department => "departments",
            Self::Student => "students",
            Self::DepartmentKpi => "department_kpis",
            Self::Publication => "publications",
            Self::ResearchProject => "research_projects",
            Self::ProjectExpense => "project_expenses",
        }
    }

    /// Position in [`EntityKind::DELETION_ORDER`].
    pub fn deletion_rank(&self) -> usize {
        Self::DELETION_ORDER
            .iter()
            .position(|kind| kind == self)
            .unwrap_or(Self::DELETION_ORDER.len())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// How existing rows are cleared before a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceMode {
    /// Every entity table is emptied.
    Full,
    /// Only the tables fed by the roles present in the source are emptied.
    Selective,
}

/// Rows inserted per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounts {
    pub colleges: usize,
    pub departments: usize,
    pub students: usize,
    pub department_kpis: usize,
    pub publications: usize,
    pub research_projects: usize,
    pub project_expenses: usize,
}

/// Rows skipped without failing the import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRows {
    pub students: usize,
    pub department_kpis: usize,
    pub publications: usize,
    pub research_projects: usize,
    pub project_expenses: usize,
}

impl DroppedRows {
    pub fn total(&self) -> usize {
        self.students
            + self.department_kpis
            + self.publications
            + self.research_projects
            + self.project_expenses
    }
}

/// Outcome of one committed import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub import_id: Uuid,
    pub mode: ReplaceMode,
    pub roles: Vec<Role>,
    pub counts: ImportCounts,
    pub dropped: DroppedRows,
    pub deleted: BTreeMap<EntityKind, u64>,
}

impl ImportReport {
    pub fn new(mode: ReplaceMode, roles: Vec<Role>) -> Self {
        Self {
            import_id: Uuid::new_v4(),
            mode,
            roles,
            counts: ImportCounts::default(),
            dropped: DroppedRows::default(),
            deleted: BTreeMap::new(),
        }
    }
}
