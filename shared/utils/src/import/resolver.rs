//! Reference resolution: department names in rows to department ids.

use std::collections::{BTreeMap, BTreeSet};

use academic_database::StoreSession;
use academic_models::College;

use crate::error::ImportResult;
use crate::import::fields::{COLLEGE, DEPARTMENT};
use crate::import::table::{Row, RoleTables, Table};

/// Composite natural key of a department.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DepartmentKey {
    pub college: String,
    pub department: String,
}

impl DepartmentKey {
    pub fn new(college: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            college: college.into(),
            department: department.into(),
        }
    }
}

/// Resolved colleges and departments for one import.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    colleges: BTreeMap<String, i64>,
    departments: BTreeMap<DepartmentKey, i64>,
    by_department_name: BTreeMap<String, Vec<i64>>,
    fallback: bool,
}

impl ReferenceMap {
    fn insert_department(&mut self, key: DepartmentKey, id: i64) {
        self.by_department_name
            .entry(key.department.clone())
            .or_default()
            .push(id);
        self.departments.insert(key, id);
    }

    /// Whether the map was loaded from existing departments instead of the input.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Colleges get-or-created from the input.
    pub fn college_count(&self) -> usize {
        if self.fallback {
            0
        } else {
            self.colleges.len()
        }
    }

    /// Departments get-or-created from the input.
    pub fn department_count(&self) -> usize {
        if self.fallback {
            0
        } else {
            self.departments.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn department_id(&self, key: &DepartmentKey) -> Option<i64> {
        self.departments.get(key).copied()
    }

    /// Lookup by department name alone. With several colleges holding the
    /// name, the first in (college, department) order wins.
    pub fn department_id_by_name(&self, department: &str) -> Option<i64> {
        self.by_department_name
            .get(department)
            .and_then(|ids| ids.first().copied())
    }

    /// Department of `row`: its explicit (college, department) pair when both
    /// are filled in, otherwise its department name alone.
    pub fn resolve_row(&self, row: &Row) -> Option<i64> {
        let department = first_value(row, DEPARTMENT.keys)?;
        match first_value(row, COLLEGE.keys) {
            Some(college) => self.department_id(&DepartmentKey::new(college, department)),
            None => self.department_id_by_name(department),
        }
    }

    fn warn_ambiguous_names(&self) {
        for (name, ids) in &self.by_department_name {
            if ids.len() > 1 {
                tracing::warn!(
                    department = %name,
                    candidates = ids.len(),
                    "Department name is shared by several colleges; name-only rows use the first"
                );
            }
        }
    }
}

fn first_value<'r>(row: &'r Row, keys: &[&str]) -> Option<&'r str> {
    keys.iter().find_map(|key| row.get(key))
}

fn carries_department_pairs(table: &Table) -> bool {
    COLLEGE.keys.iter().any(|key| table.has_column(key))
        && DEPARTMENT.keys.iter().any(|key| table.has_column(key))
}

/// Distinct non-blank (college, department) pairs across every table that
/// carries both columns.
pub fn collect_department_keys(tables: &RoleTables) -> BTreeSet<DepartmentKey> {
    tables
        .tables()
        .filter(|(_, table)| carries_department_pairs(table))
        .flat_map(|(_, table)| table.rows())
        .filter_map(|row| {
            let college = first_value(row, COLLEGE.keys)?;
            let department = first_value(row, DEPARTMENT.keys)?;
            Some(DepartmentKey::new(college, department))
        })
        .collect()
}

/// Get-or-create every referenced college and department inside `session`.
/// Falls back to the departments already stored when the input names none.
pub async fn resolve<S: StoreSession>(session: &mut S, tables: &RoleTables) -> ImportResult<ReferenceMap> {
    let keys = collect_department_keys(tables);
    let mut map = ReferenceMap::default();

    if keys.is_empty() {
        for entry in session.list_departments().await? {
            map.colleges.insert(entry.college.name.clone(), entry.college.id);
            map.insert_department(
                DepartmentKey::new(entry.college.name, entry.department.name),
                entry.department.id,
            );
        }
        map.fallback = true;
        tracing::info!(
            departments = map.departments.len(),
            "No college/department pairs in input; using stored departments"
        );
    } else {
        let mut colleges: BTreeMap<String, College> = BTreeMap::new();
        for key in &keys {
            if !colleges.contains_key(&key.college) {
                let college = session.get_or_create_college(&key.college).await?;
                map.colleges.insert(key.college.clone(), college.id);
                colleges.insert(key.college.clone(), college);
            }
        }

        for key in keys {
            if let Some(college) = colleges.get(&key.college) {
                let department = session.get_or_create_department(college, &key.department).await?;
                map.insert_department(key, department.id);
            }
        }

        tracing::info!(
            colleges = map.colleges.len(),
            departments = map.departments.len(),
            "Resolved college and department references"
        );
    }

    map.warn_ambiguous_names();
    Ok(map)
}
