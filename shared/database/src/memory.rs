//! In-memory store
//!
//! Mirrors the Postgres schema constraints (unique natural keys, foreign keys,
//! RESTRICT and CASCADE deletes) so dry runs and tests fail where the database
//! would. A session works on a private copy that replaces the shared state on
//! commit.

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use academic_models::{
    College, Department, DepartmentKpi, DepartmentWithCollege, EntityKind, NewDepartmentKpi,
    NewProjectExpense, NewPublication, NewResearchProject, NewStudent, ProjectExpense,
    Publication, ResearchProject, Student,
};

use crate::repositories::table::has_department_column;
use crate::store::{ImportStore, StoreSession};

/// Copy of every table held by a [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    pub colleges: Vec<College>,
    pub departments: Vec<Department>,
    pub students: Vec<Student>,
    pub kpis: Vec<DepartmentKpi>,
    pub publications: Vec<Publication>,
    pub projects: Vec<ResearchProject>,
    pub expenses: Vec<ProjectExpense>,
    next_id: i64,
}

impl MemorySnapshot {
    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::College => self.colleges.len(),
            EntityKind::Department => self.departments.len(),
            EntityKind::Student => self.students.len(),
            EntityKind::DepartmentKpi => self.kpis.len(),
            EntityKind::Publication => self.publications.len(),
            EntityKind::ResearchProject => self.projects.len(),
            EntityKind::ProjectExpense => self.expenses.len(),
        }
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn has_department(&self, id: i64) -> bool {
        self.departments.iter().any(|d| d.id == id)
    }

    fn restricting_references(&self, department_ids: &HashSet<i64>) -> Option<EntityKind> {
        if self.students.iter().any(|s| department_ids.contains(&s.department_id)) {
            return Some(EntityKind::Student);
        }
        if self.publications.iter().any(|p| department_ids.contains(&p.department_id)) {
            return Some(EntityKind::Publication);
        }
        if self.projects.iter().any(|p| department_ids.contains(&p.department_id)) {
            return Some(EntityKind::ResearchProject);
        }
        None
    }

    /// Delete departments, cascading to their KPIs; refused while restricted
    /// children still reference them.
    fn remove_departments(&mut self, department_ids: &HashSet<i64>) -> Result<u64> {
        if let Some(child) = self.restricting_references(department_ids) {
            bail!(
                "update or delete on table \"departments\" violates foreign key constraint on table \"{}\"",
                child
            );
        }

        self.kpis.retain(|k| !department_ids.contains(&k.department_id));
        let before = self.departments.len();
        self.departments.retain(|d| !department_ids.contains(&d.id));
        Ok((before - self.departments.len()) as u64)
    }

    fn delete_all(&mut self, kind: EntityKind) -> Result<u64> {
        let removed = match kind {
            EntityKind::ProjectExpense => std::mem::take(&mut self.expenses).len(),
            EntityKind::ResearchProject => {
                self.expenses.clear();
                std::mem::take(&mut self.projects).len()
            }
            EntityKind::Publication => std::mem::take(&mut self.publications).len(),
            EntityKind::DepartmentKpi => std::mem::take(&mut self.kpis).len(),
            EntityKind::Student => std::mem::take(&mut self.students).len(),
            EntityKind::Department => {
                let ids: HashSet<i64> = self.departments.iter().map(|d| d.id).collect();
                self.remove_departments(&ids)? as usize
            }
            EntityKind::College => {
                let ids: HashSet<i64> = self.departments.iter().map(|d| d.id).collect();
                self.remove_departments(&ids)?;
                std::mem::take(&mut self.colleges).len()
            }
        };

        Ok(removed as u64)
    }
}

/// Shared in-memory database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemorySnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed state at this instant.
    pub fn snapshot(&self) -> Result<MemorySnapshot> {
        let state = self.state
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(state.clone())
    }
}

impl ImportStore for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession> {
        let working = self.snapshot()?;
        Ok(MemorySession {
            shared: Arc::clone(&self.state),
            working,
        })
    }
}

pub struct MemorySession {
    shared: Arc<Mutex<MemorySnapshot>>,
    working: MemorySnapshot,
}

fn ensure_unique<'a, I>(constraint: &str, keys: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            bail!(
                "duplicate key value violates unique constraint \"{}\": ({})",
                constraint,
                key
            );
        }
    }
    Ok(())
}

impl StoreSession for MemorySession {
    async fn get_college(&mut self, id: i64) -> Result<Option<College>> {
        Ok(self.working.colleges.iter().find(|c| c.id == id).cloned())
    }

    async fn get_or_create_college(&mut self, name: &str) -> Result<College> {
        if let Some(existing) = self.working.colleges.iter().find(|c| c.name == name) {
            return Ok(existing.clone());
        }

        let college = College {
            id: self.working.allocate_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.working.colleges.push(college.clone());
        Ok(college)
    }

    async fn get_or_create_department(&mut self, college: &College, name: &str) -> Result<Department> {
        if !self.working.colleges.iter().any(|c| c.id == college.id) {
            bail!("college {} does not exist", college.id);
        }

        if let Some(existing) = self.working
            .departments
            .iter()
            .find(|d| d.college_id == college.id && d.name == name)
        {
            return Ok(existing.clone());
        }

        let department = Department {
            id: self.working.allocate_id(),
            college_id: college.id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.working.departments.push(department.clone());
        Ok(department)
    }

    async fn list_departments(&mut self) -> Result<Vec<DepartmentWithCollege>> {
        let mut joined = Vec::with_capacity(self.working.departments.len());
        for department in &self.working.departments {
            let college = self.working
                .colleges
                .iter()
                .find(|c| c.id == department.college_id)
                .ok_or_else(|| anyhow!("department {} has no college", department.id))?;
            joined.push(DepartmentWithCollege {
                college: college.clone(),
                department: department.clone(),
            });
        }

        joined.sort_by(|a, b| {
            (&a.college.name, &a.department.name).cmp(&(&b.college.name, &b.department.name))
        });
        Ok(joined)
    }

    async fn insert_students(&mut self, students: &[NewStudent]) -> Result<Vec<Student>> {
        let state = &mut self.working;
        ensure_unique(
            "students_student_id_number_key",
            state.students
                .iter()
                .map(|s| s.student_id_number.as_str())
                .chain(students.iter().map(|s| s.student_id_number.as_str())),
        )?;
        ensure_unique(
            "students_email_key",
            state.students
                .iter()
                .filter_map(|s| s.email.as_deref())
                .chain(students.iter().filter_map(|s| s.email.as_deref())),
        )?;
        if let Some(orphan) = students.iter().find(|s| !state.has_department(s.department_id)) {
            bail!("students.department_id {} violates foreign key", orphan.department_id);
        }

        let now = Utc::now();
        let created: Vec<Student> = students
            .iter()
            .map(|s| Student {
                id: state.allocate_id(),
                student_id_number: s.student_id_number.clone(),
                name: s.name.clone(),
                department_id: s.department_id,
                grade: s.grade,
                program_level: s.program_level.clone(),
                status: s.status.clone(),
                gender: s.gender.clone(),
                admission_year: s.admission_year,
                advisor_name: s.advisor_name.clone(),
                email: s.email.clone(),
                created_at: now,
            })
            .collect();
        state.students.extend(created.iter().cloned());
        Ok(created)
    }

    async fn insert_kpis(&mut self, kpis: &[NewDepartmentKpi]) -> Result<Vec<DepartmentKpi>> {
        let state = &mut self.working;
        let keys: Vec<String> = state.kpis
            .iter()
            .map(|k| (k.department_id, k.evaluation_year))
            .chain(kpis.iter().map(|k| (k.department_id, k.evaluation_year)))
            .map(|(department, year)| format!("{}, {}", department, year))
            .collect();
        ensure_unique(
            "department_kpis_department_id_evaluation_year_key",
            keys.iter().map(String::as_str),
        )?;
        if let Some(orphan) = kpis.iter().find(|k| !state.has_department(k.department_id)) {
            bail!("department_kpis.department_id {} violates foreign key", orphan.department_id);
        }

        let now = Utc::now();
        let created: Vec<DepartmentKpi> = kpis
            .iter()
            .map(|k| DepartmentKpi {
                id: state.allocate_id(),
                department_id: k.department_id,
                evaluation_year: k.evaluation_year,
                employment_rate: k.employment_rate,
                full_time_faculty_count: k.full_time_faculty_count,
                visiting_faculty_count: k.visiting_faculty_count,
                tech_transfer_income: k.tech_transfer_income,
                international_conferences_count: k.international_conferences_count,
                created_at: now,
            })
            .collect();
        state.kpis.extend(created.iter().cloned());
        Ok(created)
    }

    async fn insert_publications(&mut self, publications: &[NewPublication]) -> Result<Vec<Publication>> {
        let state = &mut self.working;
        ensure_unique(
            "publications_publication_id_str_key",
            state.publications
                .iter()
                .filter_map(|p| p.publication_id_str.as_deref())
                .chain(publications.iter().filter_map(|p| p.publication_id_str.as_deref())),
        )?;
        if let Some(orphan) = publications.iter().find(|p| !state.has_department(p.department_id)) {
            bail!("publications.department_id {} violates foreign key", orphan.department_id);
        }

        let now = Utc::now();
        let created: Vec<Publication> = publications
            .iter()
            .map(|p| Publication {
                id: state.allocate_id(),
                publication_id_str: p.publication_id_str.clone(),
                publication_date: p.publication_date,
                department_id: p.department_id,
                title: p.title.clone(),
                primary_author: p.primary_author.clone(),
                contributing_authors: p.contributing_authors.clone(),
                journal_name: p.journal_name.clone(),
                journal_rank: p.journal_rank.clone(),
                impact_factor: p.impact_factor,
                is_project_linked: p.is_project_linked,
                created_at: now,
            })
            .collect();
        state.publications.extend(created.iter().cloned());
        Ok(created)
    }

    async fn insert_projects(&mut self, projects: &[NewResearchProject]) -> Result<Vec<ResearchProject>> {
        let state = &mut self.working;
        ensure_unique(
            "research_projects_project_number_key",
            state.projects
                .iter()
                .map(|p| p.project_number.as_str())
                .chain(projects.iter().map(|p| p.project_number.as_str())),
        )?;
        if let Some(orphan) = projects.iter().find(|p| !state.has_department(p.department_id)) {
            bail!("research_projects.department_id {} violates foreign key", orphan.department_id);
        }

        let now = Utc::now();
        let created: Vec<ResearchProject> = projects
            .iter()
            .map(|p| ResearchProject {
                id: state.allocate_id(),
                project_number: p.project_number.clone(),
                name: p.name.clone(),
                principal_investigator: p.principal_investigator.clone(),
                department_id: p.department_id,
                funding_agency: p.funding_agency.clone(),
                total_funding_amount: p.total_funding_amount,
                created_at: now,
            })
            .collect();
        state.projects.extend(created.iter().cloned());
        Ok(created)
    }

    async fn insert_expenses(&mut self, expenses: &[NewProjectExpense]) -> Result<Vec<ProjectExpense>> {
        let state = &mut self.working;
        ensure_unique(
            "project_expenses_execution_id_key",
            state.expenses
                .iter()
                .map(|e| e.execution_id.as_str())
                .chain(expenses.iter().map(|e| e.execution_id.as_str())),
        )?;
        if let Some(orphan) = expenses
            .iter()
            .find(|e| !state.projects.iter().any(|p| p.id == e.project_id))
        {
            bail!("project_expenses.project_id {} violates foreign key", orphan.project_id);
        }

        let now = Utc::now();
        let created: Vec<ProjectExpense> = expenses
            .iter()
            .map(|e| ProjectExpense {
                id: state.allocate_id(),
                execution_id: e.execution_id.clone(),
                project_id: e.project_id,
                execution_date: e.execution_date,
                item: e.item.clone(),
                amount: e.amount,
                status: e.status.clone(),
                notes: e.notes.clone(),
                created_at: now,
            })
            .collect();
        state.expenses.extend(created.iter().cloned());
        Ok(created)
    }

    async fn delete_all(&mut self, kind: EntityKind) -> Result<u64> {
        self.working.delete_all(kind)
    }

    async fn count(&mut self, kind: EntityKind) -> Result<i64> {
        Ok(self.working.count(kind) as i64)
    }

    async fn count_by_department(&mut self, kind: EntityKind, department_id: i64) -> Result<i64> {
        if !has_department_column(kind) {
            bail!("{} rows are not keyed by department", kind);
        }

        let state = &self.working;
        let count = match kind {
            EntityKind::Student => state.students.iter().filter(|s| s.department_id == department_id).count(),
            EntityKind::DepartmentKpi => state.kpis.iter().filter(|k| k.department_id == department_id).count(),
            EntityKind::Publication => state.publications.iter().filter(|p| p.department_id == department_id).count(),
            EntityKind::ResearchProject => state.projects.iter().filter(|p| p.department_id == department_id).count(),
            _ => 0,
        };
        Ok(count as i64)
    }

    async fn commit(self) -> Result<()> {
        let mut shared = self.shared
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        *shared = self.working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
