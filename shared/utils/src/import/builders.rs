//! Entity builders: rows plus resolved references to insert payloads.
//!
//! Rows whose department cannot be resolved are dropped and counted. A value
//! that is present but malformed, or a blank required field, fails the whole
//! build.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use academic_models::{
    NewDepartmentKpi, NewProjectExpense, NewPublication, NewResearchProject, NewStudent,
    ResearchProject, Role,
};

use crate::error::ImportResult;
use crate::import::fields::*;
use crate::import::resolver::ReferenceMap;
use crate::import::table::{Row, Table};

#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome<T> {
    pub records: Vec<T>,
    /// Rows skipped because their department did not resolve.
    pub dropped: usize,
}

fn build_rows<T>(
    table: &Table,
    refs: &ReferenceMap,
    role: Role,
    build: impl Fn(&RowFields<'_>, i64) -> ImportResult<T>,
) -> ImportResult<BuildOutcome<T>> {
    let label = role.table_label();
    let mut outcome = BuildOutcome {
        records: Vec::with_capacity(table.len()),
        dropped: 0,
    };

    for row in table.rows() {
        match refs.resolve_row(row) {
            Some(department_id) => outcome.records.push(build(&RowFields::new(row, label), department_id)?),
            None => outcome.dropped += 1,
        }
    }

    if outcome.dropped > 0 {
        tracing::warn!(
            table = label,
            dropped = outcome.dropped,
            "Dropped rows with unresolved departments"
        );
    }
    Ok(outcome)
}

pub fn build_students(table: &Table, refs: &ReferenceMap) -> ImportResult<BuildOutcome<NewStudent>> {
    build_rows(table, refs, Role::Students, |fields, department_id| {
        Ok(NewStudent {
            student_id_number: fields.required_text(&STUDENT_NUMBER)?,
            name: fields.required_text(&NAME)?,
            department_id,
            grade: fields.integer(&GRADE)?,
            program_level: fields.required_text(&PROGRAM_LEVEL)?,
            status: fields.required_text(&ACADEMIC_STATUS)?,
            gender: fields.text(&GENDER),
            admission_year: fields.integer(&ADMISSION_YEAR)?,
            advisor_name: fields.text(&ADVISOR),
            email: fields.text(&EMAIL),
        })
    })
}

pub fn build_kpis(table: &Table, refs: &ReferenceMap) -> ImportResult<BuildOutcome<NewDepartmentKpi>> {
    build_rows(table, refs, Role::Kpis, |fields, department_id| {
        Ok(NewDepartmentKpi {
            department_id,
            evaluation_year: fields.required_integer(&EVALUATION_YEAR)?,
            employment_rate: fields.float(&EMPLOYMENT_RATE)?,
            full_time_faculty_count: fields.integer(&FULL_TIME_FACULTY)?,
            visiting_faculty_count: fields.integer(&VISITING_FACULTY)?,
            tech_transfer_income: fields.float(&TECH_TRANSFER_INCOME)?,
            international_conferences_count: fields.integer(&CONFERENCES)?,
        })
    })
}

pub fn build_publications(table: &Table, refs: &ReferenceMap) -> ImportResult<BuildOutcome<NewPublication>> {
    build_rows(table, refs, Role::Publications, |fields, department_id| {
        Ok(NewPublication {
            publication_id_str: fields.text(&PUBLICATION_ID),
            publication_date: fields.required_date(&PUBLICATION_DATE)?,
            department_id,
            title: fields.required_text(&TITLE)?,
            primary_author: fields.text(&PRIMARY_AUTHOR),
            contributing_authors: fields.text(&CONTRIBUTORS),
            journal_name: fields.text(&JOURNAL_NAME),
            journal_rank: fields.text(&JOURNAL_RANK),
            impact_factor: fields.float(&IMPACT_FACTOR)?,
            is_project_linked: fields.flag(&PROJECT_LINKED)?,
        })
    })
}

/// An expense line waiting for its project's id.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseDraft {
    pub execution_id: String,
    pub execution_date: NaiveDate,
    pub item: String,
    pub amount: i64,
    pub status: String,
    pub notes: Option<String>,
}

impl ExpenseDraft {
    fn with_project(&self, project_id: i64) -> NewProjectExpense {
        NewProjectExpense {
            execution_id: self.execution_id.clone(),
            project_id,
            execution_date: self.execution_date,
            item: self.item.clone(),
            amount: self.amount,
            status: self.status.clone(),
            notes: self.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub project: NewResearchProject,
    pub expenses: Vec<ExpenseDraft>,
}

/// Projects grouped by project number, with their expense lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPlan {
    pub drafts: Vec<ProjectDraft>,
    /// Groups with an unresolved department plus rows with no project number.
    pub dropped_projects: usize,
    /// Expense lines belonging to dropped groups.
    pub dropped_expenses: usize,
}

impl ProjectPlan {
    pub fn projects(&self) -> Vec<NewResearchProject> {
        self.drafts.iter().map(|draft| draft.project.clone()).collect()
    }

    pub fn expense_count(&self) -> usize {
        self.drafts.iter().map(|draft| draft.expenses.len()).sum()
    }

    /// Expense payloads for the persisted projects, matched by project number.
    pub fn attach_expenses(&self, created: &[ResearchProject]) -> Vec<NewProjectExpense> {
        let ids: HashMap<&str, i64> = created
            .iter()
            .map(|project| (project.project_number.as_str(), project.id))
            .collect();

        self.drafts
            .iter()
            .filter_map(|draft| {
                ids.get(draft.project.project_number.as_str())
                    .map(|id| (draft, *id))
            })
            .flat_map(|(draft, project_id)| {
                draft.expenses.iter().map(move |expense| expense.with_project(project_id))
            })
            .collect()
    }
}

fn build_expense(fields: &RowFields<'_>, execution_id: String) -> ImportResult<ExpenseDraft> {
    Ok(ExpenseDraft {
        execution_id,
        execution_date: fields.required_date(&EXECUTION_DATE)?,
        item: fields.required_text(&EXPENSE_ITEM)?,
        amount: fields.required_integer(&EXPENSE_AMOUNT)?,
        status: fields.required_text(&EXPENSE_STATUS)?,
        notes: fields.text(&NOTES),
    })
}

/// Group project rows by project number. Each group becomes one project
/// built from its first row; every row with an execution id becomes one of
/// its expense lines.
pub fn build_projects(table: &Table, refs: &ReferenceMap) -> ImportResult<ProjectPlan> {
    let label = Role::Projects.table_label();
    let mut plan = ProjectPlan::default();
    let mut groups: BTreeMap<String, Vec<&Row>> = BTreeMap::new();

    for row in table.rows() {
        match RowFields::new(row, label).text(&PROJECT_NUMBER) {
            Some(number) => groups.entry(number).or_default().push(row),
            None => plan.dropped_projects += 1,
        }
    }

    for (project_number, rows) in groups {
        let first = RowFields::new(rows[0], label);
        let expense_rows = rows
            .iter()
            .filter(|row| RowFields::new(row, label).text(&EXECUTION_ID).is_some())
            .count();

        let Some(department_id) = refs.resolve_row(first.row()) else {
            plan.dropped_projects += 1;
            plan.dropped_expenses += expense_rows;
            continue;
        };

        let project = NewResearchProject {
            project_number,
            name: first.required_text(&PROJECT_NAME)?,
            principal_investigator: first.text(&PRINCIPAL_INVESTIGATOR),
            department_id,
            funding_agency: first.text(&FUNDING_AGENCY),
            total_funding_amount: first.integer(&TOTAL_FUNDING)?,
        };

        let mut expenses = Vec::with_capacity(expense_rows);
        for row in rows {
            let fields = RowFields::new(row, label);
            if let Some(execution_id) = fields.text(&EXECUTION_ID) {
                expenses.push(build_expense(&fields, execution_id)?);
            }
        }

        plan.drafts.push(ProjectDraft { project, expenses });
    }

    if plan.dropped_projects > 0 {
        tracing::warn!(
            table = label,
            dropped_projects = plan.dropped_projects,
            dropped_expenses = plan.dropped_expenses,
            "Dropped project rows"
        );
    }
    Ok(plan)
}
