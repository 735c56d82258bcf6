//! Import orchestration.

use academic_database::{ImportStore, StoreSession};
use academic_models::{ImportReport, ReplaceMode, Role};

use crate::config::ImportConfig;
use crate::error::{ImportError, ImportResult};
use crate::import::builders::{build_kpis, build_projects, build_publications, build_students};
use crate::import::deletion::DeletionPlan;
use crate::import::resolver::resolve;
use crate::import::schema::SchemaValidator;
use crate::import::source::{SourceFile, SourceReader};
use crate::import::table::RoleTables;

/// Runs imports against a store. Callers must ensure only one import runs
/// against a store at a time.
pub struct ImportService<S> {
    store: S,
    config: ImportConfig,
}

impl<S: ImportStore> ImportService<S> {
    pub fn new(store: S, config: ImportConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Import one file, replacing data according to its format.
    pub async fn import_single(&self, source: &SourceFile) -> ImportResult<ImportReport> {
        self.import_single_with(source, None).await
    }

    /// Import one file; `requested` overrides the format's default replace mode.
    #[tracing::instrument(skip(self, source), fields(file_name = source.file_name()))]
    pub async fn import_single_with(
        &self,
        source: &SourceFile,
        requested: Option<ReplaceMode>,
    ) -> ImportResult<ImportReport> {
        let tables = SourceReader::new(&self.config.role_keywords).read(source)?;
        let plan = DeletionPlan::select(source.format(), &tables.roles(), requested);
        self.run(tables, plan).await
    }

    /// Import several files as one complete refresh. Same-role tables are
    /// merged across files before validation.
    #[tracing::instrument(skip(self, sources), fields(files = sources.len()))]
    pub async fn import_batch(&self, sources: &[SourceFile]) -> ImportResult<ImportReport> {
        if sources.is_empty() {
            return Err(ImportError::EmptySource {
                label: "batch".to_string(),
            });
        }

        let reader = SourceReader::new(&self.config.role_keywords);
        let mut merged = RoleTables::new();
        for source in sources {
            merged.merge(reader.read(source)?);
        }

        self.run(merged, DeletionPlan::full()).await
    }

    async fn run(&self, tables: RoleTables, plan: DeletionPlan) -> ImportResult<ImportReport> {
        SchemaValidator::new(&self.config.required_columns).validate_tables(&tables)?;

        let mut report = ImportReport::new(plan.mode(), tables.roles());
        let mut session = self.store.begin().await?;

        match load(&mut session, &tables, &plan, &mut report).await {
            Ok(()) => {
                session.commit().await?;
                tracing::info!(
                    import_id = %report.import_id,
                    counts = ?report.counts,
                    dropped = report.dropped.total(),
                    "Import committed"
                );
                Ok(report)
            }
            Err(error) => {
                tracing::warn!(import_id = %report.import_id, error = %error, "Import failed, rolling back");
                if let Err(rollback_error) = session.rollback().await {
                    tracing::error!(error = %rollback_error, "Rollback failed");
                }
                Err(error)
            }
        }
    }
}

/// Delete, resolve, then persist parents before children.
async fn load<T: StoreSession>(
    session: &mut T,
    tables: &RoleTables,
    plan: &DeletionPlan,
    report: &mut ImportReport,
) -> ImportResult<()> {
    report.deleted = plan.apply(session).await?;

    let refs = resolve(session, tables).await?;
    report.counts.colleges = refs.college_count();
    report.counts.departments = refs.department_count();

    if let Some(table) = tables.get(Role::Students) {
        let outcome = build_students(table, &refs)?;
        report.dropped.students = outcome.dropped;
        report.counts.students = session.insert_students(&outcome.records).await?.len();
    }

    if let Some(table) = tables.get(Role::Kpis) {
        let outcome = build_kpis(table, &refs)?;
        report.dropped.department_kpis = outcome.dropped;
        report.counts.department_kpis = session.insert_kpis(&outcome.records).await?.len();
    }

    if let Some(table) = tables.get(Role::Publications) {
        let outcome = build_publications(table, &refs)?;
        report.dropped.publications = outcome.dropped;
        report.counts.publications = session.insert_publications(&outcome.records).await?.len();
    }

    if let Some(table) = tables.get(Role::Projects) {
        let project_plan = build_projects(table, &refs)?;
        report.dropped.research_projects = project_plan.dropped_projects;
        report.dropped.project_expenses = project_plan.dropped_expenses;

        // Expenses need the ids assigned to their projects.
        let created = session.insert_projects(&project_plan.projects()).await?;
        report.counts.research_projects = created.len();

        let expenses = project_plan.attach_expenses(&created);
        report.counts.project_expenses = session.insert_expenses(&expenses).await?.len();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use academic_database::MemoryStore;
    use std::path::Path;

    fn write_csv(dir: &Path, name: &str, contents: &str) -> SourceFile {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        SourceFile::from_path(path).unwrap()
    }

    const STUDENTS: &str = "학번,이름,단과대학,학과,과정구분,학적상태,학년\n\
        2024001,김민수,공과대학,컴퓨터공학과,학사,재학,1\n\
        2024002,이서연,공과대학,전자공학과,학사,휴학,2\n";

    const KPIS: &str = "단과대학,학과,평가년도,졸업생취업률,전임교원수\n\
        공과대학,컴퓨터공학과,2024,85.5,12\n";

    #[tokio::test]
    async fn test_csv_import_replaces_only_its_role() {
        let dir = tempfile::tempdir().unwrap();
        let service = ImportService::new(MemoryStore::new(), ImportConfig::default());

        let report = service
            .import_single(&write_csv(dir.path(), "student_roster.csv", STUDENTS))
            .await
            .unwrap();
        assert_eq!(report.mode, ReplaceMode::Selective);
        assert_eq!(report.counts.students, 2);
        assert_eq!(report.counts.colleges, 1);
        assert_eq!(report.counts.departments, 2);

        let report = service
            .import_single(&write_csv(dir.path(), "department_kpi.csv", KPIS))
            .await
            .unwrap();
        assert_eq!(report.roles, vec![Role::Kpis]);
        assert_eq!(report.counts.department_kpis, 1);
        assert!(!report.deleted.contains_key(&academic_models::EntityKind::Student));

        let snapshot = service.store().snapshot().unwrap();
        assert_eq!(snapshot.students.len(), 2);
        assert_eq!(snapshot.kpis.len(), 1);
        assert_eq!(snapshot.departments.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_import_leaves_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let service = ImportService::new(MemoryStore::new(), ImportConfig::default());
        service
            .import_single(&write_csv(dir.path(), "student_roster.csv", STUDENTS))
            .await
            .unwrap();

        let broken = "학번,이름,단과대학,학과,과정구분,학적상태,학년\n\
            2024003,박지훈,공과대학,컴퓨터공학과,학사,재학,삼학년\n";
        let error = service
            .import_single(&write_csv(dir.path(), "student_roster_v2.csv", broken))
            .await
            .unwrap_err();
        assert_eq!(error.error_code(), "ROW_COERCION_ERROR");

        let snapshot = service.store().snapshot().unwrap();
        assert_eq!(snapshot.students.len(), 2);
        assert!(snapshot.students.iter().any(|s| s.student_id_number == "2024001"));
    }

    #[tokio::test]
    async fn test_duplicate_natural_key_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = ImportService::new(MemoryStore::new(), ImportConfig::default());
        let duplicated = "학번,이름,단과대학,학과,과정구분,학적상태\n\
            2024001,김민수,공과대학,컴퓨터공학과,학사,재학\n\
            2024001,김민수,공과대학,컴퓨터공학과,학사,재학\n";

        let error = service
            .import_single(&write_csv(dir.path(), "student_roster.csv", duplicated))
            .await
            .unwrap_err();
        assert_eq!(error.error_code(), "STORAGE_ERROR");
        assert!(!error.is_input_error());
        assert!(service.store().snapshot().unwrap().colleges.is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let service = ImportService::new(MemoryStore::new(), ImportConfig::default());
        let error = service.import_batch(&[]).await.unwrap_err();
        assert_eq!(error.error_code(), "EMPTY_SOURCE");
    }

    #[tokio::test]
    async fn test_unclassified_csv_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = ImportService::new(MemoryStore::new(), ImportConfig::default());
        service
            .import_single(&write_csv(dir.path(), "student_roster.csv", STUDENTS))
            .await
            .unwrap();

        let report = service
            .import_single(&write_csv(dir.path(), "budget.csv", "a,b\n1,2\n"))
            .await
            .unwrap();
        assert!(report.roles.is_empty());
        assert!(report.deleted.is_empty());
        assert_eq!(service.store().snapshot().unwrap().students.len(), 2);
    }
}
