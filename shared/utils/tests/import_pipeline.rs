use std::path::{Path, PathBuf};

use academic_database::MemoryStore;
use academic_models::{ImportCounts, ReplaceMode, Role};
use academic_utils::{ImportConfig, ImportError, ImportService, SourceFile, StagedUpload};
use chrono::NaiveDate;
use rust_xlsxwriter::Workbook;

fn service() -> ImportService<MemoryStore> {
    ImportService::new(MemoryStore::new(), ImportConfig::default())
}

fn write_csv(dir: &Path, name: &str, rows: &[&[&str]]) -> SourceFile {
    let path = dir.join(name);
    let mut writer = csv::Writer::from_path(&path).unwrap();
    for row in rows {
        writer.write_record(*row).unwrap();
    }
    writer.flush().unwrap();
    SourceFile::from_path(path).unwrap()
}

/// Numeric-looking cells are stored as numbers, like a hand-made workbook.
fn write_workbook(dir: &Path, name: &str, sheets: &[(&str, &[&[&str]])]) -> SourceFile {
    let path: PathBuf = dir.join(name);
    let mut workbook = Workbook::new();
    for (sheet_name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*sheet_name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell.parse::<f64>() {
                    Ok(number) if r > 0 => {
                        sheet.write_number(r as u32, c as u16, number).unwrap();
                    }
                    _ if cell.is_empty() => {}
                    _ => {
                        sheet.write_string(r as u32, c as u16, *cell).unwrap();
                    }
                }
            }
        }
    }
    workbook.save(&path).unwrap();
    SourceFile::from_path(path).unwrap()
}

const STUDENT_HEADER: &[&str] = &["학번", "이름", "단과대학", "학과", "과정구분", "학적상태", "학년", "성별", "입학년도"];
const KPI_HEADER: &[&str] = &["단과대학", "학과", "평가년도", "졸업생취업률", "전임교원수", "연간기술이전수입액(억)"];

fn scenario_workbook(dir: &Path) -> SourceFile {
    write_workbook(
        dir,
        "통합데이터.xlsx",
        &[
            (
                "학생현황",
                &[
                    STUDENT_HEADER,
                    &["2024001", "김민수", "공과대학", "컴퓨터공학과", "학사", "재학", "1", "남", "2024"],
                ],
            ),
            (
                "KPI평가",
                &[KPI_HEADER, &["공과대학", "컴퓨터공학과", "2024", "85.5", "12", "1.5"]],
            ),
        ],
    )
}

#[tokio::test]
async fn test_workbook_scenario_counts() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();

    let report = service.import_single(&scenario_workbook(dir.path())).await.unwrap();

    assert_eq!(report.mode, ReplaceMode::Full);
    assert_eq!(report.roles, vec![Role::Students, Role::Kpis]);
    assert_eq!(
        report.counts,
        ImportCounts {
            colleges: 1,
            departments: 1,
            students: 1,
            department_kpis: 1,
            ..ImportCounts::default()
        }
    );

    let snapshot = service.store().snapshot().unwrap();
    let student = &snapshot.students[0];
    assert_eq!(student.student_id_number, "2024001");
    assert_eq!(student.admission_year, Some(2024));
    let kpi = &snapshot.kpis[0];
    assert_eq!(kpi.evaluation_year, 2024);
    assert_eq!(kpi.employment_rate, Some(85.5));
    assert_eq!(kpi.tech_transfer_income, Some(1.5));
}

#[tokio::test]
async fn test_full_replace_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();
    let source = scenario_workbook(dir.path());

    let first = service.import_single(&source).await.unwrap();
    let before = service.store().snapshot().unwrap();
    let second = service.import_single(&source).await.unwrap();
    let after = service.store().snapshot().unwrap();

    assert_eq!(first.counts, second.counts);
    assert_eq!(second.deleted.values().sum::<u64>(), 4);
    assert_eq!(before.students.len(), after.students.len());
    assert_eq!(before.students[0].name, after.students[0].name);
    assert_eq!(before.kpis[0].employment_rate, after.kpis[0].employment_rate);
    assert_eq!(after.colleges.len(), 1);
}

#[tokio::test]
async fn test_kpi_csv_keeps_existing_students() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();
    service.import_single(&scenario_workbook(dir.path())).await.unwrap();

    let kpis = write_csv(
        dir.path(),
        "department_kpi.csv",
        &[KPI_HEADER, &["공과대학", "컴퓨터공학과", "2025", "90", "14", ""]],
    );
    let report = service.import_single(&kpis).await.unwrap();

    assert_eq!(report.mode, ReplaceMode::Selective);
    let snapshot = service.store().snapshot().unwrap();
    assert_eq!(snapshot.students.len(), 1);
    assert_eq!(snapshot.kpis.len(), 1);
    assert_eq!(snapshot.kpis[0].evaluation_year, 2025);
    assert_eq!(snapshot.kpis[0].tech_transfer_income, None);
}

#[tokio::test]
async fn test_translated_department_column_does_not_override_department() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();

    let roster = write_csv(
        dir.path(),
        "student_roster.csv",
        &[
            &["학번", "이름", "단과대학", "학과", "과정구분", "학적상태", "학과 (영문)"],
            &["2024001", "김민수", "공과대학", "컴퓨터공학과", "학사", "재학", "Computer Science"],
        ],
    );
    let report = service.import_single(&roster).await.unwrap();

    assert_eq!(report.counts.students, 1);
    assert_eq!(report.dropped.total(), 0);
    let snapshot = service.store().snapshot().unwrap();
    let names: Vec<&str> = snapshot.departments.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["컴퓨터공학과"]);
}

#[tokio::test]
async fn test_requested_full_replace_for_csv() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();
    service.import_single(&scenario_workbook(dir.path())).await.unwrap();

    let kpis = write_csv(
        dir.path(),
        "department_kpi.csv",
        &[KPI_HEADER, &["공과대학", "컴퓨터공학과", "2025", "90", "14", ""]],
    );
    let report = service
        .import_single_with(&kpis, Some(ReplaceMode::Full))
        .await
        .unwrap();

    assert_eq!(report.mode, ReplaceMode::Full);
    let snapshot = service.store().snapshot().unwrap();
    assert!(snapshot.students.is_empty());
    assert_eq!(snapshot.kpis.len(), 1);
}

#[tokio::test]
async fn test_department_only_projects_without_stored_departments_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();
    let projects = write_csv(
        dir.path(),
        "research_project_data.csv",
        &[
            &["과제번호", "과제명", "연구책임자", "소속학과", "총연구비"],
            &["R-2024-001", "AI 플랫폼", "김교수", "컴퓨터공학과", "50,000,000"],
            &["R-2024-002", "배터리 소재", "최교수", "화학과", "30000000"],
        ],
    );

    let report = service.import_single(&projects).await.unwrap();
    assert_eq!(report.counts.research_projects, 0);
    assert_eq!(report.dropped.research_projects, 2);
    assert_eq!(report.counts.departments, 0);
}

#[tokio::test]
async fn test_department_only_projects_use_stored_departments() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();
    service.import_single(&scenario_workbook(dir.path())).await.unwrap();

    let projects = write_csv(
        dir.path(),
        "research_project_data.csv",
        &[
            &["과제번호", "과제명", "연구책임자", "소속학과", "집행ID", "집행일자", "집행항목", "집행금액", "처리상태"],
            &["R-2024-001", "AI 플랫폼", "김교수", "컴퓨터공학과", "EX-1", "2024-01-10", "인건비", "1,200,000", "집행완료"],
            &["R-2024-001", "AI 플랫폼", "김교수", "컴퓨터공학과", "EX-2", "2024/02/10", "장비비", "800000", "처리중"],
            &["R-2024-002", "배터리 소재", "최교수", "화학과", "EX-3", "2024-03-01", "재료비", "100", "완료"],
        ],
    );

    let report = service.import_single(&projects).await.unwrap();
    assert_eq!(report.counts.research_projects, 1);
    assert_eq!(report.counts.project_expenses, 2);
    assert_eq!(report.dropped.research_projects, 1);
    assert_eq!(report.dropped.project_expenses, 1);

    let snapshot = service.store().snapshot().unwrap();
    let project = &snapshot.projects[0];
    assert_eq!(project.department_id, snapshot.departments[0].id);
    assert!(snapshot.expenses.iter().all(|e| e.project_id == project.id));
    assert_eq!(snapshot.students.len(), 1);
}

const PUBLICATION_HEADER: &[&str] = &["논문ID", "게재일자", "단과대학", "학과", "논문제목", "제1저자", "과제연계여부"];

#[tokio::test]
async fn test_publication_date_alias() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();
    let publications = write_csv(
        dir.path(),
        "publication_list.csv",
        &[
            PUBLICATION_HEADER,
            &["PUB-001", "2024-03-15", "공과대학", "컴퓨터공학과", "그래프 신경망", "이영희", "Y"],
        ],
    );

    let report = service.import_single(&publications).await.unwrap();
    assert_eq!(report.counts.publications, 1);

    let snapshot = service.store().snapshot().unwrap();
    let publication = &snapshot.publications[0];
    assert_eq!(publication.publication_date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    assert_eq!(publication.primary_author.as_deref(), Some("이영희"));
    assert!(publication.is_project_linked);
}

#[tokio::test]
async fn test_publication_without_any_date_fails() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();

    let blank_date = write_csv(
        dir.path(),
        "publication_list.csv",
        &[
            PUBLICATION_HEADER,
            &["PUB-001", "", "공과대학", "컴퓨터공학과", "그래프 신경망", "이영희", ""],
        ],
    );
    let error = service.import_single(&blank_date).await.unwrap_err();
    assert!(matches!(error, ImportError::RequiredFieldMissing { ref field, .. } if field == "게재일"));

    let no_date_column = write_csv(
        dir.path(),
        "publication_list_v2.csv",
        &[
            &["논문ID", "단과대학", "학과", "논문제목"],
            &["PUB-001", "공과대학", "컴퓨터공학과", "그래프 신경망"],
        ],
    );
    let error = service.import_single(&no_date_column).await.unwrap_err();
    assert!(matches!(error, ImportError::MissingColumns { ref missing, .. } if missing == &vec!["게재일".to_string()]));

    assert!(service.store().snapshot().unwrap().colleges.is_empty());
}

#[tokio::test]
async fn test_batch_merges_roles_and_replaces_everything() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();
    let sources = vec![
        write_csv(
            dir.path(),
            "student_roster_1.csv",
            &[STUDENT_HEADER, &["2024001", "김민수", "공과대학", "컴퓨터공학과", "학사", "재학", "1", "", ""]],
        ),
        write_csv(
            dir.path(),
            "student_roster_2.csv",
            &[STUDENT_HEADER, &["2024002", "이서연", "자연과학대학", "화학과", "석사", "재학", "", "", ""]],
        ),
        write_csv(
            dir.path(),
            "department_kpi.csv",
            &[KPI_HEADER, &["자연과학대학", "화학과", "2024", "70", "9", ""]],
        ),
    ];

    let report = service.import_batch(&sources).await.unwrap();
    assert_eq!(report.mode, ReplaceMode::Full);
    assert_eq!(report.counts.students, 2);
    assert_eq!(report.counts.colleges, 2);
    assert_eq!(report.counts.departments, 2);
    assert_eq!(report.counts.department_kpis, 1);
}

#[tokio::test]
async fn test_batch_validates_the_merged_table() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();
    let header: &[&str] = &["학번", "이름", "단과대학", "학과", "과정구분"];
    let sources = vec![
        write_csv(dir.path(), "student_a.csv", &[header, &["1", "가", "공과대학", "컴퓨터공학과", "학사"]]),
        write_csv(dir.path(), "student_b.csv", &[header, &["2", "나", "공과대학", "컴퓨터공학과", "학사"]]),
    ];

    let error = service.import_batch(&sources).await.unwrap_err();
    match error {
        ImportError::MissingColumns { label, missing } => {
            assert_eq!(label, "student_roster");
            assert_eq!(missing, vec!["학적상태".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_workbook_sheets_of_one_role_are_concatenated() {
    let dir = tempfile::tempdir().unwrap();
    let service = service();
    let source = write_workbook(
        dir.path(),
        "학생명부.xlsx",
        &[
            ("학부생", &[STUDENT_HEADER, &["2024001", "김민수", "공과대학", "컴퓨터공학과", "학사", "재학", "1", "", ""]]),
            ("대학원생", &[STUDENT_HEADER, &["2024901", "정하늘", "공과대학", "전자공학과", "석사", "재학", "", "", ""]]),
            ("요약", &[&["구분", "인원"], &["학부", "1"]]),
        ],
    );

    // Sheet titles without a role keyword are ignored.
    let report = service.import_single(&source).await.unwrap();
    assert!(report.roles.is_empty());

    let source = write_workbook(
        dir.path(),
        "학생명부_v2.xlsx",
        &[
            ("학생_학부", &[STUDENT_HEADER, &["2024001", "김민수", "공과대학", "컴퓨터공학과", "학사", "재학", "1", "", ""]]),
            ("학생_대학원", &[STUDENT_HEADER, &["2024901", "정하늘", "공과대학", "전자공학과", "석사", "재학", "", "", ""]]),
        ],
    );
    let report = service.import_single(&source).await.unwrap();
    assert_eq!(report.counts.students, 2);
    assert_eq!(report.counts.departments, 2);
}

#[tokio::test]
async fn test_staged_upload_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = ImportConfig {
        staging_dir: Some(dir.path().to_path_buf()),
        ..ImportConfig::default()
    };
    let service = ImportService::new(MemoryStore::new(), config.clone());

    let body = "학번,이름,단과대학,학과,과정구분,학적상태\n2024001,김민수,공과대학,컴퓨터공학과,학사,재학\n";
    let staged = StagedUpload::stage("student_roster.csv", body.as_bytes(), &config).unwrap();
    let staged_path = staged.path().to_path_buf();

    let report = service.import_single(&staged.source().unwrap()).await.unwrap();
    assert_eq!(report.counts.students, 1);

    drop(staged);
    assert!(!staged_path.exists());
}
