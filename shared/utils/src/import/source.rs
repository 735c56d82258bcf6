//! Tabular source reader: turns a CSV file or workbook into classified tables.

use calamine::{open_workbook_auto, DataType, Range, Reader};
use chrono::{Days, NaiveDate};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RoleKeywords;
use crate::error::{ImportError, ImportResult};
use crate::import::normalize::normalize_column;
use crate::import::table::{RoleTables, Row, Table};
use crate::validation::file_extension;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// One table, classified by file name.
    Csv,
    /// One table per sheet, classified by sheet title.
    Workbook,
}

impl SourceFormat {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        match file_extension(file_name)?.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xls" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// A file to import together with the name it was uploaded under.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    path: PathBuf,
    file_name: String,
    format: SourceFormat,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, file_name: &str) -> ImportResult<Self> {
        let format = SourceFormat::from_file_name(file_name).ok_or_else(|| {
            ImportError::UnsupportedFileType {
                file_name: file_name.to_string(),
                allowed: vec![".csv".to_string(), ".xlsx".to_string(), ".xls".to_string()],
            }
        })?;

        Ok(Self {
            path: path.into(),
            file_name: file_name.to_string(),
            format,
        })
    }

    /// Source whose declared name is the path's own file name.
    pub fn from_path(path: impl Into<PathBuf>) -> ImportResult<Self> {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(path, &file_name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }
}

pub struct SourceReader<'a> {
    keywords: &'a RoleKeywords,
}

impl<'a> SourceReader<'a> {
    pub fn new(keywords: &'a RoleKeywords) -> Self {
        Self { keywords }
    }

    /// Parse `source` and keep the tables whose name classifies into a role.
    pub fn read(&self, source: &SourceFile) -> ImportResult<RoleTables> {
        let mut tables = RoleTables::new();

        match source.format() {
            SourceFormat::Csv => {
                let table = read_csv(source)?;
                self.classify_into(&mut tables, source.file_name(), table);
            }
            SourceFormat::Workbook => {
                let mut workbook = open_workbook_auto(source.path())
                    .map_err(|e| ImportError::source_read(source.file_name(), e))?;

                for sheet_name in workbook.sheet_names().to_vec() {
                    let range = match workbook.worksheet_range(&sheet_name) {
                        Some(Ok(range)) => range,
                        Some(Err(e)) => {
                            return Err(ImportError::source_read(
                                source.file_name(),
                                format!("sheet '{}': {}", sheet_name, e),
                            ))
                        }
                        None => continue,
                    };
                    let table = sheet_to_table(&sheet_name, &range);
                    self.classify_into(&mut tables, &sheet_name, table);
                }
            }
        }

        for (role, table) in tables.tables() {
            tracing::info!(
                file_name = source.file_name(),
                role = %role,
                table = table.name(),
                rows = table.len(),
                "Read table"
            );
        }

        Ok(tables)
    }

    fn classify_into(&self, tables: &mut RoleTables, name: &str, table: Table) {
        match self.keywords.classify(name) {
            Some(role) => tables.insert(role, table),
            None => tracing::debug!(table = name, "Ignoring unclassified table"),
        }
    }
}

fn read_csv(source: &SourceFile) -> ImportResult<Table> {
    let bytes = std::fs::read(source.path())
        .map_err(|e| ImportError::source_read(source.file_name(), e))?;
    let data = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes[..]);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let raw_headers = reader
        .headers()
        .map_err(|e| ImportError::source_read(source.file_name(), e))?
        .clone();
    let columns = column_keys(source.file_name(), raw_headers.iter());

    let name: Arc<str> = Arc::from(source.file_name());
    let mut table = Table::new(source.file_name(), kept_headers(&columns));

    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ImportError::source_read(source.file_name(), e))?;
        let values = columns
            .iter()
            .zip(record.iter())
            .filter_map(|(key, value)| Some((key.clone()?, value.to_string())))
            .collect();
        push_unless_blank(&mut table, Row::new(name.clone(), index + 2, values));
    }

    Ok(table)
}

fn sheet_to_table(sheet_name: &str, range: &Range<DataType>) -> Table {
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = range.rows();

    let columns = rows
        .next()
        .map(|cells| {
            let raw: Vec<String> = cells.iter().map(cell_to_string).collect();
            column_keys(sheet_name, raw.iter().map(String::as_str))
        })
        .unwrap_or_default();

    let name: Arc<str> = Arc::from(sheet_name);
    let mut table = Table::new(sheet_name, kept_headers(&columns));

    for (index, cells) in rows.enumerate() {
        let values = columns
            .iter()
            .zip(cells.iter())
            .filter_map(|(key, cell)| Some((key.clone()?, cell_to_string(cell))))
            .collect();
        push_unless_blank(
            &mut table,
            Row::new(name.clone(), first_row + index + 2, values),
        );
    }

    table
}

/// Normalized key per source column. Blank headers and any column whose key
/// repeats an earlier one map to `None`; the first occurrence wins.
fn column_keys<'h>(table: &str, raw_headers: impl Iterator<Item = &'h str>) -> Vec<Option<String>> {
    let mut seen = HashSet::new();

    raw_headers
        .map(|raw| {
            let key = normalize_column(raw);
            if key.is_empty() {
                return None;
            }
            if seen.insert(key.clone()) {
                Some(key)
            } else {
                tracing::warn!(table, header = raw, column = %key, "Skipping duplicate column");
                None
            }
        })
        .collect()
}

fn kept_headers(columns: &[Option<String>]) -> Vec<String> {
    columns.iter().flatten().cloned().collect()
}

fn push_unless_blank(table: &mut Table, row: Row) {
    if !row.is_blank() {
        table.push_row(row);
    }
}

/// Render a workbook cell the way it would read in a CSV export.
pub(crate) fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::Empty | DataType::Error(_) => String::new(),
        DataType::String(s) => s.trim().to_string(),
        DataType::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(serial) => excel_serial_to_string(*serial),
        other => other.to_string(),
    }
}

/// Excel serial day number (1900 date system) as `YYYY-MM-DD`, with the time
/// appended when the serial has a fractional part.
fn excel_serial_to_string(serial: f64) -> String {
    let mut days = serial.trunc();
    let mut seconds = ((serial - days) * 86_400.0).round() as u32;
    if seconds >= 86_400 {
        days += 1.0;
        seconds = 0;
    }

    let date = NaiveDate::from_ymd_opt(1899, 12, 30)
        .filter(|_| days >= 0.0)
        .and_then(|epoch| epoch.checked_add_days(Days::new(days as u64)));

    match date {
        Some(date) if seconds == 0 => date.format("%Y-%m-%d").to_string(),
        Some(date) => match date.and_hms_opt(seconds / 3600, (seconds % 3600) / 60, seconds % 60) {
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => date.format("%Y-%m-%d").to_string(),
        },
        None => serial.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academic_models::Role;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_file_name("a.CSV"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_file_name("a.xlsx"), Some(SourceFormat::Workbook));
        assert_eq!(SourceFormat::from_file_name("a.xls"), Some(SourceFormat::Workbook));
        assert_eq!(SourceFormat::from_file_name("a.json"), None);
        assert!(SourceFile::new("/tmp/x", "a.json").is_err());
    }

    #[test]
    fn test_csv_classified_by_file_name_with_normalized_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "department_kpi.csv",
            "\u{feff}단과대학,학과,평가년도,연간기술이전수입액 (억)\n공과대학,컴퓨터공학과,2024,1.5\n,,,\n",
        );

        let keywords = RoleKeywords::default();
        let tables = SourceReader::new(&keywords)
            .read(&SourceFile::from_path(&path).unwrap())
            .unwrap();

        assert_eq!(tables.roles(), vec![Role::Kpis]);
        let table = tables.get(Role::Kpis).unwrap();
        assert_eq!(table.headers(), &["단과대학", "학과", "평가년도", "연간기술이전수입액"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].get("연간기술이전수입액"), Some("1.5"));
        assert_eq!(table.rows()[0].number(), 2);
    }

    #[test]
    fn test_temp_path_is_not_used_for_classification() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "upload-1234.csv", "학번,이름\n1,가\n");

        let keywords = RoleKeywords::default();
        let source = SourceFile::new(&path, "student_roster.csv").unwrap();
        let tables = SourceReader::new(&keywords).read(&source).unwrap();
        assert_eq!(tables.roles(), vec![Role::Students]);
    }

    #[test]
    fn test_unclassified_csv_yields_no_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "budget.csv", "a,b\n1,2\n");

        let keywords = RoleKeywords::default();
        let tables = SourceReader::new(&keywords)
            .read(&SourceFile::from_path(&path).unwrap())
            .unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_corrupt_workbook_is_a_source_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "통합.xlsx", "this is not a zip archive");

        let keywords = RoleKeywords::default();
        let error = SourceReader::new(&keywords)
            .read(&SourceFile::from_path(&path).unwrap())
            .unwrap_err();
        assert_eq!(error.error_code(), "SOURCE_READ_ERROR");
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell_to_string(&DataType::Float(2024.0)), "2024");
        assert_eq!(cell_to_string(&DataType::Float(85.5)), "85.5");
        assert_eq!(cell_to_string(&DataType::String("  김민수 ".to_string())), "김민수");
        assert_eq!(cell_to_string(&DataType::Bool(true)), "true");
        assert_eq!(cell_to_string(&DataType::Empty), "");
        assert_eq!(cell_to_string(&DataType::DateTime(45366.0)), "2024-03-15");
        assert_eq!(cell_to_string(&DataType::DateTime(45366.5)), "2024-03-15 12:00:00");
    }

    #[test]
    fn test_serial_rounding_to_midnight_rolls_over() {
        assert_eq!(excel_serial_to_string(45366.999_999_9), "2024-03-16");
    }

    #[test]
    fn test_csv_duplicate_normalized_header_keeps_first_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "student_roster.csv",
            "학번,이름,단과대학,학과,과정구분,학적상태,학과 (영문)\n\
             1,가,공과대학,컴퓨터공학과,학사,재학,Computer Science\n",
        );

        let keywords = RoleKeywords::default();
        let tables = SourceReader::new(&keywords)
            .read(&SourceFile::from_path(&path).unwrap())
            .unwrap();

        let table = tables.get(Role::Students).unwrap();
        assert_eq!(
            table.headers(),
            &["학번", "이름", "단과대학", "학과", "과정구분", "학적상태"]
        );
        assert_eq!(table.rows()[0].get("학과"), Some("컴퓨터공학과"));
    }

    #[test]
    fn test_sheet_duplicate_normalized_header_keeps_first_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("통합.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("학생").unwrap();
        let grid = [
            ["학번", "단과대학", "학과", "학과 (영문)"],
            ["2020001", "공과대학", "기계공학과", "Mechanical Engineering"],
        ];
        for (r, row) in grid.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                sheet.write_string(r as u32, c as u16, *cell).unwrap();
            }
        }
        workbook.save(&path).unwrap();

        let keywords = RoleKeywords::default();
        let tables = SourceReader::new(&keywords)
            .read(&SourceFile::from_path(&path).unwrap())
            .unwrap();

        let table = tables.get(Role::Students).unwrap();
        assert_eq!(table.headers(), &["학번", "단과대학", "학과"]);
        assert_eq!(table.rows()[0].get("학과"), Some("기계공학과"));
        assert_eq!(table.rows()[0].number(), 2);
    }
}
