//! Logical fields and the column names each may appear under.
//!
//! Each [`Field`] lists its accepted column keys in priority order; the first
//! key with a non-blank value in a row wins. Builders read rows only through
//! [`RowFields`], which also owns value coercion.

use chrono::NaiveDate;

use crate::error::{ImportError, ImportResult};
use crate::import::table::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Name used in error reports.
    pub label: &'static str,
    /// Accepted normalized column names, highest priority first.
    pub keys: &'static [&'static str],
}

impl Field {
    pub const fn new(label: &'static str, keys: &'static [&'static str]) -> Self {
        Self { label, keys }
    }

    pub fn accepts(&self, column: &str) -> bool {
        self.keys.iter().any(|key| *key == column)
    }
}

pub const COLLEGE: Field = Field::new("단과대학", &["단과대학"]);
pub const DEPARTMENT: Field = Field::new("학과", &["학과", "소속학과"]);

pub const STUDENT_NUMBER: Field = Field::new("학번", &["학번"]);
pub const NAME: Field = Field::new("이름", &["이름"]);
pub const GRADE: Field = Field::new("학년", &["학년"]);
pub const PROGRAM_LEVEL: Field = Field::new("과정구분", &["과정구분"]);
pub const ACADEMIC_STATUS: Field = Field::new("학적상태", &["학적상태"]);
pub const GENDER: Field = Field::new("성별", &["성별"]);
pub const ADMISSION_YEAR: Field = Field::new("입학년도", &["입학년도"]);
pub const ADVISOR: Field = Field::new("지도교수", &["지도교수"]);
pub const EMAIL: Field = Field::new("이메일", &["이메일"]);

pub const EVALUATION_YEAR: Field = Field::new("평가년도", &["평가년도"]);
pub const EMPLOYMENT_RATE: Field = Field::new("졸업생취업률", &["졸업생취업률"]);
pub const FULL_TIME_FACULTY: Field = Field::new("전임교원수", &["전임교원수"]);
pub const VISITING_FACULTY: Field = Field::new("초빙교원수", &["초빙교원수"]);
pub const TECH_TRANSFER_INCOME: Field = Field::new("연간기술이전수입액", &["연간기술이전수입액"]);
pub const CONFERENCES: Field = Field::new("국제학술대회개최횟수", &["국제학술대회개최횟수"]);

pub const PUBLICATION_ID: Field = Field::new("논문ID", &["논문ID"]);
pub const PUBLICATION_DATE: Field = Field::new("게재일", &["게재일", "게재일자"]);
pub const TITLE: Field = Field::new("논문제목", &["논문제목"]);
pub const PRIMARY_AUTHOR: Field = Field::new("주저자", &["주저자", "제1저자"]);
pub const CONTRIBUTORS: Field = Field::new("참여저자목록", &["참여저자목록", "참여저자"]);
pub const JOURNAL_NAME: Field = Field::new("학술지명", &["학술지명"]);
pub const JOURNAL_RANK: Field = Field::new("학술지등급", &["학술지등급"]);
pub const IMPACT_FACTOR: Field = Field::new("IF", &["IF", "ImpactFactor"]);
pub const PROJECT_LINKED: Field = Field::new("과제연계여부", &["과제연계여부"]);

pub const PROJECT_NUMBER: Field = Field::new("과제번호", &["과제번호"]);
pub const PROJECT_NAME: Field = Field::new("과제명", &["과제명"]);
pub const PRINCIPAL_INVESTIGATOR: Field = Field::new("연구책임자", &["연구책임자"]);
pub const FUNDING_AGENCY: Field = Field::new("지원기관", &["지원기관"]);
pub const TOTAL_FUNDING: Field = Field::new("총연구비", &["총연구비"]);
pub const EXECUTION_ID: Field = Field::new("집행ID", &["집행ID"]);
pub const EXECUTION_DATE: Field = Field::new("집행일자", &["집행일자"]);
pub const EXPENSE_ITEM: Field = Field::new("집행항목", &["집행항목"]);
pub const EXPENSE_AMOUNT: Field = Field::new("집행금액", &["집행금액"]);
pub const EXPENSE_STATUS: Field = Field::new("상태", &["상태", "처리상태"]);
pub const NOTES: Field = Field::new("비고", &["비고"]);

const ALIASED: &[Field] = &[
    DEPARTMENT,
    PUBLICATION_DATE,
    PRIMARY_AUTHOR,
    CONTRIBUTORS,
    IMPACT_FACTOR,
    EXPENSE_STATUS,
];

/// Every column name interchangeable with `column`, itself included.
pub fn alias_group(column: &str) -> Vec<&'static str> {
    ALIASED
        .iter()
        .find(|field| field.accepts(column))
        .map(|field| field.keys.to_vec())
        .unwrap_or_default()
}

const YES_TOKENS: &[&str] = &["y", "yes", "true", "1", "o", "예", "네", "있음", "연계"];
const NO_TOKENS: &[&str] = &["n", "no", "false", "0", "x", "아니오", "아니요", "없음", "미연계"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

/// Typed access to one row on behalf of the table labelled `label`.
pub struct RowFields<'a> {
    row: &'a Row,
    label: &'a str,
}

impl<'a> RowFields<'a> {
    pub fn new(row: &'a Row, label: &'a str) -> Self {
        Self { row, label }
    }

    pub fn row(&self) -> &'a Row {
        self.row
    }

    /// First non-blank value among the field's keys, with the key it came from.
    fn lookup(&self, field: &Field) -> Option<(&'static str, &'a str)> {
        field
            .keys
            .iter()
            .find_map(|key| self.row.get(key).map(|value| (*key, value)))
    }

    fn missing(&self, field: &Field) -> ImportError {
        ImportError::RequiredFieldMissing {
            label: self.label.to_string(),
            source_name: self.row.source().to_string(),
            row: self.row.number(),
            field: field.label.to_string(),
        }
    }

    fn coercion(&self, column: &str, value: &str, expected: &str) -> ImportError {
        ImportError::RowCoercion {
            label: self.label.to_string(),
            source_name: self.row.source().to_string(),
            row: self.row.number(),
            column: column.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
    }

    pub fn text(&self, field: &Field) -> Option<String> {
        self.lookup(field).map(|(_, value)| value.to_string())
    }

    pub fn required_text(&self, field: &Field) -> ImportResult<String> {
        self.text(field).ok_or_else(|| self.missing(field))
    }

    pub fn integer<T: TryFrom<i64>>(&self, field: &Field) -> ImportResult<Option<T>> {
        self.lookup(field)
            .map(|(column, value)| {
                parse_integer(value)
                    .and_then(|n| T::try_from(n).ok())
                    .ok_or_else(|| self.coercion(column, value, "integer"))
            })
            .transpose()
    }

    pub fn required_integer<T: TryFrom<i64>>(&self, field: &Field) -> ImportResult<T> {
        self.integer(field)?.ok_or_else(|| self.missing(field))
    }

    pub fn float(&self, field: &Field) -> ImportResult<Option<f64>> {
        self.lookup(field)
            .map(|(column, value)| {
                parse_float(value).ok_or_else(|| self.coercion(column, value, "number"))
            })
            .transpose()
    }

    pub fn date(&self, field: &Field) -> ImportResult<Option<NaiveDate>> {
        self.lookup(field)
            .map(|(column, value)| {
                parse_date(value).ok_or_else(|| self.coercion(column, value, "date"))
            })
            .transpose()
    }

    pub fn required_date(&self, field: &Field) -> ImportResult<NaiveDate> {
        self.date(field)?.ok_or_else(|| self.missing(field))
    }

    /// Yes/no token; an absent value reads as `false`.
    pub fn flag(&self, field: &Field) -> ImportResult<bool> {
        match self.lookup(field) {
            None => Ok(false),
            Some((column, value)) => {
                parse_flag(value).ok_or_else(|| self.coercion(column, value, "yes/no flag"))
            }
        }
    }
}

fn strip_grouping(value: &str) -> String {
    value.trim().replace(',', "")
}

/// Integer text, tolerating thousands separators and an integral `.0` tail.
pub(crate) fn parse_integer(value: &str) -> Option<i64> {
    let cleaned = strip_grouping(value);
    if let Ok(n) = cleaned.parse::<i64>() {
        return Some(n);
    }

    let f = cleaned.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
}

pub(crate) fn parse_float(value: &str) -> Option<f64> {
    let cleaned = strip_grouping(value);
    let cleaned = cleaned.strip_suffix('%').unwrap_or(cleaned.as_str()).trim();
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Calendar date; a trailing time part is ignored.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let date_part = value
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    let token = value.trim().to_lowercase();
    if YES_TOKENS.iter().any(|yes| *yes == token) {
        Some(true)
    } else if NO_TOKENS.iter().any(|no| *no == token) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::table::tests::table;

    #[test]
    fn test_alias_priority_first_non_blank_wins() {
        let t = table(
            "publication_list.csv",
            &["게재일", "게재일자", "제1저자"],
            &[&["", "2024-03-15", "이영희"], &["2023-01-02", "2024-03-15", ""]],
        );

        let first = RowFields::new(&t.rows()[0], "publication_list");
        assert_eq!(
            first.required_date(&PUBLICATION_DATE).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert_eq!(first.text(&PRIMARY_AUTHOR).as_deref(), Some("이영희"));

        let second = RowFields::new(&t.rows()[1], "publication_list");
        assert_eq!(
            second.required_date(&PUBLICATION_DATE).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
        );
        assert_eq!(second.text(&PRIMARY_AUTHOR), None);
    }

    #[test]
    fn test_missing_required_field_names_row_and_field() {
        let t = table("p.csv", &["논문제목"], &[&["제목"]]);
        let error = RowFields::new(&t.rows()[0], "publication_list")
            .required_date(&PUBLICATION_DATE)
            .unwrap_err();

        match error {
            ImportError::RequiredFieldMissing { row, field, source_name, .. } => {
                assert_eq!(row, 2);
                assert_eq!(field, "게재일");
                assert_eq!(source_name, "p.csv");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_present_but_malformed_values_fail() {
        let t = table("k.csv", &["평가년도", "졸업생취업률"], &[&["이천이십사", "높음"]]);
        let fields = RowFields::new(&t.rows()[0], "department_kpi");

        let error = fields.integer::<i32>(&EVALUATION_YEAR).unwrap_err();
        assert_eq!(error.error_code(), "ROW_COERCION_ERROR");
        assert!(error.to_string().contains("이천이십사"));
        assert!(fields.float(&EMPLOYMENT_RATE).is_err());
    }

    #[test]
    fn test_out_of_range_integer_is_a_coercion_error() {
        let t = table("s.csv", &["학년"], &[&["70000"]]);
        let fields = RowFields::new(&t.rows()[0], "student_roster");
        assert!(fields.integer::<i16>(&GRADE).is_err());
        assert_eq!(fields.integer::<i32>(&GRADE).unwrap(), Some(70000));
    }

    #[test]
    fn test_flag_defaults_to_false() {
        let t = table("p.csv", &["과제연계여부"], &[&["Y"], &[""], &["미연계"], &["maybe"]]);
        let flags: Vec<_> = t
            .rows()
            .iter()
            .map(|row| RowFields::new(row, "publication_list").flag(&PROJECT_LINKED).ok())
            .collect();
        assert_eq!(flags, vec![Some(true), Some(false), Some(false), None]);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(parse_integer("1,500,000"), Some(1_500_000));
        assert_eq!(parse_integer("2024.0"), Some(2024));
        assert_eq!(parse_integer("3.5"), None);
        assert_eq!(parse_float("85.5%"), Some(85.5));
        assert_eq!(parse_float("1,234.5"), Some(1234.5));
        assert_eq!(parse_float("NaN"), None);
    }

    #[test]
    fn test_date_coercion() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_date("2024-03-15"), expected);
        assert_eq!(parse_date("2024/03/15"), expected);
        assert_eq!(parse_date("2024.03.15"), expected);
        assert_eq!(parse_date("20240315"), expected);
        assert_eq!(parse_date("2024-03-15 00:00:00"), expected);
        assert_eq!(parse_date("2024-03-15T09:30:00"), expected);
        assert_eq!(parse_date("15/03/2024"), None);
    }

    #[test]
    fn test_alias_groups() {
        assert_eq!(alias_group("게재일자"), vec!["게재일", "게재일자"]);
        assert_eq!(alias_group("소속학과"), vec!["학과", "소속학과"]);
        assert!(alias_group("학번").is_empty());
    }
}
