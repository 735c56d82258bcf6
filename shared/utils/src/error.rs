use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportError {
    #[error("Cannot read source '{source_name}': {cause}")]
    SourceRead { source_name: String, cause: String },

    #[error("{label}: table has no data rows")]
    EmptySource { label: String },

    #[error("{label}: missing required columns: {}", .missing.join(", "))]
    MissingColumns { label: String, missing: Vec<String> },

    #[error("{label} ({source_name} row {row}): '{value}' in column {column} is not a valid {expected}")]
    RowCoercion {
        label: String,
        source_name: String,
        row: usize,
        column: String,
        value: String,
        expected: String,
    },

    #[error("{label} ({source_name} row {row}): required field {field} is blank")]
    RequiredFieldMissing {
        label: String,
        source_name: String,
        row: usize,
        field: String,
    },

    #[error("File type of '{file_name}' not allowed. Allowed types: {}", .allowed.join(", "))]
    UnsupportedFileType { file_name: String, allowed: Vec<String> },

    #[error("File '{file_name}' is {size} bytes, exceeding the maximum of {max} bytes")]
    FileTooLarge { file_name: String, size: u64, max: u64 },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ImportError {
    pub fn source_read(source_name: impl Into<String>, cause: impl ToString) -> Self {
        Self::SourceRead {
            source_name: source_name.into(),
            cause: cause.to_string(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SourceRead { .. } => "SOURCE_READ_ERROR",
            Self::EmptySource { .. } => "EMPTY_SOURCE",
            Self::MissingColumns { .. } => "MISSING_COLUMNS",
            Self::RowCoercion { .. } => "ROW_COERCION_ERROR",
            Self::RequiredFieldMissing { .. } => "REQUIRED_FIELD_MISSING",
            Self::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::SourceRead { .. } => 400,
            Self::EmptySource { .. } => 400,
            Self::MissingColumns { .. } => 400,
            Self::RowCoercion { .. } => 400,
            Self::RequiredFieldMissing { .. } => 400,
            Self::UnsupportedFileType { .. } => 400,
            Self::FileTooLarge { .. } => 413,
            Self::Storage { .. } => 500,
            Self::Configuration { .. } => 500,
        }
    }

    /// Whether the failure was caused by the uploaded data rather than the system.
    pub fn is_input_error(&self) -> bool {
        self.http_status_code() < 500
    }
}

pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Internal failure detail is only disclosed to privileged callers.
    pub fn for_caller(error: &ImportError, privileged: bool) -> Self {
        let disclose = privileged || error.is_input_error();
        let message = if disclose {
            error.to_string()
        } else {
            "An internal error occurred while processing the import".to_string()
        };

        Self {
            error: error.error_code().to_lowercase(),
            code: error.error_code().to_string(),
            message,
            details: disclose.then(|| serde_json::to_value(error).ok()).flatten(),
        }
    }
}

impl From<ImportError> for ErrorResponse {
    fn from(error: ImportError) -> Self {
        Self::for_caller(&error, false)
    }
}

// Storage layer errors carry their context chain.
impl From<anyhow::Error> for ImportError {
    fn from(error: anyhow::Error) -> Self {
        Self::storage(format!("{:#}", error))
    }
}

impl From<config::ConfigError> for ImportError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_every_column() {
        let error = ImportError::MissingColumns {
            label: "student_roster".to_string(),
            missing: vec!["학번".to_string(), "이름".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "student_roster: missing required columns: 학번, 이름"
        );
        assert_eq!(error.error_code(), "MISSING_COLUMNS");
        assert_eq!(error.http_status_code(), 400);
    }

    #[test]
    fn test_storage_details_hidden_from_unprivileged_callers() {
        let error = ImportError::storage("duplicate key value violates unique constraint");

        let public = ErrorResponse::for_caller(&error, false);
        assert_eq!(public.code, "STORAGE_ERROR");
        assert!(public.details.is_none());
        assert!(!public.message.contains("duplicate key"));

        let admin = ErrorResponse::for_caller(&error, true);
        assert!(admin.message.contains("duplicate key"));
        assert_eq!(admin.details.unwrap()["kind"], "storage");
    }

    #[test]
    fn test_input_errors_always_carry_details() {
        let error = ImportError::EmptySource {
            label: "department_kpi".to_string(),
        };
        let response = ErrorResponse::for_caller(&error, false);
        assert_eq!(response.details.unwrap()["label"], "department_kpi");
    }

    #[test]
    fn test_anyhow_context_chain_is_preserved() {
        let error: ImportError = anyhow::anyhow!("connection reset")
            .context("Failed to bulk insert students")
            .into();
        assert_eq!(
            error.to_string(),
            "Storage error: Failed to bulk insert students: connection reset"
        );
    }
}
