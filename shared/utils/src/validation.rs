use std::path::Path;
use validator::{Validate, ValidationErrors};

use crate::error::{ImportError, ImportResult};

pub fn validate_model<T: Validate>(model: &T) -> ImportResult<()> {
    model
        .validate()
        .map_err(|errors| ImportError::configuration(format_validation_errors(&errors)))
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match &error.message {
                Some(message) => message.to_string(),
                None => match error.code.as_ref() {
                    "length" => format!("Length validation failed for field '{}'", field),
                    "range" => format!("Value out of range for field '{}'", field),
                    "required" => format!("Field '{}' is required", field),
                    code => format!("Validation failed for field '{}': {}", field, code),
                },
            };
            messages.push(message);
        }
    }

    messages.sort();
    messages.join(", ")
}

/// Lowercased extension of `file_name`, without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

pub fn validate_file_type(file_name: &str, allowed_extensions: &[String]) -> ImportResult<()> {
    let allowed = file_extension(file_name)
        .map(|ext| allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false);

    if !allowed {
        return Err(ImportError::UnsupportedFileType {
            file_name: file_name.to_string(),
            allowed: allowed_extensions.iter().map(|ext| format!(".{}", ext)).collect(),
        });
    }

    Ok(())
}

pub fn validate_file_size(file_name: &str, size: u64, max_size: u64) -> ImportResult<()> {
    if size > max_size {
        return Err(ImportError::FileTooLarge {
            file_name: file_name.to_string(),
            size,
            max: max_size,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;

    fn allowed() -> Vec<String> {
        vec!["csv".to_string(), "xlsx".to_string(), "xls".to_string()]
    }

    #[test]
    fn test_validate_file_type() {
        assert!(validate_file_type("student_roster.csv", &allowed()).is_ok());
        assert!(validate_file_type("통합데이터.XLSX", &allowed()).is_ok());
        assert!(validate_file_type("legacy.xls", &allowed()).is_ok());

        let error = validate_file_type("notes.pdf", &allowed()).unwrap_err();
        assert_eq!(error.error_code(), "UNSUPPORTED_FILE_TYPE");
        assert!(error.to_string().contains(".csv, .xlsx, .xls"));

        assert!(validate_file_type("no_extension", &allowed()).is_err());
    }

    #[test]
    fn test_validate_file_size() {
        let max = 10 * 1024 * 1024;
        assert!(validate_file_size("a.csv", max, max).is_ok());

        let error = validate_file_size("a.csv", max + 1, max).unwrap_err();
        assert_eq!(error.http_status_code(), 413);
    }

    #[test]
    fn test_validate_model_reports_custom_messages() {
        let config = ImportConfig {
            max_file_size: 0,
            ..ImportConfig::default()
        };
        let error = validate_model(&config).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Configuration error: max_file_size must be positive"
        );
    }
}
