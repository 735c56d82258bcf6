//! Pre-mutation checks on classified tables.

use crate::config::RequiredColumns;
use crate::error::{ImportError, ImportResult};
use crate::import::fields::alias_group;
use crate::import::normalize::normalize_column;
use crate::import::table::{RoleTables, Table};

pub struct SchemaValidator<'a> {
    required: &'a RequiredColumns,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(required: &'a RequiredColumns) -> Self {
        Self { required }
    }

    pub fn validate_not_empty(&self, table: &Table, label: &str) -> ImportResult<()> {
        if table.is_empty() {
            return Err(ImportError::EmptySource {
                label: label.to_string(),
            });
        }
        Ok(())
    }

    /// Every required column must be present, either under its own name or
    /// under one of its aliases.
    pub fn validate_columns(&self, table: &Table, required: &[String], label: &str) -> ImportResult<()> {
        let missing: Vec<String> = required
            .iter()
            .map(|column| normalize_column(column))
            .filter(|column| !satisfied(table, column))
            .collect();

        if !missing.is_empty() {
            return Err(ImportError::MissingColumns {
                label: label.to_string(),
                missing,
            });
        }
        Ok(())
    }

    /// Validate every present role's table against its configured column set.
    pub fn validate_tables(&self, tables: &RoleTables) -> ImportResult<()> {
        for (role, table) in tables.tables() {
            let label = role.table_label();
            self.validate_not_empty(table, label)?;
            self.validate_columns(table, self.required.for_role(role), label)?;
        }
        Ok(())
    }
}

fn satisfied(table: &Table, column: &str) -> bool {
    table.has_column(column) || alias_group(column).iter().any(|alias| table.has_column(alias))
}
