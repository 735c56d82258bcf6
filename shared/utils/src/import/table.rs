//! In-memory tables produced by the reader.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use academic_models::Role;

/// One data row, keyed by normalized column name.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    source: Arc<str>,
    number: usize,
    values: HashMap<String, String>,
}

impl Row {
    pub fn new(source: Arc<str>, number: usize, values: HashMap<String, String>) -> Self {
        Self { source, number, values }
    }

    /// Name of the file or sheet the row came from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Spreadsheet row number (the header is row 1).
    pub fn number(&self) -> usize {
        self.number
    }

    /// Trimmed cell value; blank cells and absent columns are `None`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn is_blank(&self) -> bool {
        self.values.values().all(|value| value.trim().is_empty())
    }
}

/// A parsed table with normalized headers.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|header| header == column)
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Concatenate `other` after this table. Headers become the union, in
    /// first-seen order.
    pub fn append(&mut self, other: Table) {
        for header in other.headers {
            if !self.has_column(&header) {
                self.headers.push(header);
            }
        }
        self.name = format!("{} + {}", self.name, other.name);
        self.rows.extend(other.rows);
    }
}

/// Classified tables, at most one per role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleTables {
    tables: BTreeMap<Role, Table>,
}

impl RoleTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table; a second table of the same role is appended to the first.
    pub fn insert(&mut self, role: Role, table: Table) {
        match self.tables.get_mut(&role) {
            Some(existing) => existing.append(table),
            None => {
                self.tables.insert(role, table);
            }
        }
    }

    /// Merge every table of `other` into this set, preserving input order.
    pub fn merge(&mut self, other: RoleTables) {
        for (role, table) in other.tables {
            self.insert(role, table);
        }
    }

    pub fn get(&self, role: Role) -> Option<&Table> {
        self.tables.get(&role)
    }

    /// Present roles in persistence order.
    pub fn roles(&self) -> Vec<Role> {
        self.tables.keys().copied().collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = (Role, &Table)> {
        self.tables.iter().map(|(role, table)| (*role, table))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
