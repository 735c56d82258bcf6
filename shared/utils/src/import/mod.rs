//! The import and normalization pipeline.
//!
//! [`ImportService`] is the entry point: it reads sources into classified
//! tables, validates them, clears existing data according to the deletion
//! plan, resolves department references, and persists entities in one store
//! session.

pub mod builders;
pub mod deletion;
pub mod fields;
pub mod normalize;
pub mod resolver;
pub mod schema;
pub mod service;
pub mod source;
pub mod table;

pub use builders::{BuildOutcome, ExpenseDraft, ProjectDraft, ProjectPlan};
pub use deletion::DeletionPlan;
pub use normalize::normalize_column;
pub use resolver::{DepartmentKey, ReferenceMap};
pub use schema::SchemaValidator;
pub use service::ImportService;
pub use source::{SourceFile, SourceFormat, SourceReader};
pub use table::{RoleTables, Row, Table};
