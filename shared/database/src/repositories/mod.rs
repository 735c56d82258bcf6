//! Repository module for database operations
//!
//! Per-entity repositories borrow a connection, so the same code runs against
//! a pooled connection or inside an import transaction.

pub mod organization;
pub mod student;
pub mod kpi;
pub mod publication;
pub mod project;
pub mod table;

pub use organization::{CollegeRepository, DepartmentRepository};
pub use student::StudentRepository;
pub use kpi::DepartmentKpiRepository;
pub use publication::PublicationRepository;
pub use project::{ProjectExpenseRepository, ResearchProjectRepository};
pub use table::TableRepository;

/// Rows per multi-row INSERT; keeps the widest table under the 65535 bind limit.
pub const BULK_CHUNK_ROWS: usize = 1000;
