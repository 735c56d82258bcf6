//! # Academic Dashboard Domain Models
//!
//! Records for the normalized academic organization store and the vocabulary
//! used by the spreadsheet import pipeline.
//!
//! ## Key Models
//!
//! - **College / Department**: organizational units; departments are unique per college
//! - **Student**: roster entry keyed by student number
//! - **DepartmentKpi**: yearly performance indicators per department
//! - **Publication**: papers attributed to a department
//! - **ResearchProject / ProjectExpense**: funded projects and their execution ledger
//!
//! Each persisted record has a matching `New*` insert payload without the
//! server-assigned `id` and `created_at`.

pub mod organization;
pub mod student;
pub mod kpi;
pub mod publication;
pub mod project;
pub mod import;

pub use organization::*;
pub use student::*;
pub use kpi::*;
pub use publication::*;
pub use project::*;
pub use import::*;
