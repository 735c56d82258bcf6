pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod staging;
pub mod validation;

pub use self::config::*;
pub use error::*;
pub use import::{ImportService, SourceFile, SourceFormat};
pub use logging::*;
pub use staging::StagedUpload;
pub use validation::*;
