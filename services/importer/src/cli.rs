//! Argument parsing for the import command.

use clap::Parser;
use std::path::PathBuf;

/// Load academic spreadsheets into the dashboard database.
#[derive(Parser, Debug)]
#[command(name = "academic-import")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_required = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Run against an empty in-memory store instead of Postgres.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Include internal error details in failure output.
    #[arg(long, global = true)]
    pub privileged: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Import one CSV file or workbook.
    Single {
        /// File to import (.csv, .xlsx, .xls).
        file: PathBuf,

        /// Replace every table even for a CSV file.
        #[arg(long)]
        full: bool,
    },

    /// Import several files as one complete refresh.
    Batch {
        /// Files to import; tables of the same role are merged.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Commands {
    pub fn files(&self) -> Vec<&PathBuf> {
        match self {
            Self::Single { file, .. } => vec![file],
            Self::Batch { files } => files.iter().collect(),
        }
    }
}
