//! CLI argument definitions using clap
//!
//! Commands:
//! - whiteflag phone <text>
//! - whiteflag fields [--config <path>]
//! - whiteflag validate [--config <path>] [--input <path>]
//! - whiteflag export [--config <path>] --input <path> [--strict-columns]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// whiteflag - clean, assemble and validate white flag relief records
#[derive(Parser, Debug)]
#[command(name = "whiteflag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract normalized numbers and notes from a free-text phone field
    Phone {
        /// Phone field text
        text: String,
    },

    /// List external field names by section
    Fields {
        /// Path to configuration file (bundled defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate one document or an array of documents
    Validate {
        /// Path to configuration file (bundled defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Documents to validate (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Run the record pipeline and write the export files
    Export {
        /// Path to configuration file (bundled defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Source records, `[{"id": ..., "fields": {...}}]`
        #[arg(long)]
        input: PathBuf,

        /// Fail when the source lacks dictionary columns
        #[arg(long)]
        strict_columns: bool,

        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
