use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// bench - a minimal BigQuery utility toolkit
#[derive(Parser, Debug)]
#[command(name = "bench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// GCP project ID (defaults to config, environment or credentials)
    #[arg(short, long, global = true, env = "BENCH_PROJECT")]
    pub project: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands
}

/// Where the SQL for `query` and `dryrun` comes from
#[derive(Args, Debug, Clone)]
pub struct SqlInput {
    /// SQL text (omit to use --file or stdin)
    pub sql: Option<String>,

    /// Read SQL from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Default dataset for unqualified table names
    #[arg(short, long)]
    pub dataset: Option<String>
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a query and display the results
    Query {
        #[command(flatten)]
        input: SqlInput,

        /// Maximum number of rows to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: QueryFormat
    },

    /// Validate a query and estimate its cost without running it
    Dryrun {
        #[command(flatten)]
        input: SqlInput,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: DryRunFormat,

        /// Never fall back to the local syntax check
        #[arg(long)]
        no_local_check: bool
    },

    /// Show the schema of a table
    Schema {
        /// Table ID: dataset.table or project.dataset.table
        table: String,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: SchemaFormat,

        /// Include descriptions and nested fields
        #[arg(long)]
        detailed: bool,

        /// Validate a query-result JSON file against the schema
        #[arg(long, value_name = "RESULT_JSON")]
        validate: Option<PathBuf>
    },

    /// Compare the schemas of two tables
    Diff {
        /// First table ID
        table1: String,

        /// Second table ID
        table2: String,

        /// Output format
        #[arg(long, value_enum, default_value = "rich")]
        format: DiffFormat,

        /// Compare nested RECORD fields by path
        #[arg(long)]
        nested: bool,

        /// Exit with status 1 when the schemas differ
        #[arg(long)]
        exit_code: bool
    },

    /// Lint SQL files for style and safety issues
    Lint {
        /// SQL files to lint (omit or use - for stdin)
        files: Vec<PathBuf>,

        /// Apply automatic fixes and reformat
        #[arg(long)]
        fix: bool,

        /// Write fixed SQL here instead of in place
        #[arg(short, long, requires = "fix")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: LintFormat
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum QueryFormat {
    Table,
    Json,
    Csv
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DryRunFormat {
    Table,
    Json
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemaFormat {
    Table,
    Json,
    Yaml
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DiffFormat {
    Rich,
    Text,
    Json
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LintFormat {
    Text,
    Json,
    Yaml
}
