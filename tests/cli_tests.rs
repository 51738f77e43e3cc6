use std::path::PathBuf;

use bench::cli::{Cli, Commands, DiffFormat, LintFormat, QueryFormat};
use clap::Parser;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("bench").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_query_defaults() {
    let cli = parse(&["query", "SELECT 1"]);
    match cli.command {
        Commands::Query {
            input,
            limit,
            format
        } => {
            assert_eq!(input.sql.as_deref(), Some("SELECT 1"));
            assert!(input.file.is_none());
            assert_eq!(limit, 10);
            assert!(matches!(format, QueryFormat::Table));
        }
        other => panic!("unexpected command: {:?}", other)
    }
}

#[test]
fn test_global_options_after_subcommand() {
    let cli = parse(&["dryrun", "-f", "q.sql", "-p", "proj", "-vv", "--no-color"]);
    assert_eq!(cli.project.as_deref(), Some("proj"));
    assert_eq!(cli.verbose, 2);
    assert!(cli.no_color);
    match cli.command {
        Commands::Dryrun {
            input,
            no_local_check,
            ..
        } => {
            assert_eq!(input.file, Some(PathBuf::from("q.sql")));
            assert!(!no_local_check);
        }
        other => panic!("unexpected command: {:?}", other)
    }
}

#[test]
fn test_diff_flags() {
    let cli = parse(&["diff", "ds.a", "ds.b", "--format", "text", "--nested", "--exit-code"]);
    match cli.command {
        Commands::Diff {
            table1,
            table2,
            format,
            nested,
            exit_code
        } => {
            assert_eq!((table1.as_str(), table2.as_str()), ("ds.a", "ds.b"));
            assert!(matches!(format, DiffFormat::Text));
            assert!(nested && exit_code);
        }
        other => panic!("unexpected command: {:?}", other)
    }
}

#[test]
fn test_lint_files_and_fix() {
    let cli = parse(&["lint", "a.sql", "b.sql", "--fix", "--format", "yaml"]);
    match cli.command {
        Commands::Lint {
            files,
            fix,
            output,
            format
        } => {
            assert_eq!(files.len(), 2);
            assert!(fix);
            assert!(output.is_none());
            assert!(matches!(format, LintFormat::Yaml));
        }
        other => panic!("unexpected command: {:?}", other)
    }
}

#[test]
fn test_lint_output_requires_fix() {
    assert!(Cli::try_parse_from(["bench", "lint", "a.sql", "-o", "out.sql"]).is_err());
}

#[test]
fn test_invalid_format_rejected() {
    assert!(Cli::try_parse_from(["bench", "query", "SELECT 1", "--format", "xml"]).is_err());
}

#[test]
fn test_schema_requires_table() {
    assert!(Cli::try_parse_from(["bench", "schema"]).is_err());
}
