use std::{env, process};

use bench::{
    app::{
        CommandOutput, DiffParams, DryRunParams, LintParams, QueryParams, SchemaParams,
        effective_project, qualify_dataset, require_project, run_diff, run_dryrun, run_lint,
        run_query, run_schema
    },
    auth::Credentials,
    bigquery::{BigQueryClient, TableRef},
    cli::{Cli, Commands},
    config::Config,
    error::{AppResult, error_message},
    query::{read_piped_stdin, resolve_sql}
};
use clap::Parser;
use tokio::main;
use tracing_subscriber::EnvFilter;

#[main]
async fn main() {
    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", error_message(&e));
            process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace"
    };
    let filter = EnvFilter::try_from_env("BENCH_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn discover_credentials(config: &Config) -> AppResult<Credentials> {
    Credentials::discover(&config.bigquery, |key| env::var(key).ok())
}

/// Client billed to the resolved project
fn connect(config: &Config, project_flag: Option<&str>) -> AppResult<BigQueryClient> {
    let credentials = discover_credentials(config)?;
    let project = require_project(effective_project(project_flag, config, &credentials))?;
    BigQueryClient::new(config, project, credentials)
}

/// Client for table lookups; without a configured project the first
/// table's project is billed
fn connect_for_tables(
    config: &Config,
    project_flag: Option<&str>,
    tables: &[&str]
) -> AppResult<(BigQueryClient, Vec<TableRef>)> {
    let credentials = discover_credentials(config)?;
    let project = effective_project(project_flag, config, &credentials);
    let refs = tables
        .iter()
        .map(|id| TableRef::parse(id, project.as_deref()))
        .collect::<AppResult<Vec<_>>>()?;
    let billing = match (project, refs.first()) {
        (Some(project), _) => project,
        (None, Some(first)) => first.project.clone(),
        (None, None) => require_project(None)?
    };
    let client = BigQueryClient::new(config, billing, credentials)?;
    Ok((client, refs))
}

fn emit(output: CommandOutput) -> i32 {
    for line in &output.stdout {
        println!("{}", line);
    }
    for line in &output.stderr {
        eprintln!("{}", line);
    }
    output.exit_code
}

async fn run() -> AppResult<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;
    let project_flag = cli.project.as_deref();

    let output = match cli.command {
        Commands::Query {
            input,
            limit,
            format
        } => {
            let sql = resolve_sql(input.sql.as_deref(), input.file.as_deref(), read_piped_stdin)?;
            let client = connect(&config, project_flag)?;
            let params = QueryParams {
                sql,
                dataset: qualify_dataset(input.dataset, &config, Some(client.project())),
                limit,
                format,
                no_color: cli.no_color
            };
            run_query(&client, params, &config).await?
        }
        Commands::Dryrun {
            input,
            format,
            no_local_check
        } => {
            let sql = resolve_sql(input.sql.as_deref(), input.file.as_deref(), read_piped_stdin)?;
            let known_project = project_flag
                .map(String::from)
                .or_else(|| config.bigquery.project.clone());
            let params = DryRunParams {
                sql,
                dataset: qualify_dataset(input.dataset, &config, known_project.as_deref()),
                format,
                local_check: config.dryrun.local_syntax_check && !no_local_check,
                no_color: cli.no_color
            };
            run_dryrun(params, &config, || connect(&config, project_flag)).await?
        }
        Commands::Schema {
            table,
            format,
            detailed,
            validate
        } => {
            let (client, mut refs) = connect_for_tables(&config, project_flag, &[table.as_str()])?;
            let params = SchemaParams {
                table: refs.remove(0),
                format,
                detailed,
                validate,
                no_color: cli.no_color
            };
            run_schema(&client, params).await?
        }
        Commands::Diff {
            table1,
            table2,
            format,
            nested,
            exit_code
        } => {
            let (client, mut refs) =
                connect_for_tables(&config, project_flag, &[table1.as_str(), table2.as_str()])?;
            let second = refs.remove(1);
            let first = refs.remove(0);
            let params = DiffParams {
                table1: first,
                table2: second,
                format,
                nested,
                fail_on_diff: exit_code,
                no_color: cli.no_color
            };
            run_diff(&client, params).await?
        }
        Commands::Lint {
            files,
            fix,
            output,
            format
        } => {
            let params = LintParams {
                files,
                fix,
                output,
                format,
                no_color: cli.no_color
            };
            run_lint(params, &config, read_piped_stdin)?
        }
    };

    Ok(emit(output))
}
