//! REST client for the BigQuery v2 API.
//!
//! # Retry Behavior
//!
//! Requests are retried with exponential backoff on transient errors:
//! - Connection failures and timeouts
//! - Rate limiting (429)
//! - Server errors (500, 502, 503, 504)
//!
//! A 401 drops the cached access token and retries once with a fresh one.

use std::{fmt, time::Duration};

use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use super::{
    DryRunOutcome, QueryResults, QuerySpec, TableRef, Warehouse,
    wire::{
        DatasetReference, ErrorResponse, FormatOptions, JobReference, QueryRequest,
        QueryResponse, Table, decode_rows, parse_count, parse_millis
    }
};
use crate::{
    auth::{Credentials, TokenSource},
    config::{Config, RetryConfig},
    error::{AppError, AppResult, bigquery_api_error, config_error, error_message, http_error},
    schema::TableMetadata
};

/// Server-side wait for `jobs.query` and `getQueryResults`
const SERVER_WAIT_MS: u64 = 10_000;

/// BigQuery client bound to one billing project.
pub struct BigQueryClient {
    http:          reqwest::Client,
    endpoint:      String,
    project:       String,
    location:      Option<String>,
    tokens:        TokenSource,
    retry:         RetryConfig,
    poll_interval: Duration
}

/// Failure of a single REST call, kept structured so callers can react to
/// the status code before it becomes an [`AppError`].
#[derive(Debug)]
enum RequestError {
    Api { status: StatusCode, message: String },
    Transport(reqwest::Error),
    Other(AppError)
}

impl RequestError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Api {
                status, ..
            } => matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504),
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Other(_) => false
        }
    }

    fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api {
                status,
                message
            } => write!(f, "{} ({})", message, status),
            Self::Transport(e) => write!(f, "{}", e),
            Self::Other(e) => write!(f, "{}", error_message(e))
        }
    }
}

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Api {
                message, ..
            } => bigquery_api_error(message),
            RequestError::Transport(e) => http_error(e),
            RequestError::Other(e) => e
        }
    }
}

impl BigQueryClient {
    /// Discover credentials from the environment and build a client
    pub fn from_config(config: &Config, project: impl Into<String>) -> AppResult<Self> {
        let credentials =
            Credentials::discover(&config.bigquery, |key| std::env::var(key).ok())?;
        Self::new(config, project, credentials)
    }

    pub fn new(
        config: &Config,
        project: impl Into<String>,
        credentials: Credentials
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.bigquery.timeout_secs))
            .user_agent(concat!("bench/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(http_error)?;
        let tokens = TokenSource::new(credentials, http.clone(), &config.bigquery.token_uri);
        Ok(Self {
            http,
            endpoint: config.bigquery.endpoint.trim_end_matches('/').to_string(),
            project: project.into(),
            location: config.bigquery.location.clone(),
            tokens,
            retry: config.retry.clone(),
            poll_interval: Duration::from_millis(config.bigquery.poll_interval_ms)
        })
    }

    /// Billing project jobs run in
    pub fn project(&self) -> &str {
        &self.project
    }

    fn query_request(&self, spec: &QuerySpec, dry_run: bool) -> QueryRequest {
        let default_dataset = spec.default_dataset.as_deref().map(|dataset| {
            match dataset.split_once('.') {
                Some((project, dataset)) => DatasetReference {
                    project_id: project.to_string(),
                    dataset_id: dataset.to_string()
                },
                None => DatasetReference {
                    project_id: self.project.clone(),
                    dataset_id: dataset.to_string()
                }
            }
        });
        QueryRequest {
            query: spec.sql.clone(),
            use_legacy_sql: false,
            dry_run,
            use_query_cache: !dry_run,
            max_results: if dry_run { None } else { spec.max_results },
            timeout_ms: Some(SERVER_WAIT_MS),
            default_dataset,
            location: self.location.clone(),
            format_options: FormatOptions {
                use_int64_timestamp: true
            }
        }
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, RequestError> {
        let raw = format!("{}/{}", self.endpoint, path);
        Url::parse_with_params(&raw, params).map_err(|e| {
            RequestError::Other(config_error(format!(
                "Invalid BigQuery endpoint '{}': {}",
                self.endpoint, e
            )))
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&QueryRequest>
    ) -> Result<T, RequestError> {
        let mut last_error = None;
        let mut delay = self.retry.initial_delay_ms;
        let mut reauthenticated = false;
        for attempt in 0..=self.retry.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = self.retry.max_retries + 1,
                    delay_ms = delay,
                    "retrying BigQuery request"
                );
                sleep(Duration::from_millis(delay)).await;
                delay = ((delay as f64 * self.retry.backoff_factor) as u64)
                    .min(self.retry.max_delay_ms);
            }
            match self.send_once(method.clone(), url.clone(), body).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_unauthorized() && !reauthenticated => {
                    tracing::info!("access token rejected, refreshing");
                    reauthenticated = true;
                    self.tokens.invalidate().await;
                    last_error = Some(e);
                }
                Err(e) if e.is_retryable() => {
                    tracing::debug!(error = %e, "transient BigQuery error");
                    last_error = Some(e);
                }
                Err(e) => return Err(e)
            }
        }
        Err(last_error.unwrap_or_else(|| {
            RequestError::Other(bigquery_api_error("All retry attempts failed"))
        }))
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&QueryRequest>
    ) -> Result<T, RequestError> {
        let token = self.tokens.token().await.map_err(RequestError::Other)?;
        tracing::debug!(method = %method, url = %url, "BigQuery request");
        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(RequestError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RequestError::Api {
                status,
                message: api_error_message(status, &text)
            });
        }
        response.json::<T>().await.map_err(RequestError::Transport)
    }

    async fn submit(&self, spec: &QuerySpec, dry_run: bool) -> Result<QueryResponse, RequestError> {
        let url = self.url(&format!("projects/{}/queries", self.project), &[])?;
        let request = self.query_request(spec, dry_run);
        self.execute(Method::POST, url, Some(&request)).await
    }

    async fn get_query_results(
        &self,
        job: &JobReference,
        max_results: Option<u32>
    ) -> Result<QueryResponse, RequestError> {
        let mut params = vec![("timeoutMs", SERVER_WAIT_MS.to_string())];
        if let Some(max) = max_results {
            params.push(("maxResults", max.to_string()));
        }
        if let Some(location) = job.location.as_ref().or(self.location.as_ref()) {
            params.push(("location", location.clone()));
        }
        let url = self.url(
            &format!("projects/{}/queries/{}", job.project_id, job.job_id),
            &params
        )?;
        self.execute(Method::GET, url, None).await
    }
}

impl Warehouse for BigQueryClient {
    async fn run_query(&self, spec: &QuerySpec) -> AppResult<QueryResults> {
        let mut response = self.submit(spec, false).await?;
        while !response.is_complete() {
            let job = response
                .job_reference
                .clone()
                .ok_or_else(|| bigquery_api_error("Query response is missing jobReference"))?;
            tracing::debug!(job_id = %job.job_id, "job still running");
            sleep(self.poll_interval).await;
            response = self.get_query_results(&job, spec.max_results).await?;
        }
        for error in &response.errors {
            tracing::warn!(message = %error.describe(), "query reported an error");
        }

        let schema = response.fields().to_vec();
        let rows = decode_rows(&schema, &response.rows);
        let total_rows =
            parse_count(response.total_rows.as_deref()).unwrap_or(rows.len() as u64);
        tracing::info!(
            job_id = ?response.job_reference.as_ref().map(|j| &j.job_id),
            total_rows,
            bytes = response.bytes_processed(),
            "query complete"
        );
        Ok(QueryResults {
            job_id: response.job_reference.as_ref().map(|j| j.job_id.clone()),
            rows,
            total_rows,
            bytes_processed: response.bytes_processed(),
            cache_hit: response.cache_hit.unwrap_or(false),
            dml_affected_rows: parse_count(response.num_dml_affected_rows.as_deref()),
            schema
        })
    }

    async fn dry_run(&self, spec: &QuerySpec) -> AppResult<DryRunOutcome> {
        match self.submit(spec, true).await {
            Ok(response) => Ok(DryRunOutcome::Valid {
                bytes_processed: response.bytes_processed(),
                schema:          response.fields().to_vec()
            }),
            Err(RequestError::Api {
                status,
                message
            }) if rejects_query(status) => Ok(DryRunOutcome::Invalid {
                error: message
            }),
            Err(e) => Err(e.into())
        }
    }

    async fn get_table(&self, table: &TableRef) -> AppResult<TableMetadata> {
        let url = self.url(
            &format!(
                "projects/{}/datasets/{}/tables/{}",
                table.project, table.dataset, table.table
            ),
            &[]
        )?;
        let resource: Table = self.execute(Method::GET, url, None).await?;
        Ok(table_metadata(resource))
    }
}

fn table_metadata(resource: Table) -> TableMetadata {
    TableMetadata {
        schema:      resource.schema.map(|s| s.fields).unwrap_or_default(),
        num_rows:    parse_count(resource.num_rows.as_deref()),
        num_bytes:   parse_count(resource.num_bytes.as_deref()),
        created:     parse_millis(resource.creation_time.as_deref()),
        modified:    parse_millis(resource.last_modified_time.as_deref()),
        description: resource.description,
        table_type:  resource.table_type,
        reference:   resource.table_reference
    }
}

/// Statuses with which BigQuery rejects the query itself: bad SQL, a
/// missing table or dataset, or access denied to a referenced table
fn rejects_query(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
    )
}

/// Message from a BigQuery error envelope, or the raw body
fn api_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => format!("HTTP {}: {}", status, body.trim())
    }
}
