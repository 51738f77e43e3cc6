use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppResult, config_error, table_id_error};

/// Fully qualified reference to a BigQuery table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(rename = "projectId")]
    pub project: String,
    #[serde(rename = "datasetId")]
    pub dataset: String,
    #[serde(rename = "tableId")]
    pub table:   String
}

impl TableRef {
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>
    ) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table:   table.into()
        }
    }

    /// Parse `dataset.table` or `project.dataset.table`.
    ///
    /// Surrounding backticks and the legacy `project:dataset.table` form are
    /// accepted. Two-part ids take `default_project`.
    pub fn parse(id: &str, default_project: Option<&str>) -> AppResult<Self> {
        let trimmed = id.trim().trim_matches('`');
        let normalized = match trimmed.split_once(':') {
            Some((project, rest)) => format!("{}.{}", project, rest),
            None => trimmed.to_string()
        };
        let parts: Vec<&str> = normalized.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(table_id_error());
        }
        match parts.as_slice() {
            [project, dataset, table] => Ok(Self::new(*project, *dataset, *table)),
            [dataset, table] => {
                let project = default_project.ok_or_else(|| {
                    config_error(
                        "Project ID is required when table_id is in 'dataset.table' format \
                         (use --project or BENCH_PROJECT)"
                    )
                })?;
                Ok(Self::new(project, *dataset, *table))
            }
            _ => Err(table_id_error())
        }
    }

    /// Legacy `project:dataset.table` form reported by the API
    pub fn full_table_id(&self) -> String {
        format!("{}:{}.{}", self.project, self.dataset, self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}
