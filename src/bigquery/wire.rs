//! BigQuery v2 REST resources and the `f`/`v` row decoding.
//!
//! Only the members the CLI reads are modelled. Integer-valued members such
//! as `totalRows` travel as JSON strings and are parsed lazily.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Row, TableRef};
use crate::schema::Field;

/// Body of `jobs.query`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query:           String,
    pub use_legacy_sql:  bool,
    pub dry_run:         bool,
    pub use_query_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results:     Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms:      Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_dataset: Option<DatasetReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location:        Option<String>,
    pub format_options:  FormatOptions
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatOptions {
    /// Render TIMESTAMP cells as integer microseconds
    pub use_int64_timestamp: bool
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference {
    pub project_id: String,
    pub dataset_id: String
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<Field>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id:     String,
    #[serde(default)]
    pub location:   Option<String>
}

/// Response of both `jobs.query` and `jobs.getQueryResults`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub schema:                Option<TableSchema>,
    #[serde(default)]
    pub job_reference:         Option<JobReference>,
    #[serde(default)]
    pub total_rows:            Option<String>,
    #[serde(default)]
    pub rows:                  Vec<TableRow>,
    #[serde(default)]
    pub total_bytes_processed: Option<String>,
    #[serde(default)]
    pub job_complete:          Option<bool>,
    #[serde(default)]
    pub cache_hit:             Option<bool>,
    #[serde(default)]
    pub num_dml_affected_rows: Option<String>,
    #[serde(default)]
    pub errors:                Vec<ErrorProto>
}

impl QueryResponse {
    pub fn is_complete(&self) -> bool {
        self.job_complete.unwrap_or(false)
    }

    pub fn fields(&self) -> &[Field] {
        self.schema.as_ref().map(|s| s.fields.as_slice()).unwrap_or(&[])
    }

    pub fn bytes_processed(&self) -> u64 {
        parse_count(self.total_bytes_processed.as_deref()).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub v: Value
}

/// `tables.get` resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub table_reference:    TableRef,
    #[serde(default)]
    pub schema:             Option<TableSchema>,
    #[serde(default)]
    pub num_rows:           Option<String>,
    #[serde(default)]
    pub num_bytes:          Option<String>,
    #[serde(default)]
    pub creation_time:      Option<String>,
    #[serde(default)]
    pub last_modified_time: Option<String>,
    #[serde(default)]
    pub description:        Option<String>,
    #[serde(default, rename = "type")]
    pub table_type:         Option<String>
}

/// Error envelope returned with non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code:    u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status:  Option<String>,
    #[serde(default)]
    pub errors:  Vec<ErrorProto>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorProto {
    #[serde(default)]
    pub reason:   Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub message:  Option<String>
}

impl ErrorProto {
    pub fn describe(&self) -> String {
        match (&self.message, &self.reason) {
            (Some(message), _) => message.clone(),
            (None, Some(reason)) => reason.clone(),
            (None, None) => "unknown error".to_string()
        }
    }
}

/// Parse an int64-as-string member
pub fn parse_count(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Parse an epoch-millis-as-string member
pub fn parse_millis(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
}

/// Decode REST rows into ordered column maps
pub fn decode_rows(fields: &[Field], rows: &[TableRow]) -> Vec<Row> {
    rows.iter().map(|row| decode_record(fields, &row.f)).collect()
}

fn decode_record(fields: &[Field], cells: &[TableCell]) -> IndexMap<String, Value> {
    fields
        .iter()
        .zip(cells)
        .map(|(field, cell)| (field.name.clone(), decode_cell(field, &cell.v)))
        .collect()
}

fn decode_cell(field: &Field, value: &Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    if field.is_repeated() {
        return match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| decode_single(field, item.get("v").unwrap_or(&Value::Null)))
                    .collect()
            ),
            other => decode_single(field, other)
        };
    }
    decode_single(field, value)
}

fn decode_single(field: &Field, value: &Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    if field.is_record() {
        let cells: Vec<TableCell> = value
            .get("f")
            .and_then(|f| serde_json::from_value(f.clone()).ok())
            .unwrap_or_default();
        let record = decode_record(&field.fields, &cells);
        return Value::Object(record.into_iter().collect());
    }
    match value {
        Value::String(raw) => decode_scalar(&field.field_type, raw),
        other => other.clone()
    }
}

fn decode_scalar(field_type: &str, raw: &str) -> Value {
    match field_type.to_ascii_uppercase().as_str() {
        "INTEGER" | "INT64" => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        "FLOAT" | "FLOAT64" => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        "BOOLEAN" | "BOOL" => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string())
        },
        "TIMESTAMP" => decode_timestamp(raw)
            .map(|ts| Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            .unwrap_or_else(|| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string())
    }
}

/// Integer microseconds (int64 timestamp output) or float seconds (legacy)
fn decode_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(micros) = raw.parse::<i64>() {
        return DateTime::from_timestamp_micros(micros);
    }
    let seconds = raw.parse::<f64>().ok()?;
    DateTime::from_timestamp_micros((seconds * 1_000_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows(value: Value) -> Vec<TableRow> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_scalars() {
        let fields = vec![
            Field::new("n", "INTEGER"),
            Field::new("x", "FLOAT"),
            Field::new("ok", "BOOLEAN"),
            Field::new("s", "STRING"),
            Field::new("missing", "STRING"),
        ];
        let decoded = decode_rows(
            &fields,
            &rows(json!([{"f": [{"v": "42"}, {"v": "1.5"}, {"v": "true"}, {"v": "hi"}, {"v": null}]}]))
        );
        let row = &decoded[0];
        assert_eq!(row["n"], json!(42));
        assert_eq!(row["x"], json!(1.5));
        assert_eq!(row["ok"], json!(true));
        assert_eq!(row["s"], json!("hi"));
        assert_eq!(row["missing"], Value::Null);
        let order: Vec<&str> = row.keys().map(|k| k.as_str()).collect();
        assert_eq!(order, ["n", "x", "ok", "s", "missing"]);
    }

    #[test]
    fn test_decode_timestamp_micros_and_seconds() {
        let fields = vec![Field::new("a", "TIMESTAMP"), Field::new("b", "TIMESTAMP")];
        let decoded = decode_rows(
            &fields,
            &rows(json!([{"f": [{"v": "1704067200000000"}, {"v": "1.7040672E9"}]}]))
        );
        assert_eq!(decoded[0]["a"], json!("2024-01-01T00:00:00Z"));
        assert_eq!(decoded[0]["b"], json!("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_decode_repeated_record() {
        let fields = vec![
            Field::new("items", "RECORD")
                .with_mode("REPEATED")
                .with_fields(vec![Field::new("sku", "STRING"), Field::new("qty", "INTEGER")]),
        ];
        let decoded = decode_rows(
            &fields,
            &rows(json!([{"f": [{"v": [
                {"v": {"f": [{"v": "A"}, {"v": "2"}]}},
                {"v": {"f": [{"v": "B"}, {"v": null}]}}
            ]}]}]))
        );
        assert_eq!(
            decoded[0]["items"],
            json!([{"sku": "A", "qty": 2}, {"sku": "B", "qty": null}])
        );
    }

    #[test]
    fn test_query_response_counts() {
        let resp: QueryResponse = serde_json::from_value(json!({
            "jobComplete": true,
            "totalRows": "7",
            "totalBytesProcessed": "2048",
            "schema": {"fields": [{"name": "a", "type": "STRING"}]}
        }))
        .unwrap();
        assert!(resp.is_complete());
        assert_eq!(resp.bytes_processed(), 2048);
        assert_eq!(parse_count(resp.total_rows.as_deref()), Some(7));
        assert_eq!(resp.fields().len(), 1);
    }

    #[test]
    fn test_table_resource_timestamps() {
        let table: Table = serde_json::from_value(json!({
            "tableReference": {"projectId": "p", "datasetId": "d", "tableId": "t"},
            "numRows": "10",
            "creationTime": "1704067200000",
            "type": "TABLE"
        }))
        .unwrap();
        assert_eq!(table.table_reference, TableRef::new("p", "d", "t"));
        let created = parse_millis(table.creation_time.as_deref()).unwrap();
        assert_eq!(created.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert!(parse_millis(table.last_modified_time.as_deref()).is_none());
    }

    #[test]
    fn test_request_serialization() {
        let req = QueryRequest {
            query:           "SELECT 1".into(),
            use_legacy_sql:  false,
            dry_run:         true,
            use_query_cache: false,
            max_results:     None,
            timeout_ms:      None,
            default_dataset: Some(DatasetReference {
                project_id: "p".into(),
                dataset_id: "d".into()
            }),
            location:        None,
            format_options:  FormatOptions {
                use_int64_timestamp: true
            }
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["dryRun"], true);
        assert_eq!(json["useLegacySql"], false);
        assert_eq!(json["defaultDataset"]["datasetId"], "d");
        assert!(json.get("maxResults").is_none());
        assert_eq!(json["formatOptions"]["useInt64Timestamp"], true);
    }
}
