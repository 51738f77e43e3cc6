//! BigQuery table schema representation.
//!
//! Fields mirror the REST `TableFieldSchema` resource so the same type is used
//! for wire decoding and for rendering. Nested `RECORD` columns keep their
//! children in [`Field::fields`]; [`flatten_fields`] turns them into dotted
//! paths (`address.city`) for display, diffing and validation.
//!
//! # Example
//!
//! ```
//! use bench::schema::{Field, flatten_fields};
//!
//! let address = Field::new("address", "RECORD")
//!     .with_mode("REPEATED")
//!     .with_fields(vec![Field::new("city", "STRING")]);
//! let fields = vec![Field::new("id", "INTEGER").with_mode("REQUIRED"), address];
//!
//! let paths: Vec<String> = flatten_fields(&fields).into_iter().map(|f| f.name).collect();
//! assert_eq!(paths, ["id", "address", "address.city"]);
//! ```

pub mod validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bigquery::TableRef;

/// Mode reported for fields without an explicit mode
pub const DEFAULT_MODE: &str = "NULLABLE";

/// A single column of a BigQuery table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Column name
    pub name:        String,
    /// Legacy type name as returned by the API (`STRING`, `INTEGER`, `RECORD`, ...)
    #[serde(rename = "type")]
    pub field_type:  String,
    /// `NULLABLE`, `REQUIRED` or `REPEATED`; absent means `NULLABLE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode:        Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sub-fields of a `RECORD`/`STRUCT` column
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields:      Vec<Field>
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name:        name.into(),
            field_type:  field_type.into(),
            mode:        None,
            description: None,
            fields:      Vec::new()
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    /// Mode with `NULLABLE` filled in
    pub fn effective_mode(&self) -> &str {
        self.mode.as_deref().unwrap_or(DEFAULT_MODE)
    }

    pub fn is_repeated(&self) -> bool {
        self.effective_mode().eq_ignore_ascii_case("REPEATED")
    }

    pub fn is_required(&self) -> bool {
        self.effective_mode().eq_ignore_ascii_case("REQUIRED")
    }

    pub fn is_record(&self) -> bool {
        matches!(
            self.field_type.to_ascii_uppercase().as_str(),
            "RECORD" | "STRUCT"
        )
    }
}

/// Flatten nested fields depth-first into dotted paths.
///
/// Parents are emitted before their children and keep their own type and
/// mode; the returned fields carry no nested `fields`.
pub fn flatten_fields(fields: &[Field]) -> Vec<Field> {
    let mut out = Vec::new();
    flatten_into(fields, "", &mut out);
    out
}

fn flatten_into(fields: &[Field], prefix: &str, out: &mut Vec<Field>) {
    for field in fields {
        let path = format!("{}{}", prefix, field.name);
        out.push(Field {
            name:        path.clone(),
            field_type:  field.field_type.clone(),
            mode:        field.mode.clone(),
            description: field.description.clone(),
            fields:      Vec::new()
        });
        if !field.fields.is_empty() {
            flatten_into(&field.fields, &format!("{}.", path), out);
        }
    }
}

/// Table metadata returned by `tables.get`.
#[derive(Debug, Clone)]
pub struct TableMetadata {
    pub reference:   TableRef,
    pub schema:      Vec<Field>,
    pub num_rows:    Option<u64>,
    pub num_bytes:   Option<u64>,
    pub created:     Option<DateTime<Utc>>,
    pub modified:    Option<DateTime<Utc>>,
    pub description: Option<String>,
    /// `TABLE`, `VIEW`, `EXTERNAL`, ...
    pub table_type:  Option<String>
}

impl TableMetadata {
    pub fn new(reference: TableRef, schema: Vec<Field>) -> Self {
        Self {
            reference,
            schema,
            num_rows: None,
            num_bytes: None,
            created: None,
            modified: None,
            description: None,
            table_type: None
        }
    }
}

/// Serializable schema document used for JSON and YAML output.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDocument {
    pub table_id:  String,
    pub created:   Option<String>,
    pub modified:  Option<String>,
    pub num_rows:  Option<u64>,
    pub num_bytes: Option<u64>,
    pub schema:    Vec<FieldDocument>
}

/// One schema entry in a [`SchemaDocument`].
#[derive(Debug, Clone, Serialize)]
pub struct FieldDocument {
    pub name:        String,
    #[serde(rename = "type")]
    pub field_type:  String,
    pub mode:        Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields:      Option<Option<Vec<FieldDocument>>>
}

impl SchemaDocument {
    /// Build the document; `detailed` adds descriptions and flattened
    /// nested fields.
    pub fn from_metadata(table: &TableMetadata, detailed: bool) -> Self {
        let schema = table
            .schema
            .iter()
            .map(|field| {
                let mut doc = FieldDocument {
                    name:        field.name.clone(),
                    field_type:  field.field_type.clone(),
                    mode:        field.mode.clone(),
                    description: None,
                    fields:      None
                };
                if detailed {
                    doc.description = Some(field.description.clone());
                    doc.fields = Some(nested_documents(field));
                }
                doc
            })
            .collect();
        Self {
            table_id: table.reference.full_table_id(),
            created: table.created.map(|t| t.to_rfc3339()),
            modified: table.modified.map(|t| t.to_rfc3339()),
            num_rows: table.num_rows,
            num_bytes: table.num_bytes,
            schema
        }
    }
}

fn nested_documents(field: &Field) -> Option<Vec<FieldDocument>> {
    if field.fields.is_empty() {
        return None;
    }
    let docs = flatten_fields(&field.fields)
        .into_iter()
        .map(|nested| FieldDocument {
            name:        nested.name,
            field_type:  nested.field_type,
            mode:        nested.mode,
            description: Some(nested.description),
            fields:      None
        })
        .collect();
    Some(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Field> {
        vec![
            Field::new("id", "INTEGER").with_mode("REQUIRED"),
            Field::new("payload", "RECORD").with_fields(vec![
                Field::new("kind", "STRING"),
                Field::new("tags", "RECORD")
                    .with_mode("REPEATED")
                    .with_fields(vec![Field::new("key", "STRING")]),
            ]),
        ]
    }

    #[test]
    fn test_flatten_nested_paths() {
        let names: Vec<String> = flatten_fields(&sample())
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(
            names,
            ["id", "payload", "payload.kind", "payload.tags", "payload.tags.key"]
        );
    }

    #[test]
    fn test_effective_mode_defaults_to_nullable() {
        let field = Field::new("name", "STRING");
        assert_eq!(field.effective_mode(), "NULLABLE");
        assert!(!field.is_required());
        assert!(!field.is_repeated());
    }

    #[test]
    fn test_field_deserializes_rest_shape() {
        let json = r#"{"name":"ts","type":"TIMESTAMP","mode":"NULLABLE","description":"event time"}"#;
        let field: Field = serde_json::from_str(json).unwrap();
        assert_eq!(field.field_type, "TIMESTAMP");
        assert_eq!(field.description.as_deref(), Some("event time"));
        assert!(field.fields.is_empty());
    }

    #[test]
    fn test_document_simple_omits_detail_keys() {
        let table = TableMetadata::new(TableRef::new("p", "d", "t"), sample());
        let doc = SchemaDocument::from_metadata(&table, false);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["table_id"], "p:d.t");
        assert!(json["schema"][0].get("description").is_none());
        assert_eq!(json["schema"][1]["mode"], serde_json::Value::Null);
    }

    #[test]
    fn test_document_detailed_flattens_children() {
        let table = TableMetadata::new(TableRef::new("p", "d", "t"), sample());
        let doc = SchemaDocument::from_metadata(&table, true);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["schema"][0]["fields"], serde_json::Value::Null);
        assert_eq!(json["schema"][1]["fields"][0]["name"], "kind");
        assert_eq!(json["schema"][1]["fields"][2]["name"], "tags.key");
    }
}
