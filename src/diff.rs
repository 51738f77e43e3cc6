//! Schema comparison between two tables.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::schema::{Field, flatten_fields};

/// Type and mode of a field on one side of a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSignature {
    #[serde(rename = "type")]
    pub field_type: String,
    pub mode:       String
}

impl FieldSignature {
    fn of(field: &Field) -> Self {
        Self {
            field_type: field.field_type.clone(),
            mode:       field.effective_mode().to_string()
        }
    }
}

impl std::fmt::Display for FieldSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.field_type, self.mode)
    }
}

/// A field present on only one side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldEntry {
    pub field:   String,
    pub details: FieldSignature
}

/// A field whose type or mode differs between the two tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub from:  FieldSignature,
    pub to:    FieldSignature
}

/// Result of comparing two schemas. Every list is sorted by field name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDiff {
    pub table1:    String,
    pub table2:    String,
    pub added:     Vec<FieldEntry>,
    pub removed:   Vec<FieldEntry>,
    pub changed:   Vec<FieldChange>,
    pub unchanged: usize
}

impl SchemaDiff {
    pub fn has_differences(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty())
    }
}

/// Compare the fields of two schemas by name.
///
/// With `nested` set, RECORD children are compared by their dotted path
/// as well; otherwise only top-level columns are considered.
pub fn diff_schemas(
    table1: impl Into<String>,
    schema1: &[Field],
    table2: impl Into<String>,
    schema2: &[Field],
    nested: bool
) -> SchemaDiff {
    let left = signatures(schema1, nested);
    let right = signatures(schema2, nested);

    let mut diff = SchemaDiff {
        table1:    table1.into(),
        table2:    table2.into(),
        added:     Vec::new(),
        removed:   Vec::new(),
        changed:   Vec::new(),
        unchanged: 0
    };

    for (name, before) in &left {
        match right.get(name) {
            None => diff.removed.push(FieldEntry {
                field:   name.clone(),
                details: before.clone()
            }),
            Some(after) if after != before => diff.changed.push(FieldChange {
                field: name.clone(),
                from:  before.clone(),
                to:    after.clone()
            }),
            Some(_) => diff.unchanged += 1
        }
    }
    for (name, after) in &right {
        if !left.contains_key(name) {
            diff.added.push(FieldEntry {
                field:   name.clone(),
                details: after.clone()
            });
        }
    }
    diff
}

fn signatures(fields: &[Field], nested: bool) -> BTreeMap<String, FieldSignature> {
    if nested {
        flatten_fields(fields)
            .iter()
            .map(|f| (f.name.clone(), FieldSignature::of(f)))
            .collect()
    } else {
        fields
            .iter()
            .map(|f| (f.name.clone(), FieldSignature::of(f)))
            .collect()
    }
}
