// src/parse/record.rs
//! Record assembly: one canonical record per data row, every field coerced
//! according to its declared type.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::coerce;
use crate::schema::{DatasetSchema, FieldKind, TextRule};
use crate::table::{RawCell, Table};
use crate::text;
use crate::workbook::Sheet;

/// A coerced cell value. `Null` serializes as JSON null.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// One row's coerced values in fixed field order. Serializes as a JSON map
/// whose key set and order are the dataset's canonical contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(&'static str, Value)>,
}

impl Record {
    fn with_capacity(capacity: usize) -> Self {
        Record {
            fields: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, name: &'static str, value: Value) {
        self.fields.push((name, value));
    }

    fn set(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(n, _)| *n)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Row-invariant context shared by every record of one workbook.
pub struct RowContext<'a> {
    pub sheet: &'a Sheet,
    /// Hyperlink output field → sheet column carrying the link.
    pub link_columns: &'a [(&'static str, usize)],
    /// Whether the fallback target resolved from a real header column.
    pub fallback_column_present: bool,
}

/// Assemble one record from a table row, in the schema's field order.
pub fn build_record(
    table: &Table,
    row: usize,
    schema: &DatasetSchema,
    ctx: &RowContext<'_>,
) -> Record {
    let mut record = Record::with_capacity(schema.fields.len());
    for spec in schema.fields {
        let value = match spec.kind {
            FieldKind::Text => text_value(table.cell(row, spec.name), spec.rule),
            FieldKind::Integer => coerce::to_int(table.cell(row, spec.name))
                .map(Value::Int)
                .unwrap_or(Value::Null),
            FieldKind::Decimal => coerce::to_decimal(table.cell(row, spec.name))
                .map(Value::Float)
                .unwrap_or(Value::Null),
            FieldKind::Date => coerce::to_date(table.cell(row, spec.name))
                .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null),
            FieldKind::Hyperlink => hyperlink_value(table, row, spec.name, ctx),
        };
        record.push(spec.name, value);
    }

    if let Some(fallback) = &schema.comment_fallback {
        let target_blank = record.get(fallback.target).map_or(true, Value::is_null);
        if !ctx.fallback_column_present && target_blank {
            let rule = schema
                .field(fallback.target)
                .map(|spec| spec.rule)
                .unwrap_or(TextRule::Plain);
            let derived = table
                .cell(row, fallback.source)
                .as_text()
                .and_then(|t| text::clean(&t))
                .and_then(|comment| apply_text_rule(&comment, rule));
            if let Some(value) = derived {
                record.set(fallback.target, Value::Text(value));
            }
        }
    }

    record
}

fn text_value(cell: &RawCell, rule: TextRule) -> Value {
    cell.as_text()
        .and_then(|t| apply_text_rule(&t, rule))
        .map(Value::Text)
        .unwrap_or(Value::Null)
}

fn apply_text_rule(raw: &str, rule: TextRule) -> Option<String> {
    match rule {
        TextRule::Plain => text::clean(raw),
        TextRule::DashTitleCase => text::normalize_inline_separators(raw, Some(" - "), true),
        TextRule::ReferencePrefixes => text::normalize_document_reference(raw),
    }
}

/// Embedded link target first; else the cell's own text when it is an
/// absolute URL; else null.
fn hyperlink_value(table: &Table, row: usize, field: &'static str, ctx: &RowContext<'_>) -> Value {
    let Some(col) = ctx
        .link_columns
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, col)| *col)
    else {
        return Value::Null;
    };
    let sheet_row = table.source_row(row);
    if let Some(target) = ctx.sheet.hyperlink(sheet_row, col) {
        return Value::Text(target.trim().to_string());
    }
    if let RawCell::Text(s) = ctx.sheet.cell(sheet_row, col) {
        let trimmed = s.trim();
        if trimmed.to_lowercase().starts_with("http") {
            return Value::Text(trimmed.to_string());
        }
    }
    Value::Null
}
