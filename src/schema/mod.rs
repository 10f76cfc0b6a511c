// src/schema/mod.rs
//! Canonical dataset schemas: the fixed, ordered field contract each output
//! record follows, plus the lookup tables that map raw header-label variants
//! onto canonical fields. Plain data, no runtime reflection.

use std::collections::HashMap;

pub mod permits;
pub mod programmes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Date,
    Hyperlink,
}

/// Extra normalization applied to text fields after basic cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRule {
    Plain,
    /// Dash/slash unification plus smart title-casing.
    DashTitleCase,
    /// Boilerplate prefix stripping for human-entered document references.
    ReferencePrefixes,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub rule: TextRule,
}

impl FieldSpec {
    pub const fn text(name: &'static str) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Text,
            rule: TextRule::Plain,
        }
    }

    pub const fn text_with(name: &'static str, rule: TextRule) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Text,
            rule,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Integer,
            rule: TextRule::Plain,
        }
    }

    pub const fn decimal(name: &'static str) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Decimal,
            rule: TextRule::Plain,
        }
    }

    pub const fn date(name: &'static str) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Date,
            rule: TextRule::Plain,
        }
    }

    pub const fn hyperlink(name: &'static str) -> Self {
        FieldSpec {
            name,
            kind: FieldKind::Hyperlink,
            rule: TextRule::Plain,
        }
    }
}

/// How a row qualifies as the header row, applied to normalized cell text.
#[derive(Debug, Clone)]
pub enum HeaderRule {
    FirstCellContains(&'static str),
    AnyCellStartsWith(&'static str),
}

/// Predicate over a normalized header label, used to locate link-bearing
/// columns by their label rather than by a canonical mapping.
#[derive(Debug, Clone, Copy)]
pub enum LabelMatch {
    Contains(&'static str),
    StartsWith(&'static str),
}

impl LabelMatch {
    pub fn matches(&self, normalized_label: &str) -> bool {
        match self {
            LabelMatch::Contains(needle) => normalized_label.contains(needle),
            LabelMatch::StartsWith(prefix) => normalized_label.starts_with(prefix),
        }
    }
}

/// Which field(s) must be non-blank after normalization for a row to be
/// emitted as a record at all.
#[derive(Debug, Clone)]
pub enum IdentityRule {
    NonBlank(&'static str),
    AnyNonBlank(&'static [&'static str]),
}

/// Derive `target` from the normalized text of `source` when the workbook
/// has no column for `target` (schema drift across source years).
#[derive(Debug, Clone)]
pub struct CommentFallback {
    pub source: &'static str,
    pub target: &'static str,
}

pub struct DatasetSchema {
    pub name: &'static str,
    /// Output contract: every record carries exactly these fields, in order.
    pub fields: &'static [FieldSpec],
    /// Normalized raw label → canonical field.
    pub aliases: HashMap<&'static str, &'static str>,
    /// Ordered prefix fallbacks for labels that vary by trailing detail
    /// (units, footnote markers). Most specific first.
    pub prefix_rules: &'static [(&'static str, &'static str)],
    pub header_rule: HeaderRule,
    /// When set, column 0 maps to this field regardless of its label text.
    pub first_column_field: Option<&'static str>,
    /// Canonical fields that must resolve from some header, or the file is
    /// structurally unparseable.
    pub required: &'static [&'static str],
    pub identity: IdentityRule,
    /// Columns forward-filled before record assembly.
    pub forward_fill: &'static [&'static str],
    /// Rows whose cell in one of these columns is empty are dropped before
    /// record assembly.
    pub drop_if_null: &'static [&'static str],
    /// Hyperlink output fields and how to find their source column.
    pub link_rules: &'static [(&'static str, LabelMatch)],
    pub comment_fallback: Option<CommentFallback>,
}

impl DatasetSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Alias lookup first, then the ordered prefix rules.
    pub fn resolve_label(&self, normalized: &str) -> Option<&'static str> {
        if normalized.is_empty() {
            return None;
        }
        if let Some(field) = self.aliases.get(normalized) {
            return Some(*field);
        }
        self.prefix_rules
            .iter()
            .find(|(prefix, _)| normalized.starts_with(prefix))
            .map(|(_, field)| *field)
    }
}
