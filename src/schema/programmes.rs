// src/schema/programmes.rs
//! Accredited higher-education programmes (KAA yearly tables).

use once_cell::sync::Lazy;

use super::{DatasetSchema, FieldSpec, HeaderRule, IdentityRule};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("institution"),
    FieldSpec::integer("program_number"),
    FieldSpec::text("programme_sq"),
    FieldSpec::text("programme_en"),
    FieldSpec::text("campus"),
    FieldSpec::text("level"),
    FieldSpec::integer("ects"),
    FieldSpec::integer("quota"),
    FieldSpec::date("accredited_until"),
];

/// Keys are pre-normalized header labels; the misspelled variants are real
/// and appear in specific source years.
const ALIASES: &[(&str, &str)] = &[
    ("institucioni i arsimit te larte", "institution"),
    (
        "institucioni i arsimit te larte higher education institution",
        "institution",
    ),
    ("nr", "program_number"),
    ("programi i studimit", "programme_sq"),
    ("progarmi i studimit", "programme_sq"),
    ("programet e studimit", "programme_sq"),
    ("study program", "programme_en"),
    ("kampusi", "campus"),
    ("niveli", "level"),
    ("ects", "ects"),
    ("kuota", "quota"),
    ("i akredituar deri me", "accredited_until"),
];

pub static SCHEMA: Lazy<DatasetSchema> = Lazy::new(|| DatasetSchema {
    name: "accredited_programmes",
    fields: FIELDS,
    aliases: ALIASES.iter().copied().collect(),
    prefix_rules: &[],
    header_rule: HeaderRule::FirstCellContains("institucioni"),
    // the institution column itself opens the header row, so no override
    first_column_field: None,
    required: &[
        "institution",
        "program_number",
        "programme_sq",
        "programme_en",
        "campus",
        "level",
        "ects",
        "quota",
        "accredited_until",
    ],
    identity: IdentityRule::AnyNonBlank(&["programme_sq", "programme_en"]),
    forward_fill: &["institution"],
    drop_if_null: &["institution"],
    link_rules: &[],
    comment_fallback: None,
});
