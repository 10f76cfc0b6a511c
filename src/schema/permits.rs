// src/schema/permits.rs
//! Prishtina municipal building permits (one workbook per year, 2012-2025,
//! with substantial header drift between years).

use once_cell::sync::Lazy;

use super::{
    CommentFallback, DatasetSchema, FieldSpec, HeaderRule, IdentityRule, LabelMatch, TextRule,
};

const FIELDS: &[FieldSpec] = &[
    FieldSpec::text("permit_number"),
    FieldSpec::date("application_date"),
    FieldSpec::date("issuance_date"),
    FieldSpec::text("owner"),
    FieldSpec::text("investor"),
    FieldSpec::text("designer"),
    FieldSpec::text_with("neighbourhood", TextRule::DashTitleCase),
    FieldSpec::decimal("total_floor_area_m2"),
    FieldSpec::decimal("density_fee_eur"),
    FieldSpec::decimal("administrative_fee_eur"),
    FieldSpec::decimal("total_fee_eur"),
    FieldSpec::text("storeys"),
    FieldSpec::text_with("destination", TextRule::DashTitleCase),
    FieldSpec::text_with("document_reference", TextRule::ReferencePrefixes),
    FieldSpec::hyperlink("document_url"),
    FieldSpec::hyperlink("situation_url"),
];

/// `comment` and `situation_reference` resolve from headers but are not part
/// of the output contract; `comment` feeds the destination fallback.
const ALIASES: &[(&str, &str)] = &[
    ("data e aplikimit te lejes", "application_date"),
    ("data e leshimit te lejes", "issuance_date"),
    ("pronari pronaret perfaqesuesi", "owner"),
    ("kompania investitori", "investor"),
    ("projektuesi", "designer"),
    ("lagja", "neighbourhood"),
    ("lagjia", "neighbourhood"),
    ("lagjia e", "neighbourhood"),
    ("siperfaqja totale ndertimore", "total_floor_area_m2"),
    ("pagesa totale e lejes se leshuar", "total_fee_eur"),
    ("etazhiteti", "storeys"),
    ("etazhiteti i objektit", "storeys"),
    ("destinimi i objektit", "destination"),
    ("koment", "comment"),
    ("dokumenti ne pdf i lejes se leshuar", "document_reference"),
    ("situacioni i ndertimit", "situation_reference"),
    ("situacioni", "situation_reference"),
];

/// Fee and area labels grew units and footnote markers over the years; a
/// prefix match absorbs the trailing detail. Most specific first.
const PREFIX_RULES: &[(&str, &str)] = &[
    ("pagesa e tarifes per rritjen e densitetit", "density_fee_eur"),
    ("pagesa e takses administrative", "administrative_fee_eur"),
    ("siperfaqja totale ndertimore", "total_floor_area_m2"),
];

pub static SCHEMA: Lazy<DatasetSchema> = Lazy::new(|| DatasetSchema {
    name: "building_permits",
    fields: FIELDS,
    aliases: ALIASES.iter().copied().collect(),
    prefix_rules: PREFIX_RULES,
    header_rule: HeaderRule::AnyCellStartsWith("data e leshimit"),
    // the first column is the permit number even when labelled "#"
    first_column_field: Some("permit_number"),
    required: &[],
    identity: IdentityRule::NonBlank("permit_number"),
    forward_fill: &[],
    drop_if_null: &[],
    link_rules: &[
        ("document_url", LabelMatch::Contains("pdf")),
        ("situation_url", LabelMatch::StartsWith("situacioni")),
    ],
    comment_fallback: Some(CommentFallback {
        source: "comment",
        target: "destination",
    }),
});
