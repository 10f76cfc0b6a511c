//! Converters for Kosovo open-data spreadsheet exports.
//!
//! Two dataset families are supported: the KAA accredited-programmes tables
//! and the Prishtina municipal building-permit lists. Both arrive as
//! irregular Excel workbooks; the crate locates the header row, resolves the
//! drifting column labels, coerces every cell to its declared type, and
//! writes versioned JSON datasets with index documents.

pub mod coerce;
pub mod fetch;
pub mod output;
pub mod parse;
pub mod schema;
pub mod sources;
pub mod table;
pub mod text;
pub mod workbook;
