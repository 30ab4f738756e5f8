//! Source normalization.
//!
//! Turns one raw source table of a declared category into canonical
//! [`SourceRecord`](crate::models::SourceRecord)s: resolves column aliases,
//! coerces dates, money and day counts, canonicalizes union codes and reports
//! recoverable row issues as warnings.

mod normalizer;
mod schema;
mod values;

pub use normalizer::{NormalizedTable, RawTable, normalize_table};
pub use schema::{ColumnMap, Field, FieldSpec, fields_for, fold_header};
pub use values::{
    canonical_union_code, non_blank, parse_date, parse_day_count, parse_money, parse_percentage,
};
