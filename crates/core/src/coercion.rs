//! Conversion of untyped import rows into typed candidate records.
//!
//! Rules, applied per column:
//!
//! - unknown or disallowed column: dropped
//! - value unset: dropped
//! - value blank after trimming: explicit [`FieldValue::Null`]
//! - integer column that fails to parse: explicit [`FieldValue::Null`]
//! - anything else: the trimmed text
//!
//! Coercion never fails and never invents a value for a column the row did
//! not carry.

use std::collections::BTreeMap;

use crate::fields::{FieldKind, FigureField};
use crate::types::DbId;

/// One untyped row from a CSV file or spreadsheet, keyed by header.
///
/// A missing key and a `None` value both mean the cell was unset.
pub type RawRow = BTreeMap<String, Option<String>>;

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A partial, typed figure derived from one external row.
///
/// Only the columns the row actually carried are present; an explicit
/// [`FieldValue::Null`] means "set this column to null".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateRecord {
    fields: BTreeMap<FigureField, FieldValue>,
}

impl CandidateRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, mostly useful in tests and fixtures.
    pub fn with(mut self, field: FigureField, value: FieldValue) -> Self {
        self.fields.insert(field, value);
        self
    }

    pub fn set(&mut self, field: FigureField, value: FieldValue) {
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: FigureField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn contains(&self, field: FigureField) -> bool {
        self.fields.contains_key(&field)
    }

    /// The explicit identifier, if the row carried a non-null one.
    pub fn id(&self) -> Option<DbId> {
        self.get(FigureField::Id).and_then(FieldValue::as_integer)
    }

    /// True when the row carries a non-empty `name`.
    pub fn has_name(&self) -> bool {
        self.get(FigureField::Name)
            .and_then(FieldValue::as_text)
            .is_some_and(|name| !name.is_empty())
    }

    /// Every carried column except `id`, in column order.
    pub fn data_fields(&self) -> impl Iterator<Item = (FigureField, &FieldValue)> {
        self.fields
            .iter()
            .filter(|(field, _)| **field != FigureField::Id)
            .map(|(field, value)| (*field, value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Coerce one raw row, keeping only columns in `allowed`.
pub fn coerce_row(row: &RawRow, allowed: &[FigureField]) -> CandidateRecord {
    let mut candidate = CandidateRecord::new();

    for (header, raw) in row {
        let Some(field) = FigureField::from_name(header) else {
            continue;
        };
        if !allowed.contains(&field) {
            continue;
        }
        let Some(raw) = raw else {
            continue;
        };
        candidate.set(field, coerce_value(field, raw));
    }

    candidate
}

fn coerce_value(field: FigureField, raw: &str) -> FieldValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldValue::Null;
    }

    match field.kind() {
        FieldKind::Id => trimmed
            .parse::<i64>()
            .map(FieldValue::Integer)
            .unwrap_or(FieldValue::Null),
        FieldKind::Year => trimmed
            .parse::<i32>()
            .map(|year| FieldValue::Integer(i64::from(year)))
            .unwrap_or(FieldValue::Null),
        FieldKind::Text => FieldValue::Text(trimmed.to_string()),
    }
}
