//! Record Types
//! Raw CSV rows and the trait every page's derived record implements.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// One CSV row before coercion: column name → cell text.
///
/// Empty cells are not stored, so a missing key and a blank cell look the same.
pub type RawRecord = HashMap<String, String>;

/// Look up a cell by its exact (case-sensitive) column name.
pub fn cell<'a>(raw: &'a RawRecord, column: &str) -> Option<&'a str> {
    raw.get(column).map(String::as_str)
}

/// A numeric field of a page's derived record.
pub trait FieldSpec: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Human readable name used for axis titles and control labels.
    fn label(self) -> &'static str;
}

/// One card of the click-for-detail side panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailCard {
    pub title: String,
    pub value: String,
    pub subtext: String,
}

impl DetailCard {
    pub fn new(title: impl Into<String>, value: impl Into<String>, subtext: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            subtext: subtext.into(),
        }
    }
}

/// A derived record: coerced raw fields plus computed ones.
///
/// `from_raw` must be a pure function of its inputs so a record can be
/// rebuilt at any time instead of being mutated in place.
pub trait Datum: Clone + Send + Sync + 'static {
    type Field: FieldSpec;

    /// Derive a record from the raw row at `row`. `None` drops the row.
    fn from_raw(row: usize, raw: &RawRecord) -> Option<Self>;

    /// Stable identity used to key marks across updates.
    fn key(&self) -> String;

    /// Short label for axis ticks and tooltips.
    fn label(&self) -> &str;

    /// Value matched by the category filter.
    fn category(&self) -> &str;

    /// Numeric value of a field. Always finite.
    fn value(&self, field: Self::Field) -> f64;

    /// Lines of the hover tooltip; the first one is rendered as a heading.
    fn tooltip(&self) -> Vec<String>;

    /// Cards of the detail panel.
    fn details(&self) -> Vec<DetailCard>;
}
