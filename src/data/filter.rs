//! Filter Engine
//! Control state for a page and the pure function turning it into a filtered set.

use crate::data::record::{Datum, FieldSpec};
use thiserror::Error;

/// Accepted bounds for the top-N input.
pub const TOP_N_MIN: i64 = 1;
pub const TOP_N_MAX: i64 = 1000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Top count must be between 1 and 1000, got {0}")]
    TopNOutOfRange(i64),
    #[error("'{0}' is not a whole number")]
    NotANumber(String),
}

/// A validated top-N limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopN(u16);

impl TopN {
    pub fn new(n: i64) -> Result<Self, ValidationError> {
        if (TOP_N_MIN..=TOP_N_MAX).contains(&n) {
            Ok(Self(n as u16))
        } else {
            Err(ValidationError::TopNOutOfRange(n))
        }
    }

    /// Parse user input from the top-N text field.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let n = text
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::NotANumber(text.trim().to_string()))?;
        Self::new(n)
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// Category selector value, with the "all" sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == category,
        }
    }
}

/// Direction of a threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Keep records whose value is ≤ the threshold.
    AtMost,
    /// Keep records whose value is ≥ the threshold.
    AtLeast,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold<F> {
    pub field: F,
    pub bound: Bound,
    /// `None` is the "all" sentinel.
    pub value: Option<f64>,
}

impl<F> Threshold<F> {
    fn accepts(&self, v: f64) -> bool {
        match (self.value, self.bound) {
            (None, _) => true,
            (Some(t), Bound::AtMost) => v <= t,
            (Some(t), Bound::AtLeast) => v >= t,
        }
    }
}

/// Inclusive `[min, max]` range on one field. `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter<F> {
    pub field: F,
    pub min: f64,
    pub max: f64,
}

impl<F> RangeFilter<F> {
    pub fn new(field: F, a: f64, b: f64) -> Self {
        Self {
            field,
            min: a.min(b),
            max: a.max(b),
        }
    }

    fn accepts(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Current values of every interactive query control of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState<F> {
    pub category: Selection,
    pub threshold: Option<Threshold<F>>,
    pub range: Option<RangeFilter<F>>,
    /// Field plotted on the magnitude axis.
    pub measure: F,
    pub sort: Option<F>,
    /// Sorting also switches the plotted measure.
    pub linked_sort: bool,
    pub top_n: Option<TopN>,
}

/// A control change coming from the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEvent<F> {
    SelectCategory(Selection),
    SetThreshold(Option<f64>),
    SetRangeMin(f64),
    SetRangeMax(f64),
    SelectMeasure(F),
    SortBy(F),
    SubmitTopN(String),
}

impl<F: FieldSpec> FilterState<F> {
    pub fn new(measure: F) -> Self {
        Self {
            category: Selection::All,
            threshold: None,
            range: None,
            measure,
            sort: None,
            linked_sort: false,
            top_n: None,
        }
    }

    /// Apply one control change, returning the next state.
    ///
    /// On a validation error `self` is the state to keep.
    pub fn reduce(&self, event: FilterEvent<F>) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        match event {
            FilterEvent::SelectCategory(selection) => next.category = selection,
            FilterEvent::SetThreshold(value) => {
                if let Some(threshold) = next.threshold.as_mut() {
                    threshold.value = value;
                }
            }
            FilterEvent::SetRangeMin(v) => {
                if let Some(range) = next.range {
                    next.range = Some(RangeFilter::new(range.field, v, range.max));
                }
            }
            FilterEvent::SetRangeMax(v) => {
                if let Some(range) = next.range {
                    next.range = Some(RangeFilter::new(range.field, range.min, v));
                }
            }
            FilterEvent::SelectMeasure(field) => next.measure = field,
            FilterEvent::SortBy(field) => {
                next.sort = Some(field);
                if next.linked_sort {
                    next.measure = field;
                }
            }
            FilterEvent::SubmitTopN(text) => next.top_n = Some(TopN::parse(&text)?),
        }
        Ok(next)
    }

    fn accepts<D: Datum<Field = F>>(&self, record: &D) -> bool {
        self.category.matches(record.category())
            && self
                .threshold
                .map_or(true, |t| t.accepts(record.value(t.field)))
            && self
                .range
                .map_or(true, |r| r.accepts(record.value(r.field)))
    }
}

/// Records satisfying a filter state, as ordered indices into the record slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredSet {
    pub rows: Vec<usize>,
}

impl FilteredSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter<'a, D>(&'a self, records: &'a [D]) -> impl Iterator<Item = &'a D> + 'a {
        self.rows.iter().map(move |&i| &records[i])
    }

    /// Values of one field over the set, in set order.
    pub fn values<D: Datum>(&self, records: &[D], field: D::Field) -> Vec<f64> {
        self.iter(records).map(|r| r.value(field)).collect()
    }
}

/// Filter, sort and truncate `records` according to `state`.
pub fn apply<D: Datum>(records: &[D], state: &FilterState<D::Field>) -> FilteredSet {
    let mut rows: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| state.accepts(*r))
        .map(|(i, _)| i)
        .collect();

    if let Some(field) = state.sort {
        // `sort_by` is stable, so ties keep input order.
        rows.sort_by(|&a, &b| records[b].value(field).total_cmp(&records[a].value(field)));
    }

    if let Some(top) = state.top_n {
        rows.truncate(top.get());
    }

    FilteredSet { rows }
}
