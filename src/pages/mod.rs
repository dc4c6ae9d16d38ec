//! Pages module - Declarative descriptors for each dataset page
//!
//! A page is one dataset plus a [`PageSpec`]: which columns it needs, how its
//! fields map onto the chart, which controls it shows and its defaults. The
//! pipeline itself lives in [`crate::session`] and is shared by every page.

pub mod sales;
pub mod steam;
pub mod twitch;

use crate::charts::layout::Companion;
use crate::charts::scale::ColorScale;
use crate::charts::scene::Encoding;
use crate::data::{Datum, FilterState, FilteredSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageId {
    Steam,
    Twitch,
    Sales,
}

impl PageId {
    pub const ALL: [PageId; 3] = [PageId::Steam, PageId::Twitch, PageId::Sales];

    pub fn title(self) -> &'static str {
        match self {
            PageId::Steam => "Steam Games",
            PageId::Twitch => "Twitch Streamers",
            PageId::Sales => "Video Game Sales",
        }
    }
}

/// How the numeric threshold control is presented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdControl {
    /// Fixed choices; the `None` entry is the "all" sentinel.
    Choices(&'static [(&'static str, Option<f64>)]),
    /// Slider from 0 to the largest value in the dataset.
    Slider,
}

/// Which query controls a page exposes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controls<F: 'static> {
    /// Label of the category selector, if the page has one.
    pub category: Option<&'static str>,
    pub threshold: Option<(&'static str, ThresholdControl)>,
    /// Label of the paired min/max sliders.
    pub range: Option<&'static str>,
    /// Measure selector options; empty hides the selector.
    pub measures: &'static [F],
    pub sort_buttons: &'static [F],
    /// Show a single sort button that sorts by the selected measure.
    pub sort_by_measure: bool,
    pub top_n: bool,
}

/// Everything that makes one page different from another.
pub struct PageSpec<D: Datum> {
    pub title: &'static str,
    /// Columns that must be present (case-sensitive) for the load to succeed.
    pub required_columns: &'static [&'static str],
    pub encoding: Encoding<D::Field>,
    pub controls: Controls<D::Field>,
    /// Initial filter state, derived from the loaded records.
    pub defaults: fn(&[D]) -> FilterState<D::Field>,
    pub color: fn(&[D]) -> ColorScale,
    /// Aggregate charts shown under the main chart.
    pub companions: fn(&[D], &FilteredSet) -> Vec<Companion>,
    /// Fields summarized in the statistics grid.
    pub stats_fields: &'static [D::Field],
}

impl<D: Datum> Clone for PageSpec<D> {
    fn clone(&self) -> Self {
        Self {
            title: self.title,
            required_columns: self.required_columns,
            encoding: self.encoding,
            controls: self.controls,
            defaults: self.defaults,
            color: self.color,
            companions: self.companions,
            stats_fields: self.stats_fields,
        }
    }
}

/// Sorted, de-duplicated category names of `records`.
pub fn categories<D: Datum>(records: &[D]) -> Vec<String> {
    let mut names: Vec<String> = records.iter().map(|r| r.category().to_string()).collect();
    names.sort();
    names.dedup();
    names
}
