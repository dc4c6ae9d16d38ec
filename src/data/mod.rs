//! Data module - CSV loading, coercion and filtering

pub mod derive;
pub mod filter;
mod loader;
pub mod record;

pub use filter::{FilterEvent, FilterState, FilteredSet, Selection, ValidationError};
pub use loader::{Dataset, DatasetLoader, LoadError};
pub use record::{Datum, DetailCard, FieldSpec, RawRecord};
