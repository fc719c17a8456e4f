//! Core domain types for presentation generation: page layouts, length
//! conversion, element options, object-fit geometry, resource
//! classification and the presentation-wide resource counters.

pub mod classify;
pub mod counters;
pub mod error;
pub mod fit;
pub mod options;
pub mod types;
pub mod units;

pub use counters::{ResourceCounters, SharedCounters};
pub use error::{Error, Result};
pub use fit::{FitBox, FitDirective, FitPolicy, ObjectFit, SourceSize};
pub use options::*;
pub use types::{DocumentInfo, Layout, ThemeOptions, DEFAULT_LAYOUT, DEFAULT_SLIDE_MARGIN_IN};
pub use units::{Axis, Length};
