//! Bundled sample data
//!
//! The demo works on a single fixed tabular dataset (wine recognition) that is
//! split into train and test partitions once per session setup.

mod split;
mod wine;

pub use split::{train_test_split, Partitions};
pub use wine::{load_wine, WINE_CLASS_COUNTS, WINE_FEATURES, WINE_TARGET};
