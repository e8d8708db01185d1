pub mod categories;
pub mod check;
pub mod quota;
pub mod setup;
pub mod shell;
pub mod ui;

use crate::core::MetricCategory;
use std::collections::BTreeSet;

/// Turns a list of requested categories into a selection; none means all.
pub fn selection(categories: &[MetricCategory]) -> BTreeSet<MetricCategory> {
    if categories.is_empty() {
        MetricCategory::ALL.into_iter().collect()
    } else {
        categories.iter().copied().collect()
    }
}
