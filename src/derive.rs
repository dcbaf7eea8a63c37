// src/derive.rs

use crate::model::{DerivedSeries, SampleSet};

/// Stores each derived series as the sum of its parts, in declaration order,
/// so a derived series may build on an earlier one.
pub fn apply_derived(samples: &mut SampleSet, derived: &[DerivedSeries]) {
    for sample in samples.iter_mut() {
        for series in derived {
            let total = series.sum.iter().map(|part| sample.count(part)).sum();
            sample.counts.insert(series.name.clone(), total);
        }
    }
}
