//! Result aggregation: ordered lookup results into one dataset

use crate::types::{AggregatedDataset, LookupResult};

/// Merge the ordered sequence of successful lookup results into one dataset
///
/// The order established by the fetch coordinator (input order) is preserved.
/// An empty input yields an empty dataset, not an error. The all-or-nothing
/// contract is enforced upstream: this is never invoked when any lookup
/// failed terminally.
pub fn aggregate(results: Vec<LookupResult>) -> AggregatedDataset {
    let dataset = AggregatedDataset::new(results);
    tracing::debug!(
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "aggregated lookup results"
    );
    dataset
}
