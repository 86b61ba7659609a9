//! Fetch, filter, sort and slice launch configurations.

use std::ops::Range;

use tracing::{debug, info};

use crate::error::LcFindResult;
use crate::inventory::{InventoryClient, LaunchConfigurationRecord};
use crate::params::{Query, SortOrder, SortSpec};

/// Run `query` against `inventory` and return the selected records.
pub async fn find_launch_configurations(
    query: &Query,
    inventory: &dyn InventoryClient,
) -> LcFindResult<Vec<LaunchConfigurationRecord>> {
    info!("Fetching launch configurations in {}", query.region);
    let fetched = inventory.fetch(&query.region).await?;
    debug!("Fetched {} launch configurations", fetched.len());

    let selected = apply_query(query, fetched);
    info!("Selected {} launch configurations", selected.len());
    Ok(selected)
}

/// The in-memory half of the pipeline: prefix filter, then sort and slice.
pub fn apply_query(
    query: &Query,
    records: Vec<LaunchConfigurationRecord>,
) -> Vec<LaunchConfigurationRecord> {
    let mut records = match &query.name_pattern {
        Some(pattern) => records
            .into_iter()
            .filter(|record| pattern.is_match(&record.name))
            .collect(),
        None => records,
    };

    if let Some(spec) = &query.sort {
        sort_and_slice(&mut records, spec);
    }

    records
}

fn sort_and_slice(records: &mut Vec<LaunchConfigurationRecord>, spec: &SortSpec) {
    match spec.order {
        SortOrder::Ascending => records.sort_by(|a, b| a.name.cmp(&b.name)),
        SortOrder::Descending => records.sort_by(|a, b| b.name.cmp(&a.name)),
    }

    let range = slice_range(records.len(), spec.start, spec.end);
    records.truncate(range.end);
    records.drain(..range.start);
}

/// Resolve optional `[start, end)` bounds against a sequence of length `len`.
///
/// Negative bounds count back from the end, and anything out of range is
/// clamped, so the result is always a valid (possibly empty) range.
pub fn slice_range(len: usize, start: Option<i64>, end: Option<i64>) -> Range<usize> {
    let start = start.map_or(0, |bound| resolve_bound(len, bound));
    let end = end.map_or(len, |bound| resolve_bound(len, bound));
    start..end.max(start)
}

fn resolve_bound(len: usize, bound: i64) -> usize {
    let offset = usize::try_from(bound.unsigned_abs()).unwrap_or(usize::MAX);
    if bound < 0 {
        len.saturating_sub(offset)
    } else {
        offset.min(len)
    }
}
