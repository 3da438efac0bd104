//! Batched metadata lookups.
//!
//! The metadata endpoint accepts a list of deviation ids per call. Ids are
//! partitioned into contiguous chunks and each chunk is resolved with one
//! request carrying only that chunk's ids. A failed chunk is logged and
//! skipped; its deviations simply stay absent from the returned map.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::GalleryClient;
use super::models::{DEFAULT_DESCRIPTION, Deviation, DeviationMetadata};
use crate::normalize::html_to_text;

/// Maximum deviation ids per metadata request.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Resolves descriptions for `deviations`, `batch_size` ids per request.
///
/// Returns a map from deviation id to its raw and normalized description.
/// Entries without a description get [`DEFAULT_DESCRIPTION`]; deviations
/// whose batch failed get no entry at all (the writer substitutes empty
/// fields).
pub async fn fetch_metadata(
    client: &GalleryClient,
    deviations: &[Deviation],
    batch_size: usize,
) -> HashMap<String, DeviationMetadata> {
    let batch_size = batch_size.max(1);
    let mut metadata = HashMap::with_capacity(deviations.len());

    for batch in deviations.chunks(batch_size) {
        let ids: Vec<&str> = batch
            .iter()
            .map(|deviation| deviation.deviationid.as_str())
            .collect();

        let entries = match client.metadata(&ids).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, batch_len = ids.len(), "metadata batch failed, skipping");
                continue;
            }
        };
        debug!(
            requested = ids.len(),
            received = entries.len(),
            "metadata batch resolved"
        );

        for entry in entries {
            let html = entry
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
            let text = html_to_text(&html);
            metadata.insert(entry.deviationid, DeviationMetadata { html, text });
        }
    }

    metadata
}
