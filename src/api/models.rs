//! Serde models for the gallery API payloads.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Placeholder title for deviations the API returns without one.
pub const DEFAULT_TITLE: &str = "Untitled";
/// Placeholder for deviations without downloadable content.
pub const DEFAULT_IMAGE_URL: &str = "No Image";
/// Placeholder for metadata entries without a description.
pub const DEFAULT_DESCRIPTION: &str = "No Description";

/// One page of a paginated listing response.
///
/// The walk over a listing continues at `next_offset` while the server
/// reports `has_more`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    /// Items on this page, in server order.
    #[serde(default)]
    pub results: Vec<T>,
    /// Whether another page exists.
    #[serde(default)]
    pub has_more: bool,
    /// Offset of the next page, when one exists.
    #[serde(default)]
    pub next_offset: Option<u64>,
}

/// A single content item as returned by the listing endpoints.
///
/// Fields the exporter does not interpret stay available through `raw`.
/// Deviations are never mutated after deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct Deviation {
    /// Opaque stable identifier; the resumability key.
    pub deviationid: String,
    /// Display title, absent for some items.
    #[serde(default)]
    pub title: Option<String>,
    /// Primary content descriptor, absent for literature and journals.
    #[serde(default)]
    pub content: Option<DeviationContent>,
    /// Remainder of the provider payload, kept verbatim.
    #[serde(flatten)]
    pub raw: serde_json::Map<String, Value>,
}

impl Deviation {
    /// Title with absence mapped to a fixed placeholder.
    #[must_use]
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    /// Image source URL with absence mapped to a fixed placeholder.
    #[must_use]
    pub fn image_url_or_default(&self) -> &str {
        self.content
            .as_ref()
            .and_then(|content| content.src.as_deref())
            .unwrap_or(DEFAULT_IMAGE_URL)
    }
}

/// The `content` descriptor of a deviation.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviationContent {
    /// Source URL of the full-size image.
    #[serde(default)]
    pub src: Option<String>,
    /// Remainder of the content descriptor.
    #[serde(flatten)]
    pub raw: serde_json::Map<String, Value>,
}

/// A gallery folder; folders nest through `subfolders`.
///
/// Immutable once fetched. Traversal order is depth-first, parent before
/// children (see [`crate::select::select_folders`]).
#[derive(Debug, Clone, Deserialize)]
pub struct Folder {
    /// Opaque folder identifier.
    pub folderid: String,
    /// Display name.
    pub name: String,
    /// Whether the folder has nested subfolders.
    #[serde(default)]
    pub has_subfolders: bool,
    /// Nested subfolders; the API sends `null` for leaves.
    #[serde(default, deserialize_with = "null_as_empty_vec")]
    pub subfolders: Vec<Folder>,
}

/// Response envelope of the metadata endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MetadataResponse {
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

/// Per-deviation entry from the metadata endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataEntry {
    /// Id of the deviation this entry describes.
    pub deviationid: String,
    /// Rich-text description, absent for some items.
    #[serde(default)]
    pub description: Option<String>,
}

/// Description of a deviation in raw and normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviationMetadata {
    /// Raw rich-text description.
    pub html: String,
    /// Plain-text reduction of `html`.
    pub text: String,
}

fn null_as_empty_vec<'de, D>(deserializer: D) -> Result<Vec<Folder>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Vec<Folder>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deviation_defaults_for_missing_title_and_content() {
        let deviation: Deviation =
            serde_json::from_value(serde_json::json!({ "deviationid": "d1" })).unwrap();
        assert_eq!(deviation.title_or_default(), DEFAULT_TITLE);
        assert_eq!(deviation.image_url_or_default(), DEFAULT_IMAGE_URL);
    }

    #[test]
    fn test_deviation_retains_unmodeled_payload_fields() {
        let deviation: Deviation = serde_json::from_value(serde_json::json!({
            "deviationid": "d1",
            "title": "Dawn",
            "is_mature": false,
            "stats": {"comments": 4}
        }))
        .unwrap();
        assert_eq!(deviation.title_or_default(), "Dawn");
        assert_eq!(deviation.raw["is_mature"], serde_json::json!(false));
        assert_eq!(deviation.raw["stats"]["comments"], serde_json::json!(4));
    }

    #[test]
    fn test_folder_null_subfolders_becomes_empty() {
        let folder: Folder = serde_json::from_value(serde_json::json!({
            "folderid": "f1",
            "name": "Featured",
            "has_subfolders": false,
            "subfolders": null
        }))
        .unwrap();
        assert!(folder.subfolders.is_empty());
    }

    #[test]
    fn test_folder_nested_subfolders_parse() {
        let folder: Folder = serde_json::from_value(serde_json::json!({
            "folderid": "f1",
            "name": "Art",
            "has_subfolders": true,
            "subfolders": [
                {"folderid": "f2", "name": "Sketches", "has_subfolders": false}
            ]
        }))
        .unwrap();
        assert_eq!(folder.subfolders.len(), 1);
        assert_eq!(folder.subfolders[0].name, "Sketches");
    }

    #[test]
    fn test_page_defaults_when_fields_missing() {
        let page: Page<Deviation> = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(page.results.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.next_offset, None);
    }
}
