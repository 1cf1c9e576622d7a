//! Property normalization: turning a schema-free document into flat,
//! scalar graph properties.
//!
//! Normalization is a pure transform: it borrows the input and builds a
//! fresh map, so callers keep their original document untouched. Three
//! things are stripped: a fixed deny-list of structural fields (embedded
//! collections consumed elsewhere during ingestion, plus the raw document
//! id), null values, and anything else non-scalar. Dropping every remaining
//! non-scalar is what guarantees that consumed sub-records like `company`,
//! `firm` or `person` can never leak into stored properties.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::data::types::{PropertyMap, PropertyValue};

/// Structural fields removed before a document becomes node properties.
/// The embedded collections here are consumed by edge materialization or
/// are simply not graph-worthy; `_id` is the raw document-store identity,
/// carried separately as the resolved key.
pub const DISCARDED_PROPERTIES: &[&str] = &[
    "_id",
    "acquisition",
    "acquisitions",
    "available_sizes",
    "competitions",
    "degrees",
    "external_links",
    "funding_rounds",
    "funds",
    "image",
    "investments",
    "milestones",
    "offices",
    "partners",
    "products",
    "providerships",
    "relationships",
    "screenshots",
    "tag_list",
    "video_embeds",
    "web_presences",
];

/// Free-text fields that get sanitized.
pub const TEXT_FIELDS: &[&str] = &[
    "name",
    "first_name",
    "last_name",
    "overview",
    "description",
    "address1",
    "address2",
    "source_description",
];

/// Upper bound on replacements per field. Long descriptions can carry
/// hundreds of markup tags; the first occurrences are the ones that matter
/// for display, and an unbounded pass over megabyte-sized fields is wasted
/// work.
const SANITIZE_CAP: usize = 20;

static SANITIZE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\t\n\r\x0B\x0C]|</?p>").expect("sanitize pattern is valid"));

/// Result of normalizing one record.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub properties: PropertyMap,
    /// Count of text fields carrying U+FFFD replacement characters,
    /// evidence the document went through lossy decoding upstream.
    pub encoding_artifacts: usize,
}

/// Replaces control characters and inline paragraph tags with a single
/// space each, bounded to the first occurrences per field.
pub fn sanitize_text(text: &str) -> String {
    SANITIZE_PATTERN.replacen(text, SANITIZE_CAP, " ").into_owned()
}

/// Normalizes a raw document into scalar properties. Pure: the input map is
/// only borrowed and is never mutated.
pub fn normalize_record(record: &Map<String, Value>) -> Normalized {
    let mut normalized = Normalized::default();

    for (field, value) in record {
        if DISCARDED_PROPERTIES.contains(&field.as_str()) {
            continue;
        }
        if value.is_null() {
            continue;
        }

        if TEXT_FIELDS.contains(&field.as_str()) {
            if let Some(text) = value.as_str() {
                if text.contains('\u{FFFD}') {
                    normalized.encoding_artifacts += 1;
                }
                normalized.properties.insert(
                    field.clone(),
                    PropertyValue::String(sanitize_text(text)),
                );
                continue;
            }
        }

        if let Some(scalar) = PropertyValue::from_json(value) {
            normalized.properties.insert(field.clone(), scalar);
        }
    }

    normalized
}
