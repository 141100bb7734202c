// reserved document field names

/// Logical document-identifier field stored inside the document blob.
///
/// This is an alias, not a physical column: in composite-key scenarios the
/// stored `_id` and the physical key may differ, so backends must route this
/// name to the JSON `_id` key of the blob.
pub const DOC_ID: &str = "_id";
