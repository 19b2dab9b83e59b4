use crate::PostRecord;

/// Keeps records whose caption contains `keyword`, ignoring case.
///
/// A missing or blank keyword keeps everything.
pub fn filter_by_keyword(records: Vec<PostRecord>, keyword: Option<&str>) -> Vec<PostRecord> {
    let Some(needle) = keyword.map(str::trim).filter(|k| !k.is_empty()) else {
        return records;
    };
    let needle = needle.to_lowercase();
    records
        .into_iter()
        .filter(|record| record.caption.to_lowercase().contains(&needle))
        .collect()
}
