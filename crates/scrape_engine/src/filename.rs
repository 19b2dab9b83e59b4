const MAX_KEYWORD_LEN: usize = 40;

/// Filesystem-safe form of a keyword: alphanumerics, `-` and `_` survive,
/// everything else becomes `_`. Missing or blank keywords become `nokey`.
pub fn safe_keyword(keyword: Option<&str>) -> String {
    let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) else {
        return "nokey".to_string();
    };
    keyword
        .chars()
        .take(MAX_KEYWORD_LEN)
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Stored file name: `{username}_{keyword}_posts_{unix_ts}.csv`.
pub fn export_filename(username: &str, keyword: Option<&str>, unix_ts: i64) -> String {
    format!("{username}_{}_posts_{unix_ts}.csv", safe_keyword(keyword))
}

/// Name offered to the downloading client: `{username}_{keyword}_posts.csv`.
pub fn download_filename(username: &str, keyword: Option<&str>) -> String {
    format!("{username}_{}_posts.csv", safe_keyword(keyword))
}
