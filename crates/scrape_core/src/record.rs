use serde::Serialize;

/// Column order of the exported CSV. Every row fills every column.
pub const CSV_COLUMNS: [&str; 10] = [
    "post_id",
    "timestamp",
    "caption",
    "title",
    "hashtags",
    "likes",
    "comments_count",
    "post_url",
    "media_url",
    "keyword",
];

/// One normalized post. Missing provider data falls back to the field default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PostRecord {
    pub caption: String,
    pub hashtags: Vec<String>,
    pub title: String,
    pub post_id: Option<String>,
    pub post_url: Option<String>,
    pub media_url: Option<String>,
    pub likes: Option<u64>,
    pub comments_count: Option<u64>,
    pub timestamp: Option<String>,
}

impl PostRecord {
    /// Hashtags rendered as `#a #b`.
    pub fn hashtags_joined(&self) -> String {
        self.hashtags
            .iter()
            .map(|tag| format!("#{tag}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Cell values in [`CSV_COLUMNS`] order.
    pub fn csv_cells(&self, keyword: &str) -> [String; 10] {
        [
            self.post_id.clone().unwrap_or_default(),
            self.timestamp.clone().unwrap_or_default(),
            self.caption.clone(),
            self.title.clone(),
            self.hashtags_joined(),
            self.likes.map(|n| n.to_string()).unwrap_or_default(),
            self.comments_count.map(|n| n.to_string()).unwrap_or_default(),
            self.post_url.clone().unwrap_or_default(),
            self.media_url.clone().unwrap_or_default(),
            keyword.to_string(),
        ]
    }
}
