use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::raw::error_marker;
use crate::{PostRecord, RawResult, ScrapeError};

/// Captions longer than this are cut when deriving a title.
pub const TITLE_MAX_CHARS: usize = 50;

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("hashtag regex is valid"));

/// Title used when neither a provider title nor a caption exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleFallback {
    /// Leave the title empty.
    Empty,
    /// `Post N`, N being the 1-based position among emitted records.
    #[default]
    Placeholder,
}

impl FromStr for TitleFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" => Ok(Self::Empty),
            "placeholder" => Ok(Self::Placeholder),
            other => Err(format!("unknown title fallback '{other}'")),
        }
    }
}

/// Turns provider records into fixed-schema [`PostRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    pub title_fallback: TitleFallback,
}

impl Normalizer {
    pub fn new(title_fallback: TitleFallback) -> Self {
        Self { title_fallback }
    }

    /// Normalizes a decoded result.
    ///
    /// Non-object records are skipped. The first record carrying an error
    /// marker aborts with [`ScrapeError::AccountUnavailable`]. Zero surviving
    /// records is [`ScrapeError::EmptyResult`].
    pub fn normalize(&self, raw: RawResult) -> Result<Vec<PostRecord>, ScrapeError> {
        let records = match raw {
            RawResult::Records(records) => records,
            RawResult::Error(map) => {
                let message = error_marker(&map).unwrap_or_else(|| "no data".to_string());
                return Err(ScrapeError::AccountUnavailable(message));
            }
        };

        let mut posts = Vec::with_capacity(records.len());
        for record in &records {
            let Some(map) = record.as_object() else {
                continue;
            };
            if let Some(message) = error_marker(map) {
                return Err(ScrapeError::AccountUnavailable(message));
            }
            let position = posts.len() + 1;
            posts.push(self.normalize_record(map, position));
        }

        if posts.is_empty() {
            return Err(ScrapeError::EmptyResult);
        }
        Ok(posts)
    }

    fn normalize_record(&self, map: &Map<String, Value>, position: usize) -> PostRecord {
        let caption = string_field(map, &["caption"]).unwrap_or_default();
        let hashtags = structured_hashtags(map)
            .filter(|tags| !tags.is_empty())
            .unwrap_or_else(|| scan_hashtags(&caption));
        let title = string_field(map, &["title"])
            .filter(|t| !t.trim().is_empty())
            .or_else(|| derive_title(&caption))
            .unwrap_or_else(|| match self.title_fallback {
                TitleFallback::Empty => String::new(),
                TitleFallback::Placeholder => format!("Post {position}"),
            });

        PostRecord {
            caption,
            hashtags,
            title,
            post_id: string_field(map, &["id", "post_id", "shortCode"]),
            post_url: string_field(map, &["url", "post_url", "permalink"]),
            media_url: string_field(map, &["displayUrl", "media_url", "display_url"]),
            likes: count_field(map, &["likesCount", "likes", "like_count"]),
            comments_count: count_field(map, &["commentsCount", "comments_count", "comments"]),
            timestamp: string_field(map, &["timestamp", "taken_at"]),
        }
    }
}

/// Scans text for `#word` tokens, in order of appearance.
pub(crate) fn scan_hashtags(text: &str) -> Vec<String> {
    HASHTAG
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn structured_hashtags(map: &Map<String, Value>) -> Option<Vec<String>> {
    let tags = map.get("hashtags")?.as_array()?;
    Some(
        tags.iter()
            .filter_map(Value::as_str)
            .map(|tag| tag.trim().trim_start_matches('#').to_string())
            .filter(|tag| !tag.is_empty())
            .collect(),
    )
}

fn derive_title(caption: &str) -> Option<String> {
    if caption.is_empty() {
        return None;
    }
    let mut chars = caption.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        Some(format!("{head}..."))
    } else {
        Some(head)
    }
}

/// First present key rendered as text. Numbers are stringified; null is absent.
fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First present non-negative integer. Providers use `-1` for hidden counts.
fn count_field(map: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| {
        let value = map.get(*key)?;
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
    })
}
