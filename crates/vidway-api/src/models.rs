//! Typed views over raw video data API responses.
//!
//! The gateway stores and caches raw JSON payloads; these models are the
//! typed layer the facade hands to callers. Each constructor tolerates
//! missing optional fields and skips items it cannot identify.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry from a search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub video_id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: String,
    pub thumbnail_url: String,
    pub description: String,
}

impl SearchResult {
    /// Extracts search results from a raw `search` response payload.
    ///
    /// Items without a video id are skipped.
    pub fn from_response(response: &Value) -> Vec<SearchResult> {
        items(response)
            .iter()
            .filter_map(|item| {
                let video_id = item
                    .pointer("/id/videoId")
                    .and_then(Value::as_str)?
                    .to_string();
                let snippet = item.get("snippet")?;
                Some(SearchResult {
                    video_id,
                    title: str_field(snippet, "title"),
                    channel_id: str_field(snippet, "channelId"),
                    channel_title: str_field(snippet, "channelTitle"),
                    published_at: str_field(snippet, "publishedAt"),
                    thumbnail_url: thumbnail_url(snippet),
                    description: str_field(snippet, "description"),
                })
            })
            .collect()
    }
}

/// Metadata for a single video from a `videos` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: String,
    pub thumbnail_url: String,
    pub duration: Option<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl VideoMetadata {
    /// Extracts video metadata from a raw `videos` response payload.
    pub fn from_response(response: &Value) -> Vec<VideoMetadata> {
        items(response)
            .iter()
            .filter_map(|item| {
                let video_id = item.get("id").and_then(Value::as_str)?.to_string();
                let snippet = item.get("snippet").cloned().unwrap_or_default();
                let statistics = item.get("statistics").cloned().unwrap_or_default();
                Some(VideoMetadata {
                    video_id,
                    title: str_field(&snippet, "title"),
                    description: str_field(&snippet, "description"),
                    channel_id: str_field(&snippet, "channelId"),
                    channel_title: str_field(&snippet, "channelTitle"),
                    published_at: str_field(&snippet, "publishedAt"),
                    thumbnail_url: thumbnail_url(&snippet),
                    duration: item
                        .pointer("/contentDetails/duration")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    view_count: count_field(&statistics, "viewCount"),
                    like_count: count_field(&statistics, "likeCount"),
                    comment_count: count_field(&statistics, "commentCount"),
                    tags: snippet
                        .get("tags")
                        .and_then(Value::as_array)
                        .map(|tags| {
                            tags.iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default(),
                })
            })
            .collect()
    }
}

/// A top-level comment from a `commentThreads` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub author: String,
    pub text: String,
    pub like_count: u64,
    pub reply_count: Option<u64>,
    pub published_at: String,
}

impl Comment {
    /// Extracts top-level comments from a raw `commentThreads` payload.
    pub fn from_response(response: &Value) -> Vec<Comment> {
        items(response)
            .iter()
            .filter_map(|item| {
                let comment_id = item.get("id").and_then(Value::as_str)?.to_string();
                let snippet = item.pointer("/snippet/topLevelComment/snippet")?;
                Some(Comment {
                    comment_id,
                    author: str_field(snippet, "authorDisplayName"),
                    text: str_field(snippet, "textDisplay"),
                    like_count: count_field(snippet, "likeCount").unwrap_or(0),
                    reply_count: item
                        .pointer("/snippet/totalReplyCount")
                        .and_then(Value::as_u64),
                    published_at: str_field(snippet, "publishedAt"),
                })
            })
            .collect()
    }
}

/// A single transcript segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Channel information from a `channels` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub subscriber_count: Option<u64>,
    pub video_count: Option<u64>,
    pub view_count: Option<u64>,
}

impl ChannelInfo {
    /// Extracts channel records from a raw `channels` response payload.
    pub fn from_response(response: &Value) -> Vec<ChannelInfo> {
        items(response)
            .iter()
            .filter_map(|item| {
                let channel_id = item.get("id").and_then(Value::as_str)?.to_string();
                let snippet = item.get("snippet").cloned().unwrap_or_default();
                let statistics = item.get("statistics").cloned().unwrap_or_default();
                Some(ChannelInfo {
                    channel_id,
                    title: str_field(&snippet, "title"),
                    description: str_field(&snippet, "description"),
                    published_at: str_field(&snippet, "publishedAt"),
                    subscriber_count: count_field(&statistics, "subscriberCount"),
                    video_count: count_field(&statistics, "videoCount"),
                    view_count: count_field(&statistics, "viewCount"),
                })
            })
            .collect()
    }
}

fn items(response: &Value) -> &[Value] {
    response
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn str_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Statistics arrive as strings ("12345") from the remote API.
fn count_field(value: &Value, field: &str) -> Option<u64> {
    match value.get(field)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn thumbnail_url(snippet: &Value) -> String {
    for size in ["high", "medium", "default"] {
        if let Some(url) = snippet
            .pointer(&format!("/thumbnails/{size}/url"))
            .and_then(Value::as_str)
        {
            return url.to_string();
        }
    }
    String::new()
}
