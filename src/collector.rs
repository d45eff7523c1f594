//! Comment collection from the YouTube Data API (`commentThreads.list`).
//!
//! The HTTP client sits behind [`CommentSource`] so the paging and quota
//! logic can run against any page provider.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Request};
use serde::{Deserialize, Serialize};

use crate::config::{CollectConfig, OnVideoError, PAGE_SIZE};
use crate::error::{Error, Result};
use crate::{contains_hebrew_letter, write_text_file};

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// One row of the video list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub video_id: String,
    pub topic: String,
}

/// A matching comment as written to the raw JSON artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawComment {
    pub video_id: String,
    pub topic: String,
    pub author: String,
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub likes: u64,
}

/// One page of `commentThreads.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadPage {
    #[serde(default)]
    pub items: Vec<CommentThread>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThread {
    pub snippet: ThreadSnippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSnippet {
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    pub text_display: String,
    pub author_display_name: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub like_count: u64,
}

/// Anything that can serve pages of top-level comment threads for a video.
pub trait CommentSource {
    /// Fetch one page. `page_token` is `None` for the first page.
    fn fetch_page(&mut self, video_id: &str, page_token: Option<&str>)
    -> Result<CommentThreadPage>;
}

/// Blocking client for the YouTube Data API v3.
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Create a client against a different API root (proxies, local stubs).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the `commentThreads.list` request; `pageToken` is sent only for continuations.
    fn page_request(&self, video_id: &str, page_token: Option<&str>) -> Result<Request> {
        let url = format!("{}/commentThreads", self.base_url);
        let mut query: Vec<(&str, String)> = vec![
            ("part", "snippet".to_string()),
            ("videoId", video_id.to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
            ("textFormat", "plainText".to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        Ok(self.client.get(&url).query(&query).build()?)
    }
}

impl CommentSource for YouTubeClient {
    fn fetch_page(
        &mut self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentThreadPage> {
        let request = self.page_request(video_id, page_token)?;
        let response = self.client.execute(request)?;
        let status = response.status();
        let body = response.text()?;
        parse_page_response(video_id, status, &body)
    }
}

/// Maps a non-success status to [`Error::Api`], otherwise decodes the page.
fn parse_page_response(
    video_id: &str,
    status: StatusCode,
    body: &str,
) -> Result<CommentThreadPage> {
    if !status.is_success() {
        return Err(Error::Api(format!(
            "{status} for video {video_id}: {}",
            api_error_message(body)
        )));
    }
    Ok(serde_json::from_str(body)?)
}

/// Pulls `error.message` out of a Google API error body, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Pages through one video's comment threads until `quota` Hebrew comments
/// were kept or the service has no further page.
pub fn collect_video<S: CommentSource + ?Sized>(
    source: &mut S,
    video: &VideoEntry,
    quota: usize,
) -> Result<Vec<RawComment>> {
    let mut comments: Vec<RawComment> = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    while comments.len() < quota {
        let page = source.fetch_page(&video.video_id, page_token.as_deref())?;
        pages += 1;
        debug!(
            "video {}: page {} with {} threads",
            video.video_id,
            pages,
            page.items.len()
        );

        for thread in page.items {
            let snippet = thread.snippet.top_level_comment.snippet;
            if !contains_hebrew_letter(&snippet.text_display) {
                continue;
            }
            comments.push(RawComment {
                video_id: video.video_id.clone(),
                topic: video.topic.clone(),
                author: snippet.author_display_name,
                text: snippet.text_display,
                published_at: snippet.published_at,
                likes: snippet.like_count,
            });
            if comments.len() >= quota {
                break;
            }
        }

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }
    Ok(comments)
}

/// Result of a collection run.
#[derive(Debug, Default)]
pub struct CollectionReport {
    pub comments: Vec<RawComment>,
    /// Videos skipped under [`OnVideoError::Skip`].
    pub failed_videos: Vec<String>,
}

/// Collects every video in order. Under [`OnVideoError::Abort`] the first
/// failure ends the run and the comments gathered so far are discarded.
pub fn collect_comments<S: CommentSource + ?Sized>(
    source: &mut S,
    videos: &[VideoEntry],
    quota: usize,
    on_video_error: OnVideoError,
) -> Result<CollectionReport> {
    let mut report = CollectionReport::default();
    for video in videos {
        match collect_video(source, video, quota) {
            Ok(comments) => {
                info!(
                    "{} comments collected for video {} ({})",
                    comments.len(),
                    video.video_id,
                    video.topic
                );
                report.comments.extend(comments);
            }
            Err(e) if on_video_error == OnVideoError::Skip => {
                warn!("Skipping video {}: {}", video.video_id, e);
                report.failed_videos.push(video.video_id.clone());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}

/// Reads the `video_id,topic` CSV. Extra columns are ignored.
pub fn load_video_list(path: &Path) -> Result<Vec<VideoEntry>> {
    let file = File::open(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let mut videos = Vec::new();
    for row in reader.deserialize() {
        videos.push(row?);
    }
    Ok(videos)
}

/// Writes the comments as a pretty-printed JSON array, replacing any existing file.
pub fn write_raw_comments(path: &Path, comments: &[RawComment]) -> Result<()> {
    let json = serde_json::to_string_pretty(comments)?;
    write_text_file(path, &json)
}

/// Collector entry point: video list in, raw JSON out.
pub fn run_collect(config: &CollectConfig) -> Result<CollectionReport> {
    let videos = load_video_list(&config.video_list)?;
    let mut client = YouTubeClient::new(&config.api_key)?;
    let report = collect_comments(&mut client, &videos, config.quota, config.on_video_error)?;
    write_raw_comments(&config.output, &report.comments)?;
    info!(
        "Total comments saved: {} in {}",
        report.comments.len(),
        config.output.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parses_comment_thread_page() {
        let body = r#"{
            "kind": "youtube#commentThreadListResponse",
            "nextPageToken": "QURTSl9p",
            "pageInfo": {"totalResults": 1, "resultsPerPage": 100},
            "items": [{
                "kind": "youtube#commentThread",
                "id": "Ugx",
                "snippet": {
                    "videoId": "v1",
                    "topLevelComment": {
                        "id": "Ugx",
                        "snippet": {
                            "textDisplay": "כל הכבוד!",
                            "textOriginal": "כל הכבוד!",
                            "authorDisplayName": "@dana",
                            "likeCount": 7,
                            "publishedAt": "2024-03-01T10:15:00Z",
                            "updatedAt": "2024-03-01T10:15:00Z"
                        }
                    },
                    "totalReplyCount": 0
                }
            }]
        }"#;
        let page: CommentThreadPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("QURTSl9p"));
        let snippet = &page.items[0].snippet.top_level_comment.snippet;
        assert_eq!(snippet.text_display, "כל הכבוד!");
        assert_eq!(snippet.author_display_name, "@dana");
        assert_eq!(snippet.like_count, 7);
        assert_eq!(snippet.published_at.to_rfc3339(), "2024-03-01T10:15:00+00:00");
    }

    #[test]
    fn last_page_has_no_token_and_may_lack_items() {
        let page: CommentThreadPage = serde_json::from_str(r#"{"kind":"x"}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }

    fn query_of(request: &Request) -> HashMap<String, String> {
        request.url().query_pairs().into_owned().collect()
    }

    #[test]
    fn first_page_request_has_no_page_token() {
        let client =
            YouTubeClient::with_base_url("secret", "https://stub.local/youtube/v3/").unwrap();
        let request = client.page_request("dQw4w9WgXcQ", None).unwrap();

        assert_eq!(request.method(), &reqwest::Method::GET);
        assert_eq!(request.url().host_str(), Some("stub.local"));
        assert_eq!(request.url().path(), "/youtube/v3/commentThreads");
        let query = query_of(&request);
        assert_eq!(query["part"], "snippet");
        assert_eq!(query["videoId"], "dQw4w9WgXcQ");
        assert_eq!(query["maxResults"], "100");
        assert_eq!(query["textFormat"], "plainText");
        assert_eq!(query["key"], "secret");
        assert!(!query.contains_key("pageToken"));
    }

    #[test]
    fn continuation_request_carries_page_token() {
        let client = YouTubeClient::new("secret").unwrap();
        let request = client.page_request("v1", Some("QURTSl9p+/=")).unwrap();

        assert!(request.url().as_str().starts_with(BASE_URL));
        let query = query_of(&request);
        assert_eq!(query["pageToken"], "QURTSl9p+/=");
        assert_eq!(query["maxResults"], "100");
        assert_eq!(query["textFormat"], "plainText");
    }

    #[test]
    fn error_status_becomes_api_error() {
        let body = r#"{"error":{"code":403,"message":"The video identified by the videoId parameter has disabled comments.","errors":[{"reason":"commentsDisabled"}]}}"#;
        let err = parse_page_response("v9", StatusCode::FORBIDDEN, body).unwrap_err();
        match err {
            Error::Api(msg) => {
                assert!(msg.starts_with("403 Forbidden for video v9: "), "{msg}");
                assert!(msg.ends_with("has disabled comments."), "{msg}");
            }
            other => panic!("expected Error::Api, got {other:?}"),
        }
    }

    #[test]
    fn success_status_decodes_page() {
        let body = r#"{"items":[],"nextPageToken":"abc"}"#;
        let page = parse_page_response("v1", StatusCode::OK, body).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));

        let garbled = parse_page_response("v1", StatusCode::OK, "<html>");
        assert!(matches!(garbled, Err(Error::Json(_))));
    }

    #[test]
    fn api_error_message_prefers_error_message() {
        let body = r#"{"error":{"code":403,"message":"The video has disabled comments."}}"#;
        assert_eq!(api_error_message(body), "The video has disabled comments.");
        assert_eq!(api_error_message(" gateway timeout "), "gateway timeout");
    }
}
