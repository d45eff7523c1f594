//! Explicit per-stage configuration. Nothing is read from the process
//! environment here except through [`api_key_from_env`].

use std::path::PathBuf;

use clap::ValueEnum;

use crate::error::{Error, Result};

/// Environment variable holding the YouTube Data API key.
pub const API_KEY_ENV: &str = "YT_API_KEY";
/// Matching comments kept per video unless overridden.
pub const DEFAULT_QUOTA: usize = 10;
/// Largest page the comment-thread endpoint serves.
pub const PAGE_SIZE: u32 = 100;
/// Words tested for topic association unless overridden.
pub const DEFAULT_TOP_WORDS: usize = 10;
/// Rows shown in the word-count preview of the summary.
pub const PREVIEW_ROWS: usize = 5;

pub const DEFAULT_VIDEO_LIST: &str = "data/videolist.csv";
pub const DEFAULT_RAW_COMMENTS: &str = "data/raw/comments.json";
pub const DEFAULT_NORMALIZED_COMMENTS: &str = "data/processed/comments.csv";
pub const DEFAULT_STOPWORDS: &str = "data/stopwords.txt";
pub const DEFAULT_SUMMARY: &str = "data/processed/summary.txt";

/// What the collector does when fetching one video fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OnVideoError {
    /// Stop the whole run; nothing is written.
    #[default]
    Abort,
    /// Log the failure, remember the video id and continue with the next video.
    Skip,
}

#[derive(Debug, Clone)]
pub struct CollectConfig {
    pub api_key: String,
    pub video_list: PathBuf,
    pub output: PathBuf,
    pub quota: usize,
    pub on_video_error: OnVideoError,
}

impl CollectConfig {
    /// Fails with [`Error::Config`] when no usable API key was supplied.
    pub fn new(
        api_key: Option<String>,
        video_list: PathBuf,
        output: PathBuf,
        quota: usize,
        on_video_error: OnVideoError,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => {
                return Err(Error::Config(format!(
                    "{API_KEY_ENV} environment variable is not set"
                )));
            }
        };
        Ok(Self {
            api_key,
            video_list,
            output,
            quota,
            on_video_error,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_RAW_COMMENTS),
            output: PathBuf::from(DEFAULT_NORMALIZED_COMMENTS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    pub input: PathBuf,
    pub stopwords: PathBuf,
    pub output: PathBuf,
    pub top_words: usize,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_NORMALIZED_COMMENTS),
            stopwords: PathBuf::from(DEFAULT_STOPWORDS),
            output: PathBuf::from(DEFAULT_SUMMARY),
            top_words: DEFAULT_TOP_WORDS,
        }
    }
}

/// Reads the API key from [`API_KEY_ENV`]. Absent or non-unicode values yield `None`.
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok()
}
