#![forbid(unsafe_code)]
//! # yt_comment_analysis
//!
//! Three batch stages that each read the previous stage's file:
//!
//! 1. [`collector`] pages through the YouTube comment-thread API and keeps
//!    comments that contain at least one Hebrew letter.
//! 2. [`normalizer`] strips everything outside the Hebrew block and writes a
//!    `Comment,Author,Topic` CSV.
//! 3. [`analyzer`] counts words and topics and runs a chi-square test of
//!    topic against the presence of each of the most common words.
//!
//! The helpers in this file are shared by the stages.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

pub mod analyzer;
pub mod collector;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod stats;

pub use analyzer::{
    AnalysisReport, AnalysisRow, CommentRecord, ContingencyCell, ContingencyTable,
    WordAssociation, analyze, load_comments, load_stopwords, prepare_rows, run_analyze,
    topic_distribution, top_words, word_count, word_frequency,
};
pub use collector::{
    CollectionReport, CommentSource, CommentThreadPage, RawComment, VideoEntry, YouTubeClient,
    collect_comments, collect_video, load_video_list, run_collect, write_raw_comments,
};
pub use config::{AnalyzeConfig, CollectConfig, NormalizeConfig, OnVideoError};
pub use error::{Error, Result};
pub use normalizer::{
    NormalizedComment, load_raw_comments, normalize, run_normalize, write_normalized_csv,
};
pub use stats::{ChiSquareResult, chi2_contingency};

/// The 27 letters of the Hebrew alphabet, final forms included.
pub const HEBREW_LETTERS: &str = "אבגדהוזחטיכלמנסעפצקרשתךםןףץ";

// Whole Hebrew block: letters, points, cantillation marks, maqaf, geresh.
static HEBREW_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{0590}-\u{05FF}]+").expect("valid Hebrew block regex"));

/// True if `text` contains at least one Hebrew letter.
/// # Example
/// ```
/// use yt_comment_analysis::contains_hebrew_letter;
/// assert!(contains_hebrew_letter("great video שלום"));
/// assert!(!contains_hebrew_letter("great video"));
/// ```
pub fn contains_hebrew_letter(text: &str) -> bool {
    text.chars().any(|c| HEBREW_LETTERS.contains(c))
}

/// Keeps only the maximal runs of Hebrew-block characters and joins them with single spaces.
/// # Example
/// ```
/// use yt_comment_analysis::hebrew_runs;
/// assert_eq!(hebrew_runs("Hello שלום world!!"), "שלום");
/// assert_eq!(hebrew_runs("no hebrew here"), "");
/// ```
pub fn hebrew_runs(text: &str) -> String {
    HEBREW_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .collect::<Vec<&str>>()
        .join(" ")
}

///Counts the quantity of each item. Returns Vec<(item, count)> in first-seen order.
/// # Example
/// ```
/// use yt_comment_analysis::count_in_order;
/// let counted = count_in_order(["b", "a", "b"]);
/// assert_eq!(counted, vec![("b".to_string(), 2), ("a".to_string(), 1)]);
/// ```
pub fn count_in_order<I, S>(items: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counted: Vec<(String, usize)> = Vec::new();
    for item in items {
        let item = item.as_ref();
        match index.get(item) {
            Some(&i) => counted[i].1 += 1,
            None => {
                index.insert(item.to_string(), counted.len());
                counted.push((item.to_string(), 1));
            }
        }
    }
    counted
}

///Sort counted items by frequency, descending. Ties keep their incoming order.
/// # Example
/// ```
/// use yt_comment_analysis::sort_by_frequency;
/// let counted = vec![("one".to_string(), 1), ("two".to_string(), 2), ("uno".to_string(), 1)];
/// let expected = vec![("two".to_string(), 2), ("one".to_string(), 1), ("uno".to_string(), 1)];
/// assert_eq!(sort_by_frequency(counted), expected);
/// ```
pub fn sort_by_frequency(mut counted: Vec<(String, usize)>) -> Vec<(String, usize)> {
    // sort_by is stable
    counted.sort_by(|a, b| b.1.cmp(&a.1));
    counted
}

///Write `contents` to `path`, creating missing parent directories and overwriting any existing file.
pub fn write_text_file(path: &Path, contents: &str) -> Result<()> {
    create_parent_dir(path)?;
    fs::write(path, contents).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn create_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| Error::File {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

pub(crate) fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })
}
