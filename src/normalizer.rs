//! Turns the raw JSON artifact into the `Comment,Author,Topic` table.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::collector::RawComment;
use crate::config::NormalizeConfig;
use crate::error::{Error, Result};
use crate::{create_parent_dir, hebrew_runs, read_text_file};

/// One row of the normalized table. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedComment {
    #[serde(rename = "Comment")]
    pub comment: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Topic")]
    pub topic: String,
}

impl From<&RawComment> for NormalizedComment {
    fn from(raw: &RawComment) -> Self {
        Self {
            comment: hebrew_runs(&raw.text),
            author: raw.author.clone(),
            topic: raw.topic.clone(),
        }
    }
}

/// One output row per input record; rows whose text has no Hebrew keep an empty `Comment`.
pub fn normalize(raw: &[RawComment]) -> Vec<NormalizedComment> {
    raw.iter().map(NormalizedComment::from).collect()
}

pub fn load_raw_comments(path: &Path) -> Result<Vec<RawComment>> {
    let json = read_text_file(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Writes the table with a `Comment,Author,Topic` header, replacing any existing file.
pub fn write_normalized_csv(path: &Path, rows: &[NormalizedComment]) -> Result<()> {
    create_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(["Comment", "Author", "Topic"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Normalizer entry point. Returns the number of rows written.
pub fn run_normalize(config: &NormalizeConfig) -> Result<usize> {
    let raw = load_raw_comments(&config.input)?;
    let rows = normalize(&raw);
    write_normalized_csv(&config.output, &rows)?;
    info!("Saved {} comments to {}", rows.len(), config.output.display());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw(text: &str, topic: &str) -> RawComment {
        RawComment {
            video_id: "v1".to_string(),
            topic: topic.to_string(),
            author: "@someone".to_string(),
            text: text.to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            likes: 0,
        }
    }

    #[test]
    fn renames_and_cleans() {
        let rows = normalize(&[raw("Hello שלום world", "politics")]);
        assert_eq!(
            rows,
            vec![NormalizedComment {
                comment: "שלום".to_string(),
                author: "@someone".to_string(),
                topic: "politics".to_string(),
            }]
        );
    }

    #[test]
    fn keeps_rows_without_hebrew() {
        let rows = normalize(&[raw("only latin :)", "a"), raw("מה? 🙂 מה!", "b")]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].comment, "");
        assert_eq!(rows[1].comment, "מה מה");
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let once = normalize(&[raw("  אחת,שתיים  three ", "a")]);
        let mut again = once[0].clone();
        again.comment = hebrew_runs(&again.comment);
        assert_eq!(once[0], again);
    }
}
