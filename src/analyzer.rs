//! Descriptive statistics over the normalized table: topic distribution,
//! per-comment word counts, word frequency without stopwords, and a
//! chi-square test of topic against the presence of each top word.

use std::collections::{BTreeSet, HashSet};
use std::fmt::{self, Write as _};
use std::fs::File;
use std::path::Path;

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::config::{AnalyzeConfig, PREVIEW_ROWS};
use crate::error::{Error, Result};
use crate::stats::{ChiSquareResult, chi2_contingency};
use crate::{count_in_order, read_text_file, sort_by_frequency, write_text_file};

// letters, digits and underscore; combining marks (niqqud) split words
static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}_]+").expect("valid word regex"));

/// A row as read from the normalized CSV. Empty fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommentRecord {
    #[serde(rename = "Comment")]
    pub comment: Option<String>,
    #[serde(rename = "Author", default)]
    pub author: Option<String>,
    #[serde(rename = "Topic")]
    pub topic: Option<String>,
}

/// A row that survived cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRow {
    /// Position of the row in the loaded table, before any rows were dropped.
    pub index: usize,
    pub comment: String,
    pub topic: String,
    pub word_count: usize,
}

/// Number of maximal letter/digit/underscore runs in `text`.
/// # Example
/// ```
/// use yt_comment_analysis::word_count;
/// assert_eq!(word_count("שלום, עולם_טוב!"), 2);
/// ```
pub fn word_count(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Reads the normalized CSV. The header must name `Comment` and `Topic`.
pub fn load_comments(path: &Path) -> Result<Vec<CommentRecord>> {
    let file = File::open(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let headers = reader.headers()?.clone();
    for required in ["Comment", "Topic"] {
        if !headers.iter().any(|h| h == required) {
            return Err(Error::InvalidInput(format!(
                "{} has no '{required}' column",
                path.display()
            )));
        }
    }
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Newline-delimited stopwords, trimmed; blank lines are skipped.
pub fn load_stopwords(path: &Path) -> Result<HashSet<String>> {
    let content = read_text_file(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Drops rows missing a topic or a comment and counts words in the rest.
pub fn prepare_rows(records: Vec<CommentRecord>) -> Vec<AnalysisRow> {
    let total = records.len();
    let rows: Vec<AnalysisRow> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match (record.comment, record.topic) {
            (Some(comment), Some(topic)) => Some(AnalysisRow {
                index,
                word_count: word_count(&comment),
                comment,
                topic,
            }),
            _ => None,
        })
        .collect();
    let dropped = total - rows.len();
    if dropped > 0 {
        warn!("Dropped {dropped} of {total} rows with missing Topic or Comment");
    }
    rows
}

/// Comments per topic, most frequent first; ties keep first-seen order.
pub fn topic_distribution(rows: &[AnalysisRow]) -> Vec<(String, usize)> {
    sort_by_frequency(count_in_order(rows.iter().map(|r| r.topic.as_str())))
}

/// Whitespace-split tokens of all comments minus stopwords, in first-seen order.
pub fn word_frequency(rows: &[AnalysisRow], stopwords: &HashSet<String>) -> Vec<(String, usize)> {
    count_in_order(
        rows.iter()
            .flat_map(|r| r.comment.split_whitespace())
            .filter(|token| !stopwords.contains(*token)),
    )
}

/// The `n` most frequent words; ties keep first-seen order.
pub fn top_words(frequency: &[(String, usize)], n: usize) -> Vec<(String, usize)> {
    let mut sorted = sort_by_frequency(frequency.to_vec());
    sorted.truncate(n);
    sorted
}

/// One cell of a topic × presence cross-tabulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContingencyCell {
    pub topic: String,
    pub present: bool,
    pub count: usize,
}

/// Topic × word-presence counts. Only observed topics and presence values
/// appear, both in ascending order (absent before present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContingencyTable {
    pub topics: Vec<String>,
    pub presence: Vec<bool>,
    pub counts: Vec<Vec<usize>>,
}

impl ContingencyTable {
    /// Cross-tabulates each row's topic against substring containment of `word`.
    pub fn for_word(rows: &[AnalysisRow], word: &str) -> Self {
        let marks: Vec<(&str, bool)> = rows
            .iter()
            .map(|r| (r.topic.as_str(), r.comment.contains(word)))
            .collect();

        let topics: Vec<String> = marks
            .iter()
            .map(|(t, _)| *t)
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(String::from)
            .collect();
        let presence: Vec<bool> = marks
            .iter()
            .map(|(_, p)| *p)
            .collect::<BTreeSet<bool>>()
            .into_iter()
            .collect();

        let mut counts = vec![vec![0usize; presence.len()]; topics.len()];
        for (topic, present) in marks {
            // both lookups succeed: the axes were built from these marks
            if let (Ok(i), Ok(j)) = (
                topics.binary_search_by(|t| t.as_str().cmp(topic)),
                presence.binary_search(&present),
            ) {
                counts[i][j] += 1;
            }
        }
        Self {
            topics,
            presence,
            counts,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = ContingencyCell> + '_ {
        self.topics.iter().enumerate().flat_map(move |(i, topic)| {
            self.presence
                .iter()
                .enumerate()
                .map(move |(j, &present)| ContingencyCell {
                    topic: topic.clone(),
                    present,
                    count: self.counts[i][j],
                })
        })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// Chi-square outcome for one frequent word.
#[derive(Debug, Clone, PartialEq)]
pub struct WordAssociation {
    pub word: String,
    pub count: usize,
    pub table: ContingencyTable,
    pub test: ChiSquareResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub rows: Vec<AnalysisRow>,
    pub topic_counts: Vec<(String, usize)>,
    pub word_frequency: Vec<(String, usize)>,
    pub top_words: Vec<(String, usize)>,
    pub associations: Vec<WordAssociation>,
}

/// Runs every analysis step on already-loaded data.
pub fn analyze(
    records: Vec<CommentRecord>,
    stopwords: &HashSet<String>,
    top_n: usize,
) -> Result<AnalysisReport> {
    let rows = prepare_rows(records);
    let topic_counts = topic_distribution(&rows);
    let word_frequency = word_frequency(&rows, stopwords);
    let top_words = top_words(&word_frequency, top_n);

    let mut associations = Vec::with_capacity(top_words.len());
    for (word, count) in &top_words {
        let table = ContingencyTable::for_word(&rows, word);
        let test = chi2_contingency(&table.counts)?;
        associations.push(WordAssociation {
            word: word.clone(),
            count: *count,
            table,
            test,
        });
    }

    Ok(AnalysisReport {
        rows,
        topic_counts,
        word_frequency,
        top_words,
        associations,
    })
}

/// Analyzer entry point: loads the table and stopwords, writes the summary file.
pub fn run_analyze(config: &AnalyzeConfig) -> Result<AnalysisReport> {
    let records = load_comments(&config.input)?;
    let stopwords = load_stopwords(&config.stopwords)?;
    let report = analyze(records, &stopwords, config.top_words)?;
    write_text_file(&config.output, &report.to_string())?;
    info!("Summary saved to {}", config.output.display());
    Ok(report)
}

// ---- Rendering ----

/// Left-aligned columns separated by two spaces, widths in characters.
fn render_table(header: &[String], body: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let mut out = String::new();
    for row in std::iter::once(header).chain(body.iter().map(Vec::as_slice)) {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| {
                let pad = w - cell.chars().count();
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

fn presence_label(present: bool) -> String {
    let label = if present { "1" } else { "0" };
    label.to_string()
}

impl fmt::Display for ContingencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header = vec!["Topic".to_string()];
        header.extend(self.presence.iter().map(|&p| presence_label(p)));
        let body: Vec<Vec<String>> = self
            .topics
            .iter()
            .zip(&self.counts)
            .map(|(topic, row)| {
                std::iter::once(topic.clone())
                    .chain(row.iter().map(usize::to_string))
                    .collect()
            })
            .collect();
        f.write_str(&render_table(&header, &body))
    }
}

impl WordAssociation {
    fn expected_table(&self) -> String {
        let mut header = vec!["Topic".to_string()];
        header.extend(self.table.presence.iter().map(|&p| presence_label(p)));
        let body: Vec<Vec<String>> = self
            .table
            .topics
            .iter()
            .zip(&self.test.expected)
            .map(|(topic, row)| {
                std::iter::once(topic.clone())
                    .chain(row.iter().map(|e| format!("{e:.2}")))
                    .collect()
            })
            .collect();
        render_table(&header, &body)
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        writeln!(out, "Comments analyzed: {}\n", self.rows.len())?;

        out.push_str("Topic Distribution:\n\n");
        let body: Vec<Vec<String>> = self
            .topic_counts
            .iter()
            .map(|(topic, count)| vec![topic.clone(), count.to_string()])
            .collect();
        out.push_str(&render_table(
            &["Topic".to_string(), "count".to_string()],
            &body,
        ));
        out.push_str("\n\n");

        writeln!(out, "Word counts for first {PREVIEW_ROWS} comments:\n")?;
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(PREVIEW_ROWS)
            .map(|r| vec![r.index.to_string(), r.comment.clone(), r.word_count.to_string()])
            .collect();
        out.push_str(&render_table(
            &["".to_string(), "Comment".to_string(), "Word_Count".to_string()],
            &body,
        ));
        out.push_str("\n\n");

        writeln!(out, "{} most common words:\n", self.top_words.len())?;
        for (word, count) in &self.top_words {
            writeln!(out, "{word} : {count}")?;
        }
        out.push('\n');

        for assoc in &self.associations {
            writeln!(out, "Word: '{}'", assoc.word)?;
            out.push_str("Contingency Table:\n");
            write!(out, "{}", assoc.table)?;
            out.push_str("Expected Frequencies:\n");
            out.push_str(&assoc.expected_table());
            writeln!(
                out,
                "Chi2 = {:.2}, p-value = {:.4}, dof = {}\n",
                assoc.test.chi2, assoc.test.p_value, assoc.test.degrees_of_freedom
            )?;
        }
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(comment: &str, topic: &str) -> CommentRecord {
        CommentRecord {
            comment: Some(comment.to_string()),
            author: Some("@a".to_string()),
            topic: Some(topic.to_string()),
        }
    }

    #[test]
    fn word_count_uses_word_runs() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("אחת שתיים"), 2);
        assert_eq!(word_count("a-b c_d"), 3);
    }

    #[test]
    fn niqqud_splits_words() {
        let cleaned = crate::hebrew_runs("שָׁלוֹם עוֹלָם!");
        assert_eq!(cleaned, "ש\u{5b8}\u{5c1}לו\u{5b9}ם עו\u{5b9}ל\u{5b8}ם");
        assert_eq!(word_count(&cleaned), 6);
        assert_eq!(word_count("שלום עולם"), 2);
        assert_eq!(word_count("גול2 ב_ית"), 2);
    }

    #[test]
    fn preview_keeps_source_row_index() {
        let records = vec![
            record("אחת", "A"),
            CommentRecord {
                comment: None,
                ..record("", "A")
            },
            record("שתיים שלוש", "B"),
        ];
        let report = analyze(records, &HashSet::new(), 10).unwrap();
        assert_eq!(
            report.rows.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 2]
        );
        let text = report.to_string();
        assert!(text.contains("\n0  אחת         1\n"), "{text}");
        assert!(text.contains("\n2  שתיים שלוש  2\n"), "{text}");
    }

    #[test]
    fn summary_is_deterministic() {
        let run = || {
            analyze(
                vec![record("שלום עולם", "A"), record("שלום", "B")],
                &HashSet::new(),
                10,
            )
            .unwrap()
            .to_string()
        };
        let text = run();
        assert!(text.starts_with("Comments analyzed: 2\n"));
        assert_eq!(text, run());
    }

    #[test]
    fn missing_fields_are_dropped() {
        let rows = prepare_rows(vec![
            record("שלום", "A"),
            CommentRecord {
                comment: None,
                ..record("", "A")
            },
            CommentRecord {
                topic: None,
                ..record("עולם", "")
            },
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].word_count, 1);
    }

    #[test]
    fn topic_ties_keep_first_seen_order() {
        let rows = prepare_rows(vec![
            record("א", "B"),
            record("א", "A"),
            record("א", "C"),
            record("א", "C"),
        ]);
        let dist = topic_distribution(&rows);
        assert_eq!(
            dist,
            vec![
                ("C".to_string(), 2),
                ("B".to_string(), 1),
                ("A".to_string(), 1)
            ]
        );
        assert_eq!(dist.iter().map(|(_, c)| c).sum::<usize>(), rows.len());
    }

    #[test]
    fn stopwords_are_excluded_case_sensitively() {
        let rows = prepare_rows(vec![record("של של Of of בית", "A")]);
        let stop: HashSet<String> = ["של", "of"].iter().map(|s| s.to_string()).collect();
        let freq = word_frequency(&rows, &stop);
        assert_eq!(
            freq,
            vec![("Of".to_string(), 1), ("בית".to_string(), 1)]
        );
    }

    #[test]
    fn presence_is_substring_containment() {
        let rows = prepare_rows(vec![
            record("ספרים", "A"),
            record("ספר", "B"),
            record("מחשב", "B"),
        ]);
        let table = ContingencyTable::for_word(&rows, "ספר");
        assert_eq!(table.topics, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(table.presence, vec![false, true]);
        assert_eq!(table.counts, vec![vec![0, 1], vec![1, 1]]);
        assert_eq!(table.total(), rows.len());
        assert_eq!(table.cells().count(), 4);
    }

    #[test]
    fn word_in_every_row_gives_single_column() {
        let rows = prepare_rows(vec![record("כן", "A"), record("כן כן", "B")]);
        let table = ContingencyTable::for_word(&rows, "כן");
        assert_eq!(table.presence, vec![true]);
        let test = chi2_contingency(&table.counts).unwrap();
        assert_eq!(test.degrees_of_freedom, 0);
    }

    #[test]
    fn word_named_like_a_column_is_just_a_word() {
        let records = vec![record("Comment Topic", "A"), record("x", "B")];
        let report = analyze(records, &HashSet::new(), 10).unwrap();
        assert_eq!(report.associations[0].word, "Comment");
        assert_eq!(report.associations[0].table.counts, vec![vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn render_table_pads_by_characters() {
        let out = render_table(
            &["Topic".to_string(), "n".to_string()],
            &[vec!["שלום".to_string(), "12".to_string()]],
        );
        assert_eq!(out, "Topic  n\nשלום   12\n");
    }
}
