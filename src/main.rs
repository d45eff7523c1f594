#![forbid(unsafe_code)]
//! # YouTube Comment Analysis CLI
//!
//! Command-line front end for the `yt_comment_analysis` crate. Each stage is
//! its own subcommand and reads the file the previous one wrote:
//!
//! ```bash
//! YT_API_KEY=... cargo run --release -- collect --quota 10
//! cargo run --release -- normalize
//! cargo run --release -- analyze --stopwords data/stopwords.txt
//! ```
//!
//! Set `RUST_LOG=info` to see per-video progress.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::error;
use yt_comment_analysis::config::{
    DEFAULT_NORMALIZED_COMMENTS, DEFAULT_QUOTA, DEFAULT_RAW_COMMENTS, DEFAULT_STOPWORDS,
    DEFAULT_SUMMARY, DEFAULT_TOP_WORDS, DEFAULT_VIDEO_LIST, api_key_from_env,
};
use yt_comment_analysis::{
    AnalyzeConfig, CollectConfig, NormalizeConfig, OnVideoError, Result, run_analyze,
    run_collect, run_normalize,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch Hebrew comments for every video in the list (needs YT_API_KEY)
    Collect {
        /// CSV with `video_id,topic` columns
        #[arg(long, default_value = DEFAULT_VIDEO_LIST)]
        videos: PathBuf,

        /// JSON file receiving the collected comments
        #[arg(long, default_value = DEFAULT_RAW_COMMENTS)]
        output: PathBuf,

        /// Maximum number of Hebrew comments kept per video
        #[arg(long, default_value_t = DEFAULT_QUOTA)]
        quota: usize,

        /// What to do when fetching a video fails (abort, skip)
        #[arg(long, value_enum, default_value_t = OnVideoError::Abort)]
        on_video_error: OnVideoError,
    },

    /// Keep only Hebrew text and write a Comment,Author,Topic CSV
    Normalize {
        #[arg(long, default_value = DEFAULT_RAW_COMMENTS)]
        input: PathBuf,

        #[arg(long, default_value = DEFAULT_NORMALIZED_COMMENTS)]
        output: PathBuf,
    },

    /// Word frequency, topic distribution and chi-square summary
    Analyze {
        #[arg(long, default_value = DEFAULT_NORMALIZED_COMMENTS)]
        input: PathBuf,

        /// Stopword file (.txt, one word per line)
        #[arg(long, default_value = DEFAULT_STOPWORDS)]
        stopwords: PathBuf,

        /// Summary text file
        #[arg(long, default_value = DEFAULT_SUMMARY)]
        output: PathBuf,

        /// Number of most frequent words tested against topic
        #[arg(long, default_value_t = DEFAULT_TOP_WORDS)]
        top_words: usize,
    },
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Collect {
            videos,
            output,
            quota,
            on_video_error,
        } => {
            let config =
                CollectConfig::new(api_key_from_env(), videos, output, quota, on_video_error)?;
            let report = run_collect(&config)?;
            println!(
                "Total comments saved: {} in {}",
                report.comments.len(),
                config.output.display()
            );
            if !report.failed_videos.is_empty() {
                eprintln!("Videos that failed: {}", report.failed_videos.join(", "));
            }
        }
        Command::Normalize { input, output } => {
            let config = NormalizeConfig { input, output };
            let written = run_normalize(&config)?;
            println!("Saved {} comments to {}", written, config.output.display());
        }
        Command::Analyze {
            input,
            stopwords,
            output,
            top_words,
        } => {
            let config = AnalyzeConfig {
                input,
                stopwords,
                output,
                top_words,
            };
            let report = run_analyze(&config)?;
            println!("{report}");
            println!("Summary saved to {}", config.output.display());
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        error!("Error: {}", e);
        process::exit(1);
    }
}
