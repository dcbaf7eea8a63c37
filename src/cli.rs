// src/cli.rs

use crate::model::{Granularity, KeepPolicy};
use clap::Parser;
use std::path::PathBuf;

/// Charts how often code patterns occur across a git repository's history
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository to analyze
    pub repo: PathBuf,

    /// Only consider commits after this date (anything `git log --after` accepts)
    #[arg(long)]
    pub after: Option<String>,

    /// Only consider commits before this date (anything `git log --before` accepts)
    #[arg(long)]
    pub before: Option<String>,

    /// Sampling granularity [default: from config, else week]
    #[arg(short, long, value_enum)]
    pub granularity: Option<Granularity>,

    /// Which commit represents a bucket [default: from config, else first]
    #[arg(long, value_enum)]
    pub keep: Option<KeepPolicy>,

    /// TOML file with the patterns to count
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where to write the chart [default: counts.png next to the executable]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Revisions to walk; repeat for several [default: all refs]
    #[arg(long = "rev")]
    pub revs: Vec<String>,

    /// Commits per `git grep` call [default: from config, else 10]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: Option<u32>,

    /// Width of the chart in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Height of the chart in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Bucket and label dates in UTC instead of local time
    #[arg(long)]
    pub utc: bool,

    /// Print the sampled commits and their counts
    #[arg(long)]
    pub print: bool,

    /// Log debug output, including every git command
    #[arg(short, long)]
    pub verbose: bool,
}
