// src/main.rs

mod cli;
mod config;
mod counter;
mod derive;
mod error;
mod font;
mod git;
mod model;
mod parse;
mod renderer;
mod sampler;

use chrono::{DateTime, Local, Utc};
use clap::Parser;
use cli::Args;
use config::TrendConfig;
use error::{Result, TrendError};
use git::{GitCli, LogQuery};
use indicatif::{ProgressBar, ProgressStyle};
use model::{Granularity, SampleSet};
use renderer::ChartOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

const OUTPUT_FILE: &str = "counts.png";

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "git_trend=debug" } else { "git_trend=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    let config = match &args.config {
        Some(path) => TrendConfig::load(path)?,
        None => TrendConfig::builtin()?,
    };
    let granularity = match args.granularity {
        Some(g) => g,
        None => config.granularity()?.unwrap_or(Granularity::Week),
    };
    let keep = match args.keep {
        Some(k) => k,
        None => config.keep()?.unwrap_or_default(),
    };
    let batch_size = args.batch_size.map_or_else(|| config.batch_size(), |n| n as usize);
    let patterns = config.patterns()?;

    // Resolved before any git call so a bad location fails fast
    let output = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path()?,
    };

    let git = GitCli::discover(&args.repo)?;
    println!("Analyzing repository at: {}", git.workdir().display());

    let query = LogQuery { after: args.after.clone(), before: args.before.clone(), revs: args.revs.clone() };
    let mut samples = if args.utc {
        sampler::sample_commits(&git, &query, granularity, keep, &Utc)?
    } else {
        sampler::sample_commits(&git, &query, granularity, keep, &Local)?
    };
    println!("Sampled {} commits ({}) in {:.2?}.", samples.len(), granularity, start_time.elapsed());

    let count_start = Instant::now();
    let bar = ProgressBar::new(counter::batch_count(samples.len(), batch_size) as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} batches {msg}") {
        bar.set_style(style);
    }
    counter::count_patterns(&git, &mut samples, &patterns, &config.pathspec, batch_size, &bar)?;
    bar.finish_with_message("counting complete");
    println!(
        "Counted {} patterns across {} commits in {:.2?}.",
        patterns.len(),
        samples.len(),
        count_start.elapsed()
    );

    derive::apply_derived(&mut samples, &config.derived);

    let series = config.plot_order();
    let options = ChartOptions { width: args.width, height: args.height, utc: args.utc };
    renderer::render_chart(&samples, &series, &options, &output)?;
    println!("Chart written to {}.", output.display());

    if args.print {
        print_samples(&samples, &series, args.utc);
    }

    println!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

/// `counts.png` in the directory holding the executable
fn default_output_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|source| TrendError::Io {
        context: "locating the executable".to_string(),
        source,
    })?;
    let dir = exe.parent().map(PathBuf::from).unwrap_or_default();
    Ok(dir.join(OUTPUT_FILE))
}

fn print_samples(samples: &SampleSet, series: &[String], utc: bool) {
    let mut header = format!("{:<20} {:<12}", "date", "commit");
    for name in series {
        header.push_str(&format!(" {:>10}", name));
    }
    println!("{}", header);

    for sample in samples.iter() {
        let date = DateTime::<Utc>::from_timestamp(sample.timestamp, 0).unwrap_or_default();
        let date = if utc {
            date.format("%Y-%m-%d %H:%M").to_string()
        } else {
            date.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
        };
        let short = sample.id.get(..12).unwrap_or(&sample.id);
        let mut row = format!("{:<20} {:<12}", date, short);
        for name in series {
            row.push_str(&format!(" {:>10}", sample.count(name)));
        }
        println!("{}", row);
    }
}
