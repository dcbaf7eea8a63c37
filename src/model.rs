// src/model.rs

use crate::error::TrendError;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// How history is downsampled before counting
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Granularity {
    /// Every commit is its own sample
    Commit,
    /// One sample per calendar day
    Day,
    /// One sample per ISO week
    Week,
}

/// Which commit of a bucket represents it
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KeepPolicy {
    /// The oldest commit of the bucket
    #[default]
    First,
    /// The newest commit of the bucket
    Last,
}

/// Key of the time partition a commit falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketKey {
    Commit(usize),
    Day(i32),
    Week { year: i32, week: u32 },
}

impl Granularity {
    /// `position` is the commit's index in the chronological history and
    /// only matters for [`Granularity::Commit`].
    pub fn bucket_key<Tz: TimeZone>(self, position: usize, timestamp: i64, tz: &Tz) -> BucketKey {
        let date = DateTime::<Utc>::from_timestamp(timestamp, 0)
            .unwrap_or_default()
            .with_timezone(tz)
            .date_naive();
        match self {
            Granularity::Commit => BucketKey::Commit(position),
            Granularity::Day => BucketKey::Day(date.num_days_from_ce()),
            Granularity::Week => {
                let iso = date.iso_week();
                BucketKey::Week { year: iso.year(), week: iso.week() }
            }
        }
    }
}

impl FromStr for Granularity {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "commit" => Ok(Granularity::Commit),
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            _ => Err(TrendError::InvalidGranularity(s.to_string())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Commit => "per commit",
            Granularity::Day => "per day",
            Granularity::Week => "per week",
        })
    }
}

impl FromStr for KeepPolicy {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(KeepPolicy::First),
            "last" => Ok(KeepPolicy::Last),
            _ => Err(TrendError::InvalidKeep(s.to_string())),
        }
    }
}

/// Regex flavour handed to `git grep`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternSyntax {
    #[default]
    Basic,
    Extended,
    Perl,
    Fixed,
}

impl PatternSyntax {
    pub fn grep_flag(self) -> Option<&'static str> {
        match self {
            PatternSyntax::Basic => None,
            PatternSyntax::Extended => Some("-E"),
            PatternSyntax::Perl => Some("-P"),
            PatternSyntax::Fixed => Some("-F"),
        }
    }
}

impl FromStr for PatternSyntax {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(PatternSyntax::Basic),
            "extended" => Ok(PatternSyntax::Extended),
            "perl" => Ok(PatternSyntax::Perl),
            "fixed" => Ok(PatternSyntax::Fixed),
            _ => Err(TrendError::InvalidSyntax(s.to_string())),
        }
    }
}

/// A named search expression whose matches are counted per sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub name: String,
    pub text: String,
    pub syntax: PatternSyntax,
}

/// A series computed by adding other series together
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivedSeries {
    pub name: String,
    pub sum: Vec<String>,
}

/// One retained commit and the counts gathered for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSample {
    pub id: String,
    pub timestamp: i64,
    /// Series name to count; a missing name means zero
    pub counts: BTreeMap<String, u64>,
}

impl CommitSample {
    pub fn new(id: impl Into<String>, timestamp: i64) -> Self {
        CommitSample { id: id.into(), timestamp, counts: BTreeMap::new() }
    }

    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn add(&mut self, name: &str, n: u64) {
        *self.counts.entry(name.to_string()).or_insert(0) += n;
    }
}

/// Chronologically ordered samples, addressable by commit id
#[derive(Debug, Default, Clone)]
pub struct SampleSet {
    samples: Vec<CommitSample>,
    index: HashMap<String, usize>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample. Returns false and leaves the set untouched when the
    /// id is already present.
    pub fn push(&mut self, sample: CommitSample) -> bool {
        if self.index.contains_key(&sample.id) {
            return false;
        }
        self.index.insert(sample.id.clone(), self.samples.len());
        self.samples.push(sample);
        true
    }

    /// Swaps the newest sample for another one, or appends if empty.
    pub fn replace_last(&mut self, sample: CommitSample) {
        match self.samples.pop() {
            Some(old) => {
                self.index.remove(&old.id);
                self.push(sample);
            }
            None => {
                self.push(sample);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&CommitSample> {
        self.index.get(id).map(|&i| &self.samples[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CommitSample> {
        match self.index.get(id) {
            Some(&i) => self.samples.get_mut(i),
            None => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommitSample> {
        self.samples.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, CommitSample> {
        self.samples.iter_mut()
    }

    pub fn ids(&self) -> Vec<String> {
        self.samples.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The values of one series in sample order, zero where absent
    pub fn series(&self, name: &str) -> Vec<u64> {
        self.samples.iter().map(|s| s.count(name)).collect()
    }
}
