// src/sampler.rs

use crate::error::Result;
use crate::git::{GitQuery, LogQuery};
use crate::model::*;
use crate::parse::{parse_log, LogEntry};
use chrono::TimeZone;
use std::collections::HashSet;

/// Lists history through `git` and keeps one commit per bucket.
pub fn sample_commits<G, Tz>(
    git: &G,
    query: &LogQuery,
    granularity: Granularity,
    keep: KeepPolicy,
    tz: &Tz,
) -> Result<SampleSet>
where
    G: GitQuery,
    Tz: TimeZone,
{
    let entries = parse_log(&git.log(query)?)?;
    tracing::info!("history lists {} commits", entries.len());
    Ok(select_samples(entries, granularity, keep, tz))
}

pub fn select_samples<Tz: TimeZone>(
    mut entries: Vec<LogEntry>,
    granularity: Granularity,
    keep: KeepPolicy,
    tz: &Tz,
) -> SampleSet {
    // Walking several refs can interleave branches; stable sort keeps git's
    // order for equal timestamps.
    entries.sort_by_key(|e| e.timestamp);

    let mut seen = HashSet::new();
    let mut samples = SampleSet::new();
    let mut current: Option<BucketKey> = None;

    for entry in entries {
        if !seen.insert(entry.id.clone()) {
            continue;
        }
        let key = granularity.bucket_key(seen.len() - 1, entry.timestamp, tz);
        let sample = CommitSample::new(entry.id, entry.timestamp);

        if current == Some(key) {
            if keep == KeepPolicy::Last {
                samples.replace_last(sample);
            }
        } else {
            current = Some(key);
            samples.push(sample);
        }
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pattern;
    use chrono::Utc;

    const DAY: i64 = 86_400;
    // Monday 2024-01-01 00:00 UTC
    const T0: i64 = 1_704_067_200;

    struct FakeHistory(String);

    impl GitQuery for FakeHistory {
        fn log(&self, _query: &LogQuery) -> Result<String> {
            Ok(self.0.clone())
        }

        fn grep_count(&self, _: &Pattern, _: &[String], _: &[String]) -> Result<String> {
            Ok(String::new())
        }
    }

    fn id(n: usize) -> String {
        format!("{n:040x}")
    }

    fn history(times: &[i64]) -> String {
        times.iter().enumerate().map(|(i, t)| format!("{t} {}\n", id(i))).collect()
    }

    fn entries(times: &[i64]) -> Vec<LogEntry> {
        parse_log(&history(times)).unwrap()
    }

    fn sample_times(set: &SampleSet) -> Vec<i64> {
        set.iter().map(|s| s.timestamp).collect()
    }

    #[test]
    fn three_days_three_samples() {
        let times = [T0 + 3_600, T0 + DAY + 3_600, T0 + 2 * DAY + 3_600];
        let fake = FakeHistory(history(&times));
        let set = sample_commits(&fake, &LogQuery::default(), Granularity::Day, KeepPolicy::First, &Utc).unwrap();
        assert_eq!(sample_times(&set), times.to_vec());
        assert_eq!(set.ids(), vec![id(0), id(1), id(2)]);
    }

    #[test]
    fn empty_history_is_not_an_error() {
        let fake = FakeHistory(String::new());
        let query = LogQuery { after: Some("2999-01-01".into()), ..Default::default() };
        let set = sample_commits(&fake, &query, Granularity::Week, KeepPolicy::First, &Utc).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn first_and_last_policies() {
        let times = [T0, T0 + 100, T0 + DAY, T0 + DAY + 5, T0 + DAY + 10];
        let first = select_samples(entries(&times), Granularity::Day, KeepPolicy::First, &Utc);
        let last = select_samples(entries(&times), Granularity::Day, KeepPolicy::Last, &Utc);
        assert_eq!(first.ids(), vec![id(0), id(2)]);
        assert_eq!(last.ids(), vec![id(1), id(4)]);
    }

    #[test]
    fn out_of_order_history_is_sorted() {
        let times = [T0 + 2 * DAY, T0, T0 + DAY];
        let set = select_samples(entries(&times), Granularity::Day, KeepPolicy::First, &Utc);
        assert_eq!(sample_times(&set), vec![T0, T0 + DAY, T0 + 2 * DAY]);
    }

    #[test]
    fn repeated_ids_are_ignored() {
        let text = format!("{T0} {}\n{} {}\n", id(1), T0 + 10, id(1));
        let set = select_samples(parse_log(&text).unwrap(), Granularity::Commit, KeepPolicy::First, &Utc);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn bucket_keys_are_unique_and_coarser_is_smaller() {
        // Irregular spacing over about seven weeks, including same-second commits
        let mut times = Vec::new();
        let mut t = T0;
        for i in 0..60i64 {
            times.push(t);
            t += (i * 7_919) % (2 * DAY);
        }

        for keep in [KeepPolicy::First, KeepPolicy::Last] {
            let mut sizes = Vec::new();
            for granularity in [Granularity::Commit, Granularity::Day, Granularity::Week] {
                let set = select_samples(entries(&times), granularity, keep, &Utc);
                let keys: HashSet<BucketKey> = set
                    .iter()
                    .enumerate()
                    .map(|(pos, s)| granularity.bucket_key(pos, s.timestamp, &Utc))
                    .collect();
                assert_eq!(keys.len(), set.len(), "{granularity:?} {keep:?}");
                sizes.push(set.len());
            }
            assert_eq!(sizes, vec![60, 43, 8]);
        }
    }
}
