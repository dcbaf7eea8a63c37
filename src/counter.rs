// src/counter.rs

use crate::error::Result;
use crate::git::GitQuery;
use crate::model::*;
use crate::parse::parse_grep_counts;
use chrono::DateTime;
use indicatif::ProgressBar;

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Number of `git grep` rounds `count_patterns` will make for `samples`
pub fn batch_count(samples: usize, batch_size: usize) -> usize {
    samples.div_ceil(batch_size.max(1))
}

/// Adds one count per pattern to every sample.
///
/// Commits are queried `batch_size` at a time so a single `git grep` call
/// covers a whole batch. `git grep -c` reports one line per matching file,
/// and those per-file counts are summed into the sample. Patterns that never
/// match a commit leave its count absent. The bar advances once per batch.
pub fn count_patterns<G: GitQuery>(
    git: &G,
    samples: &mut SampleSet,
    patterns: &[Pattern],
    pathspec: &[String],
    batch_size: usize,
    bar: &ProgressBar,
) -> Result<()> {
    let ids = samples.ids();

    for batch in ids.chunks(batch_size.max(1)) {
        for pattern in patterns {
            let output = git.grep_count(pattern, pathspec, batch)?;
            for hit in parse_grep_counts(&output)? {
                match samples.get_mut(&hit.id) {
                    Some(sample) => sample.add(&pattern.name, hit.count),
                    None => tracing::warn!("git grep reported unknown commit {}", hit.id),
                }
            }
        }

        if let Some(last) = batch.last().and_then(|id| samples.get(id)) {
            let date = DateTime::from_timestamp(last.timestamp, 0).unwrap_or_default();
            tracing::debug!("counted batch ending at {} ({})", date, last.id);
            bar.set_message(date.format("%Y-%m-%d %H:%M").to_string());
        }
        bar.inc(1);
    }

    for pattern in patterns {
        if samples.iter().all(|s| s.count(&pattern.name) == 0) && !samples.is_empty() {
            tracing::warn!("pattern {:?} ({}) matched nothing", pattern.name, pattern.text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::LogQuery;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Answers grep queries from a table of (pattern text, commit) -> lines
    #[derive(Default)]
    struct FakeGrep {
        responses: HashMap<(String, String), Vec<String>>,
        calls: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl FakeGrep {
        fn respond(&mut self, text: &str, id: &str, path: &str, count: u64) {
            self.responses
                .entry((text.to_string(), id.to_string()))
                .or_default()
                .push(format!("{id}:{path}:{count}"));
        }
    }

    impl GitQuery for FakeGrep {
        fn log(&self, _: &LogQuery) -> Result<String> {
            Ok(String::new())
        }

        fn grep_count(&self, pattern: &Pattern, _: &[String], commits: &[String]) -> Result<String> {
            self.calls.borrow_mut().push((pattern.text.clone(), commits.to_vec()));
            let mut out = String::new();
            for id in commits {
                if let Some(lines) = self.responses.get(&(pattern.text.clone(), id.clone())) {
                    for line in lines {
                        out.push_str(line);
                        out.push('\n');
                    }
                }
            }
            Ok(out)
        }
    }

    fn id(n: usize) -> String {
        format!("{n:040x}")
    }

    fn samples(n: usize) -> SampleSet {
        let mut set = SampleSet::new();
        for i in 0..n {
            set.push(CommitSample::new(id(i), 1_700_000_000 + i as i64));
        }
        set
    }

    fn pattern(name: &str, text: &str) -> Pattern {
        Pattern { name: name.to_string(), text: text.to_string(), syntax: PatternSyntax::Basic }
    }

    #[test]
    fn per_file_counts_are_summed() {
        let mut fake = FakeGrep::default();
        fake.respond("extends Vue", &id(0), "X.vue", 2);
        fake.respond("extends Vue", &id(0), "Y.vue", 3);

        let mut set = samples(1);
        count_patterns(&fake, &mut set, &[pattern("Old", "extends Vue")], &[], 10, &ProgressBar::hidden()).unwrap();
        assert_eq!(set.get(&id(0)).unwrap().count("Old"), 5);
    }

    #[test]
    fn no_match_leaves_count_absent() {
        let fake = FakeGrep::default();
        let mut set = samples(3);
        count_patterns(&fake, &mut set, &[pattern("New", "<script setup")], &[], 10, &ProgressBar::hidden()).unwrap();
        assert!(set.iter().all(|s| s.counts.is_empty()));
        assert_eq!(set.series("New"), vec![0, 0, 0]);
    }

    #[test]
    fn commits_are_queried_in_batches() {
        let mut fake = FakeGrep::default();
        fake.respond("a", &id(11), "f", 1);
        fake.respond("b", &id(24), "f", 7);

        let mut set = samples(25);
        let bar = ProgressBar::hidden();
        let patterns = [pattern("A", "a"), pattern("B", "b")];
        count_patterns(&fake, &mut set, &patterns, &[], DEFAULT_BATCH_SIZE, &bar).unwrap();

        let calls = fake.calls.borrow();
        assert_eq!(calls.len(), 3 * 2);
        let sizes: Vec<usize> = calls.iter().map(|(_, c)| c.len()).collect();
        assert_eq!(sizes, vec![10, 10, 10, 10, 5, 5]);
        assert_eq!(calls[0].0, "a");
        assert_eq!(calls[1].0, "b");
        assert_eq!(bar.position(), 3);

        assert_eq!(set.get(&id(11)).unwrap().count("A"), 1);
        assert_eq!(set.get(&id(24)).unwrap().count("B"), 7);
        assert_eq!(set.get(&id(24)).unwrap().count("A"), 0);
    }

    #[test]
    fn malformed_response_fails() {
        struct Broken;
        impl GitQuery for Broken {
            fn log(&self, _: &LogQuery) -> Result<String> {
                Ok(String::new())
            }
            fn grep_count(&self, _: &Pattern, _: &[String], _: &[String]) -> Result<String> {
                Ok("fatal: bad revision\n".to_string())
            }
        }
        let mut set = samples(2);
        let err = count_patterns(&Broken, &mut set, &[pattern("A", "a")], &[], 10, &ProgressBar::hidden());
        assert!(err.is_err());
    }

    #[test]
    fn batch_count_rounds_up() {
        assert_eq!(batch_count(0, 10), 0);
        assert_eq!(batch_count(10, 10), 1);
        assert_eq!(batch_count(11, 10), 2);
        assert_eq!(batch_count(3, 0), 3);
    }
}
