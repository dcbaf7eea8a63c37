// src/git.rs

use crate::error::{Result, TrendError};
use crate::model::Pattern;
use git2::Repository;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Revisions and date bounds for the history listing
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub after: Option<String>,
    pub before: Option<String>,
    /// Empty means every ref
    pub revs: Vec<String>,
}

/// The two text-producing history queries the pipeline depends on
pub trait GitQuery {
    /// `<unix-seconds> <commit>` lines, oldest first
    fn log(&self, query: &LogQuery) -> Result<String>;

    /// `<commit>:<path>:<count>` lines for every file of `commits` matching
    /// `pattern`. An empty string when nothing matched.
    fn grep_count(&self, pattern: &Pattern, pathspec: &[String], commits: &[String]) -> Result<String>;
}

/// Runs the `git` executable inside a repository's directory
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Finds the repository containing `path` and runs git at its root.
    pub fn discover(path: &Path) -> Result<Self> {
        let path = expand_home(path);
        let repo = Repository::discover(&path).map_err(|source| TrendError::Repository { path: path.clone(), source })?;
        let workdir = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        tracing::debug!("using repository at {}", workdir.display());
        Ok(GitCli { workdir })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Runs git with `args`; exit codes in `ok_codes` besides zero count as
    /// success with whatever was printed.
    fn run(&self, args: &[String], ok_codes: &[i32]) -> Result<String> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!("running `{}` in {}", command, self.workdir.display());

        let output = Command::new("git")
            .arg("--no-pager")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|source| TrendError::Spawn { command: command.clone(), source })?;

        let accepted = output.status.success() || output.status.code().is_some_and(|c| ok_codes.contains(&c));
        if !accepted {
            return Err(TrendError::GitFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl GitQuery for GitCli {
    fn log(&self, query: &LogQuery) -> Result<String> {
        self.run(&log_args(query), &[])
    }

    fn grep_count(&self, pattern: &Pattern, pathspec: &[String], commits: &[String]) -> Result<String> {
        if commits.is_empty() {
            return Ok(String::new());
        }
        // git grep exits with 1 when nothing matched
        self.run(&grep_args(pattern, pathspec, commits), &[1])
    }
}

fn log_args(query: &LogQuery) -> Vec<String> {
    let mut args = vec!["log".to_string(), "--reverse".to_string(), "--format=%ct %H".to_string()];
    if let Some(after) = &query.after {
        args.push(format!("--after={after}"));
    }
    if let Some(before) = &query.before {
        args.push(format!("--before={before}"));
    }
    if query.revs.is_empty() {
        args.push("--all".to_string());
    } else {
        args.extend(query.revs.iter().cloned());
    }
    args.push("--".to_string());
    args
}

fn grep_args(pattern: &Pattern, pathspec: &[String], commits: &[String]) -> Vec<String> {
    let mut args = vec!["grep".to_string(), "-c".to_string()];
    if let Some(flag) = pattern.syntax.grep_flag() {
        args.push(flag.to_string());
    }
    args.push("-e".to_string());
    args.push(pattern.text.clone());
    args.extend(commits.iter().cloned());
    if !pathspec.is_empty() {
        args.push("--".to_string());
        args.extend(pathspec.iter().cloned());
    }
    args
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
