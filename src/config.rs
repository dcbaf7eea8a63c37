// src/config.rs

use crate::counter::DEFAULT_BATCH_SIZE;
use crate::error::{Result, TrendError};
use crate::model::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Used when no `--config` is given: tracks a Vue class-component to
/// `<script setup>` migration.
pub const DEFAULT_CONFIG: &str = r#"
granularity = "week"
keep = "first"
plot = ["Old", "Mixin", "Old total", "New"]

[[pattern]]
name = "Old"
text = "extends Vue"

[[pattern]]
name = "Mixin"
text = "extends mixins"

[[pattern]]
name = "New"
text = "<script setup"
syntax = "fixed"

[[derived]]
name = "Old total"
sum = ["Old", "Mixin"]
"#;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternEntry {
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub syntax: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrendConfig {
    #[serde(default)]
    pub granularity: Option<String>,
    #[serde(default)]
    pub keep: Option<String>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Limits `git grep` to these paths
    #[serde(default)]
    pub pathspec: Vec<String>,
    /// Series to draw, in legend order. Empty draws everything.
    #[serde(default)]
    pub plot: Vec<String>,
    #[serde(default, rename = "pattern")]
    pub patterns: Vec<PatternEntry>,
    #[serde(default)]
    pub derived: Vec<DerivedSeries>,
}

impl TrendConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| TrendError::ConfigRead { path: path.to_path_buf(), source })?;
        let config = Self::parse(&text)?;
        tracing::info!("loaded {} patterns from {}", config.patterns.len(), path.display());
        Ok(config)
    }

    pub fn builtin() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG)
    }

    /// Parses and validates a config document
    pub fn parse(text: &str) -> Result<Self> {
        let config: TrendConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.patterns.is_empty() {
            return Err(TrendError::Config("no patterns configured".into()));
        }
        if self.batch_size == Some(0) {
            return Err(TrendError::Config("batch_size must be at least 1".into()));
        }
        self.granularity()?;
        self.keep()?;

        let mut known = HashSet::new();
        for entry in &self.patterns {
            if let Some(syntax) = &entry.syntax {
                syntax.parse::<PatternSyntax>()?;
            }
            if !known.insert(entry.name.as_str()) {
                return Err(TrendError::Config(format!("duplicate series name {:?}", entry.name)));
            }
        }
        for series in &self.derived {
            if series.sum.is_empty() {
                return Err(TrendError::Config(format!("derived series {:?} sums nothing", series.name)));
            }
            if let Some(part) = series.sum.iter().find(|p| !known.contains(p.as_str())) {
                return Err(TrendError::Config(format!(
                    "derived series {:?} refers to unknown series {:?}",
                    series.name, part
                )));
            }
            if !known.insert(series.name.as_str()) {
                return Err(TrendError::Config(format!("duplicate series name {:?}", series.name)));
            }
        }
        if let Some(name) = self.plot.iter().find(|p| !known.contains(p.as_str())) {
            return Err(TrendError::Config(format!("cannot plot unknown series {name:?}")));
        }
        Ok(())
    }

    pub fn granularity(&self) -> Result<Option<Granularity>> {
        self.granularity.as_deref().map(str::parse).transpose()
    }

    pub fn keep(&self) -> Result<Option<KeepPolicy>> {
        self.keep.as_deref().map(str::parse).transpose()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn patterns(&self) -> Result<Vec<Pattern>> {
        self.patterns
            .iter()
            .map(|entry| {
                let syntax = match &entry.syntax {
                    Some(s) => s.parse()?,
                    None => PatternSyntax::default(),
                };
                Ok(Pattern { name: entry.name.clone(), text: entry.text.clone(), syntax })
            })
            .collect()
    }

    /// Names to draw: the `plot` list, or every pattern then every derived series
    pub fn plot_order(&self) -> Vec<String> {
        if !self.plot.is_empty() {
            return self.plot.clone();
        }
        self.patterns
            .iter()
            .map(|p| p.name.clone())
            .chain(self.derived.iter().map(|d| d.name.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_config_is_valid() {
        let config = TrendConfig::builtin().unwrap();
        assert_eq!(config.granularity().unwrap(), Some(Granularity::Week));
        assert_eq!(config.keep().unwrap(), Some(KeepPolicy::First));
        assert_eq!(config.batch_size(), 10);
        assert_eq!(config.plot_order(), vec!["Old", "Mixin", "Old total", "New"]);

        let patterns = config.patterns().unwrap();
        assert_eq!(patterns.len(), 3);
        assert_eq!(patterns[0].syntax, PatternSyntax::Basic);
        assert_eq!(patterns[2].syntax, PatternSyntax::Fixed);
    }

    #[test]
    fn plot_order_defaults_to_declaration_order() {
        let config = TrendConfig::parse(
            r#"
            [[pattern]]
            name = "B"
            text = "b"
            [[pattern]]
            name = "A"
            text = "a"
            [[derived]]
            name = "Both"
            sum = ["A", "B"]
            "#,
        )
        .unwrap();
        assert_eq!(config.plot_order(), vec!["B", "A", "Both"]);
        assert_eq!(config.granularity().unwrap(), None);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let cases = [
            "granularity = \"month\"\n[[pattern]]\nname = \"A\"\ntext = \"a\"",
            "keep = \"middle\"\n[[pattern]]\nname = \"A\"\ntext = \"a\"",
            "batch_size = 0\n[[pattern]]\nname = \"A\"\ntext = \"a\"",
            "plot = [\"B\"]\n[[pattern]]\nname = \"A\"\ntext = \"a\"",
            "[[pattern]]\nname = \"A\"\ntext = \"a\"\nsyntax = \"glob\"",
            "[[pattern]]\nname = \"A\"\ntext = \"a\"\n[[pattern]]\nname = \"A\"\ntext = \"b\"",
            "[[pattern]]\nname = \"A\"\ntext = \"a\"\n[[derived]]\nname = \"T\"\nsum = [\"A\", \"Z\"]",
            "[[pattern]]\nname = \"A\"\ntext = \"a\"\ncolour = \"red\"",
            "granularity = \"day\"",
        ];
        for case in cases {
            assert!(TrendConfig::parse(case).is_err(), "accepted: {case}");
        }
        assert!(matches!(
            TrendConfig::parse("granularity = \"month\"\n[[pattern]]\nname = \"A\"\ntext = \"a\""),
            Err(TrendError::InvalidGranularity(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "granularity = \"day\"\npathspec = [\"*.vue\"]\n[[pattern]]\nname = \"A\"\ntext = \"a\"").unwrap();
        let config = TrendConfig::load(file.path()).unwrap();
        assert_eq!(config.pathspec, vec!["*.vue"]);
        assert_eq!(config.granularity().unwrap(), Some(Granularity::Day));

        let missing = TrendConfig::load(Path::new("/nonexistent/git-trend.toml"));
        assert!(matches!(missing, Err(TrendError::ConfigRead { .. })));
    }
}
