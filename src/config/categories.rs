//! Benchmark categories and where their documents live.

use std::path::{Path, PathBuf};

/// Criterion wall-clock benchmarks.
pub const CRITERION: &str = "criterion";

/// Gungraun / Callgrind instruction-level benchmarks.
pub const GUNGRAUN: &str = "gungraun";

/// Retrieval-quality benchmarks.
pub const QUALITY: &str = "quality";

/// A benchmark category and its document file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Category tag written to the document's `type` field.
    pub name: String,
    /// File name inside the history directory.
    pub history_file: String,
    /// File name inside the output directory.
    pub latest_file: String,
}

impl Category {
    /// Create a category record.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        history_file: impl Into<String>,
        latest_file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            history_file: history_file.into(),
            latest_file: latest_file.into(),
        }
    }

    /// Path of the history document under `history_dir`.
    #[must_use]
    pub fn history_path(&self, history_dir: &Path) -> PathBuf {
        history_dir.join(&self.history_file)
    }

    /// Path of the latest document under `output_dir`.
    #[must_use]
    pub fn latest_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.latest_file)
    }
}

/// The categories the dashboard plots.
#[must_use]
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new(CRITERION, "perf-history.json", "perf-latest.json"),
        Category::new(GUNGRAUN, "gungraun-history.json", "gungraun-latest.json"),
        Category::new(QUALITY, "quality-history.json", "quality-latest.json"),
    ]
}

/// Look up a category by name.
#[must_use]
pub fn find_category<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.name == name)
}
