//! Path filtering using .gitignore-style patterns
//!
//! - Patterns apply in order; a later match overrides an earlier one
//! - A leading `!` re-includes what an earlier pattern excluded
//! - Ignore files (`.disciplineignore` by default) are looked up in every
//!   parent directory of a candidate file

use crate::domain::{DisciplineError, DisciplineResult, FileDiagnostic};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default name of per-directory ignore files
pub const DEFAULT_IGNORE_FILE: &str = ".disciplineignore";

/// Decides which files a check run looks at
#[derive(Debug, Clone)]
pub struct PathFilter {
    patterns: Vec<FilterPattern>,
    /// Ignore file name, if ignore files are honoured
    ignore_filename: Option<String>,
}

#[derive(Debug, Clone)]
struct FilterPattern {
    pattern: glob::Pattern,
    /// `!pattern`
    is_include: bool,
    /// Trailing `/`: matches directories only
    dir_only: bool,
    /// Contains `/`: matched against the whole relative path
    anchored: bool,
}

impl FilterPattern {
    fn parse(raw: &str) -> Result<Self, glob::PatternError> {
        let (is_include, body) = match raw.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, raw),
        };
        let dir_only = body.ends_with('/');
        let glob_source = body.trim_start_matches('/').trim_end_matches('/');
        let pattern = glob::Pattern::new(glob_source)?;
        Ok(Self { pattern, is_include, dir_only, anchored: body.trim_end_matches('/').contains('/') })
    }

    /// Match a path relative to the checked root. A directory pattern
    /// matches every file below a matching directory.
    fn matches(&self, path: &Path) -> bool {
        if self.dir_only {
            path.ancestors()
                .skip(1)
                .filter(|dir| !dir.as_os_str().is_empty())
                .any(|dir| self.matches_entry(dir))
        } else {
            self.matches_entry(path)
        }
    }

    fn matches_entry(&self, path: &Path) -> bool {
        if self.anchored {
            let path_str = path.to_string_lossy();
            let path_str = path_str.strip_prefix("./").unwrap_or(&path_str);
            self.pattern.matches(path_str)
        } else {
            path.file_name()
                .map_or(false, |name| self.pattern.matches(&name.to_string_lossy()))
        }
    }
}

impl PathFilter {
    /// Create a filter from exclude patterns and an optional ignore file name
    pub fn new(patterns: Vec<String>, ignore_filename: Option<String>) -> DisciplineResult<Self> {
        let patterns = patterns
            .iter()
            .map(|raw| {
                FilterPattern::parse(raw).map_err(|e| {
                    DisciplineError::pattern(format!("Invalid pattern '{raw}': {e}"))
                })
            })
            .collect::<DisciplineResult<Vec<_>>>()?;

        Ok(Self { patterns, ignore_filename: ignore_filename.filter(|name| !name.is_empty()) })
    }

    /// Filter with the usual build and VCS directories excluded
    pub fn with_defaults() -> DisciplineResult<Self> {
        Self::new(
            vec![
                "target/**".to_string(),
                "**/target/**".to_string(),
                "**/.git/**".to_string(),
                "**/*.generated.rs".to_string(),
            ],
            Some(DEFAULT_IGNORE_FILE.to_string()),
        )
    }

    /// Append a pattern; it takes precedence over earlier ones
    pub fn add_pattern(&mut self, pattern: impl AsRef<str>) -> DisciplineResult<()> {
        let raw = pattern.as_ref();
        let parsed = FilterPattern::parse(raw)
            .map_err(|e| DisciplineError::pattern(format!("Invalid pattern '{raw}': {e}")))?;
        self.patterns.push(parsed);
        Ok(())
    }

    /// Whether a file passes every configured pattern and ignore file,
    /// matching patterns against the path as given
    pub fn should_analyze<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();
        self.passes(path, path)
    }

    /// Like `should_analyze`, but patterns see the path relative to `root`
    pub fn should_analyze_in(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.passes(relative, path)
    }

    fn passes(&self, relative: &Path, path: &Path) -> bool {
        let mut include = true;
        for pattern in &self.patterns {
            if pattern.matches(relative) {
                include = pattern.is_include;
            }
        }
        if !include {
            return false;
        }

        match &self.ignore_filename {
            Some(name) => !self.is_ignored_by_files(path, name),
            None => true,
        }
    }

    fn is_ignored_by_files(&self, path: &Path, ignore_filename: &str) -> bool {
        let mut ignored = false;
        let mut current_dir = path.parent();

        while let Some(dir) = current_dir {
            let ignore_file = dir.join(ignore_filename);
            if ignore_file.is_file() {
                if let Ok(relative) = path.strip_prefix(dir) {
                    for pattern in load_ignore_file(&ignore_file) {
                        if pattern.matches(relative) {
                            ignored = !pattern.is_include;
                        }
                    }
                }
            }
            current_dir = dir.parent();
        }

        ignored
    }

    /// All `.rs` files under `root` that pass the filter, in a stable order.
    /// Entries the walk could not read come back as I/O diagnostics.
    pub fn find_files<P: AsRef<Path>>(&self, root: P) -> (Vec<PathBuf>, Vec<FileDiagnostic>) {
        let root = root.as_ref();
        let mut files = Vec::new();
        let mut unreadable = Vec::new();

        let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    let error = io::Error::from(e);
                    tracing::warn!("Cannot walk {}: {}", path.display(), error);
                    unreadable.push(FileDiagnostic::io(path, &error));
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().map_or(false, |ext| ext == "rs")
                && self.should_analyze_in(root, path)
            {
                files.push(path.to_path_buf());
            }
        }

        (files, unreadable)
    }
}

/// Patterns of one ignore file. An unreadable ignore file contributes none.
fn load_ignore_file(path: &Path) -> Vec<FilterPattern> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Skipping ignore file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut patterns = Vec::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match FilterPattern::parse(line) {
            Ok(pattern) => patterns.push(pattern),
            Err(e) => {
                tracing::warn!("Invalid pattern '{}' in {}: {}", line, path.display(), e);
            }
        }
    }

    patterns
}
