//! Static asset copying
//!
//! Files under the project root that match the configured glob patterns are
//! copied into a destination directory. The literal directory prefix of the
//! matching pattern is stripped, so `assets/img/logo.png` matched by
//! `assets/**/*` lands at `<dest>/img/logo.png`.
//!
//! Excluded directories (the build output) and dependency or VCS directories
//! found while walking are never treated as asset sources, so a pattern
//! without a literal base such as `**/*.svg` cannot pick up its own copies.

use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, trace};

use crate::types::{KilnError, KilnResult};

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Directory names skipped below a pattern's base
const SKIPPED_DIR_NAMES: &[&str] = &["node_modules", ".git"];

#[derive(Debug, Clone)]
pub struct AssetCopier {
    root: PathBuf,
    bases: Vec<PathBuf>,
    glob_set: GlobSet,
    excluded: Vec<PathBuf>,
}

impl AssetCopier {
    pub fn new(root: impl Into<PathBuf>, patterns: &[String]) -> KilnResult<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut bases = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                KilnError::Config(format!("Invalid asset pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
            bases.push(pattern_base(pattern));
        }
        let glob_set = builder
            .build()
            .map_err(|e| KilnError::Config(format!("Invalid asset patterns: {}", e)))?;

        Ok(Self {
            root: root.into(),
            bases,
            glob_set,
            excluded: Vec::new(),
        })
    }

    /// Ignore everything below `dirs` (relative to the root)
    pub fn with_excluded<P: AsRef<Path>>(mut self, dirs: impl IntoIterator<Item = P>) -> Self {
        for dir in dirs {
            let normalized: PathBuf = dir
                .as_ref()
                .components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect();
            if !normalized.as_os_str().is_empty() && !self.excluded.contains(&normalized) {
                self.excluded.push(normalized);
            }
        }
        self
    }

    /// Directories that can contain matching files, relative to the root
    pub fn base_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for base in &self.bases {
            if !dirs.iter().any(|d| base.starts_with(d)) {
                dirs.retain(|d| !d.starts_with(base));
                dirs.push(base.clone());
            }
        }
        dirs
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` (absolute or relative to the root) is an asset
    pub fn matches(&self, path: &Path) -> bool {
        self.relative(path)
            .is_some_and(|relative| self.is_asset(relative))
    }

    /// Collect every matching file, relative to the root, sorted
    pub fn collect(&self) -> KilnResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        let mut queue: VecDeque<PathBuf> = self
            .base_dirs()
            .into_iter()
            .map(|base| self.root.join(base))
            .filter(|dir| dir.is_dir())
            .collect();

        while let Some(current_dir) = queue.pop_front() {
            for entry in std::fs::read_dir(&current_dir)? {
                let path = entry?.path();
                let Some(relative) = self.relative(&path) else {
                    continue;
                };
                if path.is_dir() {
                    if !self.is_excluded(relative) && !is_skipped_dir(relative) {
                        queue.push_back(path);
                    }
                } else if self.is_asset(relative) {
                    found.push(relative.to_path_buf());
                }
            }
        }

        found.sort();
        Ok(found)
    }

    /// Copy every matching file into `dest`, returning the number copied
    pub fn copy_all(&self, dest: &Path) -> KilnResult<usize> {
        let files = self.collect()?;
        for file in &files {
            self.copy_file(file, dest)?;
        }
        debug!(count = files.len(), dest = %dest.display(), "copied assets");
        Ok(files.len())
    }

    /// Copy one matching file into `dest`, returning where it was written
    pub fn copy_file(&self, path: &Path, dest: &Path) -> KilnResult<PathBuf> {
        let relative = self.relative(path).ok_or_else(|| {
            KilnError::Config(format!("{} is outside the project root", path.display()))
        })?;
        let target = dest.join(self.destination_suffix(relative));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(self.root.join(relative), &target)?;
        trace!(from = %relative.display(), to = %target.display(), "copied asset");
        Ok(target)
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        self.excluded.iter().any(|dir| relative.starts_with(dir))
    }

    fn is_asset(&self, relative: &Path) -> bool {
        if self.is_excluded(relative) {
            return false;
        }
        let Some(&index) = self.glob_set.matches(relative).first() else {
            return false;
        };
        let below_base = relative.strip_prefix(&self.bases[index]).unwrap_or(relative);
        !below_base
            .parent()
            .is_some_and(|dirs| dirs.ancestors().any(is_skipped_dir))
    }

    fn relative<'p>(&self, path: &'p Path) -> Option<&'p Path> {
        if let Ok(stripped) = path.strip_prefix(&self.root) {
            return Some(stripped);
        }
        path.is_relative().then_some(path)
    }

    /// Path below the destination: the relative path minus the base of the
    /// first pattern that matches it
    fn destination_suffix<'p>(&self, relative: &'p Path) -> &'p Path {
        self.glob_set
            .matches(relative)
            .first()
            .and_then(|&index| relative.strip_prefix(&self.bases[index]).ok())
            .unwrap_or(relative)
    }
}

fn is_skipped_dir(dir: &Path) -> bool {
    dir.file_name()
        .is_some_and(|name| SKIPPED_DIR_NAMES.iter().any(|skipped| name == *skipped))
}

/// Literal directory prefix of a glob pattern (`assets/**/*.png` -> `assets`)
fn pattern_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let components: Vec<Component> = Path::new(pattern).components().collect();
    // The final component is a file pattern even when it has no wildcards
    let Some((_, dirs)) = components.split_last() else {
        return base;
    };
    for component in dirs {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(GLOB_META) {
            break;
        }
        base.push(component);
    }
    base
}
