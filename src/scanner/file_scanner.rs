use ignore::{Walk, WalkBuilder};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::gitignore::GitIgnoreFilter;
use crate::constants::scan::{IGNORE_FILE, NO_EXTENSION, VCS_DIR};
use crate::types::{Result, RunesmithError};

/// One source file: path relative to the scanned root plus its full text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub path: String,
    pub content: String,
}

/// A file the scanner skipped, reported instead of a chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanWarning {
    /// Extension is on the blacklist
    Blacklisted { path: String, extension: String },
    /// File could not be opened or read
    Unreadable { path: String, reason: String },
    /// The root ignore file, consumed as configuration
    IgnoreFile { path: String },
    /// Symlink whose target is a directory, missing, or not a regular file
    Symlink { path: String, reason: String },
    /// Directory traversal error (permissions, broken entries)
    Walk { message: String },
}

impl ScanWarning {
    /// Relative path the warning refers to, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Blacklisted { path, .. }
            | Self::Unreadable { path, .. }
            | Self::IgnoreFile { path }
            | Self::Symlink { path, .. } => Some(path),
            Self::Walk { .. } => None,
        }
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blacklisted { path, extension } => {
                write!(f, "Skipping {} (extension {} not allowed)", path, extension)
            }
            Self::Unreadable { path, reason } => write!(f, "Could not read {}: {}", path, reason),
            Self::IgnoreFile { path } => write!(f, "Skipping {} (ignore rules file)", path),
            Self::Symlink { path, reason } => {
                write!(f, "Skipping symlink {} ({})", path, reason)
            }
            Self::Walk { message } => write!(f, "Directory traversal error: {}", message),
        }
    }
}

/// Item of the lazy scan sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanItem {
    Chunk(Chunk),
    Warning(ScanWarning),
}

/// Extension label used for blacklisting and the extension preview:
/// the suffix including its dot, or `(no extension)`.
pub fn extension_label(path: &Path) -> String {
    match path.extension().map(|e| e.to_string_lossy()) {
        Some(ext) if !ext.is_empty() => format!(".{}", ext),
        _ => NO_EXTENSION.to_string(),
    }
}

/// Forward-slash relative path, independent of the host separator
fn relative_key(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub struct FileScanner {
    root: PathBuf,
    blacklist: HashSet<String>,
    /// Internal tooling directories (relative to root) pruned like `.git`
    excluded_dirs: Vec<PathBuf>,
}

impl FileScanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            blacklist: HashSet::new(),
            excluded_dirs: Vec::new(),
        }
    }

    /// Blacklisted extensions, compared case-sensitively. Entries written
    /// without a leading dot (`txt`) are treated as `.txt`.
    pub fn with_blacklist<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blacklist = extensions
            .into_iter()
            .map(|e| {
                let e = e.as_ref().trim();
                if e.starts_with('.') || e == NO_EXTENSION {
                    e.to_string()
                } else {
                    format!(".{}", e)
                }
            })
            .collect();
        self
    }

    /// Exclude a directory, given relative to the root
    pub fn exclude_dir<P: AsRef<Path>>(mut self, relative: P) -> Self {
        self.excluded_dirs.push(relative.as_ref().to_path_buf());
        self
    }

    /// Start a fresh lazy scan. Each call walks the tree again.
    pub fn chunks(&self) -> Result<ScanIter> {
        self.ensure_root()?;
        let ignore = Arc::new(GitIgnoreFilter::new(&self.root));
        if ignore.has_rules() {
            debug!("Applying {} rules under {}", IGNORE_FILE, self.root.display());
        }
        Ok(ScanIter {
            walk: self.walker(Arc::clone(&ignore)),
            root: self.root.clone(),
            ignore,
            blacklist: self.blacklist.clone(),
        })
    }

    /// Sorted distinct extensions present after ignore filtering and before
    /// blacklist filtering. Read-only preview for file selection.
    pub fn extensions(&self) -> Result<Vec<String>> {
        self.ensure_root()?;
        let ignore = Arc::new(GitIgnoreFilter::new(&self.root));
        let mut extensions = BTreeSet::new();

        for entry in self.walker(Arc::clone(&ignore)).filter_map(|e| e.ok()) {
            let is_file = entry.file_type().is_some_and(|t| t.is_file())
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            if ignore.is_ignored(relative, false) {
                continue;
            }
            extensions.insert(extension_label(entry.path()));
        }

        Ok(extensions.into_iter().collect())
    }

    fn ensure_root(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(RunesmithError::Scan {
                path: self.root.display().to_string(),
                message: "not a readable directory".to_string(),
            })
        }
    }

    fn walker(&self, ignore: Arc<GitIgnoreFilter>) -> Walk {
        let root = self.root.clone();
        let excluded = self.excluded_dirs.clone();

        WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false) // Security: prevent symlink traversal attacks
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                if is_dir && entry.file_name() == VCS_DIR {
                    return false;
                }
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    return true;
                };
                if is_dir && excluded.iter().any(|dir| relative.starts_with(dir)) {
                    return false;
                }
                // Prune ignored directories without descending into them
                !(is_dir && ignore.is_ignored(relative, true))
            })
            .build()
    }
}

/// Lazy chunk/warning sequence produced by [`FileScanner::chunks`]
pub struct ScanIter {
    walk: Walk,
    root: PathBuf,
    ignore: Arc<GitIgnoreFilter>,
    blacklist: HashSet<String>,
}

impl ScanIter {
    /// `is_link` entries are read through when their target is a regular
    /// file. Directory links are never descended into.
    fn visit(&self, path: &Path, is_link: bool) -> Option<ScanItem> {
        let relative = path.strip_prefix(&self.root).ok()?;
        if self.ignore.is_ignored(relative, false) {
            debug!("Ignored by rules: {}", relative.display());
            return None;
        }

        let key = relative_key(relative);
        if is_link {
            let reason = match std::fs::metadata(path) {
                Ok(meta) if meta.is_file() => None,
                Ok(meta) if meta.is_dir() => Some("target is a directory".to_string()),
                Ok(_) => Some("target is not a regular file".to_string()),
                Err(e) => Some(format!("broken link: {}", e)),
            };
            if let Some(reason) = reason {
                return Some(ScanItem::Warning(ScanWarning::Symlink { path: key, reason }));
            }
        }

        if key == IGNORE_FILE {
            return Some(ScanItem::Warning(ScanWarning::IgnoreFile { path: key }));
        }

        let extension = extension_label(path);
        if self.blacklist.contains(&extension) {
            return Some(ScanItem::Warning(ScanWarning::Blacklisted {
                path: key,
                extension,
            }));
        }

        match std::fs::read(path) {
            Ok(bytes) => Some(ScanItem::Chunk(Chunk {
                path: key,
                content: String::from_utf8_lossy(&bytes).into_owned(),
            })),
            Err(e) => Some(ScanItem::Warning(ScanWarning::Unreadable {
                path: key,
                reason: e.to_string(),
            })),
        }
    }
}

impl Iterator for ScanIter {
    type Item = ScanItem;

    fn next(&mut self) -> Option<ScanItem> {
        loop {
            let entry = match self.walk.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Scan error: {}", e);
                    return Some(ScanItem::Warning(ScanWarning::Walk {
                        message: e.to_string(),
                    }));
                }
            };

            let is_link = entry.path_is_symlink();
            if !is_link && !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            if let Some(item) = self.visit(entry.path(), is_link) {
                return Some(item);
            }
        }
    }
}
