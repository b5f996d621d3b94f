use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use tracing::warn;

use crate::constants::scan::IGNORE_FILE;

/// Compiled ignore rules from the scanned root's `.gitignore`
#[derive(Clone, Default)]
pub struct GitIgnoreFilter {
    gitignore: Option<Gitignore>,
}

impl GitIgnoreFilter {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let gitignore_path = root.as_ref().join(IGNORE_FILE);

        let gitignore = if gitignore_path.is_file() {
            let mut builder = GitignoreBuilder::new(root.as_ref());
            if let Some(err) = builder.add(&gitignore_path) {
                warn!("Partially invalid {}: {}", gitignore_path.display(), err);
            }
            match builder.build() {
                Ok(gi) => Some(gi),
                Err(e) => {
                    warn!("Ignoring unusable {}: {}", gitignore_path.display(), e);
                    None
                }
            }
        } else {
            None
        };

        Self { gitignore }
    }

    /// Test a path relative to the root. Files under an ignored directory
    /// are ignored too.
    pub fn is_ignored<P: AsRef<Path>>(&self, relative: P, is_dir: bool) -> bool {
        match &self.gitignore {
            Some(gi) => gi
                .matched_path_or_any_parents(relative.as_ref(), is_dir)
                .is_ignore(),
            None => false,
        }
    }

    pub fn has_rules(&self) -> bool {
        self.gitignore.as_ref().is_some_and(|gi| !gi.is_empty())
    }
}
