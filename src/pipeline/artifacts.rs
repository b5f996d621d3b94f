//! Artifact Store
//!
//! Owns the output layout: one cache file per chunk under the cache
//! directory and one final file per document type under the output
//! directory. Writes fully overwrite; writers to the same path are
//! serialized.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::types::{DocType, Result};

/// Flat cache filename for a chunk path: separators and dots become `_`
pub fn cache_key(chunk_path: &str) -> String {
    format!("{}.md", chunk_path.replace(['/', '\\', '.'], "_"))
}

#[derive(Debug)]
pub struct ArtifactStore {
    output_dir: PathBuf,
    cache_dir: PathBuf,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>, cache_dir_name: &str) -> Self {
        let output_dir = output_dir.into();
        let cache_dir = output_dir.join(cache_dir_name);
        Self {
            output_dir,
            cache_dir,
            locks: DashMap::new(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Create the output and cache directories
    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        Ok(())
    }

    pub fn cache_path(&self, chunk_path: &str) -> PathBuf {
        self.cache_dir.join(cache_key(chunk_path))
    }

    pub fn artifact_path(&self, doc_type: &DocType) -> PathBuf {
        self.output_dir.join(doc_type.artifact_file_name())
    }

    /// Overwrite `path` with `content`, one writer per path at a time
    pub async fn write(&self, path: &Path, content: &str) -> Result<()> {
        let lock = Arc::clone(
            self.locks
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        let _guard = lock.lock().await;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        debug!("Wrote {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    /// Cache directory relative to `code_path`, when it lies inside it.
    /// The scanner prunes it so earlier summaries are never re-summarized.
    pub fn cache_dir_within(&self, code_path: &Path) -> Option<PathBuf> {
        let code = code_path.canonicalize().ok()?;
        let cache = absolute(&self.cache_dir)?;
        cache.strip_prefix(&code).ok().map(Path::to_path_buf)
    }
}

/// Absolute form of a path that may not exist yet: canonicalize the longest
/// existing ancestor and append the rest.
fn absolute(path: &Path) -> Option<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Some(resolved);
    }
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let base = match parent {
        Some(parent) => absolute(parent)?,
        None => std::env::current_dir().ok()?,
    };
    Some(base.join(path.file_name()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_key_sanitization() {
        assert_eq!(cache_key("src/app/main.py"), "src_app_main_py.md");
        assert_eq!(cache_key("Makefile"), "Makefile.md");
        assert_eq!(cache_key(".env.example"), "_env_example.md");
    }

    #[test]
    fn test_collision_is_possible() {
        assert_eq!(cache_key("a/b.py"), cache_key("a_b/py"));
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("out"), "cache_docs");
        store.prepare().await.unwrap();
        assert!(store.cache_dir().is_dir());

        let path = store.artifact_path(&DocType::from("Readme"));
        store.write(&path, "first version, longer").await.unwrap();
        store.write(&path, "second").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_concurrent_writes_same_path() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ArtifactStore::new(dir.path(), "cache"));
        let path = store.cache_path("x.py");

        let writes = (0..8).map(|i| {
            let store = Arc::clone(&store);
            let path = path.clone();
            async move { store.write(&path, &format!("content-{i}")).await }
        });
        for result in futures::future::join_all(writes).await {
            result.unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("content-"));
    }

    #[test]
    fn test_cache_dir_within_code_path() {
        let code = TempDir::new().unwrap();
        let inside = ArtifactStore::new(code.path().join("docs"), "cache_docs");
        assert_eq!(
            inside.cache_dir_within(code.path()),
            Some(PathBuf::from("docs/cache_docs"))
        );

        let elsewhere = TempDir::new().unwrap();
        let outside = ArtifactStore::new(elsewhere.path(), "cache_docs");
        assert_eq!(outside.cache_dir_within(code.path()), None);
    }
}
