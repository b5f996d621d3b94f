//! Repository Scanner
//!
//! Walks a source tree depth-first, applies the root ignore rules and the
//! extension blacklist, and yields one [`Chunk`] per readable file.

pub mod file_scanner;
pub mod gitignore;

pub use file_scanner::{Chunk, FileScanner, ScanItem, ScanIter, ScanWarning, extension_label};
pub use gitignore::GitIgnoreFilter;
