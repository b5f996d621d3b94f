//! Document instruction: update an existing artifact or create a fresh one.
//!
//! An artifact that already exists under the output directory is fed back to
//! the model for a minimal-change update, unless it resolves to a path inside
//! the scanned code tree. In that case it is never read.

use std::fs;
use std::path::Path;
use tracing::debug;

use super::PromptBuilder;
use crate::types::{DocType, Result};

const UPDATE_PREAMBLE: &str = "The documentation already exists. Update, proofread, and tweak \
     it, making only minimal, safe changes. Preserve all critical information or replace with \
     equivalent, updated information. IMPORTANT: do NOT introduce major rewrites or alter \
     content unnecessarily.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionMode {
    Fresh,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub mode: InstructionMode,
    pub text: String,
}

/// Build the merge-stage system instruction for `doc_type`.
///
/// Reads the existing artifact when the update branch is taken.
pub fn build_instruction(
    doc_type: &DocType,
    custom_instructions: &str,
    output_dir: &Path,
    code_path: &Path,
) -> Result<Instruction> {
    let artifact = output_dir.join(doc_type.artifact_file_name());

    if artifact.exists() && !is_within_directory(&artifact, code_path) {
        debug!("Updating existing {}", artifact.display());
        let existing = fs::read_to_string(&artifact)?;
        let text = PromptBuilder::new()
            .text(UPDATE_PREAMBLE)
            .text(custom_instructions)
            .section("Existing documentation", &existing)
            .build();
        return Ok(Instruction {
            mode: InstructionMode::Update,
            text,
        });
    }

    let text = PromptBuilder::new()
        .role(&format!(
            "an expert coder and explainer that writes high-quality {} for developers",
            doc_type
        ))
        .text(custom_instructions)
        .build();
    Ok(Instruction {
        mode: InstructionMode::Fresh,
        text,
    })
}

/// Whether `path` resolves somewhere under `directory`
pub fn is_within_directory(path: &Path, directory: &Path) -> bool {
    match (path.canonicalize(), directory.canonicalize()) {
        (Ok(path), Ok(directory)) => path.starts_with(directory),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_when_missing() {
        let code = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let instruction = build_instruction(
            &DocType::from("Readme"),
            "Use British spelling.",
            out.path(),
            code.path(),
        )
        .unwrap();

        assert_eq!(instruction.mode, InstructionMode::Fresh);
        assert!(instruction.text.contains("high-quality Readme for developers"));
        assert!(instruction.text.ends_with("Use British spelling."));
    }

    #[test]
    fn test_update_includes_existing_verbatim() {
        let code = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let existing = "# Project\n\nOld   content with  spacing.\n\n";
        fs::write(out.path().join("api_documentation.md"), existing).unwrap();

        let instruction = build_instruction(
            &DocType::from("API documentation"),
            "Keep it short.",
            out.path(),
            code.path(),
        )
        .unwrap();

        assert_eq!(instruction.mode, InstructionMode::Update);
        assert!(instruction.text.starts_with("The documentation already exists."));
        assert!(instruction.text.contains(existing));

        let custom_at = instruction.text.find("Keep it short.").unwrap();
        let existing_at = instruction.text.find(existing).unwrap();
        assert!(custom_at < existing_at);
    }

    #[test]
    fn test_inside_code_path_is_never_read() {
        let code = TempDir::new().unwrap();
        let out = code.path().join("docs");
        // A directory where the artifact should be: reading it would fail
        fs::create_dir_all(out.join("readme.md")).unwrap();

        let instruction =
            build_instruction(&DocType::from("Readme"), "", &out, code.path()).unwrap();
        assert_eq!(instruction.mode, InstructionMode::Fresh);
    }

    #[test]
    fn test_is_within_directory_resolves_paths() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let file = nested.join("x.md");
        fs::write(&file, "x").unwrap();

        assert!(is_within_directory(&file, root.path()));
        assert!(is_within_directory(
            &root.path().join("a/../a/b/x.md"),
            &root.path().join("a")
        ));
        assert!(!is_within_directory(root.path(), &nested));
        assert!(!is_within_directory(&root.path().join("missing.md"), root.path()));
    }
}
