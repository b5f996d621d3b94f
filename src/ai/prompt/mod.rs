//! Prompt Builder System
//!
//! Prompt construction for both pipeline stages.
//!
//! ## Prompts
//!
//! 1. **Summary instruction**: fixed system instruction for per-file summaries
//! 2. **Chunk prompt**: `# File: {path}` header followed by the file content
//! 3. **Merge prompt**: all summaries joined into one draft for a document type
//! 4. **Document instruction**: update-or-create, see [`instruction`]

pub mod instruction;

pub use instruction::{Instruction, InstructionMode, build_instruction};

use crate::types::DocType;

/// Prompt builder: non-empty sections joined by blank lines
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a persona sentence
    pub fn role(mut self, persona: &str) -> Self {
        self.sections.push(format!("You are {}.", persona));
        self
    }

    /// Add a raw text section; blank text is dropped
    pub fn text(mut self, content: &str) -> Self {
        if !content.trim().is_empty() {
            self.sections.push(content.to_string());
        }
        self
    }

    /// Add a text section under a markdown header. Content is kept verbatim.
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(format!("# {}\n\n{}", header, content));
        self
    }

    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

/// Preset prompt templates for the two pipeline stages
pub struct PromptTemplates;

impl PromptTemplates {
    /// System instruction for summarizing one file
    pub fn summary_instruction(doc_types: &[DocType]) -> String {
        let targets = doc_types
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        PromptBuilder::new()
            .role("a professional technical writer")
            .text(
                "Summarise and list the technical elements of this file. The reader is also an \
                 expert so prioritise preserving details whilst condensing information.",
            )
            .text(&format!(
                "Multiple of such summaries of individual files will be combined into {} \
                 documentation files.",
                targets
            ))
            .build()
    }

    /// User content for one chunk
    pub fn chunk_prompt(path: &str, content: &str) -> String {
        format!("# File: {}\n{}", path, content)
    }

    /// User content for merging every summary into one document
    pub fn merge_prompt(doc_type: &DocType, combined_draft: &str) -> String {
        PromptBuilder::new()
            .role("a professional technical writer")
            .text(&format!(
                "Merge and organize the following {} drafts into a coherent document with \
                 clear structure, no duplication, and polished transitions.",
                doc_type
            ))
            .text(combined_draft)
            .build()
    }
}
