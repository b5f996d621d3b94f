//! Pipeline Orchestrator
//!
//! Two-stage chunk-and-merge flow:
//!
//! ```text
//! Scanning ─▶ Summarizing ─▶ Merging ─▶ Done
//!     └────────────┴─────────────┴──▶ Aborted (run-level failure)
//! ```
//!
//! - **Scanning**: drain the scanner into memory, surfacing every warning
//! - **Summarizing**: one call per chunk, bounded concurrency, results
//!   reassembled in chunk order and cached per chunk
//! - **Merging**: starts only after every summary has finished or failed;
//!   one call per document type over the joined summaries
//!
//! Every call passes admission control first. Per-unit failures are
//! reported and never stop sibling units.

mod artifacts;
mod report;

pub use artifacts::{ArtifactStore, cache_key};
pub use report::{ChunkSummary, PipelineStage, PipelineWarning, RunReport, UnitFailure};

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::ai::budget::TokenBudgetOracle;
use crate::ai::models::ModelRegistry;
use crate::ai::prompt::{PromptTemplates, build_instruction};
use crate::ai::provider::{GenerationGateway, GenerationRequest, ProviderKind, ProviderRegistry};
use crate::config::Config;
use crate::constants::pipeline::SUMMARY_SEPARATOR;
use crate::scanner::{Chunk, FileScanner, ScanItem};
use crate::types::{DocType, Result, RunesmithError, Stage};

/// Result of one unit plus the warnings it raised
struct UnitOutcome<T> {
    result: Result<T>,
    warnings: Vec<PipelineWarning>,
}

pub struct Pipeline {
    config: Config,
    provider: ProviderKind,
    gateway: GenerationGateway,
    oracle: Arc<TokenBudgetOracle>,
    store: ArtifactStore,
}

impl Pipeline {
    /// Pipeline with the built-in provider bindings
    pub fn new(config: Config) -> Result<Self> {
        let registry = ProviderKind::ALL
            .into_iter()
            .fold(ProviderRegistry::builtin(), |registry, kind| {
                registry.with_config(kind, config.provider_config(kind))
            });
        Self::with_registry(config, registry)
    }

    /// Pipeline over a caller-supplied provider registry
    pub fn with_registry(config: Config, registry: ProviderRegistry) -> Result<Self> {
        config.validate()?;
        let provider = config.provider_kind()?;

        let mut models = ModelRegistry::builtin();
        if let Some(window) = config.llm.context_window {
            models = models.with_window(provider, &config.model, window);
        }

        let gateway =
            GenerationGateway::new(registry, provider).with_max_retries(config.llm.max_retries);
        let store = ArtifactStore::new(&config.output_dir, &config.pipeline.cache_dir);

        Ok(Self {
            config,
            provider,
            gateway,
            oracle: Arc::new(TokenBudgetOracle::new(models)),
            store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scanner for the configured tree; the chunk cache is pruned when it
    /// lives inside the code tree
    pub fn scanner(&self) -> FileScanner {
        let scanner =
            FileScanner::new(&self.config.code_path).with_blacklist(&self.config.blacklist);
        match self.store.cache_dir_within(&self.config.code_path) {
            Some(relative) => scanner.exclude_dir(relative),
            None => scanner,
        }
    }

    /// Drain the scanner, recording scan warnings on `report`
    pub fn scan(&self, report: &mut RunReport) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for item in self.scanner().chunks()? {
            match item {
                ScanItem::Chunk(chunk) => chunks.push(chunk),
                ScanItem::Warning(warning) => report.warn(PipelineWarning::Scan(warning)),
            }
        }
        Ok(chunks)
    }

    #[instrument(skip(self), fields(provider = %self.provider, model = %self.config.model))]
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        match self.run_stages(&mut report).await {
            Ok(()) => {
                advance(&mut report, PipelineStage::Done);
                Ok(report)
            }
            Err(e) => {
                warn!("Run failed during {}: {}", report.stage, e);
                advance(&mut report, PipelineStage::Aborted);
                Err(e)
            }
        }
    }

    async fn run_stages(&self, report: &mut RunReport) -> Result<()> {
        // Preflight: the selected provider must be constructible
        self.gateway.provider(None)?;

        advance(report, PipelineStage::Scanning);
        let chunks = self.scan(report)?;
        report.chunk_count = chunks.len();
        info!("Collected {} chunks", chunks.len());

        self.store.prepare().await?;

        match self.oracle.model_spec(self.provider, &self.config.model) {
            Ok(spec) => info!("Context window: {} tokens", spec.context_window),
            Err(RunesmithError::UnknownModel { .. }) => {
                report.warn(PipelineWarning::UnknownModel {
                    provider: self.provider,
                    model: self.config.model.clone(),
                });
            }
            Err(e) => return Err(e),
        }

        advance(report, PipelineStage::Summarizing);
        self.summarize(chunks, report).await;

        advance(report, PipelineStage::Merging);
        self.merge(report).await;

        Ok(())
    }

    // =========================================================================
    // Summarizing
    // =========================================================================

    async fn summarize(&self, chunks: Vec<Chunk>, report: &mut RunReport) {
        let mut owners: HashMap<String, String> = HashMap::new();
        for chunk in &chunks {
            let key = cache_key(&chunk.path);
            if let Some(first) = owners.insert(key.clone(), chunk.path.clone()) {
                report.warn(PipelineWarning::CacheCollision {
                    key,
                    first,
                    second: chunk.path.clone(),
                });
            }
        }

        let instruction = PromptTemplates::summary_instruction(&self.config.doc_types);
        let instruction = instruction.as_str();
        let mut slots: Vec<Option<ChunkSummary>> = vec![None; chunks.len()];

        let mut results = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| async move {
                let outcome = self.summarize_chunk(instruction, &chunk).await;
                (index, chunk.path, outcome)
            })
            .buffer_unordered(self.config.pipeline.summary_concurrency);

        while let Some((index, path, outcome)) = results.next().await {
            for warning in outcome.warnings {
                report.warn(warning);
            }
            match outcome.result {
                Ok((text, cache_path)) => {
                    if let Some(cache_path) = cache_path {
                        report.cache_artifacts.push(cache_path);
                    }
                    slots[index] = Some(ChunkSummary { path, text });
                }
                Err(e) => report.fail(UnitFailure::new(Stage::Summarizing, path, &e)),
            }
        }

        report.cache_artifacts.sort();
        report.summaries = slots.into_iter().flatten().collect();
        info!(
            "Summarized {}/{} chunks",
            report.summaries.len(),
            report.chunk_count
        );
    }

    async fn summarize_chunk(
        &self,
        instruction: &str,
        chunk: &Chunk,
    ) -> UnitOutcome<(String, Option<PathBuf>)> {
        let mut warnings = Vec::new();
        let prompt = PromptTemplates::chunk_prompt(&chunk.path, &chunk.content);

        let text = match self
            .admit_and_generate(Stage::Summarizing, &chunk.path, instruction, &prompt, &mut warnings)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                return UnitOutcome {
                    result: Err(e),
                    warnings,
                };
            }
        };

        let cache_path = self.store.cache_path(&chunk.path);
        let cached = match self.store.write(&cache_path, &text).await {
            Ok(()) => Some(cache_path),
            Err(e) => {
                warnings.push(PipelineWarning::CacheWrite {
                    path: cache_path.display().to_string(),
                    reason: e.to_string(),
                });
                None
            }
        };

        UnitOutcome {
            result: Ok((text, cached)),
            warnings,
        }
    }

    // =========================================================================
    // Merging
    // =========================================================================

    async fn merge(&self, report: &mut RunReport) {
        let draft = report
            .summaries
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(SUMMARY_SEPARATOR);
        let draft = draft.as_str();
        let has_summaries = !report.summaries.is_empty();

        let mut slots: Vec<Option<PathBuf>> = vec![None; self.config.doc_types.len()];
        let mut results = stream::iter(self.config.doc_types.iter().enumerate())
            .map(|(index, doc_type)| async move {
                let outcome = self.merge_doc(doc_type, draft, has_summaries).await;
                (index, doc_type, outcome)
            })
            .buffer_unordered(self.config.pipeline.merge_concurrency);

        while let Some((index, doc_type, outcome)) = results.next().await {
            for warning in outcome.warnings {
                report.warn(warning);
            }
            match outcome.result {
                Ok(path) => {
                    info!("Wrote {}", path.display());
                    slots[index] = Some(path);
                }
                Err(e) => report.fail(UnitFailure::new(Stage::Merging, doc_type.as_str(), &e)),
            }
        }

        report.artifacts = slots.into_iter().flatten().collect();
    }

    async fn merge_doc(
        &self,
        doc_type: &DocType,
        draft: &str,
        has_summaries: bool,
    ) -> UnitOutcome<PathBuf> {
        let mut warnings = Vec::new();
        let result = self
            .try_merge_doc(doc_type, draft, has_summaries, &mut warnings)
            .await;
        UnitOutcome { result, warnings }
    }

    async fn try_merge_doc(
        &self,
        doc_type: &DocType,
        draft: &str,
        has_summaries: bool,
        warnings: &mut Vec<PipelineWarning>,
    ) -> Result<PathBuf> {
        if !has_summaries {
            return Err(RunesmithError::NoSummaries {
                doc_type: doc_type.to_string(),
            });
        }

        let instruction = build_instruction(
            doc_type,
            &self.config.custom_instructions,
            &self.config.output_dir,
            &self.config.code_path,
        )?;
        let prompt = PromptTemplates::merge_prompt(doc_type, draft);

        let text = self
            .admit_and_generate(
                Stage::Merging,
                doc_type.as_str(),
                &instruction.text,
                &prompt,
                warnings,
            )
            .await?;

        let path = self.store.artifact_path(doc_type);
        self.store.write(&path, &text).await?;
        Ok(path)
    }

    // =========================================================================
    // Admission + Generation
    // =========================================================================

    async fn admit_and_generate(
        &self,
        stage: Stage,
        unit: &str,
        system_instruction: &str,
        user_prompt: &str,
        warnings: &mut Vec<PipelineWarning>,
    ) -> Result<String> {
        let model = &self.config.model;
        let request = GenerationRequest::new(model.as_str(), system_instruction, user_prompt)
            .with_temperature(self.config.llm.temperature)
            .with_provider(self.provider.key());

        // BPE over a whole file or merge draft is CPU-bound
        let oracle = Arc::clone(&self.oracle);
        let provider = self.provider;
        let (request, admission) = tokio::task::spawn_blocking(move || {
            let admission = oracle.check(
                provider,
                &request.model,
                &request.system_instruction,
                &request.user_prompt,
            );
            (request, admission)
        })
        .await
        .map_err(|e| RunesmithError::Io(std::io::Error::other(e.to_string())))?;

        if let Some(fallback) = admission.fallback {
            warnings.push(PipelineWarning::TokenizerFallback {
                model: model.clone(),
                fallback: fallback.to_string(),
            });
        }

        if !admission.fits()
            && let Some(window) = admission.window.limit()
        {
            return Err(RunesmithError::TokenLimitExceeded {
                stage,
                unit: unit.to_string(),
                tokens: admission.tokens,
                window,
            });
        }

        self.gateway.generate(&request).await
    }
}

fn advance(report: &mut RunReport, stage: PipelineStage) {
    info!("Stage: {} -> {}", report.stage, stage);
    report.stage = stage;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{LlmProvider, SharedProvider};
    use crate::types::{ErrorCategory, LlmError};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Summaries echo the chunk path; merges echo the document type.
    /// Any user prompt containing `FAIL` errors out.
    #[derive(Default)]
    struct Scripted {
        calls: Mutex<Vec<GenerationRequest>>,
    }

    impl Scripted {
        fn calls(&self) -> Vec<GenerationRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        async fn generate(&self, request: &GenerationRequest) -> crate::types::Result<String> {
            self.calls.lock().unwrap().push(request.clone());
            let prompt = &request.user_prompt;

            if prompt.contains("FAIL") {
                return Err(LlmError::with_provider(ErrorCategory::Transient, "boom", "scripted").into());
            }
            if let Some(rest) = prompt.strip_prefix("# File: ") {
                let path = rest.lines().next().unwrap_or_default();
                return Ok(format!("summary:{}", path));
            }
            let start = prompt.find("following ").unwrap() + "following ".len();
            let end = prompt.find(" drafts").unwrap();
            Ok(format!("```markdown\nfinal {}\n```", &prompt[start..end]))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct Fixture {
        _dir: TempDir,
        code: PathBuf,
        out: PathBuf,
    }

    fn fixture(files: &[(&str, &str)]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let code = dir.path().join("code");
        fs::create_dir_all(&code).unwrap();
        for (path, content) in files {
            let full = code.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let out = dir.path().join("out");
        Fixture {
            _dir: dir,
            code,
            out,
        }
    }

    fn config(fx: &Fixture, provider: &str, model: &str, doc_types: &[&str]) -> Config {
        Config {
            provider: provider.to_string(),
            model: model.to_string(),
            code_path: fx.code.clone(),
            output_dir: fx.out.clone(),
            doc_types: doc_types.iter().map(|d| DocType::from(*d)).collect(),
            ..Default::default()
        }
    }

    fn scripted_pipeline(config: Config, kind: ProviderKind) -> (Pipeline, Arc<Scripted>) {
        let scripted = Arc::new(Scripted::default());
        let shared = Arc::clone(&scripted);
        let mut registry = ProviderRegistry::empty();
        registry.register(kind, move |_| Ok(Arc::clone(&shared) as SharedProvider));
        (Pipeline::with_registry(config, registry).unwrap(), scripted)
    }

    #[tokio::test]
    async fn test_two_doc_types_two_chunks() {
        let fx = fixture(&[("a.py", "print('a')"), ("src/b.py", "print('b')")]);
        let cfg = config(&fx, "openai", "gpt-4o", &["Readme", "Tutorial"]);
        let (pipeline, scripted) = scripted_pipeline(cfg, ProviderKind::OpenAi);

        let report = pipeline.run().await.unwrap();

        assert!(report.is_success(), "failures: {:?}", report.failures);
        assert_eq!(report.chunk_count, 2);
        assert_eq!(report.cache_artifacts.len(), 2);
        assert!(fx.out.join("cache_docs/a_py.md").is_file());
        assert!(fx.out.join("cache_docs/src_b_py.md").is_file());
        assert_eq!(
            fs::read_to_string(fx.out.join("cache_docs/src_b_py.md")).unwrap(),
            "summary:src/b.py"
        );

        assert_eq!(
            report.artifacts,
            vec![fx.out.join("readme.md"), fx.out.join("tutorial.md")]
        );
        assert_eq!(fs::read_to_string(fx.out.join("readme.md")).unwrap(), "final Readme");
        assert_eq!(
            fs::read_to_string(fx.out.join("tutorial.md")).unwrap(),
            "final Tutorial"
        );

        // 2 summaries + 2 merges, every call on the configured model
        let calls = scripted.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|c| c.model == "gpt-4o" && c.provider.as_deref() == Some("openai")));
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    }

    #[tokio::test]
    async fn test_summaries_in_chunk_order_and_joined_for_merge() {
        let files: Vec<(String, String)> = (0..12)
            .map(|i| (format!("f{:02}.rs", i), format!("fn f{}() {{}}", i)))
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
        let fx = fixture(&refs);
        let (pipeline, scripted) = scripted_pipeline(
            config(&fx, "openai", "gpt-4o", &["Readme"]),
            ProviderKind::OpenAi,
        );

        let report = pipeline.run().await.unwrap();
        let paths: Vec<_> = report.summaries.iter().map(|s| s.path.as_str()).collect();
        let expected: Vec<_> = files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, expected);

        let merge = scripted
            .calls()
            .into_iter()
            .find(|c| !c.user_prompt.starts_with("# File: "))
            .unwrap();
        let expected_draft = expected
            .iter()
            .map(|p| format!("summary:{}", p))
            .collect::<Vec<_>>()
            .join("\n\n");
        assert!(merge.user_prompt.ends_with(&expected_draft));
    }

    #[tokio::test]
    async fn test_unknown_model_still_generates() {
        let fx = fixture(&[("a.py", "x = 1")]);
        let (pipeline, scripted) = scripted_pipeline(
            config(&fx, "ollama", "llama3", &["Readme"]),
            ProviderKind::Ollama,
        );

        let report = pipeline.run().await.unwrap();
        assert!(report.is_success());
        assert_eq!(scripted.calls().len(), 2);
        assert!(report.warnings.contains(&PipelineWarning::UnknownModel {
            provider: ProviderKind::Ollama,
            model: "llama3".to_string(),
        }));
        // Tokenizer fallback reported once, not per call
        let fallbacks = report
            .warnings
            .iter()
            .filter(|w| matches!(w, PipelineWarning::TokenizerFallback { .. }))
            .count();
        assert_eq!(fallbacks, 1);
    }

    #[tokio::test]
    async fn test_token_limit_skips_unit_and_continues() {
        let fx = fixture(&[("a.py", "x = 1")]);
        let oracle = TokenBudgetOracle::default();
        let doc = DocType::from("Readme");
        let summary_instruction = PromptTemplates::summary_instruction(std::slice::from_ref(&doc));
        let small = oracle
            .check(
                ProviderKind::OpenAi,
                "gpt-4o",
                &summary_instruction,
                &PromptTemplates::chunk_prompt("a.py", "x = 1"),
            )
            .tokens;
        let merge_instruction = build_instruction(&doc, "", &fx.out, &fx.code).unwrap();
        let merge = oracle
            .check(
                ProviderKind::OpenAi,
                "gpt-4o",
                &merge_instruction.text,
                &PromptTemplates::merge_prompt(&doc, "summary:a.py"),
            )
            .tokens;
        let window = small.max(merge);
        fs::write(fx.code.join("big.py"), "word ".repeat(window * 2)).unwrap();

        let mut cfg = config(&fx, "openai", "gpt-4o", &["Readme"]);
        cfg.llm.context_window = Some(window);
        let (pipeline, scripted) = scripted_pipeline(cfg, ProviderKind::OpenAi);

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.stage, PipelineStage::Done);
        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.stage, Stage::Summarizing);
        assert_eq!(failure.unit, "big.py");
        assert_eq!(failure.kind, "token_limit_exceeded");

        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.artifacts, vec![fx.out.join("readme.md")]);
        // The oversized chunk was never sent
        assert!(scripted.calls().iter().all(|c| !c.user_prompt.contains("big.py")));
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_oversized_merge_fails_only_its_document() {
        let fx = fixture(&[("a.py", "x = 1")]);
        let oracle = TokenBudgetOracle::default();
        let docs = [DocType::from("Readme"), DocType::from("Tutorial")];
        let chunk = oracle
            .check(
                ProviderKind::OpenAi,
                "gpt-4o",
                &PromptTemplates::summary_instruction(&docs),
                &PromptTemplates::chunk_prompt("a.py", "x = 1"),
            )
            .tokens;
        let readme_instruction = build_instruction(&docs[0], "", &fx.out, &fx.code).unwrap();
        let readme = oracle
            .check(
                ProviderKind::OpenAi,
                "gpt-4o",
                &readme_instruction.text,
                &PromptTemplates::merge_prompt(&docs[0], "summary:a.py"),
            )
            .tokens;
        let window = chunk.max(readme);

        // An existing tutorial is folded into its update instruction
        fs::create_dir_all(&fx.out).unwrap();
        fs::write(fx.out.join("tutorial.md"), "word ".repeat(window * 2)).unwrap();

        let mut cfg = config(&fx, "openai", "gpt-4o", &["Readme", "Tutorial"]);
        cfg.llm.context_window = Some(window);
        let (pipeline, scripted) = scripted_pipeline(cfg, ProviderKind::OpenAi);

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.stage, PipelineStage::Done);
        assert_eq!(report.failures_in(Stage::Summarizing).count(), 0);
        let merges: Vec<_> = report.failures_in(Stage::Merging).collect();
        assert_eq!(merges.len(), 1);
        assert_eq!(merges[0].unit, "Tutorial");
        assert_eq!(merges[0].kind, "token_limit_exceeded");

        assert_eq!(report.artifacts, vec![fx.out.join("readme.md")]);
        assert_eq!(fs::read_to_string(fx.out.join("readme.md")).unwrap(), "final Readme");
        // One summary and the Readme merge; the Tutorial merge was never sent
        let calls = scripted.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| !c.user_prompt.contains("Tutorial")));
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_backend_failure_isolated_to_chunk() {
        let fx = fixture(&[("bad.py", "FAIL"), ("good.py", "ok")]);
        let (pipeline, _) = scripted_pipeline(
            config(&fx, "openai", "gpt-4o", &["Readme"]),
            ProviderKind::OpenAi,
        );

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].unit, "bad.py");
        assert_eq!(report.failures[0].kind, "backend");
        assert_eq!(report.summaries.len(), 1);
        assert!(fx.out.join("readme.md").is_file());
        assert!(!fx.out.join("cache_docs/bad_py.md").exists());
    }

    #[tokio::test]
    async fn test_no_summaries_fails_without_merge_call() {
        let fx = fixture(&[("a.py", "FAIL"), ("b.py", "FAIL")]);
        let (pipeline, scripted) = scripted_pipeline(
            config(&fx, "openai", "gpt-4o", &["Readme", "Tutorial"]),
            ProviderKind::OpenAi,
        );

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.failures_in(Stage::Summarizing).count(), 2);
        let merges: Vec<_> = report.failures_in(Stage::Merging).collect();
        assert_eq!(merges.len(), 2);
        assert!(merges.iter().all(|f| f.kind == "no_summaries"));
        assert_eq!(scripted.calls().len(), 2);
        assert!(report.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_existing_artifact_uses_update_instruction() {
        let fx = fixture(&[("a.py", "x = 1")]);
        fs::create_dir_all(&fx.out).unwrap();
        fs::write(fx.out.join("readme.md"), "# Old readme\n").unwrap();

        let (pipeline, scripted) = scripted_pipeline(
            config(&fx, "openai", "gpt-4o", &["Readme"]),
            ProviderKind::OpenAi,
        );
        pipeline.run().await.unwrap();

        let merge = scripted
            .calls()
            .into_iter()
            .find(|c| !c.user_prompt.starts_with("# File: "))
            .unwrap();
        assert!(merge.system_instruction.starts_with("The documentation already exists."));
        assert!(merge.system_instruction.contains("# Old readme\n"));
        assert_eq!(fs::read_to_string(fx.out.join("readme.md")).unwrap(), "final Readme");
    }

    #[tokio::test]
    async fn test_cache_inside_code_tree_not_rescanned() {
        let fx = fixture(&[("a.py", "x = 1")]);
        let mut cfg = config(&fx, "openai", "gpt-4o", &["Readme"]);
        cfg.output_dir = fx.code.join("docs");
        let (pipeline, _) = scripted_pipeline(cfg, ProviderKind::OpenAi);

        pipeline.run().await.unwrap();
        let second = pipeline.run().await.unwrap();

        assert!(
            second
                .summaries
                .iter()
                .all(|s| !s.path.starts_with("docs/cache_docs"))
        );
        // The previous final artifact is ordinary input on the next run
        assert!(second.summaries.iter().any(|s| s.path == "docs/readme.md"));
    }

    #[tokio::test]
    async fn test_preflight_aborts_before_output() {
        let fx = fixture(&[("a.py", "x = 1")]);
        let cfg = config(&fx, "anthropic", "claude-3-opus", &["Readme"]);
        let pipeline = Pipeline::with_registry(cfg, ProviderRegistry::empty()).unwrap();

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, RunesmithError::ProviderUnavailable { .. }));
        assert!(!fx.out.exists());
    }

    #[tokio::test]
    async fn test_missing_code_path_aborts() {
        let fx = fixture(&[]);
        let mut cfg = config(&fx, "openai", "gpt-4o", &["Readme"]);
        cfg.code_path = fx.code.join("missing");
        let (pipeline, scripted) = scripted_pipeline(cfg, ProviderKind::OpenAi);

        assert!(matches!(
            pipeline.run().await,
            Err(RunesmithError::Scan { .. })
        ));
        assert!(scripted.calls().is_empty());
    }

    #[test]
    fn test_empty_doc_types_is_config_error() {
        let fx = fixture(&[]);
        let cfg = config(&fx, "openai", "gpt-4o", &[]);
        assert!(matches!(
            Pipeline::with_registry(cfg, ProviderRegistry::empty()),
            Err(RunesmithError::Config(_))
        ));
    }

    #[test]
    fn test_scan_reports_warnings() {
        let fx = fixture(&[
            ("a.py", "print(1)"),
            ("b.txt", "notes"),
            (".gitignore", "*.log\n"),
            ("c.log", "log"),
        ]);
        let mut cfg = config(&fx, "openai", "gpt-4o", &["Readme"]);
        cfg.blacklist = vec![".txt".to_string()];
        let pipeline = Pipeline::with_registry(cfg, ProviderRegistry::empty()).unwrap();

        let mut report = RunReport::default();
        let chunks = pipeline.scan(&mut report).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].path, "a.py");
        assert_eq!(report.warnings.len(), 2);
    }
}
