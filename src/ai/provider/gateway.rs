//! Generation Gateway
//!
//! Single entry point for every model call: selects the provider
//! (case-insensitive, falling back to the run's default), invokes it, and
//! normalizes the returned text.
//!
//! Backend failures are surfaced as-is unless a retry budget is configured;
//! only categories marked retryable are ever retried, waiting as long as the
//! backend asked when it sent a `Retry-After`.

use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{
    GenerationRequest, ProviderKind, ProviderRegistry, SharedProvider, unwrap_markdown_block,
};
use crate::constants::retry::{BASE_DELAY_MS, MAX_DELAY_SECS};
use crate::types::{Result, RunesmithError};

#[derive(Debug)]
pub struct GenerationGateway {
    registry: ProviderRegistry,
    default_provider: ProviderKind,
    max_retries: usize,
}

impl GenerationGateway {
    pub fn new(registry: ProviderRegistry, default_provider: ProviderKind) -> Self {
        Self {
            registry,
            default_provider,
            max_retries: 0,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Resolve a provider selector; blank or absent selects the default
    pub fn resolve(&self, selector: Option<&str>) -> Result<ProviderKind> {
        match selector {
            Some(s) if !s.trim().is_empty() => s.parse(),
            _ => Ok(self.default_provider),
        }
    }

    /// Construct (or fetch) the provider a selector resolves to
    pub fn provider(&self, selector: Option<&str>) -> Result<SharedProvider> {
        self.registry.get(self.resolve(selector)?)
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let kind = self.resolve(request.provider.as_deref())?;
        let provider = self.registry.get(kind)?;

        let text = if self.max_retries == 0 {
            provider.generate(request).await?
        } else {
            let backoff = ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(BASE_DELAY_MS))
                .with_max_delay(Duration::from_secs(MAX_DELAY_SECS))
                .with_max_times(self.max_retries)
                .with_jitter();

            (|| async { provider.generate(request).await })
                .retry(backoff)
                .when(RunesmithError::is_retryable)
                // A server-supplied wait replaces the computed backoff
                .adjust(|err: &RunesmithError, delay: Option<Duration>| {
                    delay.map(|d| err.retry_after().unwrap_or(d))
                })
                .notify(|err: &RunesmithError, delay: Duration| {
                    warn!("Retrying {} call in {:?}: {}", kind, delay, err);
                })
                .await?
        };

        debug!("{} returned {} chars", provider.name(), text.len());
        Ok(unwrap_markdown_block(&text))
    }
}
