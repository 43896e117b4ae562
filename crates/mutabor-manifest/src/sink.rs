//! The manifest sink contract and the in-memory implementation.

use std::sync::Mutex;

use async_trait::async_trait;
use mutabor_policy::TransformationResult;

use crate::error::Result;

/// Persists the ordered result list of one run.
#[async_trait]
pub trait ManifestSink: Send + Sync {
    /// Write the manifest for one run.
    ///
    /// Called exactly once per run, with the full result list — even an empty
    /// one, so the manifest always records that a run occurred. `Empty`
    /// results are filtered transparently; the persisted transformation
    /// count equals the applied count of the input.
    async fn write_manifest(&self, results: &[TransformationResult]) -> Result<()>;
}

#[async_trait]
impl<T: ManifestSink> ManifestSink for std::sync::Arc<T> {
    async fn write_manifest(&self, results: &[TransformationResult]) -> Result<()> {
        self.as_ref().write_manifest(results).await
    }
}

/// In-memory sink for development and testing.
///
/// Records every `write_manifest` call verbatim so tests can assert on call
/// counts and payloads.
#[derive(Debug, Default)]
pub struct MemorySink {
    calls: Mutex<Vec<Vec<TransformationResult>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `write_manifest` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// The result list of the most recent call.
    pub fn last_write(&self) -> Option<Vec<TransformationResult>> {
        self.calls
            .lock()
            .ok()
            .and_then(|calls| calls.last().cloned())
    }

    /// Applied results of the most recent call.
    pub fn last_applied(&self) -> Vec<TransformationResult> {
        self.last_write()
            .unwrap_or_default()
            .into_iter()
            .filter(TransformationResult::is_applied)
            .collect()
    }
}

#[async_trait]
impl ManifestSink for MemorySink {
    async fn write_manifest(&self, results: &[TransformationResult]) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(results.to_vec());
        }
        Ok(())
    }
}
