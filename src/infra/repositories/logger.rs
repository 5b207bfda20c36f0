//! Logging capability injected into repositories.

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::infra::collection::Filter;

/// Where repositories report misses.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait RepositoryLogger: Send + Sync {
    /// Warn about `message`, attaching the filter that caused it.
    fn warn(&self, message: &str, filter: &Filter);
}

/// [`RepositoryLogger`] backed by `tracing`, tagged with the owning
/// repository's name.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    context: &'static str,
}

impl TracingLogger {
    pub fn new(context: &'static str) -> Self {
        Self { context }
    }
}

impl RepositoryLogger for TracingLogger {
    fn warn(&self, message: &str, filter: &Filter) {
        tracing::warn!(context = self.context, filter = %filter, "{}", message);
    }
}
