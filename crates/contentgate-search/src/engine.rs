//! Content query execution.
//!
//! The content index is an external collaborator reached through the
//! [`QueryExecutor`] trait. [`ContentQuery`] translates a request into the
//! canonical query string and hands it to the executor.

use std::sync::Arc;

use async_trait::async_trait;
use contentgate_core::ContentId;
use tracing::{debug, warn};

use crate::error::SearchError;
use crate::expression::FilterExpressionNode;
use crate::options::QueryOptions;
use crate::translator::QueryExpressionTranslator;

/// Executes canonical query strings against the content index.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str) -> Result<Vec<ContentId>, SearchError>;
}

/// Outcome of a collection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// The canonical query sent to the index
    pub query: String,
    pub ids: Vec<ContentId>,
}

/// Translate-then-execute façade over a [`QueryExecutor`].
#[derive(Clone)]
pub struct ContentQuery {
    translator: QueryExpressionTranslator,
    executor: Arc<dyn QueryExecutor>,
}

impl ContentQuery {
    pub fn new(translator: QueryExpressionTranslator, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            translator,
            executor,
        }
    }

    pub fn translator(&self) -> &QueryExpressionTranslator {
        &self.translator
    }

    pub async fn execute(
        &self,
        predicate: Option<&FilterExpressionNode>,
        filter_text: Option<&str>,
        scope_path: Option<&str>,
        options: &QueryOptions,
    ) -> Result<QueryResult, SearchError> {
        let query = self
            .translator
            .translate(predicate, filter_text, scope_path, options)?;

        let ids = self.executor.execute(&query).await.map_err(|e| {
            warn!(query = %query, error = %e, "Content query failed");
            e
        })?;
        debug!(query = %query, hits = ids.len(), "Content query executed");

        Ok(QueryResult { query, ids })
    }
}
