//! Translation of collection requests into canonical content queries.
//!
//! A request may carry a structural predicate (built in code), a textual
//! `$filter`, a scope path and paging options. The structural predicate is
//! first AND-ed with the scope (`InFolder:<path>`), then the parsed filter is
//! AND-ed on top:
//!
//! ```
//! use contentgate_search::{QueryExpressionTranslator, QueryOptions, field};
//!
//! let translator = QueryExpressionTranslator::new();
//! let query = translator
//!     .translate(
//!         Some(&field("Name").contains("s")),
//!         Some("isof('User')"),
//!         Some("/Root/IMS/BuiltIn/Portal"),
//!         &QueryOptions::new().with_top(12),
//!     )
//!     .unwrap();
//! assert_eq!(
//!     query,
//!     "+(+Name:*s* +InFolder:/root/ims/builtin/portal) +TypeIs:user .TOP:12"
//! );
//! ```

use tracing::{debug, trace};

use crate::error::TranslateError;
use crate::expression::FilterExpressionNode;
use crate::filter::parse_filter;
use crate::options::QueryOptions;
use crate::query_builder::{CanonicalQueryWriter, MAX_RENDER_DEPTH};

/// Translator from predicate trees and `$filter` text to canonical queries.
#[derive(Debug, Clone, Default)]
pub struct QueryExpressionTranslator {
    writer: CanonicalQueryWriter,
    max_top: Option<usize>,
}

impl QueryExpressionTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp `.TOP` to `max_top`.
    pub fn with_max_top(mut self, max_top: Option<usize>) -> Self {
        self.max_top = max_top;
        self
    }

    /// Merge the inputs into one tree without rendering it.
    pub fn merge_tree(
        &self,
        predicate: Option<&FilterExpressionNode>,
        filter_text: Option<&str>,
        scope_path: Option<&str>,
    ) -> Result<Option<FilterExpressionNode>, TranslateError> {
        if let Some(predicate) = predicate
            && predicate.depth() > MAX_RENDER_DEPTH
        {
            return Err(TranslateError::TooDeep {
                limit: MAX_RENDER_DEPTH,
            });
        }
        let parsed = match filter_text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => Some(parse_filter(text)?),
            None => None,
        };
        let scope = scope_path
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(FilterExpressionNode::in_folder);

        let scoped_source = FilterExpressionNode::merge(predicate.cloned(), scope);
        Ok(FilterExpressionNode::merge(scoped_source, parsed))
    }

    /// Produce the canonical query string.
    pub fn translate(
        &self,
        predicate: Option<&FilterExpressionNode>,
        filter_text: Option<&str>,
        scope_path: Option<&str>,
        options: &QueryOptions,
    ) -> Result<String, TranslateError> {
        let tree = self.merge_tree(predicate, filter_text, scope_path)?;
        trace!(?tree, "Merged filter tree");

        let options = self.clamp(options);
        let query = self.writer.write(tree.as_ref(), &options)?;
        debug!(
            query = %query,
            terms = tree.as_ref().map_or(0, FilterExpressionNode::term_count),
            "Translated content query"
        );
        Ok(query)
    }

    fn clamp(&self, options: &QueryOptions) -> QueryOptions {
        let mut options = options.clone();
        if let (Some(top), Some(max)) = (options.top, self.max_top)
            && top > max
        {
            debug!(requested = top, max, "Clamping $top");
            options.top = Some(max);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::field;

    #[test]
    fn test_predicate_filter_scope_and_top() {
        let translator = QueryExpressionTranslator::new();
        let query = translator
            .translate(
                Some(&field("Name").contains("s")),
                Some("isof('User')"),
                Some("/root/ims/builtin/portal"),
                &QueryOptions::new().with_top(12),
            )
            .unwrap();
        assert_eq!(
            query,
            "+(+Name:*s* +InFolder:/root/ims/builtin/portal) +TypeIs:user .TOP:12"
        );
    }

    #[test]
    fn test_no_inputs_yields_only_directives() {
        let translator = QueryExpressionTranslator::new();
        let query = translator
            .translate(None, None, None, &QueryOptions::new().with_top(5).with_skip(10))
            .unwrap();
        assert_eq!(query, ".TOP:5 .SKIP:10");

        let empty = translator
            .translate(None, Some("  "), Some(""), &QueryOptions::default())
            .unwrap();
        assert_eq!(empty, "");
    }

    #[test]
    fn test_filter_only() {
        let translator = QueryExpressionTranslator::new();
        let query = translator
            .translate(
                None,
                Some("Name eq 'Admin' and isof('User')"),
                None,
                &QueryOptions::default(),
            )
            .unwrap();
        assert_eq!(query, "+Name:Admin +TypeIs:user");
    }

    #[test]
    fn test_scope_with_filter_and_no_predicate() {
        let translator = QueryExpressionTranslator::new();
        let query = translator
            .translate(None, Some("isof('Folder')"), Some("/Root/Sites"), &QueryOptions::default())
            .unwrap();
        assert_eq!(query, "+InFolder:/root/sites +TypeIs:folder");
    }

    #[test]
    fn test_merge_is_deterministic() {
        let translator = QueryExpressionTranslator::new();
        let predicate = field("Index").gt(3).or(field("Hidden").eq(false));
        let run = || {
            translator
                .translate(
                    Some(&predicate),
                    Some("contains(DisplayName,'Doe') and isof('User')"),
                    Some("/Root"),
                    &QueryOptions::new().with_top(3).with_skip(6),
                )
                .unwrap()
        };
        let first = run();
        assert_eq!(first, run());
        assert_eq!(
            first,
            "+(+(Index:>3 Hidden:false) +InFolder:/root) +(+DisplayName:*Doe* +TypeIs:user) .TOP:3 .SKIP:6"
        );
    }

    #[test]
    fn test_max_top_clamp() {
        let translator = QueryExpressionTranslator::new().with_max_top(Some(100));
        let query = translator
            .translate(None, None, None, &QueryOptions::new().with_top(500))
            .unwrap();
        assert_eq!(query, ".TOP:100");
    }

    #[test]
    fn test_malformed_filter() {
        let translator = QueryExpressionTranslator::new();
        let err = translator
            .translate(None, Some("Name eq"), None, &QueryOptions::default())
            .unwrap_err();
        assert!(matches!(err, TranslateError::Syntax { .. }));
    }

    #[test]
    fn test_deeply_nested_filter_is_rejected() {
        let translator = QueryExpressionTranslator::new();
        let filter = format!("{}A eq 1{}", "(".repeat(3000), ")".repeat(3000));
        let err = translator
            .translate(None, Some(&filter), None, &QueryOptions::default())
            .unwrap_err();
        assert!(matches!(err, TranslateError::Syntax { .. }));
    }

    #[test]
    fn test_deep_predicate_is_rejected() {
        let translator = QueryExpressionTranslator::new();
        let mut predicate = field("Index").eq(0);
        for i in 1..2000 {
            predicate = predicate.and(field("Index").eq(i));
        }
        let err = translator
            .translate(Some(&predicate), None, Some("/Root"), &QueryOptions::default())
            .unwrap_err();
        assert_eq!(err, TranslateError::TooDeep { limit: MAX_RENDER_DEPTH });
    }
}
