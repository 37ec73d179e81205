//! Canonical content query rendering.
//!
//! Renders a [`FilterExpressionNode`] tree and [`QueryOptions`] into the
//! single-line query string accepted by the content index:
//!
//! - the operands of the root conjunction become top-level `+`-prefixed clauses
//! - a nested conjunction becomes a `+( ... )` group
//! - disjunction operands are unprefixed and grouped as `( ... )`
//! - negations and `ne` comparisons are `-`-prefixed
//! - type and path names are lower-cased, literals are kept as written
//! - directives follow the terms in fixed order: `.TOP`, `.SKIP`, then sorts
//!
//! Rendering is a pure function of its inputs, so identical trees always
//! yield byte-identical strings.

use crate::error::TranslateError;
use crate::expression::{CompareOp, FilterExpressionNode, ScopeDepth};
use crate::options::QueryOptions;

/// Deepest tree the writer will render.
pub const MAX_RENDER_DEPTH: usize = 512;

/// Writer for the canonical query language.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalQueryWriter;

impl CanonicalQueryWriter {
    pub fn new() -> Self {
        Self
    }

    /// Render terms followed by directives. Empty input yields an empty string.
    pub fn write(
        &self,
        tree: Option<&FilterExpressionNode>,
        options: &QueryOptions,
    ) -> Result<String, TranslateError> {
        let mut parts = Vec::new();
        if let Some(tree) = tree {
            parts.push(self.write_terms(tree)?);
        }
        let directives = self.write_directives(options);
        if !directives.is_empty() {
            parts.push(directives);
        }
        Ok(parts.join(" "))
    }

    /// Render only the term part of a query.
    ///
    /// Trees deeper than [`MAX_RENDER_DEPTH`] are refused with
    /// [`TranslateError::TooDeep`].
    pub fn write_terms(&self, tree: &FilterExpressionNode) -> Result<String, TranslateError> {
        if tree.depth() > MAX_RENDER_DEPTH {
            return Err(TranslateError::TooDeep {
                limit: MAX_RENDER_DEPTH,
            });
        }
        Ok(match tree {
            FilterExpressionNode::Conjunction(left, right) => {
                format!("{} {}", must_clause(left), must_clause(right))
            }
            FilterExpressionNode::Disjunction(_, _) => should_terms(tree),
            other => must_clause(other),
        })
    }

    /// Render `.TOP`, `.SKIP` and sort directives.
    pub fn write_directives(&self, options: &QueryOptions) -> String {
        let mut directives = Vec::new();
        if let Some(top) = options.top {
            directives.push(format!(".TOP:{top}"));
        }
        if let Some(skip) = options.skip {
            directives.push(format!(".SKIP:{skip}"));
        }
        for sort in &options.order_by {
            let keyword = if sort.descending { "REVERSESORT" } else { "SORT" };
            directives.push(format!(".{keyword}:{}", sort.field));
        }
        directives.join(" ")
    }
}

/// Render a node as a required operand of a conjunction.
fn must_clause(node: &FilterExpressionNode) -> String {
    match node {
        FilterExpressionNode::Conjunction(left, right) => {
            format!("+({} {})", must_clause(left), must_clause(right))
        }
        FilterExpressionNode::Disjunction(_, _) => format!("+({})", should_terms(node)),
        FilterExpressionNode::Negation(inner) => negated(inner),
        FilterExpressionNode::Comparison {
            op: CompareOp::Ne, ..
        } => format!("-{}", term(node)),
        other => format!("+{}", term(other)),
    }
}

/// Render a node as an optional operand of a disjunction. Nested
/// disjunctions are flattened into the same group.
fn should_clause(node: &FilterExpressionNode) -> String {
    match node {
        FilterExpressionNode::Conjunction(left, right) => {
            format!("({} {})", must_clause(left), must_clause(right))
        }
        FilterExpressionNode::Disjunction(_, _) => should_terms(node),
        FilterExpressionNode::Negation(inner) => negated(inner),
        FilterExpressionNode::Comparison {
            op: CompareOp::Ne, ..
        } => format!("-{}", term(node)),
        other => term(other),
    }
}

fn should_terms(node: &FilterExpressionNode) -> String {
    match node {
        FilterExpressionNode::Disjunction(left, right) => {
            format!("{} {}", should_clause(left), should_clause(right))
        }
        other => should_clause(other),
    }
}

/// Render the negation of `inner`.
fn negated(inner: &FilterExpressionNode) -> String {
    match inner {
        FilterExpressionNode::Negation(double) => must_clause(double),
        FilterExpressionNode::Comparison {
            op: CompareOp::Ne, ..
        } => format!("+{}", term(inner)),
        FilterExpressionNode::Conjunction(left, right) => {
            format!("-({} {})", must_clause(left), must_clause(right))
        }
        FilterExpressionNode::Disjunction(_, _) => format!("-({})", should_terms(inner)),
        leaf => format!("-{}", term(leaf)),
    }
}

/// Render a leaf without prefix. `ne` renders like `eq`; the caller adds `-`.
fn term(node: &FilterExpressionNode) -> String {
    match node {
        FilterExpressionNode::Comparison { field, op, value } => match op {
            CompareOp::Eq | CompareOp::Ne => format!("{field}:{value}"),
            CompareOp::Lt => format!("{field}:<{value}"),
            CompareOp::Le => format!("{field}:<={value}"),
            CompareOp::Gt => format!("{field}:>{value}"),
            CompareOp::Ge => format!("{field}:>={value}"),
            CompareOp::Contains => format!("{field}:*{value}*"),
            CompareOp::StartsWith => format!("{field}:{value}*"),
            CompareOp::EndsWith => format!("{field}:*{value}"),
        },
        FilterExpressionNode::TypeFilter(type_name) => {
            format!("TypeIs:{}", type_name.to_lowercase())
        }
        FilterExpressionNode::PathScope { path, depth } => {
            let keyword = match depth {
                ScopeDepth::Folder => "InFolder",
                ScopeDepth::Tree => "InTree",
            };
            format!("{keyword}:{}", path.to_lowercase())
        }
        FilterExpressionNode::Conjunction(_, _) => must_clause(node),
        FilterExpressionNode::Disjunction(_, _) => format!("({})", should_terms(node)),
        FilterExpressionNode::Negation(inner) => negated(inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::field;
    use crate::options::SortField;

    fn render(tree: &FilterExpressionNode) -> String {
        CanonicalQueryWriter::new()
            .write(Some(tree), &QueryOptions::default())
            .unwrap()
    }

    #[test]
    fn test_single_terms() {
        assert_eq!(render(&field("Name").eq("Admin")), "+Name:Admin");
        assert_eq!(render(&field("Name").contains("s")), "+Name:*s*");
        assert_eq!(render(&field("Name").starts_with("ad")), "+Name:ad*");
        assert_eq!(render(&field("Name").ends_with("in")), "+Name:*in");
        assert_eq!(render(&field("Index").ge(3)), "+Index:>=3");
        assert_eq!(render(&field("Index").lt(3)), "+Index:<3");
        assert_eq!(render(&field("Name").ne("x")), "-Name:x");
    }

    #[test]
    fn test_type_and_scope_are_lowercased() {
        assert_eq!(render(&FilterExpressionNode::type_is("User")), "+TypeIs:user");
        assert_eq!(
            render(&FilterExpressionNode::in_folder("/Root/IMS")),
            "+InFolder:/root/ims"
        );
        assert_eq!(
            render(&FilterExpressionNode::in_tree("/Root/IMS")),
            "+InTree:/root/ims"
        );
    }

    #[test]
    fn test_literal_casing_is_preserved() {
        assert_eq!(render(&field("DisplayName").contains("Smith")), "+DisplayName:*Smith*");
    }

    #[test]
    fn test_nested_conjunction_becomes_group() {
        let tree = field("A")
            .eq(1)
            .and(field("B").eq(2))
            .and(FilterExpressionNode::type_is("User"));
        assert_eq!(render(&tree), "+(+A:1 +B:2) +TypeIs:user");
    }

    #[test]
    fn test_disjunction() {
        let tree = field("A").eq(1).or(field("B").eq(2)).or(field("C").eq(3));
        assert_eq!(render(&tree), "A:1 B:2 C:3");

        let tree = field("A").eq(1).or(field("B").eq(2)).and(field("C").eq(3));
        assert_eq!(render(&tree), "+(A:1 B:2) +C:3");
    }

    #[test]
    fn test_conjunction_inside_disjunction() {
        let tree = field("A").eq(1).and(field("B").eq(2)).or(field("C").eq(3));
        assert_eq!(render(&tree), "(+A:1 +B:2) C:3");
    }

    #[test]
    fn test_negations() {
        assert_eq!(render(&field("A").eq(1).not()), "-A:1");
        assert_eq!(render(&field("A").ne(1).not()), "+A:1");
        assert_eq!(render(&field("A").eq(1).not().not()), "+A:1");
        assert_eq!(
            render(&field("A").eq(1).or(field("B").eq(2)).not()),
            "-(A:1 B:2)"
        );
        assert_eq!(
            render(&field("A").eq(1).and(field("B").eq(2).not())),
            "+A:1 -B:2"
        );
    }

    #[test]
    fn test_directives_order() {
        let options = QueryOptions::new()
            .with_sort(SortField::desc("CreationDate"))
            .with_skip(5)
            .with_top(10);
        let writer = CanonicalQueryWriter::new();
        assert_eq!(
            writer.write(None, &options).unwrap(),
            ".TOP:10 .SKIP:5 .REVERSESORT:CreationDate"
        );
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(
            CanonicalQueryWriter::new()
                .write(None, &QueryOptions::default())
                .unwrap(),
            ""
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let tree = field("A").contains("x").and(FilterExpressionNode::type_is("Folder"));
        let options = QueryOptions::new().with_top(3);
        let writer = CanonicalQueryWriter::new();
        let first = writer.write(Some(&tree), &options).unwrap();
        for _ in 0..10 {
            assert_eq!(writer.write(Some(&tree.clone()), &options).unwrap(), first);
        }
    }

    #[test]
    fn test_deep_tree_is_refused() {
        let writer = CanonicalQueryWriter::new();

        let mut tree = field("A").eq(0);
        for i in 1..MAX_RENDER_DEPTH {
            tree = tree.and(field("A").eq(i as i64));
        }
        assert_eq!(tree.depth(), MAX_RENDER_DEPTH);
        assert!(writer.write_terms(&tree).is_ok());

        for i in 0..3000 {
            tree = FilterExpressionNode::Disjunction(
                Box::new(field("B").eq(i as i64)),
                Box::new(tree),
            );
        }
        let err = writer.write(Some(&tree), &QueryOptions::default()).unwrap_err();
        assert_eq!(err, TranslateError::TooDeep { limit: MAX_RENDER_DEPTH });
    }
}
