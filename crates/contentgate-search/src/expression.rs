//! Filter expression trees.
//!
//! Trees come from two places: structural predicates assembled in code with
//! [`field`] and friends, and textual `$filter` clauses parsed by
//! [`parse_filter`](crate::parse_filter). The translator merges both into a
//! single tree before rendering.
//!
//! ```
//! use contentgate_search::{FilterExpressionNode, field};
//!
//! let predicate = field("Name").contains("s").and(FilterExpressionNode::type_is("User"));
//! assert!(matches!(predicate, FilterExpressionNode::Conjunction(_, _)));
//! ```

use std::fmt;

/// Comparison operators between a field and a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Substring match
    Contains,
    StartsWith,
    EndsWith,
}

impl CompareOp {
    /// Parse an OData comparison keyword (`eq`, `ne`, `lt`, `le`, `gt`, `ge`).
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "lt" => Some(Self::Lt),
            "le" => Some(Self::Le),
            "gt" => Some(Self::Gt),
            "ge" => Some(Self::Ge),
            _ => None,
        }
    }
}

/// How far below the scope path a query reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeDepth {
    /// Direct children only
    #[default]
    Folder,
    /// The whole subtree
    Tree,
}

/// A node of a filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpressionNode {
    Comparison {
        field: String,
        op: CompareOp,
        value: String,
    },
    /// Logical AND
    Conjunction(Box<FilterExpressionNode>, Box<FilterExpressionNode>),
    /// Logical OR
    Disjunction(Box<FilterExpressionNode>, Box<FilterExpressionNode>),
    TypeFilter(String),
    PathScope { path: String, depth: ScopeDepth },
    Negation(Box<FilterExpressionNode>),
}

impl FilterExpressionNode {
    pub fn comparison(field: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        Self::Comparison {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn type_is(type_name: impl Into<String>) -> Self {
        Self::TypeFilter(type_name.into())
    }

    pub fn in_folder(path: impl Into<String>) -> Self {
        Self::PathScope {
            path: path.into(),
            depth: ScopeDepth::Folder,
        }
    }

    pub fn in_tree(path: impl Into<String>) -> Self {
        Self::PathScope {
            path: path.into(),
            depth: ScopeDepth::Tree,
        }
    }

    pub fn and(self, other: Self) -> Self {
        Self::Conjunction(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Self) -> Self {
        Self::Disjunction(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Negation(Box::new(self))
    }

    /// AND two optional trees, keeping `left` before `right`.
    pub fn merge(left: Option<Self>, right: Option<Self>) -> Option<Self> {
        match (left, right) {
            (Some(l), Some(r)) => Some(l.and(r)),
            (Some(node), None) | (None, Some(node)) => Some(node),
            (None, None) => None,
        }
    }

    /// Height of the tree; a single term has depth 1.
    ///
    /// Walks with an explicit stack so arbitrarily deep host-built trees can
    /// be measured before anything recurses over them.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, level)) = stack.pop() {
            max = max.max(level);
            match node {
                Self::Conjunction(l, r) | Self::Disjunction(l, r) => {
                    stack.push((l, level + 1));
                    stack.push((r, level + 1));
                }
                Self::Negation(inner) => stack.push((inner, level + 1)),
                _ => {}
            }
        }
        max
    }

    /// Number of leaf terms in the tree.
    pub fn term_count(&self) -> usize {
        match self {
            Self::Conjunction(l, r) | Self::Disjunction(l, r) => l.term_count() + r.term_count(),
            Self::Negation(inner) => inner.term_count(),
            _ => 1,
        }
    }
}

/// Entry point for building structural predicates on a named field.
pub fn field(name: impl Into<String>) -> FieldRef {
    FieldRef { name: name.into() }
}

/// A field awaiting a comparison.
#[derive(Debug, Clone)]
pub struct FieldRef {
    name: String,
}

impl FieldRef {
    fn compare(self, op: CompareOp, value: impl fmt::Display) -> FilterExpressionNode {
        FilterExpressionNode::comparison(self.name, op, value.to_string())
    }

    pub fn eq(self, value: impl fmt::Display) -> FilterExpressionNode {
        self.compare(CompareOp::Eq, value)
    }

    pub fn ne(self, value: impl fmt::Display) -> FilterExpressionNode {
        self.compare(CompareOp::Ne, value)
    }

    pub fn lt(self, value: impl fmt::Display) -> FilterExpressionNode {
        self.compare(CompareOp::Lt, value)
    }

    pub fn le(self, value: impl fmt::Display) -> FilterExpressionNode {
        self.compare(CompareOp::Le, value)
    }

    pub fn gt(self, value: impl fmt::Display) -> FilterExpressionNode {
        self.compare(CompareOp::Gt, value)
    }

    pub fn ge(self, value: impl fmt::Display) -> FilterExpressionNode {
        self.compare(CompareOp::Ge, value)
    }

    pub fn contains(self, value: impl fmt::Display) -> FilterExpressionNode {
        self.compare(CompareOp::Contains, value)
    }

    pub fn starts_with(self, value: impl fmt::Display) -> FilterExpressionNode {
        self.compare(CompareOp::StartsWith, value)
    }

    pub fn ends_with(self, value: impl fmt::Display) -> FilterExpressionNode {
        self.compare(CompareOp::EndsWith, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_builder() {
        let node = field("Index").gt(5);
        assert_eq!(node, FilterExpressionNode::comparison("Index", CompareOp::Gt, "5"));
    }

    #[test]
    fn test_merge_keeps_order() {
        let a = field("A").eq(1);
        let b = field("B").eq(2);
        let merged = FilterExpressionNode::merge(Some(a.clone()), Some(b.clone())).unwrap();
        assert_eq!(merged, a.and(b));
    }

    #[test]
    fn test_merge_with_missing_side() {
        let a = field("A").eq(1);
        assert_eq!(FilterExpressionNode::merge(None, Some(a.clone())), Some(a.clone()));
        assert_eq!(FilterExpressionNode::merge(Some(a.clone()), None), Some(a));
        assert_eq!(FilterExpressionNode::merge(None, None), None);
    }

    #[test]
    fn test_term_count() {
        let node = field("A").eq(1).or(field("B").eq(2)).and(field("C").eq(3).not());
        assert_eq!(node.term_count(), 3);
    }

    #[test]
    fn test_depth() {
        assert_eq!(field("A").eq(1).depth(), 1);
        let node = field("A").eq(1).or(field("B").eq(2)).and(field("C").eq(3).not());
        assert_eq!(node.depth(), 3);

        let mut deep = field("A").eq(0);
        for i in 1..1000 {
            deep = deep.and(field("A").eq(i));
        }
        assert_eq!(deep.depth(), 1000);
    }

    #[test]
    fn test_compare_keywords() {
        assert_eq!(CompareOp::from_keyword("GE"), Some(CompareOp::Ge));
        assert_eq!(CompareOp::from_keyword("co"), None);
    }
}
