//! Paging and ordering directives appended to a content query.

use serde::{Deserialize, Serialize};

use crate::error::TranslateError;

/// One `$orderby` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// `$top`, `$skip` and `$orderby` of a collection request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub top: Option<usize>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub order_by: Vec<SortField>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn with_sort(mut self, sort: SortField) -> Self {
        self.order_by.push(sort);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.skip.is_none() && self.order_by.is_empty()
    }

    /// Read `$top`, `$skip` and `$orderby` from query-string pairs.
    ///
    /// Other keys are ignored; `$filter` is read separately by the caller.
    pub fn from_query_pairs<'a, I>(pairs: I) -> Result<Self, TranslateError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            match key {
                "$top" => options.top = Some(parse_count(key, value)?),
                "$skip" => options.skip = Some(parse_count(key, value)?),
                "$orderby" => options.order_by = parse_order_by(value)?,
                _ => {}
            }
        }
        Ok(options)
    }
}

fn parse_count(option: &str, value: &str) -> Result<usize, TranslateError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| TranslateError::invalid_option(option, format!("'{value}' is not a count")))
}

/// Parse `$orderby`: comma-separated `Field [asc|desc]` entries.
pub fn parse_order_by(value: &str) -> Result<Vec<SortField>, TranslateError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.split_whitespace();
            let field = parts.next().unwrap_or_default();
            let descending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                None | Some("asc") => false,
                Some("desc") => true,
                Some(other) => {
                    return Err(TranslateError::invalid_option(
                        "$orderby",
                        format!("unknown direction '{other}'"),
                    ));
                }
            };
            if parts.next().is_some() {
                return Err(TranslateError::invalid_option(
                    "$orderby",
                    format!("malformed entry '{entry}'"),
                ));
            }
            Ok(SortField {
                field: field.to_string(),
                descending,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_pairs() {
        let pairs = [
            ("$top", "12"),
            ("$skip", "24"),
            ("$orderby", "Name, CreationDate desc"),
            ("$filter", "isof('User')"),
        ];
        let options = QueryOptions::from_query_pairs(pairs).unwrap();
        assert_eq!(options.top, Some(12));
        assert_eq!(options.skip, Some(24));
        assert_eq!(
            options.order_by,
            vec![SortField::asc("Name"), SortField::desc("CreationDate")]
        );
    }

    #[test]
    fn test_invalid_top() {
        let err = QueryOptions::from_query_pairs([("$top", "-1")]).unwrap_err();
        assert!(matches!(err, TranslateError::InvalidOption { .. }));
    }

    #[test]
    fn test_invalid_direction() {
        assert!(parse_order_by("Name sideways").is_err());
        assert!(parse_order_by("Name asc extra").is_err());
    }

    #[test]
    fn test_empty_options() {
        assert!(QueryOptions::new().is_empty());
        assert!(!QueryOptions::new().with_top(1).is_empty());
    }
}
