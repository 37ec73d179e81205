pub mod engine;
pub mod error;
pub mod expression;
pub mod filter;
pub mod options;
pub mod query_builder;
pub mod translator;

pub use engine::{ContentQuery, QueryExecutor, QueryResult};
pub use error::{SearchError, TranslateError};
pub use expression::{CompareOp, FieldRef, FilterExpressionNode, ScopeDepth, field};
pub use filter::parse_filter;
pub use options::{QueryOptions, SortField};
pub use query_builder::CanonicalQueryWriter;
pub use translator::QueryExpressionTranslator;
