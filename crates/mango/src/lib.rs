//! Compiles declarative filter conditions into Mango (`_find`) query
//! documents.
//!
//! ```
//! use mango::{compile, ComparisonOp, Condition, FindOptions, Sort, SortDirection};
//!
//! let cond = Condition::and([
//!     Condition::cmp("task_name", ComparisonOp::Like, "tas"),
//!     Condition::cmp("task_name", ComparisonOp::Eq, "task2"),
//! ]);
//! let opts = FindOptions::default()
//!     .with_limit(100)
//!     .with_sort(Sort::new("created_time", SortDirection::Asc));
//!
//! let doc = compile(&cond, &opts).unwrap();
//! assert_eq!(doc.use_index.as_deref(), Some("created_time"));
//! ```

pub mod ast;
pub mod compile;
pub mod error;
pub mod index;
pub mod parser;
pub mod translate;

use serde_json::Value as Json;

pub use ast::{ComparisonOp, Condition, FindOptions, LogicalOp, Operator, Sort, SortDirection};
pub use compile::{compile, CompileOptions, Compiler, QueryDocument, DEFAULT_MAX_DEPTH};
pub use error::{Error, Result};
pub use index::IndexDefinition;
pub use parser::{parse_condition, parse_condition_bounded, parse_find_options};
pub use translate::{like_to_regex, translate, LikeMode, Translator};

/// Convenience wrapper for typical usage:
///
/// - Parse the condition tuple & options from JSON.
/// - Compile with default options.
pub fn build_query(condition_json: &Json, options_json: &Json) -> Result<QueryDocument> {
    let condition = parse_condition(condition_json)?;
    let opts = parse_find_options(options_json)?;
    compile(&condition, &opts)
}
