// crates/mango/src/compile.rs

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use tracing::debug;

use crate::ast::{Condition, FindOptions, LogicalOp, Sort, SortDirection};
use crate::error::{Error, Result};
use crate::translate::{LikeMode, Translator};

/// Default bound on condition nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Deepest nesting accepted; the root node is depth 1.
    pub max_depth: usize,
    pub like: LikeMode,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            like: LikeMode::default(),
        }
    }
}

/// A compiled Mango `_find` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDocument {
    pub selector: Json,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<BTreeMap<String, SortDirection>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_index: Option<String>,
}

impl QueryDocument {
    pub fn to_json(&self) -> Result<Json> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Walks a [`Condition`] tree and assembles the query document.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    options: CompileOptions,
    translator: Translator,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            translator: Translator::new(options.like),
        }
    }

    #[tracing::instrument(skip_all)]
    pub fn compile(&self, condition: &Condition, opts: &FindOptions) -> Result<QueryDocument> {
        let selector = self.compile_selector(condition)?;
        let limit = opts.limit.map(positive_limit).transpose()?;

        let mut doc = QueryDocument {
            selector,
            limit,
            sort: None,
            use_index: None,
        };

        // sort and use_index always travel together
        if let Some(Sort { field, direction }) = &opts.sort {
            doc.sort = Some(vec![BTreeMap::from([(field.clone(), *direction)])]);
            doc.use_index = Some(field.clone());
        }

        debug!(
            limit = ?doc.limit,
            use_index = ?doc.use_index,
            "query document compiled"
        );
        Ok(doc)
    }

    /// Compile only the selector fragment, without the `"selector"` envelope.
    pub fn compile_selector(&self, condition: &Condition) -> Result<Json> {
        self.fragment(condition, 1)
    }

    fn fragment(&self, condition: &Condition, depth: usize) -> Result<Json> {
        if depth > self.options.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.options.max_depth,
            });
        }

        match condition {
            Condition::Comparison { field, op, value } => {
                self.translator
                    .translate(Some(field.as_str()), (*op).into(), value.clone())
            }
            Condition::Logical {
                op: LogicalOp::Not,
                operands,
            } => {
                let [operand] = operands.as_slice() else {
                    return Err(Error::operand_kind(format!(
                        "`not` requires exactly one operand, got {}",
                        operands.len()
                    )));
                };
                let inner = self.fragment(operand, depth + 1)?;
                self.translator.translate(None, LogicalOp::Not.into(), inner)
            }
            Condition::Logical { op, operands } => {
                if operands.is_empty() {
                    return Err(Error::EmptyOperands(*op));
                }
                let children = operands
                    .iter()
                    .map(|operand| self.fragment(operand, depth + 1))
                    .collect::<Result<Vec<_>>>()?;
                self.translator
                    .translate(None, (*op).into(), Json::Array(children))
            }
        }
    }
}

fn positive_limit(limit: u64) -> Result<u64> {
    if limit == 0 {
        return Err(Error::InvalidLimit("limit must be a positive integer, got 0".into()));
    }
    Ok(limit)
}

/// Compile with default options.
pub fn compile(condition: &Condition, opts: &FindOptions) -> Result<QueryDocument> {
    Compiler::default().compile(condition, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ComparisonOp::*;
    use serde_json::json;

    fn c(field: &str, value: i64) -> Condition {
        Condition::cmp(field, Eq, value)
    }

    fn nested_nots(depth: usize) -> Condition {
        let mut cond = c("leaf", 1);
        for _ in 1..depth {
            cond = Condition::not(cond);
        }
        cond
    }

    // ─────────────────────────────────────────────────────────────
    // selector assembly
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn bare_comparison_is_not_wrapped() {
        let doc = compile(&Condition::cmp("task_name", Eq, "task2"), &FindOptions::default())
            .unwrap();
        assert_eq!(doc.selector, json!({ "task_name": { "$eq": "task2" } }));
    }

    #[test]
    fn and_preserves_operand_order() {
        let cond = Condition::and([c("a", 1), c("b", 2)]);
        let sel = Compiler::default().compile_selector(&cond).unwrap();
        assert_eq!(
            sel,
            json!({ "$and": [{ "a": { "$eq": 1 } }, { "b": { "$eq": 2 } }] })
        );
    }

    #[test]
    fn duplicates_are_kept() {
        let cond = Condition::or([c("a", 1), c("a", 1)]);
        let sel = Compiler::default().compile_selector(&cond).unwrap();
        assert_eq!(sel["$or"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn nested_or_of_and() {
        let cond = Condition::or([Condition::and([c("a", 1), c("b", 2)]), c("c", 3)]);
        let sel = Compiler::default().compile_selector(&cond).unwrap();
        assert_eq!(
            sel,
            json!({
                "$or": [
                    { "$and": [{ "a": { "$eq": 1 } }, { "b": { "$eq": 2 } }] },
                    { "c": { "$eq": 3 } }
                ]
            })
        );
    }

    #[test]
    fn not_wraps_its_single_operand() {
        let cond = Condition::not(Condition::cmp("views", Gt, 10));
        let sel = Compiler::default().compile_selector(&cond).unwrap();
        assert_eq!(sel, json!({ "$not": { "views": { "$gt": 10 } } }));
    }

    #[test]
    fn not_with_wrong_arity_is_rejected() {
        for operands in [vec![], vec![c("a", 1), c("b", 2)]] {
            let cond = Condition::Logical {
                op: LogicalOp::Not,
                operands,
            };
            let err = compile(&cond, &FindOptions::default()).unwrap_err();
            assert!(matches!(err, Error::InvalidOperandKind(_)));
        }
    }

    #[test]
    fn empty_and_or_are_rejected() {
        let err = compile(&Condition::and([]), &FindOptions::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyOperands(LogicalOp::And)));

        // nested empty groups fail the whole compilation
        let cond = Condition::and([c("a", 1), Condition::or([])]);
        let err = compile(&cond, &FindOptions::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyOperands(LogicalOp::Or)));
    }

    #[test]
    fn invalid_leaf_aborts_compilation() {
        let cond = Condition::and([c("a", 1), Condition::cmp("tags", In, "rust")]);
        let err = compile(&cond, &FindOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidOperandKind(_)));
    }

    // ─────────────────────────────────────────────────────────────
    // depth guard
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn depth_at_limit_compiles() {
        let compiler = Compiler::new(CompileOptions {
            max_depth: 8,
            ..CompileOptions::default()
        });
        assert!(compiler.compile_selector(&nested_nots(8)).is_ok());
    }

    #[test]
    fn depth_past_limit_is_resource_exhaustion() {
        let compiler = Compiler::new(CompileOptions {
            max_depth: 8,
            ..CompileOptions::default()
        });
        let err = compiler.compile_selector(&nested_nots(9)).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { limit: 8 }));
        assert!(err.is_resource_exhaustion());
    }

    // ─────────────────────────────────────────────────────────────
    // limit / sort
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn options_absent_means_keys_absent() {
        let doc = compile(&c("a", 1), &FindOptions::default()).unwrap();
        let v = doc.to_json().unwrap();
        assert_eq!(v, json!({ "selector": { "a": { "$eq": 1 } } }));
    }

    #[test]
    fn limit_is_attached_when_positive() {
        let doc = compile(&c("a", 1), &FindOptions::default().with_limit(100)).unwrap();
        assert_eq!(doc.limit, Some(100));
        assert_eq!(doc.to_json().unwrap()["limit"], json!(100));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = compile(&c("a", 1), &FindOptions::default().with_limit(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidLimit(_)));
    }

    #[test]
    fn limit_past_i64_is_emitted_as_is() {
        let limit = u64::MAX;
        let doc = compile(&c("a", 1), &FindOptions::default().with_limit(limit)).unwrap();
        assert_eq!(doc.to_json().unwrap()["limit"], json!(limit));
    }

    #[test]
    fn sort_attaches_sort_and_use_index_together() {
        let opts = FindOptions::default().with_sort(Sort::new("created_time", SortDirection::Asc));
        let doc = compile(&c("a", 1), &opts).unwrap();
        let v = doc.to_json().unwrap();

        assert_eq!(v["sort"], json!([{ "created_time": "asc" }]));
        assert_eq!(v["use_index"], json!("created_time"));
        assert!(v.get("limit").is_none());
    }

    #[test]
    fn compiling_twice_is_structurally_equal() {
        let cond = Condition::or([Condition::and([c("a", 1), c("b", 2)]), c("c", 3)]);
        let opts = FindOptions::default()
            .with_limit(5)
            .with_sort(Sort::new("c", SortDirection::Desc));

        let first = compile(&cond, &opts).unwrap();
        let second = compile(&cond, &opts).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn compiler_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Compiler>();
        assert_send_sync::<QueryDocument>();
    }
}
