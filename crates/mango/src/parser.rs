// crates/mango/src/parser.rs

use serde_json::Value as Json;
use tracing::{debug, warn};

use crate::ast::{Condition, FindOptions, LogicalOp, Operator, Sort};
use crate::compile::DEFAULT_MAX_DEPTH;
use crate::error::{Error, Result};

/// Parse a condition written in tuple form into a [`Condition`] tree.
///
/// ```text
/// ["task_name", "==", "task2"]
/// [null, "and", [["a", ">", 1], ["b", "in", [1, 2]]]]
/// [null, "not", ["a", "==", 1]]
/// ```
///
/// Only tuples are accepted at every level. An already compiled selector
/// fragment such as `[null, "not", {"a": {"$eq": 1}}]` is rejected with
/// [`Error::InvalidOperandKind`]; write the operand as a tuple instead.
pub fn parse_condition(json: &Json) -> Result<Condition> {
    parse_condition_bounded(json, DEFAULT_MAX_DEPTH)
}

/// Same as [`parse_condition`] with an explicit nesting bound.
pub fn parse_condition_bounded(json: &Json, max_depth: usize) -> Result<Condition> {
    parse_node(json, 1, max_depth)
}

fn parse_node(json: &Json, depth: usize, max_depth: usize) -> Result<Condition> {
    if depth > max_depth {
        return Err(Error::DepthExceeded { limit: max_depth });
    }

    let (field, token, value) = split_tuple(json)?;

    match token.parse::<Operator>()? {
        Operator::Comparison(op) => {
            let field = field.as_str().ok_or(Error::MissingField(op))?;
            Ok(Condition::Comparison {
                field: field.to_string(),
                op,
                value: value.clone(),
            })
        }
        Operator::Logical(op) => {
            if !field.is_null() {
                debug!(%op, ?field, "ignoring field slot on logical node");
            }
            parse_logical(op, value, depth, max_depth)
        }
    }
}

fn parse_logical(op: LogicalOp, value: &Json, depth: usize, max_depth: usize) -> Result<Condition> {
    if op == LogicalOp::Not {
        if !is_tuple(value) {
            return Err(Error::operand_kind(
                "`not` requires a single condition operand",
            ));
        }
        return Ok(Condition::not(parse_node(value, depth + 1, max_depth)?));
    }

    let items = value
        .as_array()
        .ok_or_else(|| Error::operand_kind(format!("`{op}` requires a sequence of conditions")))?;

    let mut operands = Vec::with_capacity(items.len());
    for item in items {
        operands.push(parse_node(item, depth + 1, max_depth)?);
    }
    Ok(Condition::Logical { op, operands })
}

fn split_tuple(json: &Json) -> Result<(&Json, &str, &Json)> {
    match json {
        Json::Array(items) if items.len() == 3 => {
            let token = items[1]
                .as_str()
                .ok_or_else(|| Error::condition(format!("operator must be a string, got {}", items[1])))?;
            Ok((&items[0], token, &items[2]))
        }
        Json::Array(items) => Err(Error::condition(format!(
            "expected [field, op, value], got {} elements",
            items.len()
        ))),
        other => Err(Error::condition(format!(
            "expected [field, op, value], got {other}"
        ))),
    }
}

/// A single condition node, as opposed to a list of them.
fn is_tuple(value: &Json) -> bool {
    matches!(value, Json::Array(items) if items.len() == 3 && items[1].is_string())
}

/// Parse FindOptions from a JSON object.
///
/// {
///   limit: 100,
///   sort: ["created_time", "asc"]    // or { "created_time": "asc" }
/// }
pub fn parse_find_options(json: &Json) -> Result<FindOptions> {
    let mut opts = FindOptions::default();

    let obj = match json {
        Json::Object(m) => m,
        Json::Null => return Ok(opts),
        other => {
            warn!(options = %other, "find options are not an object; using defaults");
            return Ok(opts);
        }
    };

    // limit
    match obj.get("limit") {
        None | Some(Json::Null) => {}
        Some(v) => opts.limit = Some(parse_limit(v)?),
    }

    // sort
    match obj.get("sort") {
        None | Some(Json::Null) => {}
        Some(v) => opts.sort = Some(parse_sort(v)?),
    }

    Ok(opts)
}

fn parse_limit(value: &Json) -> Result<u64> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let reason = if value.as_i64().is_some() {
        "a positive integer"
    } else {
        "an integer"
    };
    Err(Error::InvalidLimit(format!("limit must be {reason}, got {value}")))
}

fn parse_sort(value: &Json) -> Result<Sort> {
    let (field, dir) = match value {
        Json::Array(pair) if pair.len() == 2 => match &pair[0] {
            Json::String(field) => (field.as_str(), &pair[1]),
            _ => return Err(Error::InvalidSort("sort field must be a string".into())),
        },
        Json::Object(map) if map.len() == 1 => match map.iter().next() {
            Some((field, dir)) => (field.as_str(), dir),
            None => return Err(Error::InvalidSort("sort object is empty".into())),
        },
        _ => {
            return Err(Error::InvalidSort(
                "sort must be [field, dir] or { field: dir }".into(),
            ))
        }
    };

    let dir = dir.as_str().ok_or_else(|| {
        Error::InvalidSortDirection(format!("expected \"asc\" or \"desc\", got {dir}"))
    })?;
    Sort::parse(field, dir)
}
