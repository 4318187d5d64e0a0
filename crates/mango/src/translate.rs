// crates/mango/src/translate.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tracing::trace;

use crate::ast::{ComparisonOp, LogicalOp, Operator};
use crate::error::{Error, Result};

/// How the `like` operator is lowered into `$regex`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeMode {
    /// Pass the pattern through untouched; `like` is an alias of `regex`.
    #[default]
    Regex,
    /// Treat the pattern as SQL `LIKE` syntax (`%`, `_`, `\` escape) and
    /// rewrite it into an anchored regular expression.
    Wildcard,
}

/// Translates one non-recursive node into its selector fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    like: LikeMode,
}

impl Translator {
    pub fn new(like: LikeMode) -> Self {
        Self { like }
    }

    /// Field-scoped comparisons become `{field: {symbol: value}}`.
    /// Logical operators ignore `field` and become `{symbol: value}`, where
    /// `value` is the array of child fragments (`and`/`or`) or a single
    /// fragment (`not`).
    pub fn translate(&self, field: Option<&str>, op: Operator, value: Json) -> Result<Json> {
        trace!(?field, %op, "translating node");

        match op {
            Operator::Comparison(cmp) => {
                let field = field.ok_or(Error::MissingField(cmp))?;
                let value = self.comparison_value(cmp, value)?;
                Ok(single(field, single(cmp.symbol(), value)))
            }
            Operator::Logical(logic) => {
                check_logical_operand(logic, &value)?;
                Ok(single(logic.symbol(), value))
            }
        }
    }

    fn comparison_value(&self, op: ComparisonOp, value: Json) -> Result<Json> {
        match op {
            ComparisonOp::In if !value.is_array() => Err(Error::operand_kind(
                "`in` requires a sequence operand",
            )),
            ComparisonOp::Like if self.like == LikeMode::Wildcard => match value {
                Json::String(pattern) => Ok(Json::String(like_to_regex(&pattern))),
                _ => Err(Error::operand_kind(
                    "`like` requires a string pattern in wildcard mode",
                )),
            },
            _ => Ok(value),
        }
    }
}

fn check_logical_operand(op: LogicalOp, value: &Json) -> Result<()> {
    match op {
        LogicalOp::And | LogicalOp::Or if !value.is_array() => Err(Error::operand_kind(format!(
            "`{op}` requires a sequence operand"
        ))),
        LogicalOp::Not if !value.is_object() => Err(Error::operand_kind(
            "`not` requires a single condition operand",
        )),
        _ => Ok(()),
    }
}

/// Translate with the default `like` handling.
pub fn translate(field: Option<&str>, op: Operator, value: Json) -> Result<Json> {
    Translator::default().translate(field, op, value)
}

/// Rewrite a SQL `LIKE` pattern into an anchored regex.
///
/// `%` matches any run of characters, `_` exactly one, and a backslash makes
/// the following character literal. Everything else is regex-escaped. The
/// `s` flag lets both wildcards match a newline, as they do in SQL.
pub fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 6);
    let mut buf = [0u8; 4];
    let mut chars = pattern.chars();

    out.push_str("(?s)^");
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' => {
                // a trailing backslash stands for itself
                let literal = chars.next().unwrap_or('\\');
                out.push_str(&regex::escape(literal.encode_utf8(&mut buf)));
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    out.push('$');
    out
}

fn single(key: impl Into<String>, value: Json) -> Json {
    let mut map = Map::with_capacity(1);
    map.insert(key.into(), value);
    Json::Object(map)
}
