use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::Error;

/// Field-scoped comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
    Regex,
    In,
}

impl ComparisonOp {
    pub const ALL: [ComparisonOp; 9] = [
        ComparisonOp::Eq,
        ComparisonOp::Ne,
        ComparisonOp::Gt,
        ComparisonOp::Lt,
        ComparisonOp::Gte,
        ComparisonOp::Lte,
        ComparisonOp::Like,
        ComparisonOp::Regex,
        ComparisonOp::In,
    ];

    /// Mango operator key emitted for this comparison.
    pub fn symbol(self) -> &'static str {
        use ComparisonOp::*;

        match self {
            Eq => "$eq",
            Ne => "$ne",
            Gt => "$gt",
            Lt => "$lt",
            Gte => "$gte",
            Lte => "$lte",
            Like | Regex => "$regex",
            In => "$in",
        }
    }

    pub fn token(self) -> &'static str {
        use ComparisonOp::*;

        match self {
            Eq => "==",
            Ne => "!=",
            Gt => ">",
            Lt => "<",
            Gte => ">=",
            Lte => "<=",
            Like => "like",
            Regex => "regex",
            In => "in",
        }
    }
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Boolean combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOp::And => "$and",
            LogicalOp::Or => "$or",
            LogicalOp::Not => "$not",
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
            LogicalOp::Not => "not",
        }
    }
}

impl Display for LogicalOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Any operator token a condition node may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Comparison(ComparisonOp),
    Logical(LogicalOp),
}

impl From<ComparisonOp> for Operator {
    fn from(op: ComparisonOp) -> Self {
        Operator::Comparison(op)
    }
}

impl From<LogicalOp> for Operator {
    fn from(op: LogicalOp) -> Self {
        Operator::Logical(op)
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        use ComparisonOp::*;

        let op: Operator = match token {
            "==" | "eq" => Eq.into(),
            "!=" | "ne" => Ne.into(),
            ">" | "gt" => Gt.into(),
            "<" | "lt" => Lt.into(),
            ">=" | "gte" => Gte.into(),
            "<=" | "lte" => Lte.into(),
            "like" => Like.into(),
            "regex" => Regex.into(),
            "in" => In.into(),
            "and" => LogicalOp::And.into(),
            "or" => LogicalOp::Or.into(),
            "not" => LogicalOp::Not.into(),
            other => return Err(Error::UnsupportedOperator(other.to_string())),
        };
        Ok(op)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Comparison(op) => op.fmt(f),
            Operator::Logical(op) => op.fmt(f),
        }
    }
}

/// Filter tree:
/// - Comparison: `<field> <op> <value>`
/// - Logical: `and`/`or` over any number of children, `not` over exactly one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Comparison {
        field: String,
        op: ComparisonOp,
        value: Json,
    },
    Logical {
        op: LogicalOp,
        operands: Vec<Condition>,
    },
}

impl Condition {
    pub fn cmp(field: impl Into<String>, op: ComparisonOp, value: impl Into<Json>) -> Self {
        Condition::Comparison {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn and(operands: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Logical {
            op: LogicalOp::And,
            operands: operands.into_iter().collect(),
        }
    }

    pub fn or(operands: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Logical {
            op: LogicalOp::Or,
            operands: operands.into_iter().collect(),
        }
    }

    pub fn not(operand: Condition) -> Self {
        Condition::Logical {
            op: LogicalOp::Not,
            operands: vec![operand],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn token(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(Error::InvalidSortDirection(format!(
                "expected \"asc\" or \"desc\", got {other:?}"
            ))),
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A single sort key; also names the index the store should use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Build from a raw direction token, rejecting anything but `asc`/`desc`.
    pub fn parse(field: impl Into<String>, direction: &str) -> Result<Self, Error> {
        Ok(Self::new(field, direction.parse()?))
    }
}

/// Query options:
/// - limit: must be positive when present
/// - sort: single key + direction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    pub limit: Option<u64>,
    pub sort: Option<Sort>,
}

impl FindOptions {
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }
}
