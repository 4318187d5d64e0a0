// crates/mango/src/index.rs

use serde::{Deserialize, Serialize};

use crate::ast::Sort;

// ─────────────────────────────────────────────────────────────────────────────
// Index definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a Mango `_index` request.
///
/// A compiled `use_index` hint only resolves when an index with the matching
/// field exists; this builds the definition for one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub index: IndexFields,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IndexKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFields {
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    #[default]
    Json,
}

impl IndexDefinition {
    /// Single-field JSON index named `<field>_idx`.
    pub fn for_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            name: format!("{field}_idx"),
            index: IndexFields {
                fields: vec![field],
            },
            kind: IndexKind::Json,
        }
    }

    pub fn for_sort(sort: &Sort) -> Self {
        Self::for_field(sort.field.clone())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.index.fields.iter().map(|s| s.as_str())
    }
}
