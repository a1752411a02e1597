//! Source merge order
//!
//! Copyright (c) 2025 Reqgate Team
//! Licensed under the Apache-2.0 license

use crate::types::{FieldMap, RawInput, SourceKind};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precedence of request sources, lowest first
///
/// On a key collision the source that comes later in the order wins. Sources
/// of a kind the order does not list rank below every listed kind, and several
/// sources of the same kind keep their capture order. The default order is
/// `path < query < form < body`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SourceKind>", into = "Vec<SourceKind>")]
pub struct MergeOrder(Vec<SourceKind>);

impl MergeOrder {
    /// Create an order; each kind may appear at most once
    pub fn new(order: impl Into<Vec<SourceKind>>) -> Result<Self> {
        let order = order.into();
        for (i, kind) in order.iter().enumerate() {
            if order[..i].contains(kind) {
                return Err(Error::configuration(
                    format!("source '{}' listed more than once in merge order", kind),
                    Some("merge_order"),
                ));
            }
        }
        Ok(Self(order))
    }

    pub fn kinds(&self) -> &[SourceKind] {
        &self.0
    }

    fn rank(&self, kind: SourceKind) -> usize {
        self.0
            .iter()
            .position(|k| *k == kind)
            .map_or(0, |position| position + 1)
    }

    /// Combine every source of `input` into a single field map
    pub fn merge(&self, input: &RawInput) -> FieldMap {
        let mut sources: Vec<_> = input.sources().iter().collect();
        // Stable, so equal ranks stay in capture order
        sources.sort_by_key(|source| self.rank(source.kind));

        let mut merged = FieldMap::new();
        for source in sources {
            for (name, value) in &source.fields {
                merged.insert(name.clone(), value.clone());
            }
        }
        merged
    }
}

impl Default for MergeOrder {
    fn default() -> Self {
        Self(vec![
            SourceKind::Path,
            SourceKind::Query,
            SourceKind::Form,
            SourceKind::Body,
        ])
    }
}

impl TryFrom<Vec<SourceKind>> for MergeOrder {
    type Error = Error;

    fn try_from(order: Vec<SourceKind>) -> Result<Self> {
        Self::new(order)
    }
}

impl From<MergeOrder> for Vec<SourceKind> {
    fn from(order: MergeOrder) -> Self {
        order.0
    }
}

impl fmt::Display for MergeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(SourceKind::as_str).collect();
        f.write_str(&names.join(" < "))
    }
}
