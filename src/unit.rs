//! Document unit entity.

use crate::tree::HierarchyNode;
use crate::types::{UnitId, UnitName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named container owning exactly one hierarchy tree plus metadata.
///
/// The whole `hierarchy` is the unit of persistence: every structural
/// mutation reads the entire current root, computes a new root, and
/// writes the entire new root back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocUnit {
    pub unit_id: UnitId,
    pub name: UnitName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub hierarchy: HierarchyNode,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl DocUnit {
    /// Rebuild this unit with a replacement hierarchy, keeping identity,
    /// name, timestamp, and metadata.
    pub fn with_hierarchy(&self, hierarchy: HierarchyNode) -> Self {
        Self {
            unit_id: self.unit_id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            hierarchy,
            metadata: self.metadata.clone(),
        }
    }

    /// Conventional id of a unit's root folder node.
    pub fn root_node_id(unit_id: &UnitId) -> String {
        format!("{}-root", unit_id.as_str())
    }
}
