//! Hierarchy node model and serialization contract.
//!
//! A tree is a single folder root with ordered children. Nodes are treated
//! as immutable once constructed: every structural edit rebuilds the
//! affected part of the tree and returns a new root.

use crate::types::AssetId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Opaque per-node settings, copied verbatim on clone.
pub type Settings = BTreeMap<String, serde_json::Value>;

/// Node type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Asset,
}

/// Storage status of an asset pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerStatus {
    Temporary,
    Final,
}

/// Reference to a binary asset, not the asset bytes themselves.
///
/// `path_hint` is a resolver-specific location hint and is required once
/// the pointer reaches `Final` status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPointer {
    pub asset_id: AssetId,
    pub resolver: String,
    pub status: PointerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_hint: Option<String>,
}

impl AssetPointer {
    pub fn is_final(&self) -> bool {
        self.status == PointerStatus::Final
    }
}

/// The unit of the tree.
///
/// `node_id` is unique within a tree and stable across structural edits;
/// only a copy operation mints new identities. `children` order is
/// significant and is meaningful only for folder nodes; asset nodes
/// always carry an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    pub node_id: String,
    pub name: String,
    pub kind: NodeKind,
    pub settings: Settings,
    pub pointer: Option<AssetPointer>,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    /// Create an asset leaf carrying the given pointer.
    pub fn asset(
        node_id: impl Into<String>,
        name: impl Into<String>,
        pointer: AssetPointer,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            name: name.into(),
            kind: NodeKind::Asset,
            settings: Settings::new(),
            pointer: Some(pointer),
            children: Vec::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Rebuild this node with a replacement child list, cloning every
    /// other field.
    pub(crate) fn with_children(&self, children: Vec<HierarchyNode>) -> Self {
        Self {
            node_id: self.node_id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            settings: self.settings.clone(),
            pointer: self.pointer.clone(),
            children,
        }
    }
}

/// Wire shape of a node.
///
/// `children` is present only for folder nodes on serialize, and is never
/// read for asset nodes on deserialize, even if present in the input.
#[derive(Serialize, Deserialize)]
struct NodeRepr {
    id: String,
    name: String,
    #[serde(rename = "type")]
    kind: NodeKind,
    settings: Settings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pointer: Option<AssetPointer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<NodeRepr>>,
}

impl From<&HierarchyNode> for NodeRepr {
    fn from(node: &HierarchyNode) -> Self {
        NodeRepr {
            id: node.node_id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            settings: node.settings.clone(),
            pointer: node.pointer.clone(),
            children: match node.kind {
                NodeKind::Folder => Some(node.children.iter().map(NodeRepr::from).collect()),
                NodeKind::Asset => None,
            },
        }
    }
}

impl From<NodeRepr> for HierarchyNode {
    fn from(repr: NodeRepr) -> Self {
        let children = match repr.kind {
            NodeKind::Folder => repr
                .children
                .unwrap_or_default()
                .into_iter()
                .map(HierarchyNode::from)
                .collect(),
            NodeKind::Asset => Vec::new(),
        };
        HierarchyNode {
            node_id: repr.id,
            name: repr.name,
            kind: repr.kind,
            settings: repr.settings,
            pointer: repr.pointer,
            children,
        }
    }
}

impl Serialize for HierarchyNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NodeRepr::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HierarchyNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        NodeRepr::deserialize(deserializer).map(HierarchyNode::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ops::create_folder_node;

    fn sample_pointer(status: PointerStatus, hint: Option<&str>) -> AssetPointer {
        AssetPointer {
            asset_id: AssetId::new("asset-1").unwrap(),
            resolver: "doc_media".to_string(),
            status,
            path_hint: hint.map(str::to_string),
        }
    }

    #[test]
    fn test_folder_serializes_with_children() {
        let mut root = create_folder_node("u1-root", "root");
        root.children.push(create_folder_node("f1", "Chapter"));

        let value = serde_json::to_value(&root).unwrap();
        assert_eq!(value["type"], "folder");
        assert_eq!(value["children"][0]["id"], "f1");
    }

    #[test]
    fn test_asset_omits_children_on_serialize() {
        let node = HierarchyNode::asset(
            "a1",
            "page",
            sample_pointer(PointerStatus::Final, Some("doc_units/assets/a1.png")),
        );

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "asset");
        assert!(value.get("children").is_none());
        assert_eq!(value["pointer"]["status"], "final");
    }

    #[test]
    fn test_asset_ignores_children_on_deserialize() {
        let raw = serde_json::json!({
            "id": "a1",
            "name": "page",
            "type": "asset",
            "settings": {},
            "children": [{"id": "ghost", "name": "x", "type": "folder", "settings": {}}]
        });

        let node: HierarchyNode = serde_json::from_value(raw).unwrap();
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_pointer_without_hint_round_trips() {
        let node =
            HierarchyNode::asset("a1", "page", sample_pointer(PointerStatus::Temporary, None));

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["pointer"]["status"], "temporary");
        assert!(value["pointer"].get("path_hint").is_none());

        let back: HierarchyNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }
}
