//! Pure hierarchy algorithms.
//!
//! Every operation takes an immutable root plus auxiliary parameters and
//! either returns a new root or fails with a descriptive error; none
//! mutate their inputs. Callers holding the old root keep a valid tree.

use crate::error::EngineError;
use crate::store::IdGenerator;
use crate::tree::node::{HierarchyNode, NodeKind, Settings};
use std::collections::{HashMap, HashSet};

/// Id-to-node index over a whole tree, root included, in pre-order.
pub fn collect_node_map(root: &HierarchyNode) -> HashMap<&str, &HierarchyNode> {
    fn walk<'a>(node: &'a HierarchyNode, nodes: &mut HashMap<&'a str, &'a HierarchyNode>) {
        nodes.insert(node.node_id.as_str(), node);
        for child in &node.children {
            walk(child, nodes);
        }
    }

    let mut nodes = HashMap::new();
    walk(root, &mut nodes);
    nodes
}

/// Parent and sibling-index lookup for every node.
///
/// The root maps to `None`; every other node maps to its immediate parent
/// and its zero-based position among siblings.
pub fn collect_parent_index(
    root: &HierarchyNode,
) -> (
    HashMap<&str, Option<&HierarchyNode>>,
    HashMap<&str, usize>,
) {
    fn walk<'a>(
        node: &'a HierarchyNode,
        parents: &mut HashMap<&'a str, Option<&'a HierarchyNode>>,
        indices: &mut HashMap<&'a str, usize>,
    ) {
        for (idx, child) in node.children.iter().enumerate() {
            parents.insert(child.node_id.as_str(), Some(node));
            indices.insert(child.node_id.as_str(), idx);
            walk(child, parents, indices);
        }
    }

    let mut parents = HashMap::new();
    let mut indices = HashMap::new();
    parents.insert(root.node_id.as_str(), None);
    walk(root, &mut parents, &mut indices);
    (parents, indices)
}

/// First-match pre-order search.
pub fn find_node<'a>(root: &'a HierarchyNode, node_id: &str) -> Option<&'a HierarchyNode> {
    if root.node_id == node_id {
        return Some(root);
    }
    root.children
        .iter()
        .find_map(|child| find_node(child, node_id))
}

/// Factory for a new empty folder node.
pub fn create_folder_node(node_id: impl Into<String>, name: impl Into<String>) -> HierarchyNode {
    HierarchyNode {
        node_id: node_id.into(),
        name: name.into(),
        kind: NodeKind::Folder,
        settings: Settings::new(),
        pointer: None,
        children: Vec::new(),
    }
}

/// Replace `name` on the node with `target_id` wherever it occurs.
///
/// Lenient by contract: renaming an absent id returns an equivalent tree
/// without signalling failure. The use-case layer is the authoritative
/// existence validator and raises `NotFound` before calling this.
pub fn rename_node(root: &HierarchyNode, target_id: &str, new_name: &str) -> HierarchyNode {
    fn rename(node: &mut HierarchyNode, target_id: &str, new_name: &str) {
        if node.node_id == target_id {
            node.name = new_name.to_string();
        }
        for child in &mut node.children {
            rename(child, target_id, new_name);
        }
    }

    let mut updated = root.clone();
    rename(&mut updated, target_id, new_name);
    updated
}

/// Insert a contiguous block of nodes under `parent_id`.
///
/// Inserted nodes are deep-cloned so the caller's copies are never aliased
/// into the tree. `insert_index` is clamped to `[0, len(children)]`; the
/// block keeps its relative order. Fails with `NotFound` if `parent_id`
/// does not exist anywhere in the tree.
pub fn insert_nodes(
    root: &HierarchyNode,
    parent_id: &str,
    insert_index: usize,
    nodes: &[HierarchyNode],
) -> Result<HierarchyNode, EngineError> {
    fn insert(
        node: &mut HierarchyNode,
        parent_id: &str,
        insert_index: usize,
        nodes: &[HierarchyNode],
    ) -> bool {
        if node.node_id == parent_id {
            let bounded = insert_index.min(node.children.len());
            node.children.splice(bounded..bounded, nodes.iter().cloned());
            return true;
        }
        node.children
            .iter_mut()
            .any(|child| insert(child, parent_id, insert_index, nodes))
    }

    let mut updated = root.clone();
    if !insert(&mut updated, parent_id, insert_index, nodes) {
        return Err(EngineError::NotFound(format!(
            "parent node '{parent_id}' not found"
        )));
    }
    Ok(updated)
}

/// Remove every node in `node_ids`, cascading to all descendants.
///
/// Fails with `NotFound` if any id is absent, and with `InvalidOperation`
/// for the root id (the root is undeletable) or if deletion would leave
/// the tree with no root.
pub fn delete_nodes(
    root: &HierarchyNode,
    node_ids: &[String],
) -> Result<HierarchyNode, EngineError> {
    fn prune(node: &HierarchyNode, ids: &HashSet<&str>) -> Option<HierarchyNode> {
        if ids.contains(node.node_id.as_str()) {
            return None;
        }
        let children = node
            .children
            .iter()
            .filter_map(|child| prune(child, ids))
            .collect();
        Some(node.with_children(children))
    }

    let ids: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
    let node_map = collect_node_map(root);

    let mut missing: Vec<&str> = ids
        .iter()
        .copied()
        .filter(|id| !node_map.contains_key(id))
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(EngineError::NotFound(format!(
            "nodes not found in hierarchy: {missing:?}"
        )));
    }

    if ids.contains(root.node_id.as_str()) {
        return Err(EngineError::InvalidOperation(
            "cannot delete the root node of a hierarchy".to_string(),
        ));
    }

    prune(root, &ids).ok_or_else(|| {
        EngineError::InvalidOperation("hierarchy became empty after deletion".to_string())
    })
}

/// Relocate (or copy) `node_ids` under `target_parent_id` at `insert_index`.
///
/// Rejects self-moves and moves into a descendant. With `copy` set, each
/// source subtree is cloned into the untouched tree, minting a fresh id
/// for every cloned node when an `id_factory` is supplied; without `copy`,
/// the originals are removed first and `insert_index` is decremented once
/// for every moved sibling of the target parent whose original position
/// was below the requested index, so the perceived drop position stays
/// stable despite the removal renumbering.
pub fn move_nodes(
    root: &HierarchyNode,
    node_ids: &[String],
    target_parent_id: &str,
    insert_index: usize,
    copy: bool,
    id_factory: Option<&dyn IdGenerator>,
) -> Result<HierarchyNode, EngineError> {
    if node_ids.is_empty() {
        return Ok(root.clone());
    }

    let node_map = collect_node_map(root);
    let (parents, indices) = collect_parent_index(root);

    if !node_map.contains_key(target_parent_id) {
        return Err(EngineError::NotFound(format!(
            "target parent '{target_parent_id}' not found"
        )));
    }

    let missing: Vec<&str> = node_ids
        .iter()
        .map(String::as_str)
        .filter(|id| !node_map.contains_key(id))
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::NotFound(format!(
            "nodes not found in hierarchy: {missing:?}"
        )));
    }

    if node_ids.iter().any(|id| id == target_parent_id) {
        return Err(EngineError::InvalidOperation(
            "cannot move nodes into themselves".to_string(),
        ));
    }

    // Walking the target's ancestor chain; a match means cycle creation.
    let mut ancestor = parents.get(target_parent_id).copied().flatten();
    while let Some(node) = ancestor {
        if node_ids.iter().any(|id| *id == node.node_id) {
            return Err(EngineError::InvalidOperation(
                "cannot move a node into one of its descendants".to_string(),
            ));
        }
        ancestor = parents.get(node.node_id.as_str()).copied().flatten();
    }

    let mut bounded_index = insert_index;
    let (working_root, nodes_to_insert) = if copy {
        let cloned: Vec<HierarchyNode> = node_ids
            .iter()
            .map(|id| {
                let node = node_map[id.as_str()];
                match id_factory {
                    Some(ids) => clone_with_new_ids(node, ids),
                    None => node.clone(),
                }
            })
            .collect();
        (root.clone(), cloned)
    } else {
        let cloned: Vec<HierarchyNode> = node_ids
            .iter()
            .map(|id| node_map[id.as_str()].clone())
            .collect();

        for id in node_ids {
            let same_parent = matches!(
                parents.get(id.as_str()),
                Some(Some(parent)) if parent.node_id == target_parent_id
            );
            if same_parent {
                if let Some(&original_index) = indices.get(id.as_str()) {
                    if original_index < insert_index {
                        bounded_index = bounded_index.saturating_sub(1);
                    }
                }
            }
        }

        (delete_nodes(root, node_ids)?, cloned)
    };

    insert_nodes(&working_root, target_parent_id, bounded_index, &nodes_to_insert)
}

/// Wholesale tree replacement: returns a deep clone of `new_root`,
/// discarding `root`.
pub fn replace_root(_root: &HierarchyNode, new_root: &HierarchyNode) -> HierarchyNode {
    new_root.clone()
}

/// Clone a subtree minting a fresh id for every node in it.
pub(crate) fn clone_with_new_ids(node: &HierarchyNode, ids: &dyn IdGenerator) -> HierarchyNode {
    HierarchyNode {
        node_id: ids.generate(),
        name: node.name.clone(),
        kind: node.kind,
        settings: node.settings.clone(),
        pointer: node.pointer.clone(),
        children: node
            .children
            .iter()
            .map(|child| clone_with_new_ids(child, ids))
            .collect(),
    }
}
