//! Asset finalization sweep.
//!
//! Batch maintenance pass over every document unit: promotes temporary
//! pointers to final storage, garbage-collects orphaned final assets,
//! and purges the temporary area. Not part of the interactive path.

use crate::error::EngineError;
use crate::events::{DocUnitEvent, EventBus};
use crate::store::{DocUnitRepository, MediaStore};
use crate::tree::HierarchyNode;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Accumulated state of one sweep.
#[derive(Default)]
struct SweepPass {
    /// Node ids whose pointer changed, in pre-order first-encounter order.
    changed_node_ids: Vec<String>,
    /// Every final-storage path hint seen, across all units.
    referenced: HashSet<String>,
}

/// Batch promotion and garbage collection over all units.
pub struct AssetFinalizer {
    repository: Arc<dyn DocUnitRepository>,
    media: Arc<dyn MediaStore>,
    events: Arc<EventBus>,
}

impl AssetFinalizer {
    pub fn new(
        repository: Arc<dyn DocUnitRepository>,
        media: Arc<dyn MediaStore>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            repository,
            media,
            events,
        }
    }

    /// Run the sweep.
    ///
    /// A promotion failure is fatal to the sweep; units committed earlier
    /// in the pass retain their state. Orphan deletion failures are
    /// tolerated and logged, and the temporary area is purged regardless
    /// of what the garbage collection found.
    pub fn run(&self) -> Result<(), EngineError> {
        let units = self.repository.list_units()?;
        let mut referenced = HashSet::new();

        for unit in units {
            let mut pass = SweepPass::default();
            let promoted = self.promote_tree(&unit.hierarchy, &mut pass)?;
            referenced.extend(pass.referenced);

            let Some(new_root) = promoted else {
                continue;
            };

            info!(
                unit = %unit.unit_id,
                promoted = pass.changed_node_ids.len(),
                "finalized unit assets"
            );
            let updated = unit.with_hierarchy(new_root);
            self.repository.save_unit(&updated)?;

            if !pass.changed_node_ids.is_empty() {
                let mut seen = HashSet::new();
                let changed_node_ids: Vec<String> = pass
                    .changed_node_ids
                    .into_iter()
                    .filter(|id| seen.insert(id.clone()))
                    .collect();
                self.events.publish(&DocUnitEvent::HierarchyUpdated {
                    unit_id: updated.unit_id.as_str().to_string(),
                    root: updated.hierarchy,
                    changed_node_ids,
                });
            }
        }

        for hint in self.media.list_final_assets()? {
            if referenced.contains(&hint) {
                continue;
            }
            // Orphan cleanup is best-effort maintenance.
            if let Err(err) = self.media.delete_asset(&hint) {
                warn!(asset = %hint, error = %err, "orphaned asset deletion failed");
            }
        }

        self.media.cleanup_temporary();
        Ok(())
    }

    /// Promote every temporary pointer in a subtree.
    ///
    /// Returns `Some(new_node)` when anything below (or at) `node`
    /// changed, rebuilding only the path from changed nodes to this
    /// level; untouched subtrees are reused as-is.
    fn promote_tree(
        &self,
        node: &HierarchyNode,
        pass: &mut SweepPass,
    ) -> Result<Option<HierarchyNode>, EngineError> {
        let mut promoted_pointer = None;
        if let Some(pointer) = &node.pointer {
            if !pointer.is_final() {
                promoted_pointer = Some(self.media.promote(pointer)?);
                pass.changed_node_ids.push(node.node_id.clone());
            }
        }

        let effective = promoted_pointer.as_ref().or(node.pointer.as_ref());
        if let Some(pointer) = effective {
            if pointer.is_final() {
                if let Some(hint) = &pointer.path_hint {
                    pass.referenced.insert(hint.clone());
                }
            }
        }

        let mut new_children: Vec<Option<HierarchyNode>> =
            Vec::with_capacity(node.children.len());
        for child in &node.children {
            new_children.push(self.promote_tree(child, pass)?);
        }

        if promoted_pointer.is_none() && new_children.iter().all(Option::is_none) {
            return Ok(None);
        }

        let children = node
            .children
            .iter()
            .zip(new_children)
            .map(|(original, rebuilt)| rebuilt.unwrap_or_else(|| original.clone()))
            .collect();
        let mut rebuilt = node.with_children(children);
        if let Some(pointer) = promoted_pointer {
            rebuilt.pointer = Some(pointer);
        }
        Ok(Some(rebuilt))
    }
}
