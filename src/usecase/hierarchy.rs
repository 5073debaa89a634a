//! Interactive hierarchy operations for the active document unit.

use crate::error::EngineError;
use crate::events::{DocUnitEvent, EventBus};
use crate::store::{ActiveUnitStore, HierarchyRepository, IdGenerator};
use crate::tree::{ops, HierarchyNode};
use crate::types::UnitId;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Where a new folder lands relative to its anchor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderPlacement {
    /// Appended as the anchor folder's last child.
    Child,
    /// Inserted at the anchor's own position under the anchor's parent.
    Sibling,
}

#[derive(Debug, Clone)]
pub struct CreateFolderRequest {
    pub anchor_node_id: Option<String>,
    pub placement: FolderPlacement,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct MoveNodesRequest {
    pub node_ids: Vec<String>,
    pub target_parent_id: String,
    pub insert_index: usize,
    pub as_copy: bool,
}

#[derive(Debug, Clone)]
pub struct SelectNodesRequest {
    pub primary_node_id: Option<String>,
    pub selected_node_ids: Vec<String>,
}

/// Orchestrates structural edits against the active unit's tree.
pub struct HierarchyService {
    repository: Arc<dyn HierarchyRepository>,
    active: Arc<dyn ActiveUnitStore>,
    ids: Arc<dyn IdGenerator>,
    events: Arc<EventBus>,
}

impl HierarchyService {
    pub fn new(
        repository: Arc<dyn HierarchyRepository>,
        active: Arc<dyn ActiveUnitStore>,
        ids: Arc<dyn IdGenerator>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            repository,
            active,
            ids,
            events,
        }
    }

    fn active_unit(&self) -> Result<UnitId, EngineError> {
        self.active.get().ok_or(EngineError::NoActiveUnit)
    }

    fn commit(
        &self,
        unit_id: &UnitId,
        root: HierarchyNode,
        changed_node_ids: Vec<String>,
    ) -> Result<(), EngineError> {
        self.repository.save_hierarchy(unit_id, &root)?;
        self.events.publish(&DocUnitEvent::HierarchyUpdated {
            unit_id: unit_id.as_str().to_string(),
            root,
            changed_node_ids,
        });
        self.events
            .publish(&DocUnitEvent::ProjectDirtyStateChanged { is_dirty: true });
        Ok(())
    }

    /// Load the active unit's tree and announce it.
    pub fn load(&self) -> Result<HierarchyNode, EngineError> {
        let unit_id = self.active_unit()?;
        let root = self.repository.get_hierarchy(&unit_id)?;
        self.events.publish(&DocUnitEvent::HierarchyLoaded {
            unit_id: unit_id.as_str().to_string(),
            root: root.clone(),
        });
        Ok(root)
    }

    /// Create an empty folder placed relative to an optional anchor node.
    ///
    /// Without an anchor the folder is appended under the root.
    pub fn create_folder(
        &self,
        request: CreateFolderRequest,
    ) -> Result<HierarchyNode, EngineError> {
        let unit_id = self.active_unit()?;
        let root = self.repository.get_hierarchy(&unit_id)?;

        let (parent_id, insert_index) = {
            let node_map = ops::collect_node_map(&root);
            let anchor = match &request.anchor_node_id {
                Some(id) => Some(*node_map.get(id.as_str()).ok_or_else(|| {
                    EngineError::NotFound(format!("anchor node '{id}' not found"))
                })?),
                None => None,
            };

            match anchor {
                Some(anchor) if request.placement == FolderPlacement::Child => {
                    if !anchor.is_folder() {
                        return Err(EngineError::InvalidOperation(
                            "cannot create a folder inside a non-folder node".to_string(),
                        ));
                    }
                    (anchor.node_id.clone(), anchor.children.len())
                }
                Some(anchor) => {
                    let (parents, indices) = ops::collect_parent_index(&root);
                    match parents.get(anchor.node_id.as_str()).copied().flatten() {
                        Some(parent) => (
                            parent.node_id.clone(),
                            indices
                                .get(anchor.node_id.as_str())
                                .copied()
                                .unwrap_or(parent.children.len()),
                        ),
                        // Anchoring a sibling on the root falls back to
                        // appending under it.
                        None => (root.node_id.clone(), root.children.len()),
                    }
                }
                None => (root.node_id.clone(), root.children.len()),
            }
        };

        let folder_id = self.ids.generate();
        let folder = ops::create_folder_node(&folder_id, &request.name);
        debug!(unit = %unit_id, folder = %folder_id, parent = %parent_id, "creating folder");

        let updated = ops::insert_nodes(&root, &parent_id, insert_index, &[folder.clone()])?;
        self.commit(&unit_id, updated, vec![folder_id])?;
        Ok(folder)
    }

    /// Rename one node.
    ///
    /// This layer is the authoritative existence validator; the pure
    /// rename algorithm below it is lenient by contract.
    pub fn rename(&self, node_id: &str, new_name: &str) -> Result<(), EngineError> {
        let unit_id = self.active_unit()?;
        let root = self.repository.get_hierarchy(&unit_id)?;

        if ops::find_node(&root, node_id).is_none() {
            return Err(EngineError::NotFound(format!(
                "hierarchy node '{node_id}' not found"
            )));
        }

        debug!(unit = %unit_id, node = %node_id, "renaming node");
        let updated = ops::rename_node(&root, node_id, new_name);
        self.commit(&unit_id, updated, vec![node_id.to_string()])
    }

    /// Delete the given nodes and all their descendants.
    ///
    /// The published change set is the originally requested id list, not
    /// expanded to descendants.
    pub fn delete(&self, node_ids: &[String]) -> Result<(), EngineError> {
        let unit_id = self.active_unit()?;
        if node_ids.is_empty() {
            return Ok(());
        }

        let root = self.repository.get_hierarchy(&unit_id)?;
        debug!(unit = %unit_id, count = node_ids.len(), "deleting nodes");
        let updated = ops::delete_nodes(&root, node_ids)?;
        self.commit(&unit_id, updated, node_ids.to_vec())
    }

    /// Move or copy nodes under a new parent.
    ///
    /// For a plain move the change set is the requested id list,
    /// de-duplicated with order preserved; for a copy it is the set of
    /// newly minted ids.
    pub fn move_nodes(&self, request: MoveNodesRequest) -> Result<(), EngineError> {
        let unit_id = self.active_unit()?;
        if request.node_ids.is_empty() {
            return Ok(());
        }

        let node_ids: Vec<String> = {
            let mut seen = HashSet::new();
            request
                .node_ids
                .iter()
                .filter(|id| seen.insert(id.as_str()))
                .cloned()
                .collect()
        };

        let root = self.repository.get_hierarchy(&unit_id)?;
        let before: HashSet<String> = if request.as_copy {
            ops::collect_node_map(&root)
                .keys()
                .map(|id| id.to_string())
                .collect()
        } else {
            HashSet::new()
        };

        let id_factory = if request.as_copy {
            Some(self.ids.as_ref())
        } else {
            None
        };

        debug!(
            unit = %unit_id,
            count = node_ids.len(),
            target = %request.target_parent_id,
            copy = request.as_copy,
            "moving nodes"
        );
        let updated = ops::move_nodes(
            &root,
            &node_ids,
            &request.target_parent_id,
            request.insert_index,
            request.as_copy,
            id_factory,
        )?;

        let changed_node_ids = if request.as_copy {
            ops::collect_node_map(&updated)
                .keys()
                .filter(|id| !before.contains(**id))
                .map(|id| id.to_string())
                .collect()
        } else {
            node_ids
        };

        self.commit(&unit_id, updated, changed_node_ids)
    }

    /// Publish a selection change after validating every referenced node.
    ///
    /// Does not touch the persisted tree. A primary id not already in the
    /// selection list is prepended to the published list.
    pub fn select(&self, request: SelectNodesRequest) -> Result<(), EngineError> {
        let unit_id = self.active_unit()?;
        let root = self.repository.get_hierarchy(&unit_id)?;
        let node_map = ops::collect_node_map(&root);

        if let Some(primary) = &request.primary_node_id {
            if !node_map.contains_key(primary.as_str()) {
                return Err(EngineError::NotFound(format!(
                    "hierarchy node '{primary}' not found"
                )));
            }
        }
        for id in &request.selected_node_ids {
            if !node_map.contains_key(id.as_str()) {
                return Err(EngineError::NotFound(format!(
                    "hierarchy node '{id}' not found"
                )));
            }
        }

        let mut selected = request.selected_node_ids.clone();
        if let Some(primary) = &request.primary_node_id {
            if !selected.iter().any(|id| id == primary) {
                selected.insert(0, primary.clone());
            }
        }

        self.events.publish(&DocUnitEvent::HierarchySelectionChanged {
            unit_id: unit_id.as_str().to_string(),
            primary_node_id: request.primary_node_id,
            selected_node_ids: selected,
        });
        Ok(())
    }
}
