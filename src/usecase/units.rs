//! Document-unit lifecycle operations.

use crate::error::EngineError;
use crate::events::{DocUnitEvent, EventBus};
use crate::store::{ActiveUnitStore, DocUnitRepository, IdGenerator, MediaStore};
use crate::tree::{ops, HierarchyNode};
use crate::types::{UnitId, UnitName};
use crate::unit::DocUnit;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Creation, naming, activation, and asset import of document units.
pub struct DocUnitService {
    repository: Arc<dyn DocUnitRepository>,
    active: Arc<dyn ActiveUnitStore>,
    ids: Arc<dyn IdGenerator>,
    media: Arc<dyn MediaStore>,
    events: Arc<EventBus>,
}

impl DocUnitService {
    pub fn new(
        repository: Arc<dyn DocUnitRepository>,
        active: Arc<dyn ActiveUnitStore>,
        ids: Arc<dyn IdGenerator>,
        media: Arc<dyn MediaStore>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            repository,
            active,
            ids,
            media,
            events,
        }
    }

    fn publish_unit_list(&self) -> Result<(), EngineError> {
        let unit_ids = self
            .repository
            .list_units()?
            .into_iter()
            .map(|unit| unit.unit_id.as_str().to_string())
            .collect();
        self.events
            .publish(&DocUnitEvent::DocUnitListUpdated { unit_ids });
        Ok(())
    }

    fn mark_dirty(&self) {
        self.events
            .publish(&DocUnitEvent::ProjectDirtyStateChanged { is_dirty: true });
    }

    /// Create a unit with an empty root folder and make it active.
    pub fn create(&self, name: &str) -> Result<DocUnit, EngineError> {
        let unit_id = UnitId::new(self.ids.generate())?;
        let unit = DocUnit {
            unit_id: unit_id.clone(),
            name: UnitName::new(name)?,
            created_at: Some(Utc::now()),
            hierarchy: ops::create_folder_node(DocUnit::root_node_id(&unit_id), "root"),
            metadata: BTreeMap::new(),
        };

        debug!(unit = %unit_id, "creating doc unit");
        self.repository.save_unit(&unit)?;
        self.active.set(Some(unit_id.clone()));

        self.publish_unit_list()?;
        self.events.publish(&DocUnitEvent::ActiveDocUnitChanged {
            unit_id: Some(unit_id.as_str().to_string()),
        });
        self.mark_dirty();
        Ok(unit)
    }

    /// Rename an existing unit.
    pub fn rename(&self, unit_id: &UnitId, new_name: &str) -> Result<DocUnit, EngineError> {
        let unit = self.repository.get_unit(unit_id)?.ok_or_else(|| {
            EngineError::NotFound(format!("doc unit '{}' not found", unit_id.as_str()))
        })?;

        let renamed = DocUnit {
            name: UnitName::new(new_name)?,
            ..unit
        };
        self.repository.save_unit(&renamed)?;

        self.publish_unit_list()?;
        self.mark_dirty();
        Ok(renamed)
    }

    /// Delete a unit, clearing the active pointer when it was the one
    /// being edited.
    pub fn delete(&self, unit_id: &UnitId) -> Result<(), EngineError> {
        debug!(unit = %unit_id, "deleting doc unit");
        self.repository.delete_unit(unit_id)?;

        if self.active.get().as_ref() == Some(unit_id) {
            self.active.set(None);
            self.events
                .publish(&DocUnitEvent::ActiveDocUnitChanged { unit_id: None });
        }

        self.publish_unit_list()?;
        self.mark_dirty();
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<DocUnit>, EngineError> {
        self.repository.list_units()
    }

    /// Point interactive hierarchy operations at another unit (or none).
    pub fn set_active(&self, unit_id: Option<UnitId>) {
        self.active.set(unit_id.clone());
        self.events.publish(&DocUnitEvent::ActiveDocUnitChanged {
            unit_id: unit_id.map(|id| id.as_str().to_string()),
        });
    }

    /// Import a binary asset into a unit.
    ///
    /// The new asset leaf is appended as the last child of the unit's
    /// root folder, bypassing the generic insert algorithm.
    pub fn import_asset(
        &self,
        unit_id: &UnitId,
        source_path: &Path,
    ) -> Result<DocUnit, EngineError> {
        let unit = self.repository.get_unit(unit_id)?.ok_or_else(|| {
            EngineError::NotFound(format!("doc unit '{}' not found", unit_id.as_str()))
        })?;

        let pointer = self.media.import_temporary(source_path)?;
        let node_id = self.ids.generate();
        let name = pointer
            .path_hint
            .as_deref()
            .map(Path::new)
            .unwrap_or(source_path)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| node_id.clone());

        debug!(unit = %unit_id, node = %node_id, "importing asset");
        let node = HierarchyNode::asset(node_id, name, pointer);
        let mut hierarchy = unit.hierarchy.clone();
        hierarchy.children.push(node);

        let updated = unit.with_hierarchy(hierarchy);
        self.repository.save_unit(&updated)?;

        self.publish_unit_list()?;
        self.mark_dirty();
        Ok(updated)
    }
}
