//! In-memory adapters for the engine's ports.
//!
//! Shared state is guarded by exclusive locks held only for the duration
//! of the read or write, never across a full use-case execution.

use crate::error::EngineError;
use crate::store::{ActiveUnitStore, DocUnitRepository, HierarchyRepository};
use crate::tree::HierarchyNode;
use crate::types::UnitId;
use crate::unit::DocUnit;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;

/// Process-wide active-unit pointer.
#[derive(Default)]
pub struct MemActiveUnitStore {
    current: Mutex<Option<UnitId>>,
}

impl MemActiveUnitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActiveUnitStore for MemActiveUnitStore {
    fn get(&self) -> Option<UnitId> {
        self.current.lock().clone()
    }

    fn set(&self, unit_id: Option<UnitId>) {
        *self.current.lock() = unit_id;
    }
}

/// Unit registry backing both repository ports.
#[derive(Default)]
pub struct MemDocUnitStore {
    units: RwLock<BTreeMap<String, DocUnit>>,
}

impl MemDocUnitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocUnitRepository for MemDocUnitStore {
    fn get_unit(&self, unit_id: &UnitId) -> Result<Option<DocUnit>, EngineError> {
        Ok(self.units.read().get(unit_id.as_str()).cloned())
    }

    fn save_unit(&self, unit: &DocUnit) -> Result<(), EngineError> {
        self.units
            .write()
            .insert(unit.unit_id.as_str().to_string(), unit.clone());
        Ok(())
    }

    fn delete_unit(&self, unit_id: &UnitId) -> Result<(), EngineError> {
        self.units.write().remove(unit_id.as_str());
        Ok(())
    }

    fn list_units(&self) -> Result<Vec<DocUnit>, EngineError> {
        Ok(self.units.read().values().cloned().collect())
    }
}

impl HierarchyRepository for MemDocUnitStore {
    fn get_hierarchy(&self, unit_id: &UnitId) -> Result<HierarchyNode, EngineError> {
        self.units
            .read()
            .get(unit_id.as_str())
            .map(|unit| unit.hierarchy.clone())
            .ok_or_else(|| {
                EngineError::NotFound(format!("doc unit '{}' not found", unit_id.as_str()))
            })
    }

    fn save_hierarchy(&self, unit_id: &UnitId, root: &HierarchyNode) -> Result<(), EngineError> {
        let mut units = self.units.write();
        let unit = units.get_mut(unit_id.as_str()).ok_or_else(|| {
            EngineError::NotFound(format!("doc unit '{}' not found", unit_id.as_str()))
        })?;
        unit.hierarchy = root.clone();
        Ok(())
    }
}
