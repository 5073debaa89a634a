//! Storage and capability ports for the hierarchy engine.
//!
//! The orchestration layer owns no mutable tree state; the repository is
//! the sole long-lived owner of the current root for a given unit. All
//! collaborators are consumed through these single-concern traits,
//! injected at construction.

pub mod idgen;
pub mod media;
pub mod memory;

use crate::error::EngineError;
use crate::tree::{AssetPointer, HierarchyNode};
use crate::types::UnitId;
use crate::unit::DocUnit;
use std::path::{Path, PathBuf};

/// Supplies opaque unique identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Process-wide pointer to the document unit currently being edited.
pub trait ActiveUnitStore: Send + Sync {
    fn get(&self) -> Option<UnitId>;
    fn set(&self, unit_id: Option<UnitId>);
}

/// Loads and saves a whole hierarchy tree keyed by document-unit id.
pub trait HierarchyRepository: Send + Sync {
    /// Fails with `NotFound` if the unit is unknown.
    fn get_hierarchy(&self, unit_id: &UnitId) -> Result<HierarchyNode, EngineError>;
    fn save_hierarchy(&self, unit_id: &UnitId, root: &HierarchyNode) -> Result<(), EngineError>;
}

/// Persistence of whole document units.
pub trait DocUnitRepository: Send + Sync {
    fn get_unit(&self, unit_id: &UnitId) -> Result<Option<DocUnit>, EngineError>;
    fn save_unit(&self, unit: &DocUnit) -> Result<(), EngineError>;
    fn delete_unit(&self, unit_id: &UnitId) -> Result<(), EngineError>;
    fn list_units(&self) -> Result<Vec<DocUnit>, EngineError>;
}

/// Binary asset storage and promotion of temporary imports.
pub trait MediaStore: Send + Sync {
    /// Copy `source_path` into temporary storage, returning a
    /// `Temporary` pointer.
    fn import_temporary(&self, source_path: &Path) -> Result<AssetPointer, EngineError>;

    /// Promote a pointer to final storage. Idempotent: a `Final` pointer
    /// is returned unchanged. Fails with `NotFound` if the temporary
    /// file referenced by `path_hint` is missing.
    fn promote(&self, pointer: &AssetPointer) -> Result<AssetPointer, EngineError>;

    /// Resolve a pointer to an absolute path. Fails if the pointer has
    /// no `path_hint`.
    fn resolve_path(&self, pointer: &AssetPointer) -> Result<PathBuf, EngineError>;

    /// Enumerate the path hints of every asset in final storage.
    fn list_final_assets(&self) -> Result<Vec<String>, EngineError>;

    /// Delete one final-storage asset. Fails with `InvalidOperation` if
    /// `path_hint` resolves outside the final-storage area.
    fn delete_asset(&self, path_hint: &str) -> Result<(), EngineError>;

    /// Purge the temporary-storage area. Best-effort: never fails the
    /// caller.
    fn cleanup_temporary(&self);
}

pub use idgen::UuidGenerator;
pub use media::FsMediaStore;
pub use memory::{MemActiveUnitStore, MemDocUnitStore};
