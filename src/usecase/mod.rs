//! Use-case orchestration over the hierarchy engine.
//!
//! Thin operations that resolve the active unit, load the current root,
//! invoke the domain algorithms, persist the result, and publish change
//! events. Domain failures propagate unchanged to the caller.

pub mod finalize;
pub mod hierarchy;
pub mod units;

pub use finalize::AssetFinalizer;
pub use hierarchy::{
    CreateFolderRequest, FolderPlacement, HierarchyService, MoveNodesRequest, SelectNodesRequest,
};
pub use units::DocUnitService;
