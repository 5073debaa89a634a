//! Document hierarchy: node model and pure structural algorithms.

pub mod node;
pub mod ops;

pub use node::{AssetPointer, HierarchyNode, NodeKind, PointerStatus, Settings};
