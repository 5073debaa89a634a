//! Doctree: hierarchy-editing engine for document asset trees.
//!
//! An ordered, mutable folder/asset tree backing an interactive outline
//! editor. Every structural mutation is a pure transformation: operations
//! take the current root, return a new root, and report the node ids
//! that changed, so callers holding old references keep a valid tree.

pub mod error;
pub mod events;
pub mod logging;
pub mod store;
pub mod tree;
pub mod types;
pub mod unit;
pub mod usecase;
